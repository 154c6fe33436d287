//! Configuration types shared by the trunking state machine and tuning
//! control plane.
use serde::{Deserialize, Serialize};

use crate::errors::{ConfigError, Result};

/// Protocol decode mode, as selected by `[mode] decode =` in the INI config
/// or the CLI protocol presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodeMode {
    Auto,
    Dmr,
    P25p1,
    P25p2,
    Nxdn,
    Ysf,
    Edacs,
    Provoice,
    Dstar,
    M17,
    X2tdma,
    Dpmr,
    Analog,
}

impl DecodeMode {
    /// Parse a mode name, resolving the aliases from the config surface
    /// (`p25p1_only`, `p25p2_only`, `analog_monitor`, `provoice`).
    pub fn parse(name: &str) -> Result<Self> {
        let mode = match name {
            "auto" => DecodeMode::Auto,
            "dmr" => DecodeMode::Dmr,
            "p25p1" | "p25p1_only" => DecodeMode::P25p1,
            "p25p2" | "p25p2_only" => DecodeMode::P25p2,
            "nxdn" => DecodeMode::Nxdn,
            "ysf" => DecodeMode::Ysf,
            "edacs" => DecodeMode::Edacs,
            "provoice" => DecodeMode::Provoice,
            "dstar" => DecodeMode::Dstar,
            "m17" => DecodeMode::M17,
            "x2tdma" => DecodeMode::X2tdma,
            "dpmr" => DecodeMode::Dpmr,
            "analog" | "analog_monitor" => DecodeMode::Analog,
            other => {
                return Err(ConfigError::UnknownDecodeMode {
                    mode: other.to_string(),
                }
                .into())
            }
        };
        Ok(mode)
    }
}

/// A bounded duration config knob: default + inclusive range, overridable by
/// an environment variable at load time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundedF64 {
    pub value: f64,
    pub min: f64,
    pub max: f64,
}

impl BoundedF64 {
    pub const fn new(value: f64, min: f64, max: f64) -> Self {
        Self { value, min, max }
    }

    pub fn set(&mut self, value: f64, key: &str) -> Result<()> {
        if value < self.min || value > self.max {
            return Err(ConfigError::OutOfRange {
                key: key.to_string(),
                value,
                min: self.min,
                max: self.max,
            }
            .into());
        }
        self.value = value;
        Ok(())
    }

    pub fn get(&self) -> f64 {
        self.value
    }

    /// Override from an environment variable, ignoring it if unset or
    /// unparseable, and rejecting it (leaving the prior value) if out of
    /// bounds.
    pub fn override_from_env(&mut self, env_var: &str, key: &str) {
        if let Ok(raw) = std::env::var(env_var) {
            if let Ok(parsed) = raw.parse::<f64>() {
                let _ = self.set(parsed, key);
            }
        }
    }
}

/// Trunking state-machine timing and policy knobs, per the `[trunking]`
/// config section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrunkConfig {
    pub hangtime_s: BoundedF64,
    pub vc_grace_s: BoundedF64,
    pub min_follow_dwell_s: BoundedF64,
    pub grant_voice_timeout_s: BoundedF64,
    pub retune_backoff_s: BoundedF64,
    pub watchdog_interactive_ms: u64,
    pub watchdog_headless_ms: u64,
    pub tune_data_calls: bool,
    pub tune_enc_calls: bool,
}

impl Default for TrunkConfig {
    fn default() -> Self {
        Self {
            hangtime_s: BoundedF64::new(1.0, 0.0, f64::MAX),
            vc_grace_s: BoundedF64::new(1.5, 0.0, 10.0),
            min_follow_dwell_s: BoundedF64::new(0.7, 0.0, 5.0),
            grant_voice_timeout_s: BoundedF64::new(4.0, 0.0, 10.0),
            retune_backoff_s: BoundedF64::new(1.0, 0.0, 10.0),
            watchdog_interactive_ms: 200,
            watchdog_headless_ms: 400,
            tune_data_calls: false,
            tune_enc_calls: false,
        }
    }
}

impl TrunkConfig {
    /// Apply the environment-variable overrides documented in the config
    /// knob table, clamping the watchdog period to 20..2000 ms.
    pub fn apply_env_overrides(&mut self) {
        self.hangtime_s.override_from_env("DSD_HANGTIME_S", "hangtime_s");
        self.vc_grace_s.override_from_env("DSD_VC_GRACE_S", "vc_grace_s");
        self.min_follow_dwell_s
            .override_from_env("DSD_MIN_FOLLOW_DWELL_S", "min_follow_dwell_s");
        self.grant_voice_timeout_s
            .override_from_env("DSD_GRANT_VOICE_TIMEOUT_S", "grant_voice_timeout_s");
        self.retune_backoff_s
            .override_from_env("DSD_RETUNE_BACKOFF_S", "retune_backoff_s");

        if let Ok(raw) = std::env::var("DSD_WATCHDOG_MS") {
            if let Ok(parsed) = raw.parse::<u64>() {
                let clamped = parsed.clamp(20, 2000);
                self.watchdog_interactive_ms = clamped;
                self.watchdog_headless_ms = clamped;
            }
        }
        if let Ok(raw) = std::env::var("DSD_TRUNK_TUNE_DATA_CALLS") {
            self.tune_data_calls = parse_bool_env(&raw).unwrap_or(self.tune_data_calls);
        }
        if let Ok(raw) = std::env::var("DSD_TRUNK_TUNE_ENC_CALLS") {
            self.tune_enc_calls = parse_bool_env(&raw).unwrap_or(self.tune_enc_calls);
        }
    }

    /// Watchdog tick period for the given UI mode, clamped to 20..2000 ms.
    pub fn watchdog_period_ms(&self, interactive: bool) -> u64 {
        let raw = if interactive {
            self.watchdog_interactive_ms
        } else {
            self.watchdog_headless_ms
        };
        raw.clamp(20, 2000)
    }
}

fn parse_bool_env(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

/// Tuning backend connection parameters, per the `[output]` config section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TuningConfig {
    pub rigctl_host: String,
    pub rigctl_port: u16,
    pub rigctl_timeout_ms: u64,
    pub rtl_udp_port: Option<u16>,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            rigctl_host: "127.0.0.1".to_string(),
            rigctl_port: 4532,
            rigctl_timeout_ms: 1500,
            rtl_udp_port: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_mode_aliases_resolve() {
        assert_eq!(DecodeMode::parse("p25p1_only").unwrap(), DecodeMode::P25p1);
        assert_eq!(DecodeMode::parse("analog_monitor").unwrap(), DecodeMode::Analog);
        assert!(DecodeMode::parse("not-a-mode").is_err());
    }

    #[test]
    fn bounded_f64_rejects_out_of_range() {
        let mut b = BoundedF64::new(1.5, 0.0, 10.0);
        assert!(b.set(20.0, "vc_grace_s").is_err());
        assert_eq!(b.get(), 1.5);
        assert!(b.set(3.0, "vc_grace_s").is_ok());
        assert_eq!(b.get(), 3.0);
    }

    #[test]
    fn watchdog_period_clamped() {
        let mut cfg = TrunkConfig::default();
        cfg.watchdog_interactive_ms = 5;
        cfg.watchdog_headless_ms = 99999;
        assert_eq!(cfg.watchdog_period_ms(true), 20);
        assert_eq!(cfg.watchdog_period_ms(false), 2000);
    }
}
