//! INI-style config loader: `[input]`/`[output]`/`[mode]`/`[trunking]`
//! sections, a scalar `version`, `[profile.<name>]` overlays, and a
//! top-level `include = "<path>"` that is merged first (included values are
//! overridden by the including file).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use dsd_core::config::{DecodeMode, TrunkConfig, TuningConfig};
use dsd_core::errors::ConfigError;
use dsd_core::{DsdError, Result};
use ini::Ini;

use crate::logging::LoggingConfig;

const CURRENT_CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, Default)]
pub struct InputConfig {
    /// Raw `-i`/`[input] spec` string (`pulse`, `soapy[:args]`,
    /// `rtl:<dev>:<freq>:...`, `rtltcp:<host>:<port>:...`). Turning this
    /// into a live sample source is a backend concern outside this crate.
    pub spec: Option<String>,
    pub mbe_in_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub wav_path: Option<PathBuf>,
    pub tuning: TuningConfig,
    pub rdio_mode: RdioMode,
    pub rdio_api_url: Option<String>,
    pub rdio_api_key: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            wav_path: None,
            tuning: TuningConfig::default(),
            rdio_mode: RdioMode::default(),
            rdio_api_url: None,
            rdio_api_key: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RdioMode {
    #[default]
    Off,
    Dirwatch,
    Api,
    Both,
}

impl RdioMode {
    pub fn parse(name: &str) -> Self {
        match name {
            "dirwatch" => RdioMode::Dirwatch,
            "api" => RdioMode::Api,
            "both" => RdioMode::Both,
            _ => RdioMode::Off,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModeConfig {
    pub decode: DecodeMode,
}

impl Default for ModeConfig {
    fn default() -> Self {
        Self { decode: DecodeMode::Auto }
    }
}

#[derive(Debug, Clone)]
pub struct CliConfig {
    pub version: u32,
    pub input: InputConfig,
    pub output: OutputConfig,
    pub mode: ModeConfig,
    pub trunking: TrunkConfig,
    pub logging: LoggingConfig,
    pub rtl_udp_control_port: Option<u16>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            version: CURRENT_CONFIG_VERSION,
            input: InputConfig::default(),
            output: OutputConfig::default(),
            mode: ModeConfig::default(),
            trunking: TrunkConfig::default(),
            logging: LoggingConfig::default(),
            rtl_udp_control_port: None,
        }
    }
}

impl CliConfig {
    /// Load `path`, resolving `include = "<path>"` chains relative to the
    /// including file's directory, then parse the merged key/value table
    /// into a typed config.
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut visited = Vec::new();
        let merged = load_merged(path, &mut visited)?;
        Self::from_merged(merged)
    }

    fn from_merged(merged: MergedIni) -> Result<Self> {
        let version = merged
            .general
            .get("version")
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(CURRENT_CONFIG_VERSION);

        let mut config = CliConfig {
            version,
            input: InputConfig {
                spec: merged.section("input", "spec"),
                mbe_in_path: merged.section("input", "mbe_in").map(PathBuf::from),
            },
            output: OutputConfig {
                wav_path: merged.section("output", "wav").map(PathBuf::from),
                tuning: TuningConfig {
                    rigctl_host: merged
                        .section("output", "rigctl_host")
                        .unwrap_or_else(|| "127.0.0.1".to_string()),
                    rigctl_port: merged
                        .section("output", "rigctl_port")
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(4532),
                    rigctl_timeout_ms: merged
                        .section("output", "rigctl_timeout_ms")
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(1500),
                    rtl_udp_port: merged.section("output", "rtl_udp_port").and_then(|v| v.parse().ok()),
                },
                rdio_mode: merged
                    .section("output", "rdio_mode")
                    .map(|v| RdioMode::parse(&v))
                    .unwrap_or_default(),
                rdio_api_url: merged.section("output", "rdio_api_url"),
                rdio_api_key: merged.section("output", "rdio_api_key"),
            },
            mode: ModeConfig {
                decode: merged
                    .section("mode", "decode")
                    .map(|v| DecodeMode::parse(&v))
                    .transpose()?
                    .unwrap_or(DecodeMode::Auto),
            },
            trunking: load_trunk_config(&merged),
            logging: LoggingConfig::default(),
            rtl_udp_control_port: merged
                .section("output", "rtl_udp_control_port")
                .and_then(|v| v.parse().ok()),
        };

        if let Some(profile_name) = merged.section("mode", "profile") {
            apply_profile_overlay(&mut config, &merged, &profile_name)?;
        }

        Ok(config)
    }
}

fn load_trunk_config(merged: &MergedIni) -> TrunkConfig {
    let mut cfg = TrunkConfig::default();
    macro_rules! set_bounded {
        ($field:ident, $key:expr) => {
            if let Some(raw) = merged.section("trunking", $key) {
                if let Ok(parsed) = raw.parse::<f64>() {
                    let _ = cfg.$field.set(parsed, $key);
                }
            }
        };
    }
    set_bounded!(hangtime_s, "hangtime_s");
    set_bounded!(vc_grace_s, "vc_grace_s");
    set_bounded!(min_follow_dwell_s, "min_follow_dwell_s");
    set_bounded!(grant_voice_timeout_s, "grant_voice_timeout_s");
    set_bounded!(retune_backoff_s, "retune_backoff_s");

    if let Some(raw) = merged.section("trunking", "watchdog_ms") {
        if let Ok(parsed) = raw.parse::<u64>() {
            let clamped = parsed.clamp(20, 2000);
            cfg.watchdog_interactive_ms = clamped;
            cfg.watchdog_headless_ms = clamped;
        }
    }
    if let Some(raw) = merged.section("trunking", "trunk_tune_data_calls") {
        cfg.tune_data_calls = parse_bool(&raw).unwrap_or(cfg.tune_data_calls);
    }
    if let Some(raw) = merged.section("trunking", "trunk_tune_enc_calls") {
        cfg.tune_enc_calls = parse_bool(&raw).unwrap_or(cfg.tune_enc_calls);
    }
    cfg.apply_env_overrides();
    cfg
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

/// `[profile.<name>]` keys override the same key in their owning section
/// (`hangtime_s` in a profile overrides `[trunking] hangtime_s`, `decode`
/// overrides `[mode] decode`, and so on).
fn apply_profile_overlay(config: &mut CliConfig, merged: &MergedIni, profile_name: &str) -> Result<()> {
    let section_name = format!("profile.{profile_name}");
    let Some(profile) = merged.sections.get(&section_name) else {
        return Ok(());
    };

    if let Some(decode) = profile.get("decode") {
        config.mode.decode = DecodeMode::parse(decode)?;
    }
    if let Some(wav) = profile.get("wav") {
        config.output.wav_path = Some(PathBuf::from(wav));
    }

    let mut trunk_section = merged.sections.get("trunking").cloned().unwrap_or_default();
    for (k, v) in profile {
        if matches!(
            k.as_str(),
            "hangtime_s"
                | "vc_grace_s"
                | "min_follow_dwell_s"
                | "grant_voice_timeout_s"
                | "retune_backoff_s"
                | "watchdog_ms"
                | "trunk_tune_data_calls"
                | "trunk_tune_enc_calls"
        ) {
            trunk_section.insert(k.clone(), v.clone());
        }
    }
    let mut overlay_sections = merged.sections.clone();
    overlay_sections.insert("trunking".to_string(), trunk_section);
    let overlay = MergedIni { general: HashMap::new(), sections: overlay_sections };
    config.trunking = load_trunk_config(&overlay);
    Ok(())
}

/// A flattened view of an INI file (and its transitively included parents)
/// as plain string maps, pre-typed-parse.
#[derive(Clone)]
struct MergedIni {
    general: HashMap<String, String>,
    sections: HashMap<String, HashMap<String, String>>,
}

impl MergedIni {
    fn section(&self, section: &str, key: &str) -> Option<String> {
        self.sections.get(section)?.get(key).cloned()
    }
}

fn load_merged(path: &Path, visited: &mut Vec<PathBuf>) -> Result<MergedIni> {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    if visited.contains(&canonical) {
        return Err(DsdError::Config(ConfigError::IncludeCycle { path: canonical.display().to_string() }));
    }
    visited.push(canonical.clone());

    let ini = Ini::load_from_file(path)
        .map_err(|e| DsdError::Config(ConfigError::MalformedIni { reason: format!("{}: {e}", path.display()) }))?;

    let mut general: HashMap<String, String> = HashMap::new();
    for (k, v) in ini.general_section().iter() {
        general.insert(k.to_string(), v.to_string());
    }

    let mut merged = if let Some(include_rel) = general.get("include") {
        let include_path = resolve_relative(path, include_rel);
        load_merged(&include_path, visited)?
    } else {
        MergedIni { general: HashMap::new(), sections: HashMap::new() }
    };

    merged.general.extend(general);

    for (section_name, props) in ini.iter().filter_map(|(name, props)| name.map(|n| (n, props))) {
        let entry = merged.sections.entry(section_name.to_string()).or_default();
        for (k, v) in props.iter() {
            entry.insert(k.to_string(), v.to_string());
        }
    }

    Ok(merged)
}

fn resolve_relative(including_file: &Path, raw: &str) -> PathBuf {
    let candidate = PathBuf::from(raw.trim_matches('"'));
    if candidate.is_absolute() {
        return candidate;
    }
    including_file
        .parent()
        .map(|dir| dir.join(&candidate))
        .unwrap_or(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("dsd-cli-test-{name}-{}.ini", std::process::id()));
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn parses_basic_sections() {
        let path = write_temp(
            "basic",
            "version = 1\n[mode]\ndecode = p25p1_only\n[trunking]\nhangtime_s = 2.5\n",
        );
        let config = CliConfig::from_file(&path).unwrap();
        assert_eq!(config.version, 1);
        assert_eq!(config.mode.decode, DecodeMode::P25p1);
        assert_eq!(config.trunking.hangtime_s.get(), 2.5);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn include_is_merged_first_and_overridden() {
        let base = write_temp("base", "[mode]\ndecode = dmr\n[trunking]\nhangtime_s = 1.0\n");
        let overlay = write_temp(
            "overlay",
            &format!("include = \"{}\"\n[mode]\ndecode = nxdn\n", base.display()),
        );
        let config = CliConfig::from_file(&overlay).unwrap();
        assert_eq!(config.mode.decode, DecodeMode::Nxdn);
        assert_eq!(config.trunking.hangtime_s.get(), 1.0);
        let _ = std::fs::remove_file(base);
        let _ = std::fs::remove_file(overlay);
    }

    #[test]
    fn profile_overlay_overrides_base_section() {
        let path = write_temp(
            "profile",
            "[mode]\ndecode = dmr\nprofile = night\n[trunking]\nhangtime_s = 1.0\n[profile.night]\nhangtime_s = 3.0\n",
        );
        let config = CliConfig::from_file(&path).unwrap();
        assert_eq!(config.trunking.hangtime_s.get(), 3.0);
        let _ = std::fs::remove_file(path);
    }
}
