//! Command-line surface: input/output specs, protocol presets, key
//! material, and the rdio/RTL-UDP control options.

use std::path::PathBuf;

use clap::Parser;

use crate::presets;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum RdioModeArg {
    Off,
    Dirwatch,
    Api,
    Both,
}

#[derive(Debug, Parser)]
#[command(name = "dsd-neo", about = "SDR digital voice decoder and trunking tracker", version)]
pub struct Cli {
    /// Config file. A bare positional argument ending in `.ini` is
    /// equivalent to `--config <path>`.
    #[arg(value_name = "CONFIG.ini")]
    pub config_positional: Option<PathBuf>,

    #[arg(long, short = 'c', value_name = "CONFIG.ini")]
    pub config: Option<PathBuf>,

    /// Input spec: `pulse`, `soapy[:args]`, `rtl:<dev>:<freq>:<gain>:<ppm>:<bw>:<sql>:<vol>`,
    /// `rtltcp:<host>:<port>:...`.
    #[arg(short = 'i', value_name = "INPUT-SPEC")]
    pub input: Option<String>,

    /// WAV output path.
    #[arg(short = 'w', value_name = "FILE.wav")]
    pub wav_output: Option<PathBuf>,

    /// Read encoded frames from an MBE file instead of a live source.
    #[arg(short = 'r', value_name = "FILE.mbe")]
    pub mbe_input: Option<PathBuf>,

    /// Protocol preset, resolved from a translated `-f<code>` token (see
    /// `main::preprocess_preset_flags`); not meant to be typed directly as
    /// `--preset`.
    #[arg(long, hide = true)]
    pub preset: Option<String>,

    /// AES-256 key, hex, optional `0x` prefix and internal whitespace.
    #[arg(short = 'H', value_name = "HEX")]
    pub aes_key: Option<String>,

    /// RC4 key, hex, optional `0x` prefix and internal whitespace.
    #[arg(short = '1', value_name = "HEX")]
    pub rc4_key: Option<String>,

    /// Listen for 5-byte RTL-UDP retune frames on this port.
    #[arg(long, value_name = "PORT")]
    pub rtl_udp_control: Option<u16>,

    #[arg(long, value_enum, default_value = "off")]
    pub rdio_mode: RdioModeArg,

    #[arg(long, value_name = "URL")]
    pub rdio_api_url: Option<String>,

    #[arg(long, value_name = "KEY")]
    pub rdio_api_key: Option<String>,

    /// Log output format: json, logfmt, or pretty.
    #[arg(long)]
    pub log_format: Option<String>,

    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Resolve the effective config path: `--config` (any extension), else
    /// a bare positional argument ending in `.ini`.
    pub fn config_path(&self) -> Option<&PathBuf> {
        if let Some(explicit) = self.config.as_ref() {
            return Some(explicit);
        }
        self.config_positional
            .as_ref()
            .filter(|p| p.extension().map(|ext| ext.eq_ignore_ascii_case("ini")).unwrap_or(false))
    }

    pub fn protocol_preset(&self) -> Option<dsd_core::config::DecodeMode> {
        self.preset.as_deref().and_then(presets::resolve)
    }
}

/// Rewrite legacy `-f<code>` tokens (`-fa`, `-fy`, ...) into `--preset
/// <code>` before handing argv to clap, since clap's short-flag parsing
/// doesn't support multi-character short options.
pub fn preprocess_preset_flags(args: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut out = Vec::new();
    for arg in args {
        if let Some(code) = arg.strip_prefix("-f") {
            if !arg.starts_with("--") && !code.is_empty() && code.chars().all(|c| c.is_ascii_alphanumeric()) {
                out.push("--preset".to_string());
                out.push(code.to_string());
                continue;
            }
        }
        out.push(arg);
    }
    out
}
