//! Protocol presets: `-fa|-fi|-fy|-fr|...` shorthand flags that set
//! `[mode] decode` without requiring a config file.

use dsd_core::config::DecodeMode;

/// One `-f<x>` preset flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolPreset {
    pub flag: &'static str,
    pub decode: DecodeMode,
    pub description: &'static str,
}

pub const PRESETS: &[ProtocolPreset] = &[
    ProtocolPreset { flag: "fa", decode: DecodeMode::Auto, description: "auto-detect across all supported protocols" },
    ProtocolPreset { flag: "fi", decode: DecodeMode::Nxdn, description: "NXDN 4800 baud" },
    ProtocolPreset { flag: "fy", decode: DecodeMode::Ysf, description: "Yaesu System Fusion only" },
    ProtocolPreset { flag: "fr", decode: DecodeMode::Dmr, description: "DMR mono (legacy)" },
    ProtocolPreset { flag: "fd", decode: DecodeMode::Dstar, description: "D-STAR only" },
    ProtocolPreset { flag: "f1", decode: DecodeMode::P25p1, description: "P25 Phase 1 only" },
    ProtocolPreset { flag: "f2", decode: DecodeMode::P25p2, description: "P25 Phase 2 only" },
    ProtocolPreset { flag: "fe", decode: DecodeMode::Edacs, description: "EDACS/ProVoice" },
    ProtocolPreset { flag: "fx", decode: DecodeMode::X2tdma, description: "X2-TDMA only" },
    ProtocolPreset { flag: "fp", decode: DecodeMode::Dpmr, description: "dPMR only" },
    ProtocolPreset { flag: "fm", decode: DecodeMode::M17, description: "M17 only" },
];

/// Resolve a preset flag (without its leading `-`) to a decode mode.
pub fn resolve(flag: &str) -> Option<DecodeMode> {
    PRESETS.iter().find(|p| p.flag == flag).map(|p| p.decode)
}
