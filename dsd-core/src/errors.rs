//! dsd-neo error types with granular categories, per the error taxonomy in
//! the design (transient I/O, protocol decode, policy rejection,
//! configuration, fatal).

use thiserror::Error;

/// Top-level error type for all dsd-core operations
#[derive(Debug, Error)]
pub enum DsdError {
    #[error("sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("trunking error: {0}")]
    Trunk(#[from] TrunkError),

    #[error("tuning error: {0}")]
    Tuning(#[from] TuningError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("DSP processing error: {0}")]
    Dsp(#[from] DspError),
}

/// Symbol pipeline / frame sync errors
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("sync not found after {symbols_searched} symbols")]
    SyncNotFound { symbols_searched: usize },

    #[error("insufficient symbol history: need {required}, have {available}")]
    InsufficientHistory { required: usize, available: usize },

    #[error("slicer threshold update rejected: {reason}")]
    ThresholdRejected { reason: String },
}

/// Trunking state machine errors
#[derive(Debug, Error)]
pub enum TrunkError {
    #[error("channel id {channel_id:#06x} resolves to unknown IDEN {iden}")]
    UnresolvedIden { channel_id: u16, iden: u8 },

    #[error("grant rejected by policy: {reason}")]
    PolicyRejected { reason: String },

    #[error("no control channel candidates available")]
    NoCcCandidates,
}

/// Tuning control-plane errors
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("rigctl connection failed: {reason}")]
    RigctlConnect { reason: String },

    #[error("rigctl command timed out after {millis} ms")]
    RigctlTimeout { millis: u64 },

    #[error("rigctl reported error: RPRT {code}")]
    RigctlError { code: i32 },

    #[error("RTL-UDP send failed: {reason}")]
    RtlUdpSend { reason: String },

    #[error("no tuning backend is configured")]
    NoBackend,
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid duration for `{key}`: {value} (must be within {min}..={max})")]
    OutOfRange { key: String, value: f64, min: f64, max: f64 },

    #[error("malformed INI file: {reason}")]
    MalformedIni { reason: String },

    #[error("unknown decode mode: {mode}")]
    UnknownDecodeMode { mode: String },

    #[error("include cycle detected at {path}")]
    IncludeCycle { path: String },
}

/// DSP processing errors
#[derive(Debug, Error)]
pub enum DspError {
    #[error("buffer underrun: requested {requested}, available {available}")]
    BufferUnderrun { requested: usize, available: usize },

    #[error("buffer overflow: capacity {capacity}, attempted write of {size}")]
    BufferOverflow { capacity: usize, size: usize },

    #[error("soft-metric saturation clamped {count} values")]
    MetricSaturation { count: usize },
}

/// Result type alias for dsd-core operations
pub type Result<T> = std::result::Result<T, DsdError>;
