//! Frame sync detector: pattern table and rolling-window matcher.

pub mod detector;
pub mod patterns;

pub use detector::{FrameSyncDetector, Polarity, SyncEvent};
pub use patterns::{PatternId, SyncPattern};
