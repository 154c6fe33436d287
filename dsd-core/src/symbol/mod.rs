//! Symbol pipeline: soft-symbol ingestion, adaptive slicer thresholds, and
//! sync-driven recalibration.

pub mod pipeline;
pub mod slicer;

pub use pipeline::{Emitted, SymbolPipeline};
pub use slicer::SlicerThresholds;
