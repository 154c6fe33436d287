//! Slicer threshold state: the five scalars that turn a soft symbol into a
//! dibit, and the invariant that guards every update to them.

use crate::errors::{Result, SyncError};

/// `min < lmid < center < umid < max` must hold after every update;
/// violating inputs are rejected and the previous thresholds are kept.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlicerThresholds {
    pub min: f32,
    pub max: f32,
    pub center: f32,
    pub lmid: f32,
    pub umid: f32,
}

impl Default for SlicerThresholds {
    fn default() -> Self {
        Self::neutral()
    }
}

impl SlicerThresholds {
    /// Neutral starting point used by `SymbolPipeline::reset`.
    pub fn neutral() -> Self {
        Self {
            min: -3.0,
            max: 3.0,
            center: 0.0,
            lmid: -1.5,
            umid: 1.5,
        }
    }

    fn derive(min: f32, max: f32) -> Self {
        let center = (min + max) / 2.0;
        Self {
            min,
            max,
            center,
            lmid: (center + min) / 2.0,
            umid: (center + max) / 2.0,
        }
    }

    fn is_valid(&self) -> bool {
        self.min < self.lmid && self.lmid < self.center && self.center < self.umid && self.umid < self.max
    }

    /// Recompute `center`/`lmid`/`umid` from a new `min`/`max` pair and
    /// apply it only if the invariant holds; otherwise leave thresholds
    /// unchanged and report why.
    pub fn update_from_extremes(&mut self, min: f32, max: f32) -> Result<()> {
        let candidate = Self::derive(min, max);
        if !candidate.is_valid() {
            return Err(SyncError::ThresholdRejected {
                reason: format!(
                    "derived thresholds violate ordering: min={} lmid={} center={} umid={} max={}",
                    candidate.min, candidate.lmid, candidate.center, candidate.umid, candidate.max
                ),
            }
            .into());
        }
        *self = candidate;
        Ok(())
    }

    /// Slice a soft symbol into the canonical two-bit dibit code
    /// (`0,1,2,3` mapping to `+1,+3,-1,-3`).
    pub fn slice(&self, symbol: f32) -> u8 {
        if symbol >= self.center {
            if symbol >= self.umid {
                1 // +3
            } else {
                0 // +1
            }
        } else if symbol < self.lmid {
            3 // -3
        } else {
            2 // -1
        }
    }

    /// Distance from the symbol to the nearest decision boundary,
    /// normalised to 0..255 (0 = on a boundary, 255 = far from any boundary).
    ///
    /// `min`/`max` are the signal's own +3/-3 extremes, not decision
    /// boundaries `slice()` tests against, so they're excluded here —
    /// including them made a symbol sitting at a confident constellation
    /// point measure distance 0 and report reliability 0.
    pub fn reliability(&self, symbol: f32) -> u8 {
        let boundaries = [self.lmid, self.center, self.umid];
        let nearest = boundaries
            .iter()
            .map(|b| (symbol - b).abs())
            .fold(f32::INFINITY, f32::min);
        let span = (self.max - self.min).max(f32::EPSILON);
        let normalised = (nearest / (span / 4.0)).clamp(0.0, 1.0);
        (normalised * 255.0).round() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_thresholds_satisfy_invariant() {
        let t = SlicerThresholds::neutral();
        assert!(t.is_valid());
    }

    #[test]
    fn valid_update_applies() {
        let mut t = SlicerThresholds::neutral();
        assert!(t.update_from_extremes(-1.8, 1.8).is_ok());
        assert!((t.max - 1.8).abs() < 1e-6);
        assert!(t.is_valid());
    }

    #[test]
    fn degenerate_update_is_rejected_and_state_preserved() {
        let mut t = SlicerThresholds::neutral();
        let before = t;
        // min == max collapses every boundary onto a point.
        assert!(t.update_from_extremes(0.0, 0.0).is_err());
        assert_eq!(t, before);
    }

    #[test]
    fn slicing_matches_boundary_table() {
        let t = SlicerThresholds::neutral();
        assert_eq!(t.slice(2.0), 1); // >= umid (1.5)
        assert_eq!(t.slice(0.5), 0); // center..umid
        assert_eq!(t.slice(-0.5), 2); // lmid..center
        assert_eq!(t.slice(-2.0), 3); // < lmid
    }

    #[test]
    fn reliability_is_zero_at_a_boundary_and_high_away_from_one() {
        let t = SlicerThresholds::neutral();
        assert_eq!(t.reliability(0.0), 0);
        assert!(t.reliability(3.0) > 200);
    }
}
