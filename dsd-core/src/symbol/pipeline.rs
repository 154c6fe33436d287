//! Soft-symbol to dibit pipeline: adaptive slicer thresholds, a bounded
//! history of raw samples for sync-driven recalibration, and a small queue
//! of emitted dibits decoupling the demod producer from the protocol
//! consumer.

use std::collections::VecDeque;

use crate::logging::SignalLogger;
use crate::symbol::slicer::SlicerThresholds;

const SAMPLE_HISTORY_LEN: usize = 2048; // power of two
const EMIT_HISTORY_LEN: usize = 256; // last N emitted dibits, for re-digitization
const PERCENTILE_WINDOW: usize = 512;

/// One emitted dibit plus its soft-decision context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Emitted {
    pub dibit: u8,
    pub reliability: u8,
    pub symbol: f32,
}

/// Converts a stream of raw soft symbols into dibits, adapting slicer
/// thresholds from the running signal and re-deriving them whenever the
/// frame sync detector hands back a confirmed pattern window.
pub struct SymbolPipeline {
    thresholds: SlicerThresholds,
    raw_history: VecDeque<f32>,
    emit_history: VecDeque<Emitted>,
    pending: VecDeque<Emitted>,
    frozen: bool,
}

impl Default for SymbolPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolPipeline {
    pub fn new() -> Self {
        Self {
            thresholds: SlicerThresholds::neutral(),
            raw_history: VecDeque::with_capacity(SAMPLE_HISTORY_LEN),
            emit_history: VecDeque::with_capacity(EMIT_HISTORY_LEN),
            pending: VecDeque::new(),
            frozen: false,
        }
    }

    /// Reset all adaptive state back to a neutral starting point, as done
    /// on a full retune.
    pub fn reset(&mut self) {
        self.thresholds = SlicerThresholds::neutral();
        self.raw_history.clear();
        self.emit_history.clear();
        self.pending.clear();
        self.frozen = false;
    }

    pub fn thresholds(&self) -> SlicerThresholds {
        self.thresholds
    }

    /// Stop percentile-based threshold adaptation (e.g. the channel has
    /// gone off-air and the signal is noise).
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn unfreeze(&mut self) {
        self.frozen = false;
    }

    /// Feed one raw soft symbol, slicing it with the current thresholds and
    /// queuing the result. Also performs periodic percentile-based
    /// threshold adaptation when unfrozen.
    pub fn ingest(&mut self, symbol: f32, log: &mut SignalLogger) {
        if self.raw_history.len() == SAMPLE_HISTORY_LEN {
            self.raw_history.pop_front();
        }
        self.raw_history.push_back(symbol);

        let dibit = self.thresholds.slice(symbol);
        let reliability = self.thresholds.reliability(symbol);
        let emitted = Emitted { dibit, reliability, symbol };

        if self.emit_history.len() == EMIT_HISTORY_LEN {
            self.emit_history.pop_front();
        }
        self.emit_history.push_back(emitted);
        self.pending.push_back(emitted);

        if !self.frozen && self.raw_history.len() >= PERCENTILE_WINDOW && self.raw_history.len() % PERCENTILE_WINDOW == 0 {
            self.adapt_from_percentiles(log);
        }
    }

    /// Pop the next queued dibit, if any. `None` means nothing is currently
    /// buffered, not that the stream has ended.
    pub fn next_dibit(&mut self) -> Option<u8> {
        self.pending.pop_front().map(|e| e.dibit)
    }

    /// Pop the next queued emission with its reliability/soft context.
    pub fn next_dibit_soft(&mut self) -> Option<Emitted> {
        self.pending.pop_front()
    }

    /// 16-bit soft branch metric for the given dibit's top bit: `0x0000` is
    /// confident-0, `0xFFFF` confident-1, `0x7FFF` undecided.
    pub fn soft_cost(&self, emitted: Emitted, bit_index: u8) -> u16 {
        let bit = if bit_index == 0 {
            (emitted.dibit >> 1) & 1
        } else {
            emitted.dibit & 1
        };
        let offset = (emitted.reliability as u32 * 0x8000) / 255;
        if bit == 1 {
            (0x7FFF_u32 + offset).min(0xFFFF) as u16
        } else {
            (0x7FFF_u32).saturating_sub(offset) as u16
        }
    }

    fn adapt_from_percentiles(&mut self, log: &mut SignalLogger) {
        let mut window: Vec<f32> = self.raw_history.iter().copied().collect();
        window.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let lo_idx = window.len() / 10;
        let hi_idx = (window.len() * 9) / 10;
        let lo = window[lo_idx.min(window.len() - 1)];
        let hi = window[hi_idx.min(window.len() - 1)];
        if let Err(e) = self.thresholds.update_from_extremes(lo, hi) {
            log.warn("symbol", &format!("percentile threshold update rejected: {e}"));
        }
    }

    /// Re-derive thresholds from a confirmed sync pattern's known symbol
    /// polarities (the `+3`/`-3` extremes of the pattern), then re-slice
    /// the buffered prefix so CACH and burst-prefix dibits reflect the
    /// corrected thresholds. `pattern_symbols` pairs each known pattern
    /// dibit with the raw soft symbol observed at that position.
    ///
    /// Leaves thresholds untouched and returns `false` if the extracted
    /// extremes straddle the current center (a bad extraction), rather
    /// than propagating an error up through the sync detector.
    pub fn recalibrate_from_sync(&mut self, pattern_symbols: &[(u8, f32)], log: &mut SignalLogger) -> bool {
        let highs: Vec<f32> = pattern_symbols
            .iter()
            .filter(|(d, _)| *d == 1)
            .map(|(_, s)| *s)
            .collect();
        let lows: Vec<f32> = pattern_symbols
            .iter()
            .filter(|(d, _)| *d == 3)
            .map(|(_, s)| *s)
            .collect();
        if highs.is_empty() || lows.is_empty() {
            log.warn("symbol", "sync recalibration skipped: pattern lacks both +3 and -3 symbols");
            return false;
        }
        let max = highs.iter().sum::<f32>() / highs.len() as f32;
        let min = lows.iter().sum::<f32>() / lows.len() as f32;
        if min >= max {
            log.warn("symbol", "sync recalibration skipped: extracted extremes are inverted");
            return false;
        }
        match self.thresholds.update_from_extremes(min, max) {
            Ok(()) => {
                self.redigitize_prefix();
                true
            }
            Err(e) => {
                log.warn("symbol", &format!("sync recalibration rejected: {e}"));
                false
            }
        }
    }

    fn redigitize_prefix(&mut self) {
        for emitted in self.emit_history.iter_mut() {
            emitted.dibit = self.thresholds.slice(emitted.symbol);
            emitted.reliability = self.thresholds.reliability(emitted.symbol);
        }
    }

    pub fn recent_history(&self) -> impl Iterator<Item = &Emitted> {
        self.emit_history.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogConfig;

    fn logger() -> SignalLogger {
        SignalLogger::new(LogConfig::disabled())
    }

    #[test]
    fn ingest_then_pop_preserves_order() {
        let mut p = SymbolPipeline::new();
        let mut log = logger();
        p.ingest(2.0, &mut log);
        p.ingest(-2.0, &mut log);
        assert_eq!(p.next_dibit(), Some(1));
        assert_eq!(p.next_dibit(), Some(3));
        assert_eq!(p.next_dibit(), None);
    }

    #[test]
    fn reset_clears_all_state() {
        let mut p = SymbolPipeline::new();
        let mut log = logger();
        for _ in 0..10 {
            p.ingest(1.0, &mut log);
        }
        p.reset();
        assert_eq!(p.thresholds(), SlicerThresholds::neutral());
        assert!(p.next_dibit().is_none());
        assert_eq!(p.recent_history().count(), 0);
    }

    #[test]
    fn percentile_adaptation_tracks_wider_signal() {
        let mut p = SymbolPipeline::new();
        let mut log = logger();
        for i in 0..PERCENTILE_WINDOW {
            let v = if i % 2 == 0 { 5.0 } else { -5.0 };
            p.ingest(v, &mut log);
        }
        assert!(p.thresholds().max > 3.0);
        assert!(p.thresholds().min < -3.0);
    }

    #[test]
    fn sync_recalibration_rejects_degenerate_pattern() {
        let mut p = SymbolPipeline::new();
        let mut log = logger();
        let before = p.thresholds();
        let ok = p.recalibrate_from_sync(&[(1, 1.0), (1, 1.1)], &mut log);
        assert!(!ok);
        assert_eq!(p.thresholds(), before);
    }

    #[test]
    fn sync_recalibration_applies_and_redigitizes_history() {
        let mut p = SymbolPipeline::new();
        let mut log = logger();
        p.ingest(1.8, &mut log); // would slice as +1 under neutral thresholds
        let ok = p.recalibrate_from_sync(&[(1, 4.0), (1, 4.2), (3, -4.0), (3, -4.1)], &mut log);
        assert!(ok);
        let history: Vec<_> = p.recent_history().collect();
        // thresholds widened, so 1.8 now falls inside the +1 band, not +3
        assert_eq!(history[0].dibit, 0);
    }

    #[test]
    fn soft_cost_is_monotone_in_reliability() {
        let p = SymbolPipeline::new();
        let low_conf = Emitted { dibit: 0, reliability: 10, symbol: 0.1 };
        let high_conf = Emitted { dibit: 0, reliability: 250, symbol: 2.9 };
        assert!(p.soft_cost(high_conf, 0) >= p.soft_cost(low_conf, 0));
    }
}
