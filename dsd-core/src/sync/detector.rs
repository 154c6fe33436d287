//! Frame sync detector: matches a rolling symbol window against the closed
//! pattern set and emits a typed [`SyncEvent`] at most once per frame
//! period.

use std::collections::VecDeque;

use crate::sync::patterns::{all_patterns, PatternId, SyncPattern};

const MAX_PATTERN_LEN: usize = 48; // EDACS, the longest entry
const COOLDOWN_SYMBOLS: u32 = 32; // shortest expected frame period we suppress re-fire within
const POLARITY_VOTE_WINDOW: usize = 5; // last K matches contributing to the sticky polarity
const LOSS_OF_LOCK_RELIABILITY: u8 = 64; // below this, a symbol counts toward the loss-of-lock streak
const LOSS_OF_LOCK_STREAK: u32 = 16; // consecutive low-reliability symbols before cooldown is lifted

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Normal,
    Inverted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncEvent {
    pub pattern_id: PatternId,
    pub polarity: Polarity,
    pub buffer_offset: usize,
    pub modulation_label: &'static str,
}

fn modulation_label(id: PatternId) -> &'static str {
    use PatternId::*;
    match id {
        P25P1 | P25P2 => "c4fm",
        DmrBsVoice | DmrBsData | DmrMsVoice | DmrMsData | DmrDmoTs1Data | DmrDmoTs1Voice
        | DmrDmoTs2Data | DmrDmoTs2Voice => "c4fm",
        NxdnFsw | NxdnPreambleFsw | NxdnMsData | NxdnMsVoice | NxdnBsData | NxdnBsVoice => "c4fm",
        DStar => "gmsk",
        Ysf => "c4fm",
        DpmrFs1 | DpmrFs2 | DpmrFs3 | DpmrFs4 => "fsk4",
        ProVoice | ProVoiceEa => "fsk4",
        M17Lsf | M17Str | M17Pkt | M17Brt => "c4fm",
        Edacs | EdacsDottingA | EdacsDottingB => "fsk4",
    }
}

struct PendingCooldown {
    pattern_id: PatternId,
    remaining: u32,
}

/// Rolling-window pattern matcher. Feed one symbol (dibit mapped to its
/// `+1/+3/-1/-3` value) at a time via [`push`](Self::push).
pub struct FrameSyncDetector {
    patterns: Vec<SyncPattern>,
    window: VecDeque<i8>,
    cooldowns: Vec<PendingCooldown>,
    symbols_seen: usize,
    polarity_votes: VecDeque<Polarity>,
    current_polarity: Option<Polarity>,
    low_reliability_streak: u32,
}

impl Default for FrameSyncDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSyncDetector {
    pub fn new() -> Self {
        Self {
            patterns: all_patterns(),
            window: VecDeque::with_capacity(MAX_PATTERN_LEN),
            cooldowns: Vec::new(),
            symbols_seen: 0,
            polarity_votes: VecDeque::with_capacity(POLARITY_VOTE_WINDOW),
            current_polarity: None,
            low_reliability_streak: 0,
        }
    }

    /// Drop all rolling state, as on a full retune.
    pub fn reset_mod_state(&mut self) {
        self.window.clear();
        self.cooldowns.clear();
        self.symbols_seen = 0;
        self.polarity_votes.clear();
        self.current_polarity = None;
        self.low_reliability_streak = 0;
    }

    /// Sticky polarity downstream decoders consult, updated as a majority
    /// vote over the last [`POLARITY_VOTE_WINDOW`] matches. `None` until
    /// the first match.
    pub fn current_polarity(&self) -> Option<Polarity> {
        self.current_polarity
    }

    /// Feed one symbol value and its slicer reliability (0 = on a decision
    /// boundary, 255 = far from any). Returns a sync event on a pattern
    /// match, `None` otherwise. Ties are broken by longest pattern, then by
    /// most recently matched pattern id (earlier entries in
    /// `all_patterns()` lose ties against later ones fed on the same
    /// symbol).
    ///
    /// A sustained run of low-reliability symbols (a loss of lock) lifts
    /// cooldown suppression early, so the detector can re-acquire instead
    /// of waiting out a cooldown window against a signal it's no longer
    /// tracking.
    pub fn push(&mut self, symbol: i8, reliability: u8) -> Option<SyncEvent> {
        if self.window.len() == MAX_PATTERN_LEN {
            self.window.pop_front();
        }
        self.window.push_back(symbol);
        self.symbols_seen += 1;

        if reliability < LOSS_OF_LOCK_RELIABILITY {
            self.low_reliability_streak = self.low_reliability_streak.saturating_add(1);
        } else {
            self.low_reliability_streak = 0;
        }
        let loss_of_lock = self.low_reliability_streak >= LOSS_OF_LOCK_STREAK;

        for c in self.cooldowns.iter_mut() {
            c.remaining = c.remaining.saturating_sub(1);
        }
        self.cooldowns.retain(|c| c.remaining > 0);
        if loss_of_lock {
            self.cooldowns.clear();
        }

        let mut best: Option<(SyncEvent, usize)> = None;

        for pattern in &self.patterns {
            if self.window.len() < pattern.len() {
                continue;
            }
            if self.cooldowns.iter().any(|c| c.pattern_id == pattern.id) {
                continue;
            }

            let tail: Vec<i8> = self
                .window
                .iter()
                .rev()
                .take(pattern.len())
                .rev()
                .copied()
                .collect();

            if let Some(event) = self.match_against(pattern, &tail) {
                let better = match &best {
                    None => true,
                    Some((_, len)) => pattern.len() >= *len,
                };
                if better {
                    best = Some((event, pattern.len()));
                }
            }
        }

        if let Some((event, _)) = &best {
            self.cooldowns.push(PendingCooldown {
                pattern_id: event.pattern_id,
                remaining: COOLDOWN_SYMBOLS,
            });
            self.record_polarity_vote(event.polarity);
            self.low_reliability_streak = 0;
        }

        best.map(|(event, _)| event)
    }

    fn record_polarity_vote(&mut self, polarity: Polarity) {
        if self.polarity_votes.len() == POLARITY_VOTE_WINDOW {
            self.polarity_votes.pop_front();
        }
        self.polarity_votes.push_back(polarity);

        let normal_votes = self.polarity_votes.iter().filter(|p| **p == Polarity::Normal).count();
        let inverted_votes = self.polarity_votes.len() - normal_votes;
        self.current_polarity = Some(if normal_votes >= inverted_votes {
            Polarity::Normal
        } else {
            Polarity::Inverted
        });
    }

    fn match_against(&self, pattern: &SyncPattern, tail: &[i8]) -> Option<SyncEvent> {
        let distance = hamming_like_distance(&pattern.symbols, tail);
        if distance <= pattern.tolerance as usize {
            return Some(SyncEvent {
                pattern_id: pattern.id,
                polarity: Polarity::Normal,
                buffer_offset: self.symbols_seen - pattern.len(),
                modulation_label: modulation_label(pattern.id),
            });
        }

        if let Some(inverted) = pattern.inverted_symbols() {
            let inv_distance = hamming_like_distance(&inverted, tail);
            if inv_distance <= pattern.tolerance as usize {
                return Some(SyncEvent {
                    pattern_id: pattern.id,
                    polarity: Polarity::Inverted,
                    buffer_offset: self.symbols_seen - pattern.len(),
                    modulation_label: modulation_label(pattern.id),
                });
            }
        }

        None
    }
}

fn hamming_like_distance(a: &[i8], b: &[i8]) -> usize {
    a.iter().zip(b.iter()).filter(|(x, y)| x != y).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_on_known_pattern_emits_event() {
        let mut det = FrameSyncDetector::new();
        let pattern = all_patterns()
            .into_iter()
            .find(|p| p.id == PatternId::P25P1)
            .unwrap();

        let mut last = None;
        for &sym in &pattern.symbols {
            last = det.push(sym, 255);
        }
        let event = last.expect("expected a sync event on the final symbol");
        assert_eq!(event.pattern_id, PatternId::P25P1);
        assert_eq!(event.polarity, Polarity::Normal);
    }

    #[test]
    fn inverted_pattern_is_detected_with_inverted_polarity() {
        let mut det = FrameSyncDetector::new();
        let pattern = all_patterns()
            .into_iter()
            .find(|p| p.id == PatternId::P25P1)
            .unwrap();

        let mut last = None;
        for &sym in &pattern.symbols {
            last = det.push(-sym, 255);
        }
        let event = last.expect("expected a sync event on the inverted sequence");
        assert_eq!(event.polarity, Polarity::Inverted);
    }

    #[test]
    fn fixed_polarity_dmr_pattern_has_no_inverted_match() {
        let mut det = FrameSyncDetector::new();
        let pattern = all_patterns()
            .into_iter()
            .find(|p| p.id == PatternId::DmrBsVoice)
            .unwrap();

        let mut last = None;
        for &sym in &pattern.symbols {
            last = det.push(-sym, 255);
        }
        assert!(last.is_none());
    }

    #[test]
    fn match_suppressed_within_cooldown() {
        let mut det = FrameSyncDetector::new();
        let pattern = all_patterns()
            .into_iter()
            .find(|p| p.id == PatternId::NxdnFsw)
            .unwrap();

        let mut first_event = None;
        for &sym in &pattern.symbols {
            first_event = det.push(sym, 255);
        }
        assert!(first_event.is_some());

        // Feed the same pattern again immediately; cooldown should suppress it.
        let mut second_event = None;
        for &sym in &pattern.symbols {
            second_event = det.push(sym, 255);
        }
        assert!(second_event.is_none());
    }

    #[test]
    fn reset_clears_cooldowns_and_window() {
        let mut det = FrameSyncDetector::new();
        let pattern = all_patterns()
            .into_iter()
            .find(|p| p.id == PatternId::NxdnFsw)
            .unwrap();
        for &sym in &pattern.symbols {
            det.push(sym, 255);
        }
        det.reset_mod_state();
        assert!(det.window.is_empty());
        assert!(det.cooldowns.is_empty());

        let mut last = None;
        for &sym in &pattern.symbols {
            last = det.push(sym, 255);
        }
        assert!(last.is_some());
    }

    #[test]
    fn polarity_vote_tracks_majority_of_recent_matches() {
        let mut det = FrameSyncDetector::new();
        let pattern = all_patterns()
            .into_iter()
            .find(|p| p.id == PatternId::P25P1)
            .unwrap();
        assert_eq!(det.current_polarity(), None);

        for &sym in &pattern.symbols {
            det.push(sym, 255);
        }
        assert_eq!(det.current_polarity(), Some(Polarity::Normal));

        det.reset_mod_state();
        for &sym in &pattern.symbols {
            det.push(-sym, 255);
        }
        assert_eq!(det.current_polarity(), Some(Polarity::Inverted));
    }

    #[test]
    fn loss_of_lock_lifts_cooldown_suppression() {
        let mut det = FrameSyncDetector::new();
        let pattern = all_patterns()
            .into_iter()
            .find(|p| p.id == PatternId::NxdnFsw)
            .unwrap();

        let mut first_event = None;
        for &sym in &pattern.symbols {
            first_event = det.push(sym, 255);
        }
        assert!(first_event.is_some());

        // A sustained run of low-reliability symbols signals loss of lock
        // and should lift the cooldown before it would naturally expire.
        for _ in 0..LOSS_OF_LOCK_STREAK {
            det.push(0, 0);
        }

        let mut second_event = None;
        for &sym in &pattern.symbols {
            second_event = det.push(sym, 255);
        }
        assert!(second_event.is_some(), "loss of lock should have lifted the cooldown early");
    }
}
