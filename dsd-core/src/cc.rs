//! Control-channel candidate set: a bounded ring of neighbor frequencies to
//! hunt across on CC loss.

use std::time::{Duration, Instant};

const CAPACITY: usize = 16;

struct Candidate {
    freq_hz: i64,
    cooldown_until: Option<Instant>,
}

/// Bounded ring of CC candidates, deduped by exact frequency. Insertion
/// past capacity evicts the oldest entry. The current CC frequency is
/// never handed back by [`next_candidate`](Self::next_candidate).
pub struct CcCandidateSet {
    candidates: Vec<Candidate>,
    cursor: usize,
}

impl Default for CcCandidateSet {
    fn default() -> Self {
        Self::new()
    }
}

impl CcCandidateSet {
    pub fn new() -> Self {
        Self { candidates: Vec::with_capacity(CAPACITY), cursor: 0 }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Insert a neighbor frequency, deduping by exact match. Evicts the
    /// oldest entry if this is the 17th distinct frequency.
    pub fn insert(&mut self, freq_hz: i64) {
        if self.candidates.iter().any(|c| c.freq_hz == freq_hz) {
            return;
        }
        if self.candidates.len() >= CAPACITY {
            self.candidates.remove(0);
            if self.cursor > 0 {
                self.cursor -= 1;
            }
        }
        self.candidates.push(Candidate { freq_hz, cooldown_until: None });
    }

    pub fn insert_many(&mut self, freqs: &[i64]) {
        for &f in freqs {
            self.insert(f);
        }
    }

    /// Put a candidate in cooldown (e.g. after a failed tune) for the
    /// given duration.
    pub fn set_cooldown(&mut self, freq_hz: i64, duration: Duration, now: Instant) {
        if let Some(c) = self.candidates.iter_mut().find(|c| c.freq_hz == freq_hz) {
            c.cooldown_until = Some(now + duration);
        }
    }

    /// Advance to and return the next candidate that is neither the
    /// current CC nor in cooldown, wrapping around the ring at most once.
    pub fn next_candidate(&mut self, current_cc_hz: i64, now: Instant) -> Option<i64> {
        if self.candidates.is_empty() {
            return None;
        }
        let n = self.candidates.len();
        for step in 0..n {
            let idx = (self.cursor + step) % n;
            let candidate = &self.candidates[idx];
            let in_cooldown = candidate.cooldown_until.is_some_and(|deadline| now < deadline);
            if candidate.freq_hz != current_cc_hz && !in_cooldown {
                self.cursor = (idx + 1) % n;
                return Some(candidate.freq_hz);
            }
        }
        None
    }

    /// Iterate every candidate frequency that is not the current CC,
    /// regardless of cooldown state.
    pub fn iter_excluding_current(&self, current_cc_hz: i64) -> impl Iterator<Item = i64> + '_ {
        self.candidates
            .iter()
            .map(|c| c.freq_hz)
            .filter(move |&f| f != current_cc_hz)
    }
}
