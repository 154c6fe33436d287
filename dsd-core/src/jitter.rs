//! Phase-2 audio jitter ring and gate: decouples the decoder's 20 ms voice
//! frame cadence from the audio sink, and enforces MAC-driven gating.

use std::time::{Duration, Instant};

const CAPACITY: usize = 3;
const FRAME_LEN: usize = 160;

pub type Frame160 = [f32; FRAME_LEN];

/// Single-producer/single-consumer bounded queue of speech frames for one
/// slot. Drop-oldest on overflow.
pub struct JitterRing {
    frames: [Frame160; CAPACITY],
    head: usize,
    tail: usize,
    count: usize,
    dropped: u64,
}

impl Default for JitterRing {
    fn default() -> Self {
        Self::new()
    }
}

impl JitterRing {
    pub fn new() -> Self {
        Self {
            frames: [[0.0; FRAME_LEN]; CAPACITY],
            head: 0,
            tail: 0,
            count: 0,
            dropped: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped
    }

    /// Push a frame, dropping the oldest queued frame if full.
    pub fn push(&mut self, frame: Frame160) {
        if self.count == CAPACITY {
            self.head = (self.head + 1) % CAPACITY;
            self.count -= 1;
            self.dropped += 1;
        }
        self.frames[self.tail] = frame;
        self.tail = (self.tail + 1) % CAPACITY;
        self.count += 1;
    }

    /// Pop the oldest frame into `out`. Returns `false` and fills `out`
    /// with zeros if the ring is empty.
    pub fn pop(&mut self, out: &mut Frame160) -> bool {
        if self.count == 0 {
            *out = [0.0; FRAME_LEN];
            return false;
        }
        *out = self.frames[self.head];
        self.head = (self.head + 1) % CAPACITY;
        self.count -= 1;
        true
    }

    pub fn reset(&mut self) {
        self.head = 0;
        self.tail = 0;
        self.count = 0;
    }
}

/// Per-slot audio gate: `audio_allowed` set by MAC_PTT, refreshed by
/// MAC_ACTIVE, cleared by MAC_END or an SM release.
#[derive(Debug, Clone, Copy)]
pub struct AudioGate {
    audio_allowed: [bool; 2],
    mac_hold_until: [Option<Instant>; 2],
}

impl Default for AudioGate {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioGate {
    pub fn new() -> Self {
        Self { audio_allowed: [false, false], mac_hold_until: [None, None] }
    }

    pub fn mac_ptt(&mut self, slot: usize, now: Instant, hold: Duration) {
        self.audio_allowed[slot] = true;
        self.mac_hold_until[slot] = Some(now + hold);
    }

    pub fn mac_active(&mut self, slot: usize, now: Instant, hold: Duration) {
        self.audio_allowed[slot] = true;
        self.mac_hold_until[slot] = Some(now + hold);
    }

    pub fn mac_end(&mut self, slot: usize) {
        self.audio_allowed[slot] = false;
        self.mac_hold_until[slot] = None;
    }

    pub fn set(&mut self, slot: usize, allowed: bool) {
        self.audio_allowed[slot] = allowed;
        if !allowed {
            self.mac_hold_until[slot] = None;
        }
    }

    /// Whether the sink may currently pop from this slot's ring: gate open,
    /// or the MAC hold has not yet expired.
    pub fn may_pop(&self, slot: usize, now: Instant) -> bool {
        self.audio_allowed[slot] || self.mac_hold_until[slot].is_some_and(|deadline| now < deadline)
    }
}

/// Owns both slots' rings and gate together, as `DecoderContext` does.
pub struct JitterRings {
    pub rings: [JitterRing; 2],
    pub gate: AudioGate,
}

impl Default for JitterRings {
    fn default() -> Self {
        Self::new()
    }
}

impl JitterRings {
    pub fn new() -> Self {
        Self { rings: [JitterRing::new(), JitterRing::new()], gate: AudioGate::new() }
    }

    pub fn reset_slot(&mut self, slot: usize) {
        self.rings[slot].reset();
    }

    pub fn reset_all(&mut self) {
        self.rings[0].reset();
        self.rings[1].reset();
        self.gate = AudioGate::new();
    }

    /// Pop a frame for `slot` only if the gate currently permits it;
    /// otherwise reset the ring so stale frames don't leak into a later
    /// call, matching the "gate interaction" policy.
    pub fn gated_pop(&mut self, slot: usize, now: Instant, out: &mut Frame160) -> bool {
        if self.gate.may_pop(slot, now) {
            self.rings[slot].pop(out)
        } else {
            self.rings[slot].reset();
            *out = [0.0; FRAME_LEN];
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_beyond_capacity_drops_oldest() {
        let mut ring = JitterRing::new();
        for i in 0..5u8 {
            let mut frame = [0.0; FRAME_LEN];
            frame[0] = i as f32;
            ring.push(frame);
        }
        assert_eq!(ring.len(), CAPACITY);
        assert_eq!(ring.dropped_count(), 2);
        let mut out = [0.0; FRAME_LEN];
        ring.pop(&mut out);
        assert_eq!(out[0], 2.0); // frames 0,1 were dropped
    }

    #[test]
    fn pop_on_empty_ring_zeros_output_and_returns_false() {
        let mut ring = JitterRing::new();
        let mut out = [1.0; FRAME_LEN];
        assert!(!ring.pop(&mut out));
        assert_eq!(out, [0.0; FRAME_LEN]);
    }

    #[test]
    fn explicit_gate_close_also_clears_mac_hold() {
        let mut gate = AudioGate::new();
        let now = Instant::now();
        gate.mac_ptt(0, now, Duration::from_millis(200));
        gate.set(0, false);
        assert!(!gate.may_pop(0, now));
    }

    #[test]
    fn mac_hold_outlives_allowed_flag_until_deadline() {
        let mut gate = AudioGate::new();
        let now = Instant::now();
        gate.mac_ptt(0, now, Duration::from_millis(200));
        gate.audio_allowed[0] = false; // simulate the allowed flag dropping without an explicit set()
        assert!(gate.may_pop(0, now));
        let later = now + Duration::from_millis(300);
        assert!(!gate.may_pop(0, later));
    }

    #[test]
    fn mac_end_closes_gate_and_clears_hold() {
        let mut gate = AudioGate::new();
        let now = Instant::now();
        gate.mac_ptt(0, now, Duration::from_millis(200));
        gate.mac_end(0);
        assert!(!gate.may_pop(0, now));
    }

    #[test]
    fn gated_pop_resets_ring_when_gate_closed() {
        let mut rings = JitterRings::new();
        rings.rings[0].push([1.0; FRAME_LEN]);
        let now = Instant::now();
        let mut out = [0.0; FRAME_LEN];
        let popped = rings.gated_pop(0, now, &mut out);
        assert!(!popped);
        assert_eq!(rings.rings[0].len(), 0);
    }
}
