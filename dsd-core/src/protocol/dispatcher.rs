//! Routes a [`SyncEvent`] to the per-protocol decoder registered for its
//! pattern, producing zero or more [`ProtocolEvent`]s.
//!
//! The decoders themselves (P25 MAC/PDU/LCW parsing and friends) are
//! external collaborators per the data model; this module only owns the
//! routing table and the trait boundary they implement against.

use crate::bits::Bits;
use crate::sync::{PatternId, SyncEvent};

use super::events::ProtocolEvent;

/// A per-protocol frame decoder. One instance typically handles a family of
/// related patterns (e.g. all four DMR BS/MS data/voice variants).
pub trait ProtocolDecoder {
    fn name(&self) -> &'static str;
    fn accepts(&self, pattern_id: PatternId) -> bool;

    /// Decode one matched frame's payload bits into protocol events. Called
    /// once per [`SyncEvent`] whose pattern this decoder accepts.
    fn decode(&mut self, event: &SyncEvent, frame_bits: &Bits) -> Vec<ProtocolEvent>;
}

/// Catch-all decoder for patterns with no registered handler: emits nothing,
/// so an unrouted sync event is silently dropped rather than panicking.
/// Mirrors the "never default to crashing when unset" capability-trait
/// convention used for tuning hooks.
pub struct NullProtocolDecoder;

impl ProtocolDecoder for NullProtocolDecoder {
    fn name(&self) -> &'static str {
        "null"
    }

    fn accepts(&self, _pattern_id: PatternId) -> bool {
        true
    }

    fn decode(&mut self, _event: &SyncEvent, _frame_bits: &Bits) -> Vec<ProtocolEvent> {
        Vec::new()
    }
}

pub struct ProtocolDispatcher {
    decoders: Vec<Box<dyn ProtocolDecoder>>,
    fallback: NullProtocolDecoder,
}

impl Default for ProtocolDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ProtocolDispatcher {
    pub fn new() -> Self {
        Self { decoders: Vec::new(), fallback: NullProtocolDecoder }
    }

    pub fn register(&mut self, decoder: Box<dyn ProtocolDecoder>) {
        self.decoders.push(decoder);
    }

    /// Route `event` to the first registered decoder that accepts its
    /// pattern, falling through to the null decoder (and a debug log line)
    /// if none do.
    pub fn dispatch(&mut self, event: &SyncEvent, frame_bits: &Bits) -> Vec<ProtocolEvent> {
        for decoder in self.decoders.iter_mut() {
            if decoder.accepts(event.pattern_id) {
                return decoder.decode(event, frame_bits);
            }
        }
        log::debug!("no protocol decoder registered for {:?}, dropping frame", event.pattern_id);
        self.fallback.decode(event, frame_bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::Polarity;

    struct CountingDecoder {
        pattern: PatternId,
        calls: u32,
    }

    impl ProtocolDecoder for CountingDecoder {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn accepts(&self, pattern_id: PatternId) -> bool {
            pattern_id == self.pattern
        }

        fn decode(&mut self, _event: &SyncEvent, _frame_bits: &Bits) -> Vec<ProtocolEvent> {
            self.calls += 1;
            vec![ProtocolEvent::Ptt { slot: 0 }]
        }
    }

    fn event(pattern_id: PatternId) -> SyncEvent {
        SyncEvent { pattern_id, polarity: Polarity::Normal, buffer_offset: 0, modulation_label: "c4fm" }
    }

    #[test]
    fn routes_to_matching_decoder() {
        let mut dispatcher = ProtocolDispatcher::new();
        dispatcher.register(Box::new(CountingDecoder { pattern: PatternId::P25P1, calls: 0 }));
        let events = dispatcher.dispatch(&event(PatternId::P25P1), &Bits::new());
        assert_eq!(events, vec![ProtocolEvent::Ptt { slot: 0 }]);
    }

    #[test]
    fn unrouted_pattern_falls_through_to_null_decoder() {
        let mut dispatcher = ProtocolDispatcher::new();
        dispatcher.register(Box::new(CountingDecoder { pattern: PatternId::P25P1, calls: 0 }));
        let events = dispatcher.dispatch(&event(PatternId::DmrBsVoice), &Bits::new());
        assert!(events.is_empty());
    }
}
