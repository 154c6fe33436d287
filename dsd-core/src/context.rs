//! `DecoderContext`: the single process-wide owner of all mutable decoder
//! state. Created at startup and torn down at shutdown; the control-plane
//! sockets and watchdog thread hold shared references into it rather than
//! each subsystem owning its own copy of shared state.

use crate::cc::CcCandidateSet;
use crate::config::{TrunkConfig, TuningConfig};
use crate::iden::IdenTable;
use crate::jitter::JitterRings;
use crate::logging::SignalLogger;
use crate::protocol::ProtocolDispatcher;
use crate::sync::FrameSyncDetector;
use crate::symbol::SymbolPipeline;
use crate::trunk_sm::policy::Policy;
use crate::trunk_sm::TrunkSm;

/// Owns every piece of mutable decoder state named in the data model:
/// symbol pipeline (and its slicer thresholds), frame sync history, IDEN
/// table, Trunk-SM, CC candidates, and jitter rings.
pub struct DecoderContext {
    pub symbol_pipeline: SymbolPipeline,
    pub sync_detector: FrameSyncDetector,
    pub protocol_dispatcher: ProtocolDispatcher,
    pub iden_table: IdenTable,
    pub cc_candidates: CcCandidateSet,
    pub trunk_sm: TrunkSm,
    pub jitter_rings: JitterRings,
    pub tuning_config: TuningConfig,
    pub logger: SignalLogger,
}

impl DecoderContext {
    pub fn new(trunk_config: TrunkConfig, policy: Policy, tuning_config: TuningConfig, current_cc_hz: i64) -> Self {
        Self {
            symbol_pipeline: SymbolPipeline::new(),
            sync_detector: FrameSyncDetector::new(),
            protocol_dispatcher: ProtocolDispatcher::new(),
            iden_table: IdenTable::new(),
            cc_candidates: CcCandidateSet::new(),
            trunk_sm: TrunkSm::new(trunk_config, policy, current_cc_hz),
            jitter_rings: JitterRings::new(),
            tuning_config,
            logger: SignalLogger::default(),
        }
    }

    /// Atomic tune-to-new-system reset: IDEN table, sync detector history,
    /// Phase-2 frame state, and jitter rings all reset together so no stale
    /// cross-system state survives a site change. Trunk-SM and CC
    /// candidates are intentionally left untouched here; callers drive
    /// those separately via their own lifecycle events (a site change isn't
    /// itself a Trunk-SM event).
    pub fn retune_to_new_system(&mut self) {
        self.iden_table.clear();
        self.sync_detector.reset_mod_state();
        self.symbol_pipeline.reset();
        self.jitter_rings.reset_all();
        self.logger.info("TRUNK", "retuned to new system: IDEN/sync/jitter state cleared");
    }
}
