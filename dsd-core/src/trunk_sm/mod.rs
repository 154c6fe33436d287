//! Trunk-SM: the voice-channel follow lifecycle state machine.
//!
//! Owns the transition between control-channel monitoring and voice-channel
//! following: grant ingestion, tune dispatch, per-slot voice gating,
//! hang/grace/dwell timers, return-to-CC, and CC hunting.

pub mod policy;
pub mod tags;

use std::time::{Duration, Instant};

use crate::cc::CcCandidateSet;
use crate::config::TrunkConfig;
use crate::grant::{GrantEvent, SlotHint};
use crate::iden::IdenTable;

use self::policy::{Policy, PolicyVerdict};
use self::tags::TagRing;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Armed,
    FollowingVC,
    Hang,
    /// Transient: a release is in flight. Never persisted between calls to
    /// `handle` — observed only via the tag ring.
    ReturnCC,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Grant(GrantEvent),
    VoicePtt(u8),
    VoiceActive(u8),
    VoiceEnd(u8),
    VoiceIdle(u8),
    NoSync,
    CcLost,
    Tick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    TuneVc { freq_hz: i64, slot_hint: SlotHint },
    TuneCc { freq_hz: i64 },
    Release,
    SetAudioGate { slot: u8, allowed: bool },
}

/// All the state Trunk-SM needs besides the mutable decoder-context
/// collaborators passed into [`TrunkSm::handle`].
pub struct TrunkSm {
    state: State,
    vc_freq_hz: Option<i64>,
    vc_channel_id: Option<u16>,
    vc_slot_hint: SlotHint,
    slot_active: [bool; 2],
    t_last_tune: Option<Instant>,
    t_last_voice: Option<Instant>,
    t_follow_start: Option<Instant>,
    t_hang_start: Option<Instant>,
    t_last_return: Option<Instant>,
    last_return_freq: Option<i64>,
    last_cc_sync_time: Option<Instant>,
    current_cc_hz: i64,
    config: TrunkConfig,
    policy: Policy,
    tags: TagRing,
}

impl TrunkSm {
    pub fn new(config: TrunkConfig, policy: Policy, current_cc_hz: i64) -> Self {
        Self {
            state: State::Idle,
            vc_freq_hz: None,
            vc_channel_id: None,
            vc_slot_hint: SlotHint::None,
            slot_active: [false, false],
            t_last_tune: None,
            t_last_voice: None,
            t_follow_start: None,
            t_hang_start: None,
            t_last_return: None,
            last_return_freq: None,
            last_cc_sync_time: None,
            current_cc_hz,
            config,
            policy,
            tags: TagRing::new(),
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn tags(&self) -> &TagRing {
        &self.tags
    }

    pub fn note_cc_sync(&mut self, now: Instant, current_cc_hz: i64) {
        self.last_cc_sync_time = Some(now);
        self.current_cc_hz = current_cc_hz;
    }

    fn backoff_active(&self, freq_hz: i64, now: Instant) -> bool {
        match (self.last_return_freq, self.t_last_return) {
            (Some(f), Some(t)) if f == freq_hz => {
                now.duration_since(t) < Duration::from_secs_f64(self.config.retune_backoff_s.get())
            }
            _ => false,
        }
    }

    fn both_slots_inactive(&self) -> bool {
        !self.slot_active[0] && !self.slot_active[1]
    }

    /// Transition into `Hang`/`Idle` via `release()`: record the return
    /// frequency, clear per-slot state, and emit the release + gate-clear
    /// + return-to-CC actions.
    fn release(&mut self, now: Instant) -> Vec<Action> {
        self.last_return_freq = self.vc_freq_hz;
        self.t_last_return = Some(now);
        self.slot_active = [false, false];
        self.vc_freq_hz = None;
        self.vc_channel_id = None;
        self.state = State::Idle;
        self.tags.push("release: returning to CC");
        vec![
            Action::SetAudioGate { slot: 0, allowed: false },
            Action::SetAudioGate { slot: 1, allowed: false },
            Action::Release,
            Action::TuneCc { freq_hz: self.current_cc_hz },
        ]
    }

    /// Called by the caller's tuning control plane when a `tune_vc`/`tune_cc`
    /// action failed. Transitions immediately to `Idle` and puts the target
    /// frequency in CC cooldown for `2 * retune_backoff_s`.
    pub fn handle_tune_failure(&mut self, freq_hz: i64, cc_candidates: &mut CcCandidateSet, now: Instant) {
        self.state = State::Idle;
        self.slot_active = [false, false];
        self.vc_freq_hz = None;
        self.vc_channel_id = None;
        self.tags.push(format!("tune failed for {freq_hz} Hz, cooling down"));
        let cooldown = Duration::from_secs_f64(self.config.retune_backoff_s.get() * 2.0);
        cc_candidates.set_cooldown(freq_hz, cooldown, now);
    }

    pub fn handle(
        &mut self,
        event: Event,
        iden_table: &IdenTable,
        cc_candidates: &mut CcCandidateSet,
        now: Instant,
    ) -> Vec<Action> {
        if matches!(event, Event::CcLost) {
            return self.handle_cc_lost(cc_candidates, now);
        }

        match self.state {
            State::Idle => self.handle_idle(event, iden_table, now),
            State::Armed => self.handle_armed(event, now),
            State::FollowingVC => self.handle_following(event, now),
            State::Hang => self.handle_hang(event, now),
            State::ReturnCC => Vec::new(),
        }
    }

    fn handle_cc_lost(&mut self, cc_candidates: &mut CcCandidateSet, now: Instant) -> Vec<Action> {
        let elapsed = self
            .last_cc_sync_time
            .map(|t| now.duration_since(t))
            .unwrap_or(Duration::MAX);
        let threshold = Duration::from_secs_f64(
            self.config.hangtime_s.get() + self.config.vc_grace_s.get(),
        );
        if elapsed < threshold {
            return Vec::new();
        }
        match cc_candidates.next_candidate(self.current_cc_hz, now) {
            Some(freq_hz) => {
                self.tags.push(format!("cc lost, hunting to {freq_hz} Hz"));
                vec![Action::TuneCc { freq_hz }]
            }
            None => {
                self.tags.push("cc lost, no candidates available");
                Vec::new()
            }
        }
    }

    fn handle_idle(&mut self, event: Event, iden_table: &IdenTable, now: Instant) -> Vec<Action> {
        let Event::Grant(grant) = event else {
            return Vec::new();
        };

        let freq_hz = match iden_table.resolve_channel_id(grant.channel_id) {
            Ok(f) => f,
            Err(_) => {
                self.tags.push("grant dropped: unresolved IDEN");
                return Vec::new();
            }
        };

        if self.backoff_active(freq_hz, now) {
            self.tags.push(format!("grant ignored: backoff active for {freq_hz} Hz"));
            return Vec::new();
        }

        match self.policy.evaluate(&grant, iden_table) {
            PolicyVerdict::Allow => {}
            verdict => {
                self.tags.push(format!("grant rejected by policy: {verdict:?}"));
                return Vec::new();
            }
        }

        self.vc_freq_hz = Some(freq_hz);
        self.vc_channel_id = Some(grant.channel_id);
        self.vc_slot_hint = grant.slot_hint;
        self.slot_active = [false, false];
        self.t_last_tune = Some(now);
        self.state = State::Armed;
        self.tags.push(format!("armed: tuning to {freq_hz} Hz"));
        vec![Action::TuneVc { freq_hz, slot_hint: grant.slot_hint }]
    }

    fn handle_armed(&mut self, event: Event, now: Instant) -> Vec<Action> {
        match event {
            Event::VoicePtt(slot) | Event::VoiceActive(slot) => {
                self.slot_active[slot as usize] = true;
                self.t_follow_start = Some(now);
                self.t_last_voice = Some(now);
                self.state = State::FollowingVC;
                vec![Action::SetAudioGate { slot, allowed: true }]
            }
            Event::NoSync => {
                let Some(t_last_tune) = self.t_last_tune else { return Vec::new() };
                if now.duration_since(t_last_tune) >= Duration::from_secs_f64(self.config.vc_grace_s.get()) {
                    self.state = State::Hang;
                    self.t_hang_start = Some(now);
                    self.tags.push("armed -> hang: nosync past grace period");
                }
                Vec::new()
            }
            Event::Tick => {
                let Some(t_last_tune) = self.t_last_tune else { return Vec::new() };
                let timed_out = now.duration_since(t_last_tune)
                    >= Duration::from_secs_f64(self.config.grant_voice_timeout_s.get());
                if timed_out && self.both_slots_inactive() {
                    self.release(now)
                } else {
                    Vec::new()
                }
            }
            _ => Vec::new(),
        }
    }

    fn handle_following(&mut self, event: Event, now: Instant) -> Vec<Action> {
        match event {
            Event::VoicePtt(slot) | Event::VoiceActive(slot) => {
                self.slot_active[slot as usize] = true;
                self.t_last_voice = Some(now);
                vec![Action::SetAudioGate { slot, allowed: true }]
            }
            Event::VoiceEnd(slot) | Event::VoiceIdle(slot) => {
                self.slot_active[slot as usize] = false;
                if self.both_slots_inactive() {
                    self.state = State::Hang;
                    self.t_hang_start = Some(now);
                    vec![
                        Action::SetAudioGate { slot: 0, allowed: false },
                        Action::SetAudioGate { slot: 1, allowed: false },
                    ]
                } else {
                    Vec::new()
                }
            }
            Event::Tick => {
                let (Some(t_last_tune), Some(t_last_voice), Some(t_follow_start)) =
                    (self.t_last_tune, self.t_last_voice, self.t_follow_start)
                else {
                    return Vec::new();
                };
                let grace_elapsed = now.duration_since(t_last_tune)
                    >= Duration::from_secs_f64(self.config.vc_grace_s.get());
                let hang_elapsed = now.duration_since(t_last_voice)
                    >= Duration::from_secs_f64(self.config.hangtime_s.get());
                let dwell_elapsed = now.duration_since(t_follow_start)
                    >= Duration::from_secs_f64(self.config.min_follow_dwell_s.get());
                if grace_elapsed && hang_elapsed && dwell_elapsed && self.both_slots_inactive() {
                    self.release(now)
                } else {
                    Vec::new()
                }
            }
            _ => Vec::new(),
        }
    }

    fn handle_hang(&mut self, event: Event, now: Instant) -> Vec<Action> {
        match event {
            Event::VoicePtt(slot) | Event::VoiceActive(slot) => {
                self.slot_active[slot as usize] = true;
                self.t_last_voice = Some(now);
                self.state = State::FollowingVC;
                vec![Action::SetAudioGate { slot, allowed: true }]
            }
            Event::Tick => {
                let Some(t_hang_start) = self.t_hang_start else { return Vec::new() };
                if now.duration_since(t_hang_start) >= Duration::from_secs_f64(self.config.hangtime_s.get()) {
                    self.release(now)
                } else {
                    Vec::new()
                }
            }
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iden::{IdenEntry, OffsetSign, Trust};

    fn trusted_table() -> IdenTable {
        let mut table = IdenTable::new();
        table.insert(IdenEntry {
            iden: 0,
            iden_type: 0,
            tdma_flag: false,
            base_freq_units: 170_203_000 / 5_000,
            channel_spacing_units: 1,
            offset_sign: OffsetSign::Positive,
            offset_mag_units: 0,
            trust: Trust::Confirmed,
        });
        table
    }

    fn grant() -> GrantEvent {
        GrantEvent {
            channel_id: 5,
            svc_flags: 0,
            target_id: 100,
            source_id: 1,
            slot_hint: SlotHint::Slot0,
        }
    }

    #[test]
    fn grant_in_idle_arms_and_tunes() {
        let mut sm = TrunkSm::new(TrunkConfig::default(), Policy::default(), 851_012_500);
        let table = trusted_table();
        let mut cc = CcCandidateSet::new();
        let now = Instant::now();
        let actions = sm.handle(Event::Grant(grant()), &table, &mut cc, now);
        assert_eq!(sm.state(), State::Armed);
        assert!(matches!(actions[0], Action::TuneVc { .. }));
    }

    #[test]
    fn grant_with_no_voice_times_out_to_idle() {
        let mut config = TrunkConfig::default();
        config.grant_voice_timeout_s.set(4.0, "grant_voice_timeout_s").unwrap();
        let mut sm = TrunkSm::new(config, Policy::default(), 851_012_500);
        let table = trusted_table();
        let mut cc = CcCandidateSet::new();
        let t0 = Instant::now();
        sm.handle(Event::Grant(grant()), &table, &mut cc, t0);
        assert_eq!(sm.state(), State::Armed);

        let t1 = t0 + Duration::from_secs(5);
        let actions = sm.handle(Event::Tick, &table, &mut cc, t1);
        assert_eq!(sm.state(), State::Idle);
        assert!(actions.iter().any(|a| matches!(a, Action::Release)));
    }

    #[test]
    fn normal_call_then_hang_then_idle() {
        let mut config = TrunkConfig::default();
        config.hangtime_s.set(1.0, "hangtime_s").unwrap();
        config.min_follow_dwell_s.set(0.1, "min_follow_dwell_s").unwrap();
        config.vc_grace_s.set(0.1, "vc_grace_s").unwrap();
        let mut sm = TrunkSm::new(config, Policy::default(), 851_012_500);
        let table = trusted_table();
        let mut cc = CcCandidateSet::new();
        let t0 = Instant::now();

        sm.handle(Event::Grant(grant()), &table, &mut cc, t0);
        let t1 = t0 + Duration::from_millis(200);
        sm.handle(Event::VoicePtt(0), &table, &mut cc, t1);
        assert_eq!(sm.state(), State::FollowingVC);

        let t2 = t1 + Duration::from_millis(200);
        sm.handle(Event::VoiceEnd(0), &table, &mut cc, t2);
        assert_eq!(sm.state(), State::Hang);

        let t3 = t2 + Duration::from_secs(2);
        let actions = sm.handle(Event::Tick, &table, &mut cc, t3);
        assert_eq!(sm.state(), State::Idle);
        assert!(actions.iter().any(|a| matches!(a, Action::Release)));
    }

    #[test]
    fn backoff_blocks_regrant_to_last_return_freq() {
        let mut config = TrunkConfig::default();
        config.grant_voice_timeout_s.set(0.01, "grant_voice_timeout_s").unwrap();
        config.retune_backoff_s.set(5.0, "retune_backoff_s").unwrap();
        let mut sm = TrunkSm::new(config, Policy::default(), 851_012_500);
        let table = trusted_table();
        let mut cc = CcCandidateSet::new();
        let t0 = Instant::now();
        sm.handle(Event::Grant(grant()), &table, &mut cc, t0);
        let t1 = t0 + Duration::from_millis(50);
        sm.handle(Event::Tick, &table, &mut cc, t1);
        assert_eq!(sm.state(), State::Idle);

        let t2 = t1 + Duration::from_millis(10);
        let actions = sm.handle(Event::Grant(grant()), &table, &mut cc, t2);
        assert_eq!(sm.state(), State::Idle);
        assert!(actions.is_empty());
    }

    #[test]
    fn cc_lost_hunts_to_next_candidate() {
        let mut sm = TrunkSm::new(TrunkConfig::default(), Policy::default(), 851_012_500);
        let table = trusted_table();
        let mut cc = CcCandidateSet::new();
        cc.insert(851_012_500);
        cc.insert(851_025_000);
        let t0 = Instant::now();
        sm.note_cc_sync(t0, 851_012_500);
        let t1 = t0 + Duration::from_secs(8);
        let actions = sm.handle(Event::CcLost, &table, &mut cc, t1);
        assert_eq!(actions, vec![Action::TuneCc { freq_hz: 851_025_000 }]);
    }

    #[test]
    fn data_call_without_toggle_is_rejected() {
        let mut sm = TrunkSm::new(TrunkConfig::default(), Policy::default(), 851_012_500);
        let table = trusted_table();
        let mut cc = CcCandidateSet::new();
        let mut g = grant();
        g.svc_flags = crate::grant::SVC_FLAG_DATA;
        let actions = sm.handle(Event::Grant(g), &table, &mut cc, Instant::now());
        assert_eq!(sm.state(), State::Idle);
        assert!(actions.is_empty());
    }
}
