//! Protocol-decoder output: the typed events a per-protocol decoder hands
//! back to the dispatcher for the Trunk-SM and jitter/gate layer to act on.

use crate::grant::GrantEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolEvent {
    Grant(GrantEvent),
    /// MAC_PTT / equivalent: slot about to carry voice.
    Ptt { slot: u8 },
    /// MAC_ACTIVE / equivalent: slot is actively carrying voice, refresh the
    /// gate hold.
    Active { slot: u8 },
    /// MAC_END / equivalent: slot's call ended cleanly.
    End { slot: u8 },
    /// Slot returned to idle signalling (no call, no error).
    Idle { slot: u8 },
    /// Decode lost frame sync mid-stream (CRC failure, unknown opcode past
    /// a tolerance threshold).
    NoSync,
}
