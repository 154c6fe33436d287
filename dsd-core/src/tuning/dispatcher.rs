//! Dispatcher: picks the available tuning backend, in-process stream →
//! rigctl → RTL-UDP, and caches the frequency last sent by each.

use crate::errors::{Result, TuningError};

use super::rigctl::RigctlClient;
use super::rtl_udp::RtlUdpTuner;

/// An in-process sample source that can be retuned by a direct function
/// call, bypassing rigctl/RTL-UDP entirely. Implemented by the sample
/// source owner when streaming directly off an SDR in-process.
pub trait DirectStreamTuner {
    fn tune_direct(&mut self, freq_hz: u64) -> Result<()>;
}

/// No-op stand-in for when no in-process stream is present, matching the
/// "never default to crashing when unset" capability-trait convention.
pub struct NoDirectStream;

impl DirectStreamTuner for NoDirectStream {
    fn tune_direct(&mut self, _freq_hz: u64) -> Result<()> {
        Err(TuningError::NoBackend.into())
    }
}

pub struct TuningDispatcher<D: DirectStreamTuner> {
    direct: D,
    rigctl: Option<RigctlClient>,
    rtl_udp: Option<RtlUdpTuner>,
}

impl<D: DirectStreamTuner> TuningDispatcher<D> {
    pub fn new(direct: D, rigctl: Option<RigctlClient>, rtl_udp: Option<RtlUdpTuner>) -> Self {
        Self { direct, rigctl, rtl_udp }
    }

    /// Tune to `freq_hz`, trying in-process stream, then rigctl, then
    /// RTL-UDP, stopping at the first backend that is configured and
    /// succeeds. Does not distinguish "voice-tuned" from "CC-tuned" — that
    /// bookkeeping belongs to the caller (the decoder context), matching
    /// `tune_to_cc`'s identical wire behaviour.
    pub fn tune_to_freq(&mut self, freq_hz: u64) -> Result<()> {
        if self.direct.tune_direct(freq_hz).is_ok() {
            return Ok(());
        }
        if let Some(rigctl) = self.rigctl.as_mut() {
            if rigctl.set_freq(freq_hz).is_ok() {
                return Ok(());
            }
        }
        if let Some(rtl_udp) = self.rtl_udp.as_mut() {
            return rtl_udp.set_freq(freq_hz);
        }
        Err(TuningError::NoBackend.into())
    }

    /// Identical wire behaviour to `tune_to_freq`; kept as a separate entry
    /// point so callers can mark the SM's "voice-tuned" bookkeeping only on
    /// the `tune_to_freq` path.
    pub fn tune_to_cc(&mut self, freq_hz: u64) -> Result<()> {
        self.tune_to_freq(freq_hz)
    }

    pub fn rigctl_mut(&mut self) -> Option<&mut RigctlClient> {
        self.rigctl.as_mut()
    }

    pub fn rtl_udp_mut(&mut self) -> Option<&mut RtlUdpTuner> {
        self.rtl_udp.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct FailingDirect;
    impl DirectStreamTuner for FailingDirect {
        fn tune_direct(&mut self, _freq_hz: u64) -> Result<()> {
            Err(TuningError::NoBackend.into())
        }
    }

    struct CountingDirect {
        calls: Cell<u32>,
    }
    impl DirectStreamTuner for CountingDirect {
        fn tune_direct(&mut self, _freq_hz: u64) -> Result<()> {
            self.calls.set(self.calls.get() + 1);
            Ok(())
        }
    }

    #[test]
    fn direct_stream_is_preferred_when_present() {
        let direct = CountingDirect { calls: Cell::new(0) };
        let mut dispatcher = TuningDispatcher::new(direct, None, None);
        assert!(dispatcher.tune_to_freq(851_000_000).is_ok());
        assert_eq!(dispatcher.direct.calls.get(), 1);
    }

    #[test]
    fn no_backend_configured_errors() {
        let mut dispatcher = TuningDispatcher::new(FailingDirect, None, None);
        assert!(dispatcher.tune_to_freq(851_000_000).is_err());
    }

    #[test]
    fn falls_through_to_rtl_udp_when_direct_and_rigctl_absent() {
        let rtl = RtlUdpTuner::new(0).expect("bind ephemeral port");
        let mut dispatcher = TuningDispatcher::new(FailingDirect, None, Some(rtl));
        assert!(dispatcher.tune_to_freq(851_000_000).is_ok());
        assert_eq!(dispatcher.rtl_udp_mut().unwrap().cached_freq_hz(), Some(851_000_000));
    }
}
