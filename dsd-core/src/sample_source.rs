//! Sample sources as an external collaborator: PulseAudio/PortAudio,
//! rtl_sdr driver glue, SoapySDR, and rtl_tcp are all out of scope here.
//! This module specifies the frame shape and retune hook a source must
//! provide; a provider crate supplies the actual capture backend.

use crate::errors::Result;

/// A single demodulator-input frame: either raw baseband I/Q samples (from
/// an SDR source) or already-demodulated discriminator audio (from a
/// `pulse`/WAV-like source), matching `-i`'s `rtl:...`/`rtltcp:...` vs
/// `pulse`/`soapy:...` distinction.
#[derive(Debug, Clone)]
pub enum SourceFrame {
    Baseband(Vec<num_complex::Complex<f32>>),
    Discriminator(Vec<f32>),
}

/// A live sample source. `read_frame` blocks until a frame is available or
/// the source is closed, matching the symbol-pipeline/demod thread's
/// suspension point on sample-source reads.
pub trait SampleSource {
    fn sample_rate_hz(&self) -> u32;
    fn read_frame(&mut self) -> Result<Option<SourceFrame>>;

    /// Retune in-process, if this source streams directly off an SDR.
    /// Sources that only play back a file or a fixed audio device return
    /// `Ok(())` without effect.
    fn retune(&mut self, freq_hz: u64) -> Result<()> {
        let _ = freq_hz;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSource {
        frames: Vec<SourceFrame>,
    }

    impl SampleSource for FixedSource {
        fn sample_rate_hz(&self) -> u32 {
            48_000
        }

        fn read_frame(&mut self) -> Result<Option<SourceFrame>> {
            Ok(self.frames.pop())
        }
    }

    #[test]
    fn default_retune_is_a_no_op_that_succeeds() {
        let mut source = FixedSource { frames: vec![SourceFrame::Discriminator(vec![0.0; 4])] };
        assert!(source.retune(851_000_000).is_ok());
        assert!(source.read_frame().unwrap().is_some());
    }
}
