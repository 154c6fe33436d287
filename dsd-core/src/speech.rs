//! Speech codec synthesis as an external, pure-function collaborator.
//!
//! AMBE/IMBE/Codec2 bit-exact vocoder synthesis is out of scope; this module
//! specifies the frame shapes a decoder passes to one and gets 8 kHz PCM
//! back from. `reliability` mirrors the symbol pipeline's per-symbol score
//! so a soft-decision vocoder provider can weight error concealment.

/// One 20 ms analysis frame's worth of encoded voice bits, plus the mean
/// per-bit reliability carried over from the symbol pipeline.
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    pub bits: Vec<u8>,
    pub mean_reliability: u8,
}

/// 160 linear PCM samples (20 ms at 8 kHz), the shape the jitter ring
/// buffers.
pub type PcmFrame = [f32; 160];

/// A speech decoder: turns encoded voice frames into 20 ms PCM frames.
/// Implementations own whatever internal vocoder state (pitch, energy,
/// error-concealment history) they need across calls.
pub trait SpeechDecoder {
    /// Decode one frame. On a muted/erased frame (`bits` all zero or a
    /// provider-specific erasure marker), implementations typically repeat
    /// or fade the previous frame rather than emit silence outright.
    fn decode(&mut self, frame: &EncodedFrame) -> PcmFrame;
    fn reset(&mut self);
}

/// Silence-only stand-in: decodes every frame to zeros. Lets the pipeline
/// exercise jitter/gate/sink plumbing without a real vocoder linked in.
#[derive(Debug, Default)]
pub struct SilentSpeechDecoder;

impl SpeechDecoder for SilentSpeechDecoder {
    fn decode(&mut self, _frame: &EncodedFrame) -> PcmFrame {
        [0.0; 160]
    }

    fn reset(&mut self) {}
}
