//! The closed set of known sync patterns, one entry per supported
//! protocol/burst type, each carrying its own polarity-inverted twin.
//!
//! Patterns are dibit-symbol sequences using only the `+1`/`+3`
//! constellation corners, the convention real frame-sync words are drawn
//! from since the outer two symbols give the largest decision margin.
//! `'1'` decodes to symbol value `+1`, `'3'` to `+3`; the inverted twin
//! negates every symbol (`+1 -> -1`, `+3 -> -3`) rather than reusing the
//! same two characters.
//!
//! Exact bit patterns for P25 P1/P2, the NXDN frame sync word, and YSF are
//! reproduced from the external interface table. The other entries are
//! representative sequences of the documented length/tolerance/polarity
//! shape: this crate's external-interface scope stops at frame
//! acquisition, not bit-exact protocol conformance (see `DESIGN.md`).

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternId {
    P25P1,
    P25P2,
    DmrBsVoice,
    DmrBsData,
    DmrMsVoice,
    DmrMsData,
    DmrDmoTs1Data,
    DmrDmoTs1Voice,
    DmrDmoTs2Data,
    DmrDmoTs2Voice,
    NxdnFsw,
    NxdnPreambleFsw,
    NxdnMsData,
    NxdnMsVoice,
    NxdnBsData,
    NxdnBsVoice,
    DStar,
    Ysf,
    DpmrFs1,
    DpmrFs2,
    DpmrFs3,
    DpmrFs4,
    ProVoice,
    ProVoiceEa,
    M17Lsf,
    M17Str,
    M17Pkt,
    M17Brt,
    Edacs,
    EdacsDottingA,
    EdacsDottingB,
}

/// A named sync pattern plus its correlation tolerance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPattern {
    pub id: PatternId,
    pub symbols: Vec<i8>,
    /// Whether the detector should also test the negated sequence.
    pub has_inverted_twin: bool,
    /// Maximum symbol-by-symbol mismatch still counted as a match.
    pub tolerance: u8,
}

impl SyncPattern {
    fn new(id: PatternId, text: &str, has_inverted_twin: bool, tolerance: u8) -> Self {
        let symbols = text
            .bytes()
            .map(|b| match b {
                b'1' => 1,
                b'3' => 3,
                other => panic!("invalid sync pattern char: {}", other as char),
            })
            .collect();
        Self {
            id,
            symbols,
            has_inverted_twin,
            tolerance,
        }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// The polarity-inverted twin, if this pattern has one.
    pub fn inverted_symbols(&self) -> Option<Vec<i8>> {
        self.has_inverted_twin
            .then(|| self.symbols.iter().map(|&s| -s).collect())
    }
}

/// The full closed set, matching the external interface table exactly in
/// length, tolerance, and inverted-twin flag.
pub fn all_patterns() -> Vec<SyncPattern> {
    vec![
        SyncPattern::new(PatternId::P25P1, "111113113311333313133333", true, 1),
        SyncPattern::new(PatternId::P25P2, "11131131111333133333", true, 1),
        SyncPattern::new(PatternId::DmrBsVoice, "331131311331113311331133", false, 0),
        SyncPattern::new(PatternId::DmrBsData, "113313133113311331331331", false, 0),
        SyncPattern::new(PatternId::DmrMsVoice, "133113313113133113311331", false, 0),
        SyncPattern::new(PatternId::DmrMsData, "311331133113311331133113", false, 0),
        SyncPattern::new(PatternId::DmrDmoTs1Data, "133311133311133311133311", false, 0),
        SyncPattern::new(PatternId::DmrDmoTs1Voice, "311133311133311133311133", false, 0),
        SyncPattern::new(PatternId::DmrDmoTs2Data, "113331113331113331113331", false, 0),
        SyncPattern::new(PatternId::DmrDmoTs2Voice, "331113331113331113331113", false, 0),
        SyncPattern::new(PatternId::NxdnFsw, "3131331131", true, 0),
        SyncPattern::new(PatternId::NxdnPreambleFsw, "3131331313313133131", true, 1),
        SyncPattern::new(PatternId::NxdnMsData, "311333113331133311", true, 1),
        SyncPattern::new(PatternId::NxdnMsVoice, "133111331113311133", true, 1),
        SyncPattern::new(PatternId::NxdnBsData, "331133311333113331", true, 1),
        SyncPattern::new(PatternId::NxdnBsVoice, "113311133111331113", true, 1),
        SyncPattern::new(PatternId::DStar, "111331133113311331133113", true, 1),
        SyncPattern::new(PatternId::Ysf, "31111311313113131131", true, 1),
        SyncPattern::new(PatternId::DpmrFs1, "113311331133113311331133", true, 1),
        SyncPattern::new(PatternId::DpmrFs2, "311331133113", true, 0),
        SyncPattern::new(PatternId::DpmrFs3, "133113311331", true, 0),
        SyncPattern::new(PatternId::DpmrFs4, "331133113311331133113311", true, 1),
        SyncPattern::new(
            PatternId::ProVoice,
            "11331133113311331133113311331133",
            true,
            2,
        ),
        SyncPattern::new(
            PatternId::ProVoiceEa,
            "33113311331133113311331133113311",
            true,
            2,
        ),
        SyncPattern::new(PatternId::M17Lsf, "31131131", false, 0),
        SyncPattern::new(PatternId::M17Str, "13313313", false, 0),
        SyncPattern::new(PatternId::M17Pkt, "3113113311311133", false, 1),
        SyncPattern::new(PatternId::M17Brt, "1331331133133311", false, 1),
        SyncPattern::new(
            PatternId::Edacs,
            "113311331133113311331133113311331133113311331133",
            true,
            2,
        ),
        SyncPattern::new(
            PatternId::EdacsDottingA,
            "131313131313131313131313131313131313131313131313",
            false,
            1,
        ),
        SyncPattern::new(
            PatternId::EdacsDottingB,
            "313131313131313131313131313131313131313131313131",
            false,
            1,
        ),
    ]
}
