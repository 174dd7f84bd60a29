/// ADU-level framing violations detected before the PDU is even considered
/// (spec §7, "ProtocolMismatch").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolMismatchKind {
    InvalidProtocolId,
    FrameTooLarge,
    FrameTooSmallAtEof,
}

impl std::fmt::Display for ProtocolMismatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidProtocolId => write!(f, "invalid MBAP protocol ID"),
            Self::FrameTooLarge => write!(f, "frame larger than the maximum ADU size"),
            Self::FrameTooSmallAtEof => write!(f, "incomplete frame remained at end of stream"),
        }
    }
}
