use thiserror::Error;

use super::kinds::{FrameStructureKind, ProtocolMismatchKind};

#[derive(Error, Debug, Clone)]
pub enum FrameError {
    #[error("protocol mismatch: {kind} - {details}")]
    ProtocolMismatch {
        kind: ProtocolMismatchKind,
        details: String,
    },

    #[error("frame structure error: {kind} - {details}")]
    Structure {
        kind: FrameStructureKind,
        details: String,
    },

    #[error("CRC mismatch: calculated=0x{calculated:04X}, received=0x{received:04X}")]
    Crc { calculated: u16, received: u16 },

    #[error("LRC mismatch: calculated=0x{calculated:02X}, received=0x{received:02X}")]
    Lrc { calculated: u8, received: u8 },
}

impl FrameError {
    pub fn protocol_mismatch(kind: ProtocolMismatchKind, details: impl Into<String>) -> Self {
        Self::ProtocolMismatch {
            kind,
            details: details.into(),
        }
    }

    pub fn structure(kind: FrameStructureKind, details: impl Into<String>) -> Self {
        Self::Structure {
            kind,
            details: details.into(),
        }
    }

    pub fn pdu_too_short(details: impl Into<String>) -> Self {
        Self::structure(FrameStructureKind::PduTooShort, details)
    }

    pub fn byte_count_mismatch(expected: usize, got: usize) -> Self {
        Self::structure(
            FrameStructureKind::ByteCountMismatch,
            format!("expected {expected}, got {got}"),
        )
    }

    pub fn unexpected_function_code(expected: u8, got: u8) -> Self {
        Self::structure(
            FrameStructureKind::UnexpectedFunctionCode,
            format!("expected 0x{expected:02X}, got 0x{got:02X}"),
        )
    }
}
