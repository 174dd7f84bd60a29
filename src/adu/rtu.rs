//! RTU framing used by serial transports (spec §3, §4.4): `[unitId | PDU | CRC-16]`.

use crate::checksum::crc16;
use crate::errors::{CorrelationError, FrameError};

pub const MIN_FRAME_LEN: usize = 4;
pub const MAX_FRAME_LEN: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtuFrame<'a> {
    pub unit_id: u8,
    pub pdu: &'a [u8],
}

/// Emits `unitId | pdu | crc16(unitId ∥ pdu)` with the CRC low byte first.
pub fn build(unit_id: u8, pdu: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(1 + pdu.len() + 2);
    frame.push(unit_id);
    frame.extend_from_slice(pdu);
    let crc = crc16::compute(&frame);
    frame.extend_from_slice(&crc.to_le_bytes());
    frame
}

/// Parses a complete RTU frame, verifying its CRC.
pub fn parse(bytes: &[u8]) -> Result<RtuFrame<'_>, FrameError> {
    if bytes.len() < MIN_FRAME_LEN {
        return Err(FrameError::pdu_too_short("RTU frame shorter than 4 bytes"));
    }
    if bytes.len() > MAX_FRAME_LEN {
        return Err(FrameError::structure(
            crate::errors::FrameStructureKind::PduTooShort,
            format!("RTU frame of {} bytes exceeds maximum 256", bytes.len()),
        ));
    }
    let (body, trailer) = bytes.split_at(bytes.len() - 2);
    let calculated = crc16::compute(body);
    let received = u16::from_le_bytes([trailer[0], trailer[1]]);
    if calculated != received {
        return Err(FrameError::Crc {
            calculated,
            received,
        });
    }
    Ok(RtuFrame {
        unit_id: body[0],
        pdu: &body[1..],
    })
}

pub fn correlate(frame: &RtuFrame<'_>, expected_unit_id: u8) -> Result<(), CorrelationError> {
    if frame.unit_id != expected_unit_id {
        return Err(CorrelationError::UnitIdMismatch {
            expected: expected_unit_id,
            got: frame.unit_id,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_worked_example() {
        // spec §8 scenario 2
        let frame = build(0x01, &[0x03, 0x00, 0x6B, 0x00, 0x03]);
        assert_eq!(frame, [0x01, 0x03, 0x00, 0x6B, 0x00, 0x03, 0x74, 0x17]);
    }

    #[test]
    fn parses_exception_response() {
        // spec §8 scenario 3
        let frame = [0x01, 0x83, 0x02, 0xC0, 0xF1];
        let parsed = parse(&frame).unwrap();
        assert_eq!(parsed.unit_id, 0x01);
        assert_eq!(parsed.pdu, &[0x83, 0x02]);
    }

    #[test]
    fn rejects_crc_mismatch() {
        let mut frame = build(0x01, &[0x03, 0x00, 0x6B, 0x00, 0x03]);
        let last = frame.len() - 1;
        frame[last] ^= 0xFF;
        assert!(matches!(parse(&frame).unwrap_err(), FrameError::Crc { .. }));
    }

    #[test]
    fn rejects_too_short_frame() {
        assert!(matches!(
            parse(&[0x01, 0x03]).unwrap_err(),
            FrameError::Structure { .. }
        ));
    }
}
