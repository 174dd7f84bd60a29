//! ASCII framing used by serial transports (spec §3, §4.4):
//! `:` + hex({unitId, PDU, LRC}) + CRLF.

use crate::checksum::lrc;
use crate::errors::{FrameError, FrameStructureKind};

const START: u8 = b':';
pub(crate) const CR: u8 = b'\r';
pub(crate) const LF: u8 = b'\n';

pub const MIN_FRAME_LEN: usize = 9;
pub const MAX_FRAME_LEN: usize = 513;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsciiFrame {
    pub unit_id: u8,
    pub pdu: Vec<u8>,
}

/// Emits `:` + hex(unitId ∥ pdu ∥ lrc) + CRLF, uppercase hex per convention.
pub fn build(unit_id: u8, pdu: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(1 + pdu.len() + 1);
    body.push(unit_id);
    body.extend_from_slice(pdu);
    body.push(lrc::compute(&body));

    let mut frame = Vec::with_capacity(1 + body.len() * 2 + 2);
    frame.push(START);
    frame.extend_from_slice(hex::encode_upper(&body).as_bytes());
    frame.push(CR);
    frame.push(LF);
    frame
}

/// Parses a complete ASCII frame, decoding hex and verifying the LRC.
pub fn parse(bytes: &[u8]) -> Result<AsciiFrame, FrameError> {
    if bytes.len() < MIN_FRAME_LEN || bytes.len() > MAX_FRAME_LEN {
        return Err(FrameError::pdu_too_short(format!(
            "ASCII frame length {} out of range {}..={}",
            bytes.len(),
            MIN_FRAME_LEN,
            MAX_FRAME_LEN
        )));
    }
    if bytes[0] != START {
        return Err(FrameError::structure(
            FrameStructureKind::InvalidHexEncoding,
            "missing ':' start delimiter",
        ));
    }
    let n = bytes.len();
    if bytes[n - 2] != CR || bytes[n - 1] != LF {
        return Err(FrameError::structure(
            FrameStructureKind::InvalidHexEncoding,
            "missing CRLF terminator",
        ));
    }
    let hex_body = &bytes[1..n - 2];
    let body = hex::decode(hex_body).map_err(|e| {
        FrameError::structure(FrameStructureKind::InvalidHexEncoding, e.to_string())
    })?;
    if body.len() < 3 {
        return Err(FrameError::pdu_too_short("ASCII frame body too short"));
    }
    let (payload, trailer) = body.split_at(body.len() - 1);
    let received = trailer[0];
    let calculated = lrc::compute(payload);
    if calculated != received {
        return Err(FrameError::Lrc {
            calculated,
            received,
        });
    }
    Ok(AsciiFrame {
        unit_id: payload[0],
        pdu: payload[1..].to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_worked_example() {
        // spec §8 scenario 5
        let pdu = [0x01, 0x00, 0x0A, 0x00, 0x0D];
        let frame = build(0x04, &pdu);
        let parsed = parse(&frame).unwrap();
        assert_eq!(parsed.unit_id, 0x04);
        assert_eq!(parsed.pdu, pdu);
    }

    #[test]
    fn lrc_matches_reference_value() {
        let pdu = [0x01, 0x00, 0x0A, 0x00, 0x0D];
        let mut body = vec![0x04];
        body.extend_from_slice(&pdu);
        assert_eq!(lrc::compute(&body), 0xE4);
    }

    #[test]
    fn rejects_missing_delimiters() {
        let mut frame = build(0x04, &[0x01, 0x02]);
        frame[0] = b'!';
        assert!(matches!(
            parse(&frame).unwrap_err(),
            FrameError::Structure { .. }
        ));
    }

    #[test]
    fn rejects_lrc_mismatch() {
        let mut frame = build(0x04, &[0x01, 0x02]);
        let n = frame.len();
        frame[n - 3] ^= 0x01; // corrupt a hex digit of the LRC byte
        assert!(matches!(parse(&frame).unwrap_err(), FrameError::Lrc { .. }));
    }
}
