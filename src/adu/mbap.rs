//! MBAP framing used by TCP/TLS/UDP transports (spec §4.4).

use crate::binary;
use crate::errors::{CorrelationError, FrameError, ProtocolMismatchKind};

pub const HEADER_LEN: usize = 7;
pub const MAX_LENGTH_FIELD: u16 = 254;
pub const PROTOCOL_ID: u16 = 0x0000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MbapFrame<'a> {
    pub transaction_id: u16,
    pub unit_id: u8,
    pub pdu: &'a [u8],
}

/// Emits `transactionId(BE) | protocolId=0 | length | unitId | pdu`.
pub fn build(transaction_id: u16, unit_id: u8, pdu: &[u8]) -> Vec<u8> {
    let length = (pdu.len() + 1) as u16;
    let mut adu = Vec::with_capacity(HEADER_LEN + pdu.len());
    adu.extend_from_slice(&transaction_id.to_be_bytes());
    adu.extend_from_slice(&PROTOCOL_ID.to_be_bytes());
    adu.extend_from_slice(&length.to_be_bytes());
    adu.push(unit_id);
    adu.extend_from_slice(pdu);
    adu
}

/// Parses a complete MBAP ADU. Does not check Transaction ID or Unit ID
/// against expectations; see [`correlate`] for that.
pub fn parse(bytes: &[u8]) -> Result<MbapFrame<'_>, FrameError> {
    if bytes.len() < HEADER_LEN {
        return Err(FrameError::pdu_too_short("MBAP header truncated"));
    }
    let transaction_id = binary::u16_be(bytes, 0).unwrap();
    let protocol_id = binary::u16_be(bytes, 2).unwrap();
    if protocol_id != PROTOCOL_ID {
        return Err(FrameError::protocol_mismatch(
            ProtocolMismatchKind::InvalidProtocolId,
            format!("expected 0, got {protocol_id}"),
        ));
    }
    let length = binary::u16_be(bytes, 4).unwrap();
    if length == 0 || length > MAX_LENGTH_FIELD {
        return Err(FrameError::protocol_mismatch(
            ProtocolMismatchKind::FrameTooLarge,
            format!("length field {length} out of range 1..=254"),
        ));
    }
    let total_len = 6 + length as usize;
    if bytes.len() < total_len {
        return Err(FrameError::pdu_too_short(format!(
            "expected {total_len} bytes, have {}",
            bytes.len()
        )));
    }
    let unit_id = bytes[6];
    let pdu = &bytes[7..total_len];
    Ok(MbapFrame {
        transaction_id,
        unit_id,
        pdu,
    })
}

/// Checks a parsed frame against the Transaction ID/Unit ID the caller
/// expected (spec §4.4 "when a caller provides expected ... mismatches
/// raise typed errors").
pub fn correlate(
    frame: &MbapFrame<'_>,
    expected_transaction_id: u16,
    expected_unit_id: u8,
) -> Result<(), CorrelationError> {
    if frame.transaction_id != expected_transaction_id {
        return Err(CorrelationError::TransactionIdMismatch {
            expected: expected_transaction_id,
            got: frame.transaction_id,
        });
    }
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
        // spec §8 scenario 4
        let adu = build(0x0001, 0x01, &[0x03, 0x00, 0x00, 0x00, 0x0A]);
        assert_eq!(
            adu,
            [0x00, 0x01, 0x00, 0x00, 0x00, 0x06, 0x01, 0x03, 0x00, 0x00, 0x00, 0x0A]
        );
    }

    #[test]
    fn parses_built_frame() {
        let adu = build(0x0042, 0x11, &[0x03, 0x00, 0x6B, 0x00, 0x03]);
        let frame = parse(&adu).unwrap();
        assert_eq!(frame.transaction_id, 0x0042);
        assert_eq!(frame.unit_id, 0x11);
        assert_eq!(frame.pdu, &[0x03, 0x00, 0x6B, 0x00, 0x03]);
    }

    #[test]
    fn correlate_reports_transaction_id_mismatch() {
        // spec §8 scenario 4
        let adu = build(0x0001, 0x01, &[0x03, 0x00, 0x00, 0x00, 0x0A]);
        let frame = parse(&adu).unwrap();
        let err = correlate(&frame, 0x0002, 0x01).unwrap_err();
        assert_eq!(
            err,
            CorrelationError::TransactionIdMismatch {
                expected: 2,
                got: 1
            }
        );
    }

    #[test]
    fn rejects_nonzero_protocol_id() {
        let mut adu = build(1, 1, &[0x03]);
        adu[3] = 0x01;
        assert!(matches!(
            parse(&adu).unwrap_err(),
            FrameError::ProtocolMismatch { .. }
        ));
    }

    #[test]
    fn rejects_length_out_of_range() {
        let mut adu = build(1, 1, &[0x03]);
        adu[5] = 0xFF; // length = 255 > 254
        assert!(matches!(
            parse(&adu).unwrap_err(),
            FrameError::ProtocolMismatch { .. }
        ));
    }

    #[test]
    fn rejects_truncated_body() {
        let adu = build(1, 1, &[0x03, 0x00, 0x00, 0x00, 0x0A]);
        let err = parse(&adu[..adu.len() - 2]).unwrap_err();
        assert!(matches!(err, FrameError::Structure { .. }));
    }
}
