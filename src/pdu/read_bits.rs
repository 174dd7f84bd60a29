//! FC 0x01 (read coils) and 0x02 (read discrete inputs).

use crate::binary;
use crate::errors::{FrameError, PduError, PduResult};

use super::parse_response_header;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadBitsRequest {
    pub address: u16,
    pub quantity: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadBitsResponse {
    pub bits: Vec<bool>,
}

pub fn build_request(function: u8, req: ReadBitsRequest) -> Vec<u8> {
    let mut pdu = Vec::with_capacity(5);
    pdu.push(function);
    pdu.extend_from_slice(&req.address.to_be_bytes());
    pdu.extend_from_slice(&req.quantity.to_be_bytes());
    pdu
}

pub fn parse_request(function: u8, pdu: &[u8]) -> PduResult<ReadBitsRequest> {
    super::expect_function_code(pdu, function)?;
    let address = binary::u16_be(pdu, 1).ok_or_else(|| pdu_too_short())?;
    let quantity = binary::u16_be(pdu, 3).ok_or_else(|| pdu_too_short())?;
    Ok(ReadBitsRequest { address, quantity })
}

/// `quantity` is the value from the original request; the response carries
/// no quantity field of its own, only a byte count (spec §4.3).
pub fn parse_response(function: u8, pdu: &[u8], quantity: u16) -> PduResult<ReadBitsResponse> {
    parse_response_header(pdu, function)?;
    let byte_count = binary::u8(pdu, 1).ok_or_else(|| pdu_too_short())? as usize;
    let expected_bytes = (quantity as usize).div_ceil(8);
    if byte_count != expected_bytes {
        return Err(PduError::Frame(FrameError::byte_count_mismatch(
            expected_bytes,
            byte_count,
        )));
    }
    let data = binary::bytes(pdu, 2, byte_count).ok_or_else(|| pdu_too_short())?;
    let mut bits = Vec::with_capacity(quantity as usize);
    for i in 0..quantity as usize {
        let byte = data[i / 8];
        bits.push((byte >> (i % 8)) & 0x01 != 0);
    }
    Ok(ReadBitsResponse { bits })
}

pub fn build_response(data: &[u8]) -> Vec<u8> {
    data.to_vec()
}

fn pdu_too_short() -> PduError {
    PduError::Frame(FrameError::pdu_too_short("read-bits PDU truncated"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_and_parses_request() {
        let req = ReadBitsRequest {
            address: 0x0013,
            quantity: 0x0013,
        };
        let pdu = build_request(0x01, req);
        assert_eq!(pdu, [0x01, 0x00, 0x13, 0x00, 0x13]);
        assert_eq!(parse_request(0x01, &pdu).unwrap(), req);
    }

    #[test]
    fn unpacks_requested_bit_count_discarding_padding() {
        // 3 bits requested, packed LSB-first into one byte with padding.
        let pdu = [0x01, 0x01, 0b0000_0101];
        let resp = parse_response(0x01, &pdu, 3).unwrap();
        assert_eq!(resp.bits, vec![true, false, true]);
    }

    #[test]
    fn rejects_byte_count_mismatch() {
        let pdu = [0x01, 0x02, 0xFF, 0xFF];
        let err = parse_response(0x01, &pdu, 3).unwrap_err();
        assert!(matches!(err, PduError::Frame(FrameError::Structure { .. })));
    }

    #[test]
    fn rejects_declared_length_past_pdu() {
        let pdu = [0x01, 0x05, 0xFF];
        let err = parse_response(0x01, &pdu, 40).unwrap_err();
        assert!(matches!(err, PduError::Frame(FrameError::Structure { .. })));
    }
}
