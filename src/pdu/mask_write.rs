//! FC 0x16 (mask write register). The response echoes the request.

use crate::binary;
use crate::errors::PduResult;

use super::parse_response_header;

pub const MASK_WRITE_REGISTER: u8 = 0x16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskWriteRequest {
    pub address: u16,
    pub and_mask: u16,
    pub or_mask: u16,
}

pub type MaskWriteResponse = MaskWriteRequest;

fn pdu_too_short() -> crate::errors::PduError {
    crate::errors::PduError::Frame(crate::errors::FrameError::pdu_too_short(
        "mask-write PDU truncated",
    ))
}

pub fn build_request(req: MaskWriteRequest) -> Vec<u8> {
    let mut pdu = Vec::with_capacity(7);
    pdu.push(MASK_WRITE_REGISTER);
    pdu.extend_from_slice(&req.address.to_be_bytes());
    pdu.extend_from_slice(&req.and_mask.to_be_bytes());
    pdu.extend_from_slice(&req.or_mask.to_be_bytes());
    pdu
}

pub fn parse_request(pdu: &[u8]) -> PduResult<MaskWriteRequest> {
    super::expect_function_code(pdu, MASK_WRITE_REGISTER)?;
    parse_body(pdu)
}

pub fn parse_response(pdu: &[u8]) -> PduResult<MaskWriteResponse> {
    parse_response_header(pdu, MASK_WRITE_REGISTER)?;
    parse_body(pdu)
}

fn parse_body(pdu: &[u8]) -> PduResult<MaskWriteRequest> {
    let address = binary::u16_be(pdu, 1).ok_or_else(pdu_too_short)?;
    let and_mask = binary::u16_be(pdu, 3).ok_or_else(pdu_too_short)?;
    let or_mask = binary::u16_be(pdu, 5).ok_or_else(pdu_too_short)?;
    Ok(MaskWriteRequest {
        address,
        and_mask,
        or_mask,
    })
}

/// Applies the mask-write formula: `(current AND andMask) OR (orMask AND (NOT andMask))`.
pub fn apply(current: u16, and_mask: u16, or_mask: u16) -> u16 {
    (current & and_mask) | (or_mask & !and_mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_echoes_request() {
        let req = MaskWriteRequest {
            address: 0x0004,
            and_mask: 0x00F2,
            or_mask: 0x0025,
        };
        let pdu = build_request(req);
        assert_eq!(parse_response(&pdu).unwrap(), req);
    }

    #[test]
    fn applies_mask_formula() {
        // worked example from the Modbus application protocol reference
        assert_eq!(apply(0x0012, 0x00F2, 0x0025), 0x0017);
    }
}
