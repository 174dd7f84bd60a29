//! FC 0x05 (write single coil) and 0x06 (write single register). Both
//! responses echo the request verbatim.

use crate::binary;
use crate::errors::PduResult;

use super::parse_response_header;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteSingleRequest {
    pub address: u16,
    pub value: u16,
}

pub type WriteSingleResponse = WriteSingleRequest;

/// On-the-wire coil encoding: 0xFF00 for on, 0x0000 for off (spec §4.3).
pub fn coil_value(on: bool) -> u16 {
    if on {
        0xFF00
    } else {
        0x0000
    }
}

/// Raw coil value interpreted per spec; any value other than 0xFF00/0x0000
/// is still returned so the caller can inspect the unexpected encoding.
pub fn coil_on(value: u16) -> bool {
    value == 0xFF00
}

pub fn build_request(function: u8, req: WriteSingleRequest) -> Vec<u8> {
    let mut pdu = Vec::with_capacity(5);
    pdu.push(function);
    pdu.extend_from_slice(&req.address.to_be_bytes());
    pdu.extend_from_slice(&req.value.to_be_bytes());
    pdu
}

pub fn parse_request(function: u8, pdu: &[u8]) -> PduResult<WriteSingleRequest> {
    super::expect_function_code(pdu, function)?;
    let address = binary::u16_be(pdu, 1).ok_or_else(pdu_too_short)?;
    let value = binary::u16_be(pdu, 3).ok_or_else(pdu_too_short)?;
    Ok(WriteSingleRequest { address, value })
}

pub fn parse_response(function: u8, pdu: &[u8]) -> PduResult<WriteSingleResponse> {
    parse_response_header(pdu, function)?;
    let address = binary::u16_be(pdu, 1).ok_or_else(pdu_too_short)?;
    let value = binary::u16_be(pdu, 3).ok_or_else(pdu_too_short)?;
    Ok(WriteSingleResponse { address, value })
}

pub fn build_response(function: u8, resp: WriteSingleResponse) -> Vec<u8> {
    build_request(function, resp)
}

fn pdu_too_short() -> crate::errors::PduError {
    crate::errors::PduError::Frame(crate::errors::FrameError::pdu_too_short(
        "write-single PDU truncated",
    ))
}
