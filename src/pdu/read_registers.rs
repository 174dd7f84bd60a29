//! FC 0x03 (read holding registers) and 0x04 (read input registers).

use crate::binary;
use crate::errors::{FrameError, PduError, PduResult};

use super::parse_response_header;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadRegistersRequest {
    pub address: u16,
    pub quantity: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadRegistersResponse {
    pub registers: Vec<u16>,
}

pub fn build_request(function: u8, req: ReadRegistersRequest) -> Vec<u8> {
    let mut pdu = Vec::with_capacity(5);
    pdu.push(function);
    pdu.extend_from_slice(&req.address.to_be_bytes());
    pdu.extend_from_slice(&req.quantity.to_be_bytes());
    pdu
}

pub fn parse_request(function: u8, pdu: &[u8]) -> PduResult<ReadRegistersRequest> {
    super::expect_function_code(pdu, function)?;
    let address = binary::u16_be(pdu, 1).ok_or_else(pdu_too_short)?;
    let quantity = binary::u16_be(pdu, 3).ok_or_else(pdu_too_short)?;
    Ok(ReadRegistersRequest { address, quantity })
}

pub fn parse_response(function: u8, pdu: &[u8]) -> PduResult<ReadRegistersResponse> {
    parse_response_header(pdu, function)?;
    let byte_count = binary::u8(pdu, 1).ok_or_else(pdu_too_short)? as usize;
    if byte_count % 2 != 0 {
        return Err(PduError::Frame(FrameError::byte_count_mismatch(
            byte_count + 1,
            byte_count,
        )));
    }
    let data = binary::bytes(pdu, 2, byte_count).ok_or_else(pdu_too_short)?;
    let registers = data
        .chunks_exact(2)
        .map(|c| u16::from_be_bytes([c[0], c[1]]))
        .collect();
    Ok(ReadRegistersResponse { registers })
}

pub fn build_response(registers: &[u16]) -> Vec<u8> {
    let mut pdu = Vec::with_capacity(2 + registers.len() * 2);
    pdu.push((registers.len() * 2) as u8);
    for reg in registers {
        pdu.extend_from_slice(&reg.to_be_bytes());
    }
    pdu
}

fn pdu_too_short() -> PduError {
    PduError::Frame(FrameError::pdu_too_short("read-registers PDU truncated"))
}
