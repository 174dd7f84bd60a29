//! FC 0x0F (write multiple coils) and 0x10 (write multiple registers).

use crate::binary;
use crate::errors::{FrameError, PduError, PduResult};

use super::parse_response_header;

pub const WRITE_MULTIPLE_COILS: u8 = 0x0F;
pub const WRITE_MULTIPLE_REGISTERS: u8 = 0x10;

pub const MAX_COIL_QUANTITY: u16 = 1968;
pub const MAX_REGISTER_QUANTITY: u16 = 123;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteMultipleResponse {
    pub address: u16,
    pub quantity: u16,
}

fn pdu_too_short() -> PduError {
    PduError::Frame(FrameError::pdu_too_short("write-multiple PDU truncated"))
}

pub fn build_coils_request(address: u16, bits: &[bool]) -> Vec<u8> {
    let byte_count = bits.len().div_ceil(8);
    let mut pdu = Vec::with_capacity(6 + byte_count);
    pdu.push(WRITE_MULTIPLE_COILS);
    pdu.extend_from_slice(&address.to_be_bytes());
    pdu.extend_from_slice(&(bits.len() as u16).to_be_bytes());
    pdu.push(byte_count as u8);
    let mut packed = vec![0u8; byte_count];
    for (i, &bit) in bits.iter().enumerate() {
        if bit {
            packed[i / 8] |= 1 << (i % 8);
        }
    }
    pdu.extend_from_slice(&packed);
    pdu
}

pub fn parse_coils_request(pdu: &[u8]) -> PduResult<(u16, Vec<bool>)> {
    super::expect_function_code(pdu, WRITE_MULTIPLE_COILS)?;
    let address = binary::u16_be(pdu, 1).ok_or_else(pdu_too_short)?;
    let quantity = binary::u16_be(pdu, 3).ok_or_else(pdu_too_short)?;
    let byte_count = binary::u8(pdu, 5).ok_or_else(pdu_too_short)? as usize;
    let expected_bytes = (quantity as usize).div_ceil(8);
    if byte_count != expected_bytes {
        return Err(PduError::Frame(FrameError::byte_count_mismatch(
            expected_bytes,
            byte_count,
        )));
    }
    let data = binary::bytes(pdu, 6, byte_count).ok_or_else(pdu_too_short)?;
    let bits = (0..quantity as usize)
        .map(|i| (data[i / 8] >> (i % 8)) & 0x01 != 0)
        .collect();
    Ok((address, bits))
}

pub fn build_registers_request(address: u16, values: &[u16]) -> Vec<u8> {
    let mut pdu = Vec::with_capacity(6 + values.len() * 2);
    pdu.push(WRITE_MULTIPLE_REGISTERS);
    pdu.extend_from_slice(&address.to_be_bytes());
    pdu.extend_from_slice(&(values.len() as u16).to_be_bytes());
    pdu.push((values.len() * 2) as u8);
    for v in values {
        pdu.extend_from_slice(&v.to_be_bytes());
    }
    pdu
}

pub fn parse_registers_request(pdu: &[u8]) -> PduResult<(u16, Vec<u16>)> {
    super::expect_function_code(pdu, WRITE_MULTIPLE_REGISTERS)?;
    let address = binary::u16_be(pdu, 1).ok_or_else(pdu_too_short)?;
    let quantity = binary::u16_be(pdu, 3).ok_or_else(pdu_too_short)?;
    let byte_count = binary::u8(pdu, 5).ok_or_else(pdu_too_short)? as usize;
    let expected_bytes = quantity as usize * 2;
    if byte_count != expected_bytes {
        return Err(PduError::Frame(FrameError::byte_count_mismatch(
            expected_bytes,
            byte_count,
        )));
    }
    let data = binary::bytes(pdu, 6, byte_count).ok_or_else(pdu_too_short)?;
    let values = data
        .chunks_exact(2)
        .map(|c| u16::from_be_bytes([c[0], c[1]]))
        .collect();
    Ok((address, values))
}

pub fn parse_response(function: u8, pdu: &[u8]) -> PduResult<WriteMultipleResponse> {
    parse_response_header(pdu, function)?;
    let address = binary::u16_be(pdu, 1).ok_or_else(pdu_too_short)?;
    let quantity = binary::u16_be(pdu, 3).ok_or_else(pdu_too_short)?;
    Ok(WriteMultipleResponse { address, quantity })
}

pub fn build_response(resp: WriteMultipleResponse) -> Vec<u8> {
    let mut pdu = Vec::with_capacity(4);
    pdu.extend_from_slice(&resp.address.to_be_bytes());
    pdu.extend_from_slice(&resp.quantity.to_be_bytes());
    pdu
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_and_unpacks_coils() {
        let bits = vec![true, false, true, true, false, false, true, false, true];
        let pdu = build_coils_request(0x0013, &bits);
        let (addr, parsed) = parse_coils_request(&pdu).unwrap();
        assert_eq!(addr, 0x0013);
        assert_eq!(parsed, bits);
    }

    #[test]
    fn rejects_byte_count_mismatch_for_registers() {
        let mut pdu = build_registers_request(0, &[1, 2, 3]);
        pdu[5] = 4; // corrupt declared byte count
        let err = parse_registers_request(&pdu).unwrap_err();
        assert!(matches!(err, PduError::Frame(FrameError::Structure { .. })));
    }

    #[test]
    fn response_round_trips() {
        let resp = WriteMultipleResponse {
            address: 0x0012,
            quantity: 10,
        };
        let mut pdu = vec![WRITE_MULTIPLE_REGISTERS];
        pdu.extend_from_slice(&build_response(resp));
        assert_eq!(parse_response(WRITE_MULTIPLE_REGISTERS, &pdu).unwrap(), resp);
    }
}
