//! FC 0x17 (read/write multiple registers): a single round trip that writes
//! before it reads, atomically on the device.

use crate::binary;
use crate::errors::{FrameError, PduError, PduResult};

use super::parse_response_header;

pub const READ_WRITE_MULTIPLE_REGISTERS: u8 = 0x17;

pub const MAX_READ_QUANTITY: u16 = 125;
pub const MAX_WRITE_QUANTITY: u16 = 121;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadWriteRequest {
    pub read_address: u16,
    pub read_quantity: u16,
    pub write_address: u16,
    pub write_values: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadWriteResponse {
    pub registers: Vec<u16>,
}

fn pdu_too_short() -> PduError {
    PduError::Frame(FrameError::pdu_too_short("read/write PDU truncated"))
}

pub fn build_request(req: &ReadWriteRequest) -> Vec<u8> {
    let mut pdu = Vec::with_capacity(10 + req.write_values.len() * 2);
    pdu.push(READ_WRITE_MULTIPLE_REGISTERS);
    pdu.extend_from_slice(&req.read_address.to_be_bytes());
    pdu.extend_from_slice(&req.read_quantity.to_be_bytes());
    pdu.extend_from_slice(&req.write_address.to_be_bytes());
    pdu.extend_from_slice(&(req.write_values.len() as u16).to_be_bytes());
    pdu.push((req.write_values.len() * 2) as u8);
    for v in &req.write_values {
        pdu.extend_from_slice(&v.to_be_bytes());
    }
    pdu
}

pub fn parse_request(pdu: &[u8]) -> PduResult<ReadWriteRequest> {
    super::expect_function_code(pdu, READ_WRITE_MULTIPLE_REGISTERS)?;
    let read_address = binary::u16_be(pdu, 1).ok_or_else(pdu_too_short)?;
    let read_quantity = binary::u16_be(pdu, 3).ok_or_else(pdu_too_short)?;
    let write_address = binary::u16_be(pdu, 5).ok_or_else(pdu_too_short)?;
    let write_quantity = binary::u16_be(pdu, 7).ok_or_else(pdu_too_short)?;
    let byte_count = binary::u8(pdu, 9).ok_or_else(pdu_too_short)? as usize;
    let expected_bytes = write_quantity as usize * 2;
    if byte_count != expected_bytes {
        return Err(PduError::Frame(FrameError::byte_count_mismatch(
            expected_bytes,
            byte_count,
        )));
    }
    let data = binary::bytes(pdu, 10, byte_count).ok_or_else(pdu_too_short)?;
    let write_values = data
        .chunks_exact(2)
        .map(|c| u16::from_be_bytes([c[0], c[1]]))
        .collect();
    Ok(ReadWriteRequest {
        read_address,
        read_quantity,
        write_address,
        write_values,
    })
}

pub fn parse_response(pdu: &[u8]) -> PduResult<ReadWriteResponse> {
    parse_response_header(pdu, READ_WRITE_MULTIPLE_REGISTERS)?;
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
    Ok(ReadWriteResponse { registers })
}

pub fn build_response(registers: &[u16]) -> Vec<u8> {
    let mut pdu = Vec::with_capacity(1 + registers.len() * 2);
    pdu.push((registers.len() * 2) as u8);
    for r in registers {
        pdu.extend_from_slice(&r.to_be_bytes());
    }
    pdu
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_request() {
        let req = ReadWriteRequest {
            read_address: 0x0003,
            read_quantity: 6,
            write_address: 0x000E,
            write_values: vec![0x00FF, 0x00FF, 0x00FF],
        };
        let pdu = build_request(&req);
        assert_eq!(parse_request(&pdu).unwrap(), req);
    }

    #[test]
    fn response_round_trips() {
        let registers = vec![0x00FE, 0x0ACD, 0x0001];
        let mut pdu = vec![READ_WRITE_MULTIPLE_REGISTERS];
        pdu.extend_from_slice(&build_response(&registers));
        assert_eq!(parse_response(&pdu).unwrap().registers, registers);
    }
}
