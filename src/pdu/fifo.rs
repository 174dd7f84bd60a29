//! FC 0x18 (read FIFO queue).

use crate::binary;
use crate::errors::{FrameError, PduError, PduResult};

use super::parse_response_header;

pub const READ_FIFO_QUEUE: u8 = 0x18;
pub const MAX_FIFO_COUNT: u16 = 31;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FifoResponse {
    pub values: Vec<u16>,
}

fn pdu_too_short() -> PduError {
    PduError::Frame(FrameError::pdu_too_short("FIFO PDU truncated"))
}

pub fn build_request(address: u16) -> Vec<u8> {
    let mut pdu = Vec::with_capacity(3);
    pdu.push(READ_FIFO_QUEUE);
    pdu.extend_from_slice(&address.to_be_bytes());
    pdu
}

pub fn parse_request(pdu: &[u8]) -> PduResult<u16> {
    super::expect_function_code(pdu, READ_FIFO_QUEUE)?;
    binary::u16_be(pdu, 1).ok_or_else(pdu_too_short)
}

pub fn parse_response(pdu: &[u8]) -> PduResult<FifoResponse> {
    parse_response_header(pdu, READ_FIFO_QUEUE)?;
    let byte_count = binary::u16_be(pdu, 1).ok_or_else(pdu_too_short)? as usize;
    let fifo_count = binary::u16_be(pdu, 3).ok_or_else(pdu_too_short)? as usize;
    if fifo_count > MAX_FIFO_COUNT as usize {
        return Err(PduError::Frame(FrameError::byte_count_mismatch(
            MAX_FIFO_COUNT as usize,
            fifo_count,
        )));
    }
    let expected_bytes = 2 + fifo_count * 2;
    if byte_count != expected_bytes {
        return Err(PduError::Frame(FrameError::byte_count_mismatch(
            expected_bytes,
            byte_count,
        )));
    }
    let data = binary::bytes(pdu, 5, fifo_count * 2).ok_or_else(pdu_too_short)?;
    let values = data
        .chunks_exact(2)
        .map(|c| u16::from_be_bytes([c[0], c[1]]))
        .collect();
    Ok(FifoResponse { values })
}

pub fn build_response(values: &[u16]) -> Vec<u8> {
    let byte_count = 2 + values.len() * 2;
    let mut pdu = Vec::with_capacity(4 + values.len() * 2);
    pdu.extend_from_slice(&(byte_count as u16).to_be_bytes());
    pdu.extend_from_slice(&(values.len() as u16).to_be_bytes());
    for v in values {
        pdu.extend_from_slice(&v.to_be_bytes());
    }
    pdu
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let values = vec![0x00AD, 0x00C8, 0x0100];
        let mut pdu = vec![READ_FIFO_QUEUE];
        pdu.extend_from_slice(&build_response(&values));
        assert_eq!(parse_response(&pdu).unwrap().values, values);
    }

    #[test]
    fn rejects_fifo_count_over_cap() {
        let mut pdu = vec![READ_FIFO_QUEUE, 0x00, 0x42, 0x00, 0x20];
        pdu.extend(std::iter::repeat(0u8).take(0x20 * 2));
        let err = parse_response(&pdu).unwrap_err();
        assert!(matches!(err, PduError::Frame(FrameError::Structure { .. })));
    }
}
