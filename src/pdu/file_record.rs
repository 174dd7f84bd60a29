//! FC 0x14 (read file record) and 0x15 (write file record).

use crate::binary;
use crate::errors::{FrameError, FrameStructureKind, PduError, PduResult};

use super::parse_response_header;

pub const READ_FILE_RECORD: u8 = 0x14;
pub const WRITE_FILE_RECORD: u8 = 0x15;

/// Reference type byte required by both function codes (spec §4.3).
pub const REFERENCE_TYPE: u8 = 0x06;

fn pdu_too_short() -> PduError {
    PduError::Frame(FrameError::pdu_too_short("file-record PDU truncated"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileRecordRequestEntry {
    pub file_number: u16,
    pub record_number: u16,
    pub record_length: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecordWriteEntry {
    pub file_number: u16,
    pub record_number: u16,
    /// Always an even number of bytes (whole 16-bit words), per spec §3.
    pub data: Vec<u8>,
}

/// A read-response sub-record. File/record numbers are not echoed by the
/// device (spec §9 open question); the caller correlates by position with
/// the original request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecordReadEntry {
    pub data: Vec<u8>,
}

pub fn build_read_request(entries: &[FileRecordRequestEntry]) -> Vec<u8> {
    let mut pdu = Vec::with_capacity(2 + entries.len() * 7);
    pdu.push(READ_FILE_RECORD);
    pdu.push((entries.len() * 7) as u8);
    for e in entries {
        pdu.push(REFERENCE_TYPE);
        pdu.extend_from_slice(&e.file_number.to_be_bytes());
        pdu.extend_from_slice(&e.record_number.to_be_bytes());
        pdu.extend_from_slice(&e.record_length.to_be_bytes());
    }
    pdu
}

pub fn parse_read_request(pdu: &[u8]) -> PduResult<Vec<FileRecordRequestEntry>> {
    super::expect_function_code(pdu, READ_FILE_RECORD)?;
    let data_len = binary::u8(pdu, 1).ok_or_else(pdu_too_short)? as usize;
    let body = binary::bytes(pdu, 2, data_len).ok_or_else(pdu_too_short)?;
    let mut entries = Vec::new();
    for chunk in body.chunks(7) {
        if chunk.len() != 7 {
            return Err(pdu_too_short());
        }
        if chunk[0] != REFERENCE_TYPE {
            return Err(PduError::Frame(FrameError::structure(
                FrameStructureKind::InvalidFileReferenceType,
                format!("expected 0x06, got 0x{:02X}", chunk[0]),
            )));
        }
        entries.push(FileRecordRequestEntry {
            file_number: u16::from_be_bytes([chunk[1], chunk[2]]),
            record_number: u16::from_be_bytes([chunk[3], chunk[4]]),
            record_length: u16::from_be_bytes([chunk[5], chunk[6]]),
        });
    }
    Ok(entries)
}

pub fn parse_read_response(pdu: &[u8]) -> PduResult<Vec<FileRecordReadEntry>> {
    parse_response_header(pdu, READ_FILE_RECORD)?;
    let data_len = binary::u8(pdu, 1).ok_or_else(pdu_too_short)? as usize;
    let body = binary::bytes(pdu, 2, data_len).ok_or_else(pdu_too_short)?;
    let mut entries = Vec::new();
    let mut offset = 0;
    while offset < body.len() {
        let sub_len = *body.get(offset).ok_or_else(pdu_too_short)? as usize;
        let ref_type = *body.get(offset + 1).ok_or_else(pdu_too_short)?;
        if ref_type != REFERENCE_TYPE {
            return Err(PduError::Frame(FrameError::structure(
                FrameStructureKind::InvalidFileReferenceType,
                format!("expected 0x06, got 0x{ref_type:02X}"),
            )));
        }
        let data_start = offset + 2;
        let data_end = data_start
            .checked_add(sub_len.saturating_sub(1))
            .ok_or_else(pdu_too_short)?;
        let data = body.get(data_start..data_end).ok_or_else(pdu_too_short)?;
        entries.push(FileRecordReadEntry {
            data: data.to_vec(),
        });
        offset = data_end;
    }
    Ok(entries)
}

pub fn build_write_request(entries: &[FileRecordWriteEntry]) -> PduResult<Vec<u8>> {
    for e in entries {
        if e.data.len() % 2 != 0 {
            return Err(PduError::Frame(FrameError::structure(
                FrameStructureKind::OddRecordDataLength,
                format!("record data length {} is odd", e.data.len()),
            )));
        }
    }
    let body_len: usize = entries.iter().map(|e| 7 + e.data.len()).sum();
    let mut pdu = Vec::with_capacity(2 + body_len);
    pdu.push(WRITE_FILE_RECORD);
    pdu.push(body_len as u8);
    for e in entries {
        pdu.push(REFERENCE_TYPE);
        pdu.extend_from_slice(&e.file_number.to_be_bytes());
        pdu.extend_from_slice(&e.record_number.to_be_bytes());
        pdu.extend_from_slice(&((e.data.len() / 2) as u16).to_be_bytes());
        pdu.extend_from_slice(&e.data);
    }
    Ok(pdu)
}

/// The response is an echo of the request (spec §4.3).
pub fn parse_write_response(pdu: &[u8]) -> PduResult<Vec<FileRecordWriteEntry>> {
    parse_response_header(pdu, WRITE_FILE_RECORD)?;
    let data_len = binary::u8(pdu, 1).ok_or_else(pdu_too_short)? as usize;
    let body = binary::bytes(pdu, 2, data_len).ok_or_else(pdu_too_short)?;
    let mut entries = Vec::new();
    let mut offset = 0;
    while offset < body.len() {
        let chunk = body.get(offset..offset + 7).ok_or_else(pdu_too_short)?;
        if chunk[0] != REFERENCE_TYPE {
            return Err(PduError::Frame(FrameError::structure(
                FrameStructureKind::InvalidFileReferenceType,
                format!("expected 0x06, got 0x{:02X}", chunk[0]),
            )));
        }
        let record_length = u16::from_be_bytes([chunk[5], chunk[6]]) as usize;
        let data_bytes = record_length * 2;
        let data = body
            .get(offset + 7..offset + 7 + data_bytes)
            .ok_or_else(pdu_too_short)?;
        entries.push(FileRecordWriteEntry {
            file_number: u16::from_be_bytes([chunk[1], chunk[2]]),
            record_number: u16::from_be_bytes([chunk[3], chunk[4]]),
            data: data.to_vec(),
        });
        offset += 7 + data_bytes;
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_request_round_trips() {
        let entries = vec![FileRecordRequestEntry {
            file_number: 4,
            record_number: 1,
            record_length: 2,
        }];
        let pdu = build_read_request(&entries);
        assert_eq!(parse_read_request(&pdu).unwrap(), entries);
    }

    #[test]
    fn rejects_wrong_reference_type() {
        let mut pdu = build_read_request(&[FileRecordRequestEntry {
            file_number: 1,
            record_number: 1,
            record_length: 1,
        }]);
        pdu[2] = 0x07;
        let err = parse_read_request(&pdu).unwrap_err();
        assert!(matches!(
            err,
            PduError::Frame(FrameError::Structure {
                kind: FrameStructureKind::InvalidFileReferenceType,
                ..
            })
        ));
    }

    #[test]
    fn write_request_rejects_odd_data_length() {
        let entries = vec![FileRecordWriteEntry {
            file_number: 4,
            record_number: 7,
            data: vec![0x00, 0x0D, 0xFF],
        }];
        let err = build_write_request(&entries).unwrap_err();
        assert!(matches!(
            err,
            PduError::Frame(FrameError::Structure {
                kind: FrameStructureKind::OddRecordDataLength,
                ..
            })
        ));
    }

    #[test]
    fn write_request_round_trips_through_response_echo() {
        let entries = vec![FileRecordWriteEntry {
            file_number: 4,
            record_number: 7,
            data: vec![0x00, 0x0D],
        }];
        // the response is a byte-for-byte echo of the request
        let pdu = build_write_request(&entries).unwrap();
        assert_eq!(parse_write_response(&pdu).unwrap(), entries);
    }
}
