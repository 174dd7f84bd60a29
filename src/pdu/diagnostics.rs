//! FC 0x07 (read exception status), 0x08 (diagnostics), 0x0B (get comm event
//! counter), 0x0C (get comm event log).

use crate::binary;
use crate::errors::{FrameError, PduError, PduResult};

use super::parse_response_header;

pub const READ_EXCEPTION_STATUS: u8 = 0x07;
pub const DIAGNOSTICS: u8 = 0x08;
pub const GET_COMM_EVENT_COUNTER: u8 = 0x0B;
pub const GET_COMM_EVENT_LOG: u8 = 0x0C;

fn pdu_too_short() -> PduError {
    PduError::Frame(FrameError::pdu_too_short("diagnostics PDU truncated"))
}

// --- 0x07 read exception status ---

pub fn build_read_exception_status_request() -> Vec<u8> {
    vec![READ_EXCEPTION_STATUS]
}

pub fn parse_read_exception_status_response(pdu: &[u8]) -> PduResult<u8> {
    parse_response_header(pdu, READ_EXCEPTION_STATUS)?;
    binary::u8(pdu, 1).ok_or_else(pdu_too_short)
}

pub fn build_read_exception_status_response(status: u8) -> Vec<u8> {
    vec![status]
}

// --- 0x08 diagnostics ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagnosticsMessage {
    pub sub_function: u16,
    pub data: u16,
}

pub fn build_diagnostics_request(msg: DiagnosticsMessage) -> Vec<u8> {
    let mut pdu = Vec::with_capacity(5);
    pdu.push(DIAGNOSTICS);
    pdu.extend_from_slice(&msg.sub_function.to_be_bytes());
    pdu.extend_from_slice(&msg.data.to_be_bytes());
    pdu
}

pub fn parse_diagnostics_request(pdu: &[u8]) -> PduResult<DiagnosticsMessage> {
    super::expect_function_code(pdu, DIAGNOSTICS)?;
    parse_diagnostics_body(pdu)
}

/// A conforming diagnostics slave echoes the sub-function and data fields.
pub fn parse_diagnostics_response(pdu: &[u8]) -> PduResult<DiagnosticsMessage> {
    parse_response_header(pdu, DIAGNOSTICS)?;
    parse_diagnostics_body(pdu)
}

fn parse_diagnostics_body(pdu: &[u8]) -> PduResult<DiagnosticsMessage> {
    let sub_function = binary::u16_be(pdu, 1).ok_or_else(pdu_too_short)?;
    let data = binary::u16_be(pdu, 3).ok_or_else(pdu_too_short)?;
    Ok(DiagnosticsMessage { sub_function, data })
}

pub fn build_diagnostics_response(msg: DiagnosticsMessage) -> Vec<u8> {
    build_diagnostics_request(msg)[1..].to_vec()
}

// --- 0x0B get comm event counter ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommEventCounter {
    pub status: u16,
    pub event_count: u16,
}

pub fn build_comm_event_counter_request() -> Vec<u8> {
    vec![GET_COMM_EVENT_COUNTER]
}

pub fn parse_comm_event_counter_response(pdu: &[u8]) -> PduResult<CommEventCounter> {
    parse_response_header(pdu, GET_COMM_EVENT_COUNTER)?;
    let status = binary::u16_be(pdu, 1).ok_or_else(pdu_too_short)?;
    let event_count = binary::u16_be(pdu, 3).ok_or_else(pdu_too_short)?;
    Ok(CommEventCounter {
        status,
        event_count,
    })
}

// --- 0x0C get comm event log ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommEventLog {
    pub status: u16,
    pub event_count: u16,
    pub message_count: u16,
    pub events: Vec<u8>,
}

pub fn build_comm_event_log_request() -> Vec<u8> {
    vec![GET_COMM_EVENT_LOG]
}

pub fn parse_comm_event_log_response(pdu: &[u8]) -> PduResult<CommEventLog> {
    parse_response_header(pdu, GET_COMM_EVENT_LOG)?;
    let byte_count = binary::u8(pdu, 1).ok_or_else(pdu_too_short)? as usize;
    if byte_count < 6 {
        return Err(PduError::Frame(FrameError::byte_count_mismatch(
            6,
            byte_count,
        )));
    }
    let status = binary::u16_be(pdu, 2).ok_or_else(pdu_too_short)?;
    let event_count = binary::u16_be(pdu, 4).ok_or_else(pdu_too_short)?;
    let message_count = binary::u16_be(pdu, 6).ok_or_else(pdu_too_short)?;
    let events = binary::bytes(pdu, 8, byte_count - 6)
        .ok_or_else(pdu_too_short)?
        .to_vec();
    if events.len() > 64 {
        return Err(PduError::Frame(FrameError::byte_count_mismatch(
            64,
            events.len(),
        )));
    }
    Ok(CommEventLog {
        status,
        event_count,
        message_count,
        events,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_request_round_trips_through_response() {
        let msg = DiagnosticsMessage {
            sub_function: 0x0000,
            data: 0xA537,
        };
        let req = build_diagnostics_request(msg);
        assert_eq!(parse_diagnostics_request(&req).unwrap(), msg);

        let mut resp = vec![DIAGNOSTICS];
        resp.extend_from_slice(&build_diagnostics_response(msg));
        assert_eq!(parse_diagnostics_response(&resp).unwrap(), msg);
    }

    #[test]
    fn comm_event_log_rejects_byte_count_below_minimum() {
        let pdu = [GET_COMM_EVENT_LOG, 0x04, 0, 0, 0, 0];
        let err = parse_comm_event_log_response(&pdu).unwrap_err();
        assert!(matches!(err, PduError::Frame(FrameError::Structure { .. })));
    }

    #[test]
    fn comm_event_log_parses_minimal_log() {
        let pdu = [GET_COMM_EVENT_LOG, 0x06, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01];
        let log = parse_comm_event_log_response(&pdu).unwrap();
        assert_eq!(log.event_count, 1);
        assert!(log.events.is_empty());
    }
}
