//! PDU codec: one builder and one parser per supported function code, plus
//! the exception-response path every parser shares (spec §4.3).

pub mod device_identification;
pub mod diagnostics;
pub mod file_record;
pub mod fifo;
pub mod mask_write;
pub mod read_bits;
pub mod read_registers;
pub mod read_write_registers;
pub mod write_multiple;
pub mod write_single;

use crate::binary;
use crate::errors::{DeviceExceptionError, ExceptionCode, FrameError, PduError, PduResult};

/// High bit marking a response as an exception (spec §3).
pub const EXCEPTION_BIT: u8 = 0x80;

/// Checks the exception bit before anything else checks function-code
/// equality (spec §4.3 "Exception precedence"). Returns `Ok(())` when `pdu`
/// is not an exception response for `expected_fc`.
pub fn check_exception(pdu: &[u8], expected_fc: u8) -> PduResult<()> {
    let fc = binary::u8(pdu, 0).ok_or_else(|| PduError::Frame(FrameError::pdu_too_short("empty PDU")))?;
    if fc == expected_fc | EXCEPTION_BIT {
        let raw = binary::u8(pdu, 1)
            .ok_or_else(|| PduError::Frame(FrameError::pdu_too_short("exception code missing")))?;
        return Err(PduError::Exception(DeviceExceptionError::new(
            expected_fc,
            ExceptionCode::from_u8(raw),
        )));
    }
    Ok(())
}

/// After the exception check passes, verifies the function code matches
/// exactly.
pub fn expect_function_code(pdu: &[u8], expected_fc: u8) -> PduResult<()> {
    let fc = binary::u8(pdu, 0).ok_or_else(|| PduError::Frame(FrameError::pdu_too_short("empty PDU")))?;
    if fc != expected_fc {
        return Err(PduError::Frame(FrameError::unexpected_function_code(
            expected_fc,
            fc,
        )));
    }
    Ok(())
}

/// Runs the shared parser prelude: exception check, then function-code match.
/// Every response parser starts here.
pub fn parse_response_header(pdu: &[u8], expected_fc: u8) -> PduResult<()> {
    check_exception(pdu, expected_fc)?;
    expect_function_code(pdu, expected_fc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exception_precedes_function_code_check() {
        // 0x83 = 0x03 | 0x80, so this must surface as an exception, never
        // as unexpected-function-code even though 0x83 != 0x03.
        let pdu = [0x83, 0x02];
        let err = parse_response_header(&pdu, 0x03).unwrap_err();
        assert!(matches!(err, PduError::Exception(e) if e.code == ExceptionCode::IllegalDataAddress));
    }

    #[test]
    fn rejects_wrong_function_code() {
        let pdu = [0x04, 0x00];
        let err = parse_response_header(&pdu, 0x03).unwrap_err();
        assert!(matches!(err, PduError::Frame(FrameError::Structure { .. })));
    }

    #[test]
    fn rejects_empty_pdu() {
        let err = parse_response_header(&[], 0x03).unwrap_err();
        assert!(matches!(err, PduError::Frame(FrameError::Structure { .. })));
    }
}
