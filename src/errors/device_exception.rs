use thiserror::Error;

use super::kinds::ExceptionCode;

/// A Modbus exception response: the request's function code with the high
/// bit set, followed by the exception byte (spec §3, §7 "DeviceException").
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("device exception on function 0x{function:02X}: {code}")]
pub struct DeviceExceptionError {
    pub function: u8,
    pub code: ExceptionCode,
}

impl DeviceExceptionError {
    pub fn new(function: u8, code: ExceptionCode) -> Self {
        Self { function, code }
    }
}
