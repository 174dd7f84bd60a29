mod exception_code;
mod frame_structure;
mod protocol_mismatch;
mod serial_error;

pub use exception_code::ExceptionCode;
pub use frame_structure::FrameStructureKind;
pub use protocol_mismatch::ProtocolMismatchKind;
pub use serial_error::SerialErrorKind;
