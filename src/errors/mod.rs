mod backoff;
mod backpressure;
mod client;
mod config;
mod correlation;
mod device_exception;
mod frame;
mod io_operation;
mod pdu;
mod timing;
mod transport;
mod validation;

pub mod kinds;

pub use kinds::ExceptionCode;
pub use kinds::FrameStructureKind;
pub use kinds::ProtocolMismatchKind;
pub use kinds::SerialErrorKind;

pub use backoff::BackoffError;
pub use backpressure::BackpressureError;
pub use client::ClientError;
pub use config::ConfigValidationError;
pub use correlation::CorrelationError;
pub use device_exception::DeviceExceptionError;
pub use frame::FrameError;
pub use io_operation::IoOperation;
pub use pdu::{PduError, PduResult};
pub use timing::TimingError;
pub use transport::TransportError;
pub use validation::ValidationError;
