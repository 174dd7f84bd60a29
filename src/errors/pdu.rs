use thiserror::Error;

use super::{ClientError, DeviceExceptionError, FrameError};

/// Result type shared by every PDU builder/parser: either the frame was
/// structurally wrong, or it was well-formed but carried an exception
/// response. Kept distinct from [`ClientError`] so the codec module has no
/// dependency on the client façade; the façade flattens it on the way out.
#[derive(Error, Debug, Clone)]
pub enum PduError {
    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Exception(#[from] DeviceExceptionError),
}

impl From<PduError> for ClientError {
    fn from(err: PduError) -> Self {
        match err {
            PduError::Frame(e) => ClientError::Frame(e),
            PduError::Exception(e) => ClientError::Device(e),
        }
    }
}

pub type PduResult<T> = Result<T, PduError>;
