use thiserror::Error;

/// Parameter validation failures raised before any byte is built
/// (spec §7, "Validation"). Never retryable.
#[derive(Error, Debug, Clone)]
#[error("invalid parameter: {0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
