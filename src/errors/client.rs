use thiserror::Error;

use super::{
    BackoffError, BackpressureError, ConfigValidationError, CorrelationError,
    DeviceExceptionError, FrameError, TimingError, TransportError, ValidationError,
};

/// The umbrella error surfaced by the client façade, mapping every local
/// typed error from the codec/framing/transaction layers onto the taxonomy
/// of spec §7.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("device exception: {0}")]
    Device(#[from] DeviceExceptionError),

    #[error("timing error: {0}")]
    Timing(#[from] TimingError),

    #[error("correlation error: {0}")]
    Correlation(#[from] CorrelationError),

    #[error("backpressure: {0}")]
    Backpressure(#[from] BackpressureError),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigValidationError),

    #[error("backoff error: {0}")]
    Backoff(#[from] BackoffError),
}

impl ClientError {
    /// Implements spec §7's "Propagation policy": Transport/Timing/Correlation
    /// errors are retryable up to `retries + 1` attempts; Modbus exceptions
    /// and parameter/config errors are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClientError::Transport(_) | ClientError::Timing(_) | ClientError::Correlation(_)
        )
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ValidationError::new(message).into()
    }
}
