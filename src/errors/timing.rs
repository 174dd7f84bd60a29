use std::time::Duration;
use thiserror::Error;

/// Deadline violations (spec §7, "Timing").
#[derive(Error, Debug, Clone, Copy)]
pub enum TimingError {
    #[error("request timed out after {0:?}")]
    RequestTimeout(Duration),

    #[error("connect timed out after {0:?}")]
    ConnectTimeout(Duration),
}
