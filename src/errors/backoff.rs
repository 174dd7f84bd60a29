use thiserror::Error;

/// Reconnection has no attempt cap (spec §4.8) so the only failure mode
/// left here is a malformed strategy configuration.
#[derive(Error, Debug, Clone)]
pub enum BackoffError {
    #[error("invalid backoff configuration: {0}")]
    InvalidConfig(String),
}
