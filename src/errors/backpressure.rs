use thiserror::Error;

/// Pipelined-mode registration failures (spec §7, "Backpressure").
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackpressureError {
    #[error("too many pending requests (max in-flight reached)")]
    TooManyPending,

    #[error("transaction ID 0x{0:04X} already in use")]
    TransactionIdInUse(u16),
}
