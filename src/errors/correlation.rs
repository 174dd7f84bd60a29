use thiserror::Error;

/// ADU-level correlation mismatches between a request and its response
/// (spec §7, "Correlation").
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrelationError {
    #[error("transaction ID mismatch: expected {expected}, got {got}")]
    TransactionIdMismatch { expected: u16, got: u16 },

    #[error("unit ID mismatch: expected {expected}, got {got}")]
    UnitIdMismatch { expected: u8, got: u8 },
}
