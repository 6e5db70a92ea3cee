//! Error types for folio-core

use thiserror::Error;

/// Result type alias for folio-core
pub type Result<T> = std::result::Result<T, Error>;

/// Error type shared by the core traits and their adapters
#[derive(Error, Debug)]
pub enum Error {
    /// Market-data lookup failed or timed out
    #[error("Market data unavailable: {0}")]
    Gateway(String),

    /// Ledger read or write failed
    #[error("Ledger error: {0}")]
    Ledger(String),

    /// User input rejected before reaching a collaborator
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Amount does not fit in the decimal range
    #[error("Value out of range: {0}")]
    OutOfRange(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether retrying the same request later may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Gateway(_) | Self::Ledger(_))
    }
}
