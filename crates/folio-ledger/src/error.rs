//! Error types for the SQLite ledger

use thiserror::Error;

/// Ledger storage errors
#[derive(Debug, Error)]
pub enum LedgerError {
    /// SQLite returned an error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Database directory could not be prepared
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored row could not be turned back into a holding
    #[error("Corrupt row in {table}: {reason}")]
    Corrupt { table: &'static str, reason: String },

    /// Database was created by a newer version of folio
    #[error("Unsupported schema version {found} (expected at most {supported})")]
    SchemaVersion { found: i64, supported: i64 },

    /// Connection mutex poisoned by a panicking writer
    #[error("Connection lock poisoned: {0}")]
    Poisoned(String),

    /// Blocking task was cancelled or panicked
    #[error("Blocking task failed: {0}")]
    Task(String),
}

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Convert LedgerError to folio_core::Error
impl From<LedgerError> for folio_core::Error {
    fn from(err: LedgerError) -> Self {
        folio_core::Error::Ledger(err.to_string())
    }
}
