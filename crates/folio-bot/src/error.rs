//! Error types for the bot front-end

use folio_utils::EnvError;
use thiserror::Error;

/// Bot-level errors
#[derive(Debug, Error)]
pub enum BotError {
    /// Domain error surfaced by the core or one of its adapters
    #[error(transparent)]
    Core(#[from] folio_core::Error),

    /// ISS client could not be built
    #[error("MOEX client error: {0}")]
    Moex(#[from] folio_moex::MoexError),

    /// Ledger could not be opened
    #[error("Ledger error: {0}")]
    Ledger(#[from] folio_ledger::LedgerError),

    /// Network or HTTP error (request URL stripped, it carries the bot token)
    #[error("Network error: {0}")]
    Http(reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Telegram Bot API answered `ok: false`
    #[error("Telegram API error{}: {description}", code.map(|c| format!(" {c}")).unwrap_or_default())]
    Telegram {
        code: Option<i64>,
        description: String,
        retry_after: Option<u64>,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Console I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Dispatcher or store shut down
    #[error("{0}")]
    Other(String),
}

/// Result type alias for bot operations
pub type Result<T> = std::result::Result<T, BotError>;

impl From<reqwest::Error> for BotError {
    fn from(err: reqwest::Error) -> Self {
        BotError::Http(err.without_url())
    }
}

impl From<EnvError> for BotError {
    fn from(err: EnvError) -> Self {
        BotError::Config(err.to_string())
    }
}

impl From<url::ParseError> for BotError {
    fn from(err: url::ParseError) -> Self {
        BotError::Config(format!("invalid URL: {err}"))
    }
}
