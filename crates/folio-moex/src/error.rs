//! Error types for the ISS client

use thiserror::Error;

/// ISS client errors
#[derive(Debug, Error)]
pub enum MoexError {
    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("ISS returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Response parsed but did not have the expected shape
    #[error("Unexpected ISS response: {0}")]
    Response(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for ISS operations
pub type Result<T> = std::result::Result<T, MoexError>;

impl From<url::ParseError> for MoexError {
    fn from(err: url::ParseError) -> Self {
        MoexError::Config(format!("invalid ISS base URL: {err}"))
    }
}

impl From<folio_utils::EnvError> for MoexError {
    fn from(err: folio_utils::EnvError) -> Self {
        MoexError::Config(err.to_string())
    }
}

/// Convert MoexError to folio_core::Error
impl From<MoexError> for folio_core::Error {
    fn from(err: MoexError) -> Self {
        match err {
            MoexError::Config(msg) => folio_core::Error::Config(msg),
            other => folio_core::Error::Gateway(other.to_string()),
        }
    }
}
