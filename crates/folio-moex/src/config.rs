//! Configuration for the ISS client

use crate::error::{MoexError, Result};
use folio_utils::EnvSource;
use std::time::Duration;
use url::Url;

/// Public ISS endpoint
pub const DEFAULT_BASE_URL: &str = "https://iss.moex.com/iss";

/// Main board for shares in T+ mode
pub const DEFAULT_BOARD: &str = "TQBR";

/// Configuration for [`MoexClient`](crate::MoexClient)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoexConfig {
    /// ISS root, e.g. `https://iss.moex.com/iss`
    pub base_url: String,

    /// Trading board used for price quotes
    pub board: String,

    /// Request timeout duration
    pub request_timeout: Duration,

    /// Upper bound on outgoing requests per second
    pub requests_per_second: u32,
}

impl Default for MoexConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            board: DEFAULT_BOARD.to_string(),
            request_timeout: Duration::from_secs(10),
            requests_per_second: 10,
        }
    }
}

impl MoexConfig {
    /// Create a new configuration builder
    pub fn builder() -> MoexConfigBuilder {
        MoexConfigBuilder::default()
    }

    /// Load overrides from `FOLIO_ISS_*` variables
    pub fn from_env(env: &impl EnvSource) -> Result<Self> {
        let mut builder = Self::builder();
        if let Some(url) = env.var("FOLIO_ISS_URL") {
            builder = builder.base_url(url);
        }
        if let Some(board) = env.var("FOLIO_ISS_BOARD") {
            builder = builder.board(board);
        }
        if let Some(secs) = env.parsed::<u64>("FOLIO_ISS_TIMEOUT_SECS")? {
            builder = builder.request_timeout(Duration::from_secs(secs));
        }
        if let Some(rps) = env.parsed::<u32>("FOLIO_ISS_RPS")? {
            builder = builder.requests_per_second(rps);
        }
        builder.build()
    }

    /// Parsed base URL
    pub fn base_url(&self) -> Result<Url> {
        let url = Url::parse(&self.base_url)?;
        if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
            return Err(MoexError::Config(format!(
                "ISS base URL must be http(s): {}",
                self.base_url
            )));
        }
        Ok(url)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.base_url()?;

        if self.board.trim().is_empty() {
            return Err(MoexError::Config("board must not be empty".to_string()));
        }

        if self.request_timeout.is_zero() {
            return Err(MoexError::Config(
                "request_timeout must be greater than 0".to_string(),
            ));
        }

        if self.requests_per_second == 0 {
            return Err(MoexError::Config(
                "requests_per_second must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for MoexConfig
#[derive(Debug, Default)]
pub struct MoexConfigBuilder {
    base_url: Option<String>,
    board: Option<String>,
    request_timeout: Option<Duration>,
    requests_per_second: Option<u32>,
}

impl MoexConfigBuilder {
    /// Set the ISS root URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the board used for quotes
    pub fn board(mut self, board: impl Into<String>) -> Self {
        self.board = Some(board.into());
        self
    }

    /// Set request timeout
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = Some(duration);
        self
    }

    /// Set the outgoing request rate
    pub fn requests_per_second(mut self, rps: u32) -> Self {
        self.requests_per_second = Some(rps);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<MoexConfig> {
        let defaults = MoexConfig::default();

        let config = MoexConfig {
            base_url: self.base_url.unwrap_or(defaults.base_url),
            board: self
                .board
                .map(|b| b.trim().to_uppercase())
                .unwrap_or(defaults.board),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            requests_per_second: self
                .requests_per_second
                .unwrap_or(defaults.requests_per_second),
        };

        config.validate()?;
        Ok(config)
    }
}
