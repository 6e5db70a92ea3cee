//! Configuration for the portfolio bot

use crate::error::{BotError, Result};
use crate::interface::session::{DEFAULT_CONVERSATION_TTL, DEFAULT_MAX_CONVERSATIONS};
use crate::platforms::TelegramConfig;
use folio_moex::MoexConfig;
use folio_utils::{EnvSource, LogFormat};
use std::path::PathBuf;
use std::time::Duration;

/// Default SQLite file, relative to the working directory
pub const DEFAULT_DATABASE_PATH: &str = "./app_data/database.db";

/// Where holdings are kept
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Storage {
    /// SQLite file
    Sqlite(PathBuf),
    /// Process memory, lost on exit
    Memory,
}

impl Default for Storage {
    fn default() -> Self {
        Self::Sqlite(PathBuf::from(DEFAULT_DATABASE_PATH))
    }
}

/// Configuration for the portfolio bot
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Ledger backend
    pub storage: Storage,

    /// Idle period after which a dialogue is dropped
    pub conversation_ttl: Duration,

    /// Upper bound on users with tracked dialogue state
    pub max_conversations: usize,

    /// Label printed next to portfolio values
    pub currency: String,

    /// Market data source
    pub moex: MoexConfig,

    /// Telegram transport; `None` when no token is configured
    pub telegram: Option<TelegramConfig>,

    /// Log output format
    pub log_format: LogFormat,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            storage: Storage::default(),
            conversation_ttl: DEFAULT_CONVERSATION_TTL,
            max_conversations: DEFAULT_MAX_CONVERSATIONS,
            currency: "RUB".to_string(),
            moex: MoexConfig::default(),
            telegram: None,
            log_format: LogFormat::default(),
        }
    }
}

impl BotConfig {
    /// Create a new configuration builder
    pub fn builder() -> BotConfigBuilder {
        BotConfigBuilder::default()
    }

    /// Load from `FOLIO_*` variables and the Telegram token
    pub fn from_env(env: &impl EnvSource) -> Result<Self> {
        let mut builder = Self::builder().moex(MoexConfig::from_env(env)?);

        if let Some(path) = env.var("FOLIO_DB_PATH") {
            builder = builder.storage(Storage::Sqlite(PathBuf::from(path)));
        }
        if let Some(secs) = env.parsed::<u64>("FOLIO_CONVERSATION_TTL_SECS")? {
            builder = builder.conversation_ttl(Duration::from_secs(secs));
        }
        if let Some(max) = env.parsed::<usize>("FOLIO_MAX_CONVERSATIONS")? {
            builder = builder.max_conversations(max);
        }
        if let Some(currency) = env.var("FOLIO_CURRENCY") {
            builder = builder.currency(currency);
        }
        if let Some(format) = env.parsed::<LogFormat>("FOLIO_LOG_FORMAT")? {
            builder = builder.log_format(format);
        }
        if env.var("TELEGRAM_BOT_TOKEN").is_some() || env.var("API_TOKEN").is_some() {
            builder = builder.telegram(TelegramConfig::from_env(env)?);
        }

        builder.build()
    }

    /// Telegram settings, or an error naming the missing token
    pub fn require_telegram(&self) -> Result<&TelegramConfig> {
        self.telegram
            .as_ref()
            .ok_or_else(|| BotError::Config("TELEGRAM_BOT_TOKEN not set".to_string()))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.conversation_ttl.is_zero() {
            return Err(BotError::Config(
                "conversation_ttl must be greater than 0".to_string(),
            ));
        }

        if self.max_conversations == 0 {
            return Err(BotError::Config(
                "max_conversations must be greater than 0".to_string(),
            ));
        }

        if self.currency.trim().is_empty() {
            return Err(BotError::Config("currency label must not be empty".to_string()));
        }

        if let Storage::Sqlite(path) = &self.storage {
            if path.as_os_str().is_empty() {
                return Err(BotError::Config("database path must not be empty".to_string()));
            }
        }

        self.moex.validate()?;
        if let Some(telegram) = &self.telegram {
            telegram.validate()?;
        }

        Ok(())
    }
}

/// Builder for BotConfig
#[derive(Debug, Default)]
pub struct BotConfigBuilder {
    storage: Option<Storage>,
    conversation_ttl: Option<Duration>,
    max_conversations: Option<usize>,
    currency: Option<String>,
    moex: Option<MoexConfig>,
    telegram: Option<TelegramConfig>,
    log_format: Option<LogFormat>,
}

impl BotConfigBuilder {
    /// Set the ledger storage
    pub fn storage(mut self, storage: Storage) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Set the idle period of a dialogue
    pub fn conversation_ttl(mut self, ttl: Duration) -> Self {
        self.conversation_ttl = Some(ttl);
        self
    }

    /// Set the maximum number of tracked users
    pub fn max_conversations(mut self, max: usize) -> Self {
        self.max_conversations = Some(max);
        self
    }

    /// Set the currency label of portfolio values
    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    /// Set the ISS client configuration
    pub fn moex(mut self, config: MoexConfig) -> Self {
        self.moex = Some(config);
        self
    }

    /// Set the Telegram configuration
    pub fn telegram(mut self, config: TelegramConfig) -> Self {
        self.telegram = Some(config);
        self
    }

    /// Set the log output format
    pub fn log_format(mut self, format: LogFormat) -> Self {
        self.log_format = Some(format);
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<BotConfig> {
        let defaults = BotConfig::default();

        let config = BotConfig {
            storage: self.storage.unwrap_or(defaults.storage),
            conversation_ttl: self.conversation_ttl.unwrap_or(defaults.conversation_ttl),
            max_conversations: self.max_conversations.unwrap_or(defaults.max_conversations),
            currency: self.currency.unwrap_or(defaults.currency),
            moex: self.moex.unwrap_or(defaults.moex),
            telegram: self.telegram.or(defaults.telegram),
            log_format: self.log_format.unwrap_or(defaults.log_format),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_default_config() {
        let config = BotConfig::default();
        assert_eq!(config.storage, Storage::Sqlite(PathBuf::from(DEFAULT_DATABASE_PATH)));
        assert_eq!(config.conversation_ttl, Duration::from_secs(1800));
        assert_eq!(config.max_conversations, 10_000);
        assert_eq!(config.currency, "RUB");
        assert!(config.telegram.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = BotConfig::builder()
            .storage(Storage::Memory)
            .conversation_ttl(Duration::from_secs(60))
            .max_conversations(5)
            .currency("USD")
            .build()
            .unwrap();

        assert_eq!(config.storage, Storage::Memory);
        assert_eq!(config.conversation_ttl, Duration::from_secs(60));
        assert_eq!(config.max_conversations, 5);
        assert_eq!(config.currency, "USD");
    }

    #[test]
    fn test_config_validation() {
        assert!(BotConfig::builder().max_conversations(0).build().is_err());
        assert!(BotConfig::builder().conversation_ttl(Duration::ZERO).build().is_err());
        assert!(BotConfig::builder().currency(" ").build().is_err());
    }

    #[test]
    fn test_config_from_env() {
        let config = BotConfig::from_env(&env(&[
            ("FOLIO_DB_PATH", "/tmp/folio.db"),
            ("FOLIO_CONVERSATION_TTL_SECS", "120"),
            ("FOLIO_LOG_FORMAT", "json"),
            ("FOLIO_ISS_BOARD", "tqtf"),
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
        ]))
        .unwrap();

        assert_eq!(config.storage, Storage::Sqlite(PathBuf::from("/tmp/folio.db")));
        assert_eq!(config.conversation_ttl, Duration::from_secs(120));
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.moex.board, "TQTF");
        assert_eq!(config.require_telegram().unwrap().token, "123:abc");
    }

    #[test]
    fn test_config_from_env_without_token() {
        let config = BotConfig::from_env(&env(&[])).unwrap();
        assert!(config.telegram.is_none());
        assert!(config.require_telegram().is_err());

        assert!(BotConfig::from_env(&env(&[("FOLIO_MAX_CONVERSATIONS", "many")])).is_err());
    }
}
