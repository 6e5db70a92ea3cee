//! Chat front-end of the folio portfolio tracker
//!
//! Users record purchases of Moscow Exchange securities through a short
//! dialogue, look tickers up and ask for a portfolio summary. This crate
//! holds everything between the chat platform and `folio-core`:
//!
//! - [`bot::Command`] parsing and the [`bot::PortfolioBot`] router
//! - per-user dialogue state ([`interface::ConversationStore`])
//! - per-user mailboxes ([`dispatch::Dispatcher`])
//! - the Telegram long-polling and console front-ends ([`platforms`])
//!
//! # Example
//!
//! ```rust,ignore
//! use folio_bot::{BotConfig, PortfolioBot};
//! use folio_bot::platforms::CliBot;
//! use folio_core::UserId;
//! use folio_utils::ProcessEnv;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = BotConfig::from_env(&ProcessEnv)?;
//!     let bot = Arc::new(PortfolioBot::from_config(&config)?);
//!     CliBot::new(bot, UserId(1)).run_stdio().await?;
//!     Ok(())
//! }
//! ```

pub mod bot;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod interface;
pub mod platforms;

pub use bot::{Command, PortfolioBot};
pub use config::{BotConfig, Storage};
pub use dispatch::Dispatcher;
pub use error::{BotError, Result};
