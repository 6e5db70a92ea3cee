//! Platform-specific front-ends

pub mod cli;
pub mod telegram;

pub use cli::CliBot;
pub use telegram::{TelegramApi, TelegramBot, TelegramConfig};
