//! Chat platform interfaces
//!
//! Platform-agnostic pieces shared by the Telegram and console front-ends:
//! message types, reply texts, per-user dialogue state and the outbound
//! [`ChatTransport`] seam.

pub mod formatter;
pub mod message;
pub mod session;

use crate::error::Result;
use async_trait::async_trait;

pub use formatter::ReplyFormatter;
pub use message::{ChatId, IncomingMessage, split_message};
pub use session::{ConversationStore, Dialogue, UserSlot};

/// Outbound side of a chat platform
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Deliver one reply to `chat`
    async fn send(&self, chat: ChatId, text: &str) -> Result<()>;
}
