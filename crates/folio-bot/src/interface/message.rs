//! Message types exchanged with chat transports

use folio_core::UserId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Chat a reply is delivered to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Text message received from a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub user: UserId,
    pub chat: ChatId,
    pub text: String,
}

impl IncomingMessage {
    /// Message from `user` posted in `chat`
    pub fn new(user: UserId, chat: ChatId, text: impl Into<String>) -> Self {
        Self {
            user,
            chat,
            text: text.into(),
        }
    }

    /// Private chats share the user's id
    pub fn private(user: UserId, text: impl Into<String>) -> Self {
        Self::new(user, ChatId(user.0), text)
    }
}

/// Split `text` into chunks of at most `limit` characters, preferring line breaks
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split_inclusive('\n') {
        let line_len = line.chars().count();

        if current_len + line_len > limit && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if line_len > limit {
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(limit) {
                let piece: String = piece.iter().collect();
                if current_len + piece.chars().count() > limit && !current.is_empty() {
                    chunks.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                current_len += piece.chars().count();
                current.push_str(&piece);
            }
        } else {
            current_len += line_len;
            current.push_str(line);
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
