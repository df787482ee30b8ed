use serde::{Deserialize, Serialize};

use super::MessageRole;

/// One stored message as returned by `GET messages/{user_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryMessage {
    /// Author of the message.
    pub role: MessageRole,

    /// Message text.
    pub content: String,
}

impl HistoryMessage {
    /// Creates a history entry.
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Answer to `GET messages/{user_id}`, oldest message first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageHistory {
    /// Messages in chronological order.
    #[serde(default)]
    pub messages: Vec<HistoryMessage>,
}
