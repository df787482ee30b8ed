use serde::{Deserialize, Serialize};

/// Body of `POST chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatParams {
    /// The registered user sending the message.
    pub user_id: String,

    /// Message text, already trimmed.
    pub message: String,
}

impl ChatParams {
    /// Creates a chat request body.
    pub fn new(user_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            message: message.into(),
        }
    }
}

/// Successful answer to `POST chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    /// The assistant's reply.
    pub message: String,

    /// Model that produced the reply, when the server reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}
