use serde::{Deserialize, Serialize};

/// Body of `POST user/register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterParams {
    /// Display name chosen during onboarding.
    pub username: String,

    /// Age in years.
    pub age: u32,
}

impl RegisterParams {
    /// Creates registration parameters.
    pub fn new(username: impl Into<String>, age: u32) -> Self {
        Self {
            username: username.into(),
            age,
        }
    }
}

/// Successful answer to `POST user/register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredUser {
    /// Server-assigned identifier used on every later request.
    pub user_id: String,

    /// Display name as the server stored it.
    pub username: String,

    /// Informational text from the server, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
