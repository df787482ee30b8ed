use serde::{Deserialize, Serialize};

use super::Preferences;

/// Answer to `GET user/{user_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Server-assigned identifier.
    pub user_id: String,

    /// Display name.
    pub username: String,

    /// Age in years, if recorded.
    #[serde(default)]
    pub age: Option<u32>,

    /// Whether the preferences form was ever submitted.
    #[serde(default)]
    pub persona_completed: bool,

    /// Stored preferences; empty when the form was skipped.
    #[serde(default)]
    pub preferences: Preferences,
}
