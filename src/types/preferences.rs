use serde::{Deserialize, Serialize};

/// Conversation preferences collected once, right after registration.
///
/// Every field may be empty.  After submission the server owns these values; the
/// client never reads them back except for the profile view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Preferred relationship style (a choice field).
    pub relationship_style: String,

    /// Free-text description of emotional needs.
    pub emotional_needs: String,

    /// Free-text list of topics the user likes to talk about.
    pub conversation_topics: String,

    /// Preferred love language (a choice field).
    pub love_language: String,
}

impl Preferences {
    /// Creates an empty set of preferences.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the relationship style.
    pub fn with_relationship_style(mut self, value: impl Into<String>) -> Self {
        self.relationship_style = value.into();
        self
    }

    /// Sets the emotional needs.
    pub fn with_emotional_needs(mut self, value: impl Into<String>) -> Self {
        self.emotional_needs = value.into();
        self
    }

    /// Sets the conversation topics.
    pub fn with_conversation_topics(mut self, value: impl Into<String>) -> Self {
        self.conversation_topics = value.into();
        self
    }

    /// Sets the love language.
    pub fn with_love_language(mut self, value: impl Into<String>) -> Self {
        self.love_language = value.into();
        self
    }

    /// Returns a copy with the free-text fields trimmed.
    ///
    /// The choice fields are submitted exactly as entered.
    pub fn normalized(&self) -> Self {
        Self {
            relationship_style: self.relationship_style.clone(),
            emotional_needs: self.emotional_needs.trim().to_string(),
            conversation_topics: self.conversation_topics.trim().to_string(),
            love_language: self.love_language.clone(),
        }
    }

    /// Returns `(label, value)` pairs for the non-empty fields.
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        [
            ("Relationship style", self.relationship_style.as_str()),
            ("Emotional needs", self.emotional_needs.as_str()),
            ("Conversation topics", self.conversation_topics.as_str()),
            ("Love language", self.love_language.as_str()),
        ]
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .collect()
    }
}

/// Body of `POST user/preferences`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferencesParams {
    /// The registered user these preferences belong to.
    pub user_id: String,

    /// The preferences themselves.
    pub preferences: Preferences,
}

impl PreferencesParams {
    /// Creates the request body for `user_id`.
    pub fn new(user_id: impl Into<String>, preferences: Preferences) -> Self {
        Self {
            user_id: user_id.into(),
            preferences,
        }
    }
}
