// Public modules
pub mod chat_params;
pub mod message_history;
pub mod message_role;
pub mod preferences;
pub mod profile;
pub mod register;

// Re-exports
pub use chat_params::{ChatParams, ChatReply};
pub use message_history::{HistoryMessage, MessageHistory};
pub use message_role::MessageRole;
pub use preferences::{Preferences, PreferencesParams};
pub use profile::Profile;
pub use register::{RegisterParams, RegisteredUser};
