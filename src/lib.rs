// Public modules
pub mod app;
pub mod chat;
pub mod client;
pub mod error;
pub mod observability;
pub mod render;
pub mod screen;
pub mod session;
pub mod types;

#[cfg(test)]
mod testing;

// Re-exports
pub use app::App;
pub use client::{Ammora, ChatBackend};
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use screen::{Screen, ScreenController, Transition};
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionStore};
pub use types::*;
