//! The chat screen and the terminal client around it.
//!
//! # Architecture
//!
//! - [`transcript`]: the rendered, append-only message list
//! - [`pipeline`]: submitting messages, the busy gate, cancellation and history
//! - [`commands`]: slash command parsing
//! - [`config`]: CLI argument parsing and configuration

mod commands;
mod config;
mod pipeline;
mod transcript;

pub use crate::render::{PlainTextRenderer, Renderer};
pub use commands::{ChatCommand, help_text, is_confirmation, parse_command};
pub use config::{ClientArgs, ClientConfig, ConfigFile};
pub use pipeline::{CHAT_FALLBACK, CancelHandle, ChatPipeline, SubmitOutcome};
pub use transcript::{Message, Transcript};
