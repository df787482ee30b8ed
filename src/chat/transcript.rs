//! The transcript view-model.
//!
//! A [`Transcript`] is the ordered, append-only list of messages shown for the current
//! visit to the chat screen, plus the two transient decorations around it: the welcome
//! placeholder and the typing indicator.  Every change is forwarded to the attached
//! [`Renderer`] as it happens.

use time::OffsetDateTime;
use time::format_description::FormatItem;
use time::macros::format_description;

use crate::render::Renderer;
use crate::screen::Screen;
use crate::session::Session;
use crate::types::{HistoryMessage, MessageRole, Profile};

const TIME_LABEL: &[FormatItem<'static>] = format_description!("[hour]:[minute]");

/// One rendered chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Author.
    pub role: MessageRole,
    /// Text as sent or received.
    pub content: String,
    /// When the message was rendered.
    pub timestamp: OffsetDateTime,
}

impl Message {
    /// Creates a message stamped with the current local time.
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        let timestamp = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        Self::at(role, content, timestamp)
    }

    /// Creates a message with an explicit timestamp.
    pub fn at(role: MessageRole, content: impl Into<String>, timestamp: OffsetDateTime) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp,
        }
    }

    /// `HH:MM` of the render time.
    pub fn time_label(&self) -> String {
        self.timestamp
            .format(TIME_LABEL)
            .unwrap_or_else(|_| "--:--".to_string())
    }
}

/// Messages shown on the chat screen, and the renderer that draws them.
pub struct Transcript {
    messages: Vec<Message>,
    welcome: bool,
    typing: bool,
    renderer: Box<dyn Renderer>,
}

impl Transcript {
    /// Creates an empty transcript drawing through `renderer`.
    pub fn new(renderer: Box<dyn Renderer>) -> Self {
        Self {
            messages: Vec::new(),
            welcome: false,
            typing: false,
            renderer,
        }
    }

    /// Messages in the order they were appended.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// True while the welcome placeholder is shown.
    pub fn has_welcome(&self) -> bool {
        self.welcome
    }

    /// True while the typing indicator is shown.
    pub fn is_typing(&self) -> bool {
        self.typing
    }

    /// Direct access to the renderer for output that is not part of the transcript.
    pub fn renderer_mut(&mut self) -> &mut dyn Renderer {
        self.renderer.as_mut()
    }

    /// Switches the visible screen.
    pub fn show_screen(&mut self, screen: Screen, session: Option<&Session>) {
        self.renderer.show_screen(screen, session);
    }

    /// Shows the welcome placeholder if nothing has been said yet.
    pub fn show_welcome(&mut self, session: &Session) {
        if self.messages.is_empty() && !self.welcome {
            self.welcome = true;
            self.renderer.print_welcome(session);
        }
    }

    /// Appends a message and scrolls it into view.
    pub fn append(&mut self, role: MessageRole, content: impl Into<String>) {
        self.append_message(Message::new(role, content));
    }

    /// Appends an already-built message and scrolls it into view.
    pub fn append_message(&mut self, message: Message) {
        self.clear_welcome();
        self.renderer.print_message(&message);
        self.messages.push(message);
        self.renderer.scroll_to_latest();
    }

    /// Appends server history in the order given, replacing the welcome placeholder.
    pub fn extend_from_history(&mut self, history: Vec<HistoryMessage>) -> usize {
        let count = history.len();
        for entry in history {
            self.append(entry.role, entry.content);
        }
        count
    }

    /// Shows the typing indicator after the last message.
    pub fn show_typing(&mut self) {
        if !self.typing {
            self.typing = true;
            self.renderer.show_typing();
            self.renderer.scroll_to_latest();
        }
    }

    /// Removes the typing indicator if it is shown.
    pub fn hide_typing(&mut self) {
        if self.typing {
            self.typing = false;
            self.renderer.hide_typing();
        }
    }

    /// Returns focus to the composer.
    pub fn focus_composer(&mut self) {
        self.renderer.focus_composer();
    }

    /// Forgets every message and decoration.
    pub fn reset(&mut self) {
        self.hide_typing();
        self.messages.clear();
        self.welcome = false;
        self.renderer.clear_transcript();
    }

    /// Shows an error notification.
    pub fn error(&mut self, message: &str) {
        self.renderer.print_error(message);
    }

    /// Shows an informational line.
    pub fn info(&mut self, message: &str) {
        self.renderer.print_info(message);
    }

    /// Shows a profile.
    pub fn profile(&mut self, profile: &Profile) {
        self.renderer.print_profile(profile);
    }

    fn clear_welcome(&mut self) {
        if self.welcome {
            self.welcome = false;
            self.renderer.clear_welcome();
        }
    }
}
