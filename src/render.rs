//! Output rendering for the client.
//!
//! The application and chat pipeline only ever describe *what* changed (a screen
//! switch, an appended message, the typing indicator appearing or going away); a
//! [`Renderer`] decides how that looks.  [`PlainTextRenderer`] draws to a terminal with
//! optional ANSI styling.

use std::io::{self, Stdout, Write};

use crate::chat::Message;
use crate::screen::Screen;
use crate::session::Session;
use crate::types::{MessageRole, Profile};

/// ANSI escape code for bold text (used for screen headings).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code for dim text (used for timestamps and the typing indicator).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for headings).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for green text (used for the user's name).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// ANSI escape code for magenta text (used for the assistant's name).
const ANSI_MAGENTA: &str = "\x1b[35m";

/// ANSI escape code to erase the current line.
const ANSI_ERASE_LINE: &str = "\x1b[2K";

/// Name shown for assistant messages.
pub const ASSISTANT_NAME: &str = "Ammora";

const TYPING_TEXT: &str = "Ammora is typing...";

/// Trait for rendering client output.
pub trait Renderer: Send {
    /// Make `screen` the visible one.  `session` is set whenever one exists.
    fn show_screen(&mut self, screen: Screen, session: Option<&Session>);

    /// Show the placeholder that greets an empty transcript.
    fn print_welcome(&mut self, session: &Session);

    /// Remove the welcome placeholder.
    fn clear_welcome(&mut self) {}

    /// Append one message to the transcript.
    fn print_message(&mut self, message: &Message);

    /// Show the typing indicator below the last message.
    fn show_typing(&mut self);

    /// Remove the typing indicator.
    fn hide_typing(&mut self);

    /// Bring the newest transcript entry into view.
    fn scroll_to_latest(&mut self) {}

    /// Drop everything shown in the transcript.
    fn clear_transcript(&mut self) {}

    /// Return input focus to the message composer.
    fn focus_composer(&mut self) {}

    /// Print the user's stored profile.
    fn print_profile(&mut self, profile: &Profile);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
    typing: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
            typing: false,
        }
    }

    /// Flushes stdout to ensure immediate display.
    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }

    fn paint(&self, style: &str, text: &str) -> String {
        if self.use_color {
            format!("{style}{text}{ANSI_RESET}")
        } else {
            text.to_string()
        }
    }

    fn heading(&mut self, text: &str) {
        let style = format!("{ANSI_BOLD}{ANSI_CYAN}");
        println!("\n{}", self.paint(&style, text));
        self.flush();
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn show_screen(&mut self, screen: Screen, session: Option<&Session>) {
        self.hide_typing();
        match screen {
            Screen::Onboarding => {
                self.heading("Welcome to Ammora");
                println!("Tell us who you are to get started.");
            }
            Screen::Preferences => {
                self.heading("Your preferences");
                println!("Help Ammora get to know you. Every field is optional; type /skip to skip.");
            }
            Screen::Chat => {
                let name = session.map(|s| s.username.as_str()).unwrap_or("you");
                self.heading(&format!("Chatting as {name}"));
                println!("Type /help for commands, /quit to exit.");
            }
        }
        self.flush();
    }

    fn print_welcome(&mut self, session: &Session) {
        let text = format!(
            "Hi {}! Say hello to start the conversation.",
            session.username
        );
        println!("{}", self.paint(ANSI_DIM, &text));
        self.flush();
    }

    fn print_message(&mut self, message: &Message) {
        self.hide_typing();
        let (name, style) = match message.role {
            MessageRole::User => ("You", ANSI_GREEN),
            MessageRole::Assistant => (ASSISTANT_NAME, ANSI_MAGENTA),
        };
        let stamp = self.paint(ANSI_DIM, &format!("[{}]", message.time_label()));
        let name = self.paint(style, &format!("{name}:"));
        println!("{stamp} {name} {}", message.content);
        self.flush();
    }

    fn show_typing(&mut self) {
        if self.typing {
            return;
        }
        print!("{}", self.paint(ANSI_DIM, TYPING_TEXT));
        self.typing = true;
        self.flush();
    }

    fn hide_typing(&mut self) {
        if !self.typing {
            return;
        }
        if self.use_color {
            print!("\r{ANSI_ERASE_LINE}");
        } else {
            print!("\r{:width$}\r", "", width = TYPING_TEXT.len());
        }
        self.typing = false;
        self.flush();
    }

    fn focus_composer(&mut self) {
        self.hide_typing();
        self.flush();
    }

    fn print_profile(&mut self, profile: &Profile) {
        println!("    Profile:");
        println!("      Name: {}", profile.username);
        match profile.age {
            Some(age) => println!("      Age: {age}"),
            None => println!("      Age: (unknown)"),
        }
        let entries = profile.preferences.entries();
        if entries.is_empty() {
            println!("      Preferences: (none)");
        } else {
            println!("      Preferences:");
            for (label, value) in entries {
                println!("        {label}: {value}");
            }
        }
        self.flush();
    }

    fn print_error(&mut self, error: &str) {
        self.hide_typing();
        eprintln!("{}", self.paint(ANSI_RED, &format!("Error: {error}")));
    }

    fn print_info(&mut self, info: &str) {
        self.hide_typing();
        println!("{info}");
        self.flush();
    }
}
