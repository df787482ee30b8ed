//! Slash command parsing for the terminal client.
//!
//! Input that starts with `/` controls the client instead of being sent to the
//! assistant.

/// A parsed slash command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Display help information.
    Help,

    /// Forget the session and return to onboarding (after confirmation).
    NewChat,

    /// Reload the conversation history from the server.
    History,

    /// Show the stored profile.
    Profile,

    /// Skip the preferences form.
    Skip,

    /// Exit the client.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `None` if the input should be treated as a regular message.
///
/// # Examples
///
/// ```
/// # use ammora::chat::{ChatCommand, parse_command};
/// assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
/// assert!(parse_command("Hello, Ammora!").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let mut parts = rest.splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "help" | "?" => no_argument(argument, ChatCommand::Help, "/help"),
        "new" | "reset" => no_argument(argument, ChatCommand::NewChat, "/new"),
        "history" => no_argument(argument, ChatCommand::History, "/history"),
        "profile" | "me" => no_argument(argument, ChatCommand::Profile, "/profile"),
        "skip" => no_argument(argument, ChatCommand::Skip, "/skip"),
        "quit" | "exit" | "q" => ChatCommand::Quit,
        "" => ChatCommand::Invalid("Empty command. Type /help for commands.".to_string()),
        other => ChatCommand::Invalid(format!("Unknown command: /{other}")),
    };
    Some(result)
}

fn no_argument(argument: Option<&str>, command: ChatCommand, name: &str) -> ChatCommand {
    match argument {
        None => command,
        Some(_) => ChatCommand::Invalid(format!("{name} takes no arguments")),
    }
}

/// True if `answer` confirms a yes/no prompt.  Anything but an explicit yes declines.
pub fn is_confirmation(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Returns the help text for available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /new                   Start over as a new user (clears this session)
  /history               Reload the conversation from the server
  /profile               Show your profile and preferences
  /help                  Show this help message
  /quit                  Exit the chat

On the preferences screen, /skip goes straight to the chat."#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_quit_commands() {
        assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/exit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/q"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("  /quit  "), Some(ChatCommand::Quit));
    }

    #[test]
    fn parse_new_chat() {
        assert_eq!(parse_command("/new"), Some(ChatCommand::NewChat));
        assert_eq!(parse_command("/NEW"), Some(ChatCommand::NewChat));
        assert_eq!(parse_command("/reset"), Some(ChatCommand::NewChat));
        assert!(matches!(
            parse_command("/new please"),
            Some(ChatCommand::Invalid(_))
        ));
    }

    #[test]
    fn parse_other_commands() {
        assert_eq!(parse_command("/help"), Some(ChatCommand::Help));
        assert_eq!(parse_command("/?"), Some(ChatCommand::Help));
        assert_eq!(parse_command("/history"), Some(ChatCommand::History));
        assert_eq!(parse_command("/profile"), Some(ChatCommand::Profile));
        assert_eq!(parse_command("/skip"), Some(ChatCommand::Skip));
    }

    #[test]
    fn parse_unknown_command() {
        assert_eq!(
            parse_command("/dance"),
            Some(ChatCommand::Invalid("Unknown command: /dance".to_string()))
        );
        assert!(matches!(parse_command("/"), Some(ChatCommand::Invalid(_))));
    }

    #[test]
    fn regular_messages_are_not_commands() {
        assert!(parse_command("Hello").is_none());
        assert!(parse_command("I feel 1/2 ready").is_none());
        assert!(parse_command("").is_none());
    }

    #[test]
    fn confirmation_answers() {
        assert!(is_confirmation("y"));
        assert!(is_confirmation(" Yes "));
        assert!(!is_confirmation(""));
        assert!(!is_confirmation("n"));
        assert!(!is_confirmation("sure"));
    }

    #[test]
    fn help_mentions_every_command() {
        let help = help_text();
        for name in ["/new", "/history", "/profile", "/help", "/quit", "/skip"] {
            assert!(help.contains(name), "missing {name}");
        }
    }
}
