//! Terminal client for the Ammora companion chat service.
//!
//! # Usage
//!
//! ```bash
//! # Talk to the hosted service
//! ammora-chat
//!
//! # Talk to a local server
//! ammora-chat --base-url http://localhost:5000/api/
//!
//! # Don't remember who you are between runs
//! ammora-chat --ephemeral
//!
//! # Verbose logging to stderr
//! AMMORA_LOG=debug ammora-chat
//! ```
//!
//! # Commands
//!
//! While chatting:
//! - `/help` - Show available commands
//! - `/new` - Start over as a new user
//! - `/history` - Reload the conversation
//! - `/profile` - Show your profile
//! - `/quit` - Exit the application
//!
//! On the preferences screen, `/skip` goes straight to the chat.  Ctrl+C cancels a
//! pending reply; Ctrl+D exits.

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing_subscriber::EnvFilter;

use ammora::chat::{
    ChatCommand, ClientArgs, ClientConfig, PlainTextRenderer, help_text, is_confirmation,
    parse_command,
};
use ammora::{
    Ammora, App, FileSessionStore, MemorySessionStore, Preferences, Screen, SessionStore,
};

/// Environment variable holding the log filter.
const LOG_ENV: &str = "AMMORA_LOG";

type ChatApp = App<Ammora, Box<dyn SessionStore>>;

/// Whether the main loop keeps going.
enum Flow {
    Continue,
    Quit,
}

/// One line of user input.
enum Input {
    Line(String),
    Interrupted,
    Eof,
}

/// Main entry point for the ammora-chat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ClientArgs::from_command_line_relaxed("ammora-chat [OPTIONS]");
    init_tracing();
    let config = ClientConfig::resolve(args)?;

    let client = Ammora::with_options(config.base_url.clone(), Some(config.timeout))?;
    tracing::info!(base_url = %client.base_url(), timeout = ?client.timeout(), "starting");

    let store: Box<dyn SessionStore> = match config.session_path() {
        Some(path) => {
            tracing::debug!(path = %path.display(), "using session file");
            Box::new(FileSessionStore::new(path))
        }
        None => Box::new(MemorySessionStore::new()),
    };
    let renderer = PlainTextRenderer::with_color(config.use_color);
    let mut app = App::new(client, store, Box::new(renderer));
    let mut rl = DefaultEditor::new()?;

    // Ctrl+C while waiting on the server abandons the request
    let cancel = app.cancel_handle();
    ctrlc::set_handler(move || cancel.cancel())?;

    app.start().await;
    loop {
        let flow = match app.screen() {
            Screen::Onboarding => onboarding(&mut rl, &mut app).await?,
            Screen::Preferences => preferences(&mut rl, &mut app).await?,
            Screen::Chat => chat(&mut rl, &mut app).await?,
        };
        if let Flow::Quit = flow {
            break;
        }
    }
    println!("\nGoodbye!");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn read_line(rl: &mut DefaultEditor, prompt: &str) -> Result<Input, ReadlineError> {
    match rl.readline(prompt) {
        Ok(line) => {
            if !line.trim().is_empty() {
                let _ = rl.add_history_entry(line.as_str());
            }
            Ok(Input::Line(line))
        }
        Err(ReadlineError::Interrupted) => {
            println!();
            Ok(Input::Interrupted)
        }
        Err(ReadlineError::Eof) => Ok(Input::Eof),
        Err(err) => Err(err),
    }
}

/// Reads one onboarding or preferences field.  `None` means the form was abandoned.
fn read_field(
    rl: &mut DefaultEditor,
    app: &ChatApp,
    prompt: &str,
) -> Result<Option<Result<String, Flow>>, ReadlineError> {
    loop {
        let line = match read_line(rl, prompt)? {
            Input::Line(line) => line,
            Input::Interrupted => return Ok(None),
            Input::Eof => return Ok(Some(Err(Flow::Quit))),
        };
        match parse_command(&line) {
            None => return Ok(Some(Ok(line))),
            Some(ChatCommand::Quit) => return Ok(Some(Err(Flow::Quit))),
            Some(ChatCommand::Skip) if app.screen() == Screen::Preferences => {
                return Ok(Some(Err(Flow::Continue)));
            }
            Some(ChatCommand::Help) => print_help(app),
            Some(ChatCommand::Invalid(message)) => app.show_error(&message),
            Some(_) => app.show_error("That command is only available while chatting."),
        }
    }
}

async fn onboarding(rl: &mut DefaultEditor, app: &mut ChatApp) -> Result<Flow, ReadlineError> {
    let username = match read_field(rl, app, "Username: ")? {
        Some(Ok(value)) => value,
        Some(Err(flow)) => return Ok(flow),
        None => return Ok(Flow::Continue),
    };
    let age = match read_field(rl, app, "Age: ")? {
        Some(Ok(value)) => value,
        Some(Err(flow)) => return Ok(flow),
        None => return Ok(Flow::Continue),
    };
    // Failures are already on screen; the loop asks again.
    let _ = app.register(&username, &age).await;
    Ok(Flow::Continue)
}

async fn preferences(rl: &mut DefaultEditor, app: &mut ChatApp) -> Result<Flow, ReadlineError> {
    let prompts = [
        "Relationship style (e.g. friend, partner, mentor): ",
        "What do you need emotionally? ",
        "Topics you like to talk about: ",
        "Love language (e.g. words, time, gifts, acts, touch): ",
    ];
    let mut answers = Vec::with_capacity(prompts.len());
    for prompt in prompts {
        match read_field(rl, app, prompt)? {
            Some(Ok(value)) => answers.push(value),
            Some(Err(Flow::Continue)) => {
                let _ = app.skip_preferences();
                return Ok(Flow::Continue);
            }
            Some(Err(Flow::Quit)) => return Ok(Flow::Quit),
            None => return Ok(Flow::Continue),
        }
    }
    let mut answers = answers.into_iter();
    let mut next = || answers.next().unwrap_or_default();
    let preferences = Preferences::new()
        .with_relationship_style(next())
        .with_emotional_needs(next())
        .with_conversation_topics(next())
        .with_love_language(next());
    let _ = app.save_preferences(preferences).await;
    Ok(Flow::Continue)
}

async fn chat(rl: &mut DefaultEditor, app: &mut ChatApp) -> Result<Flow, ReadlineError> {
    let line = match read_line(rl, "You: ")? {
        Input::Line(line) => line,
        Input::Interrupted => return Ok(Flow::Continue),
        Input::Eof => return Ok(Flow::Quit),
    };

    let Some(command) = parse_command(&line) else {
        let _ = app.submit(&line).await;
        return Ok(Flow::Continue);
    };
    match command {
        ChatCommand::Quit => return Ok(Flow::Quit),
        ChatCommand::Help => print_help(app),
        ChatCommand::NewChat => {
            let prompt = "Start a new chat? This forgets who you are on this device. [y/N] ";
            let confirmed = match read_line(rl, prompt)? {
                Input::Line(answer) => is_confirmation(&answer),
                Input::Interrupted => false,
                Input::Eof => return Ok(Flow::Quit),
            };
            let _ = app.new_chat(confirmed);
        }
        ChatCommand::History => {
            if let Ok(None) = app.reload_history().await {
                app.show_error("Could not load your conversation. Please try again.");
            }
        }
        ChatCommand::Profile => {
            let _ = app.profile().await;
        }
        ChatCommand::Skip => app.show_error("There is nothing to skip here."),
        ChatCommand::Invalid(message) => app.show_error(&message),
    }
    Ok(Flow::Continue)
}

fn print_help(app: &ChatApp) {
    let text = help_text()
        .lines()
        .map(|line| format!("    {line}"))
        .collect::<Vec<_>>()
        .join("\n");
    app.show_info(&text);
}
