//! Configuration for the terminal client.
//!
//! Settings come from three places, strongest first: command-line arguments parsed
//! with `arrrg`, the `AMMORA_API_URL` environment variable (base URL only), and an
//! optional YAML file named with `--config`.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use arrrg_derive::CommandLine;
use serde::Deserialize;

use crate::client::{API_URL_ENV, DEFAULT_TIMEOUT};
use crate::error::{Error, Result};
use crate::session::FileSessionStore;

/// Command-line arguments for the ammora-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ClientArgs {
    /// Base URL of the Ammora API.
    #[arrrg(optional, "Base URL of the API (default: https://ammora.onrender.com/api/)", "URL")]
    pub base_url: Option<String>,

    /// Request timeout in seconds.
    #[arrrg(optional, "Request timeout in seconds (default: 60)", "SECONDS")]
    pub timeout_secs: Option<u64>,

    /// Where the session is persisted.
    #[arrrg(optional, "Session file (default: <data dir>/ammora/session.json)", "PATH")]
    pub session_file: Option<String>,

    /// YAML configuration file.
    #[arrrg(optional, "YAML configuration file", "FILE")]
    pub config: Option<String>,

    /// Keep the session in memory only.
    #[arrrg(flag, "Do not persist the session between runs")]
    pub ephemeral: bool,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Contents of the YAML configuration file.  Every key is optional.
///
/// ```yaml
/// base_url: http://localhost:5000/api/
/// timeout_secs: 30
/// session_file: /tmp/ammora-session.json
/// color: false
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// Base URL of the API.
    pub base_url: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Where the session is persisted.
    pub session_file: Option<PathBuf>,
    /// Whether to use ANSI styling.
    pub color: Option<bool>,
}

impl ConfigFile {
    /// Reads and parses `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|err| {
            Error::io(format!("failed to read config file {}", path.display()), err)
        })?;
        Self::parse(&content)
    }

    /// Parses YAML text.  An empty document is an empty configuration.
    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }
}

/// Resolved client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the API.  `None` lets the client fall back to its default.
    pub base_url: Option<String>,

    /// Timeout applied to every request.
    pub timeout: Duration,

    /// Explicit session file.  `None` uses the platform default.
    pub session_file: Option<PathBuf>,

    /// Whether the session survives restarts.
    pub persist_session: bool,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ClientConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self {
            base_url: None,
            timeout: DEFAULT_TIMEOUT,
            session_file: None,
            persist_session: true,
            use_color: true,
        }
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the session file.
    pub fn with_session_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_file = Some(path.into());
        self
    }

    /// Keeps the session in memory only.
    pub fn ephemeral(mut self) -> Self {
        self.persist_session = false;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Builds the configuration from command-line arguments, the environment and the
    /// config file named by `--config`.
    pub fn resolve(args: ClientArgs) -> Result<Self> {
        let file = match &args.config {
            Some(path) => ConfigFile::load(path)?,
            None => ConfigFile::default(),
        };
        Self::merge(args, env::var(API_URL_ENV).ok(), file)
    }

    /// Combines the three sources, strongest first.
    pub fn merge(args: ClientArgs, env_url: Option<String>, file: ConfigFile) -> Result<Self> {
        let timeout_secs = args.timeout_secs.or(file.timeout_secs);
        if timeout_secs == Some(0) {
            return Err(Error::validation(
                "timeout must be at least one second",
                Some("timeout_secs".to_string()),
            ));
        }
        let env_url = env_url.filter(|url| !url.trim().is_empty());

        Ok(Self {
            base_url: args.base_url.or(env_url).or(file.base_url),
            timeout: timeout_secs.map(Duration::from_secs).unwrap_or(DEFAULT_TIMEOUT),
            session_file: args.session_file.map(PathBuf::from).or(file.session_file),
            persist_session: !args.ephemeral,
            use_color: !args.no_color && file.color.unwrap_or(true),
        })
    }

    /// The file the session should be kept in, or `None` for an in-memory session.
    pub fn session_path(&self) -> Option<PathBuf> {
        if !self.persist_session {
            return None;
        }
        self.session_file
            .clone()
            .or_else(FileSessionStore::default_path)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ClientArgs> for ClientConfig {
    /// Uses the arguments alone, without consulting the environment or a config file.
    fn from(args: ClientArgs) -> Self {
        ClientConfig {
            base_url: args.base_url,
            timeout: args
                .timeout_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_TIMEOUT),
            session_file: args.session_file.map(PathBuf::from),
            persist_session: !args.ephemeral,
            use_color: !args.no_color,
        }
    }
}
