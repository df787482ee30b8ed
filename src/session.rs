//! Durable user identity.
//!
//! A [`Session`] is the pair of server-assigned user id and display name.  It is created
//! by registration, persisted through a [`SessionStore`], restored on the next start,
//! and cleared when the user starts over.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The identity that gates access to the chat screen.
///
/// Both fields are always present; an absent identity is `Option<Session>::None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Server-assigned user id.
    pub user_id: String,
    /// Display name.
    pub username: String,
}

impl Session {
    /// Creates a session from its two parts.
    pub fn new(user_id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
        }
    }
}

/// Persistence for the current [`Session`].
///
/// `restore` never fails: missing or unreadable data simply means there is no session.
pub trait SessionStore: Send {
    /// Returns the stored session if both fields are present and non-empty.
    fn restore(&self) -> Option<Session>;

    /// Stores both fields of `session` in one step.
    fn save(&mut self, session: &Session) -> Result<()>;

    /// Removes the stored session.  Clearing an empty store succeeds.
    fn clear(&mut self) -> Result<()>;
}

impl<S: SessionStore + ?Sized> SessionStore for Box<S> {
    fn restore(&self) -> Option<Session> {
        (**self).restore()
    }

    fn save(&mut self, session: &Session) -> Result<()> {
        (**self).save(session)
    }

    fn clear(&mut self) -> Result<()> {
        (**self).clear()
    }
}

/// On-disk layout.  The keys match the ones the web client kept in local storage.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredSession {
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    username: Option<String>,
}

impl StoredSession {
    fn into_session(self) -> Option<Session> {
        match (self.user_id, self.username) {
            (Some(user_id), Some(username)) if !user_id.is_empty() && !username.is_empty() => {
                Some(Session { user_id, username })
            }
            _ => None,
        }
    }
}

impl From<&Session> for StoredSession {
    fn from(session: &Session) -> Self {
        Self {
            user_id: Some(session.user_id.clone()),
            username: Some(session.username.clone()),
        }
    }
}

/// A session store backed by a small JSON file.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Creates a store that keeps the session at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data dir>/ammora/session.json`, if the platform has a data directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("ammora").join("session.json"))
    }

    /// The file this store reads and writes.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| "session.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SessionStore for FileSessionStore {
    fn restore(&self) -> Option<Session> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return None,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "cannot read session file");
                return None;
            }
        };
        match serde_json::from_str::<StoredSession>(&content) {
            Ok(stored) => stored.into_session(),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "ignoring malformed session file");
                None
            }
        }
    }

    fn save(&mut self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .map_err(|err| Error::io("failed to create session directory", err))?;
        }
        let body = serde_json::to_vec_pretty(&StoredSession::from(session))?;
        let temp = self.temp_path();
        {
            let mut file = fs::File::create(&temp)
                .map_err(|err| Error::io("failed to create session file", err))?;
            file.write_all(&body)
                .and_then(|_| file.sync_all())
                .map_err(|err| Error::io("failed to write session file", err))?;
        }
        // Readers see either the old file or the new one, never a half-written mix.
        fs::rename(&temp, &self.path)
            .map_err(|err| Error::io("failed to replace session file", err))
    }

    fn clear(&mut self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(Error::io("failed to remove session file", err)),
        }
    }
}

/// A session store that lives only as long as the process.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    session: Option<Session>,
}

impl MemorySessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `session`.
    pub fn with_session(session: Session) -> Self {
        Self {
            session: Some(session),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn restore(&self) -> Option<Session> {
        self.session
            .as_ref()
            .filter(|s| !s.user_id.is_empty() && !s.username.is_empty())
            .cloned()
    }

    fn save(&mut self, session: &Session) -> Result<()> {
        self.session = Some(session.clone());
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.session = None;
        Ok(())
    }
}
