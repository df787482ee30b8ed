//! The three-screen state machine: onboarding, preferences, chat.

use std::fmt;

use crate::error::{Error, Result};
use crate::session::{Session, SessionStore};

/// The screen currently shown.  Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Screen {
    /// Registration form.
    #[default]
    Onboarding,
    /// One-time preferences form.
    Preferences,
    /// The chat panel.
    Chat,
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Screen::Onboarding => write!(f, "onboarding"),
            Screen::Preferences => write!(f, "preferences"),
            Screen::Chat => write!(f, "chat"),
        }
    }
}

/// Events that move the controller forward.
///
/// Resetting from chat back to onboarding is not a plain transition: it goes through
/// [`ScreenController::reset`] so the stored session is always cleared first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Registration succeeded.
    Registered,
    /// Preferences were saved.
    PreferencesSaved,
    /// The user skipped the preferences form.
    PreferencesSkipped,
}

impl Screen {
    /// The screen `transition` leads to from `self`, if it is allowed.
    pub fn next(self, transition: Transition) -> Option<Screen> {
        match (self, transition) {
            (Screen::Onboarding, Transition::Registered) => Some(Screen::Preferences),
            (
                Screen::Preferences,
                Transition::PreferencesSaved | Transition::PreferencesSkipped,
            ) => Some(Screen::Chat),
            _ => None,
        }
    }
}

/// Owns the single current-screen value.
#[derive(Debug, Clone, Default)]
pub struct ScreenController {
    screen: Screen,
}

impl ScreenController {
    /// Starts on the onboarding screen.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts directly on the chat screen for a restored session.
    pub fn resume(session: &Session) -> Self {
        tracing::debug!(user_id = %session.user_id, "resuming session on chat screen");
        Self {
            screen: Screen::Chat,
        }
    }

    /// The active screen.
    pub fn current(&self) -> Screen {
        self.screen
    }

    /// Applies `transition`, rejecting it if the current screen does not allow it.
    pub fn apply(&mut self, transition: Transition) -> Result<Screen> {
        match self.screen.next(transition) {
            Some(next) => {
                tracing::debug!(from = %self.screen, to = %next, ?transition, "screen transition");
                self.screen = next;
                Ok(next)
            }
            None => Err(Error::validation(
                format!("{transition:?} is not allowed on the {} screen", self.screen),
                None,
            )),
        }
    }

    /// Returns from chat to onboarding after clearing `store`.
    ///
    /// If the store cannot be cleared the controller stays on the chat screen.
    pub fn reset(&mut self, store: &mut dyn SessionStore) -> Result<Screen> {
        if self.screen != Screen::Chat {
            return Err(Error::validation(
                format!("cannot start a new chat from the {} screen", self.screen),
                None,
            ));
        }
        store.clear()?;
        self.screen = Screen::Onboarding;
        Ok(self.screen)
    }
}
