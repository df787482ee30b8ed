//! The top-level application context.
//!
//! [`App`] owns the one [`Session`], the [`ScreenController`], the [`SessionStore`] and
//! the [`ChatPipeline`].  Front-ends call its operations and never touch those parts
//! directly, so the screen, the stored session and the transcript cannot drift apart.

use crate::chat::{CancelHandle, ChatPipeline, SubmitOutcome};
use crate::client::ChatBackend;
use crate::error::{Error, Result};
use crate::observability::{SESSION_RESETS, SESSION_RESTORES};
use crate::render::Renderer;
use crate::screen::{Screen, ScreenController, Transition};
use crate::session::{Session, SessionStore};
use crate::types::{Preferences, PreferencesParams, Profile, RegisterParams};

/// Shown when either registration field is blank.
pub const MISSING_FIELDS: &str = "Please fill in all fields";

/// Shown when the age is not a whole number.
pub const INVALID_AGE: &str = "Please enter your age as a whole number";

/// Shown when registration fails without a server-provided message.
pub const REGISTER_FALLBACK: &str = "Registration failed";

/// Prefix of the retry hint when registration never reached the server.
pub const REGISTER_RETRY: &str = "Failed to register";

/// Shown when saving preferences fails without a server-provided message.
pub const PREFERENCES_FALLBACK: &str = "Failed to save preferences";

/// Shown when the profile cannot be fetched without a server-provided message.
pub const PROFILE_FALLBACK: &str = "Failed to load profile";

/// Checks the onboarding form and builds the registration request.
pub fn validate_registration(username: &str, age: &str) -> Result<RegisterParams> {
    let username = username.trim();
    let age = age.trim();
    if username.is_empty() {
        return Err(Error::validation(MISSING_FIELDS, Some("username".to_string())));
    }
    if age.is_empty() {
        return Err(Error::validation(MISSING_FIELDS, Some("age".to_string())));
    }
    let age = age
        .parse::<u32>()
        .map_err(|_| Error::validation(INVALID_AGE, Some("age".to_string())))?;
    Ok(RegisterParams::new(username, age))
}

/// Everything one running client needs.
pub struct App<B: ChatBackend, S: SessionStore> {
    store: S,
    screens: ScreenController,
    session: Option<Session>,
    pipeline: ChatPipeline<B>,
}

impl<B: ChatBackend, S: SessionStore> App<B, S> {
    /// Creates an application on the onboarding screen.  Call [`App::start`] next.
    pub fn new(backend: B, store: S, renderer: Box<dyn Renderer>) -> Self {
        Self {
            store,
            screens: ScreenController::new(),
            session: None,
            pipeline: ChatPipeline::new(backend, renderer),
        }
    }

    /// The active screen.
    pub fn screen(&self) -> Screen {
        self.screens.current()
    }

    /// The current session, once registered or restored.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// The session store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The chat pipeline.
    pub fn pipeline(&self) -> &ChatPipeline<B> {
        &self.pipeline
    }

    /// A handle that cancels in-flight requests, for signal handlers.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.pipeline.cancel_handle()
    }

    /// Restores a stored session if there is one.
    ///
    /// With a session the chat screen is shown and prior messages are loaded;
    /// otherwise onboarding is shown.
    pub async fn start(&mut self) -> Screen {
        match self.store.restore() {
            Some(session) => {
                SESSION_RESTORES.click();
                tracing::info!(user_id = %session.user_id, "restored session");
                self.screens = ScreenController::resume(&session);
                self.session = Some(session);
                self.enter_chat();
                if let Some(session) = &self.session {
                    self.pipeline.load_history(&session.user_id).await;
                }
            }
            None => {
                self.screens = ScreenController::new();
                self.pipeline
                    .with_transcript(|t| t.show_screen(Screen::Onboarding, None));
            }
        }
        self.screen()
    }

    /// Registers a new user from the onboarding form.
    ///
    /// Nothing is sent if a field is missing.  On success the session is stored and the
    /// preferences screen is shown; on failure the user stays on onboarding.
    pub async fn register(&mut self, username: &str, age: &str) -> Result<Session> {
        if self.screen() != Screen::Onboarding {
            return Err(Error::validation(
                format!("cannot register from the {} screen", self.screen()),
                None,
            ));
        }
        let params = match validate_registration(username, age) {
            Ok(params) => params,
            Err(err) => {
                self.show_error(&err.user_message(REGISTER_FALLBACK));
                return Err(err);
            }
        };
        let user = match self.pipeline.backend().register(params).await {
            Ok(user) => user,
            Err(err) => {
                tracing::warn!(error = %err, "registration failed");
                self.show_error(&err.user_message_with_retry(REGISTER_FALLBACK, REGISTER_RETRY));
                return Err(err);
            }
        };

        let session = Session::new(user.user_id, user.username);
        if let Err(err) = self.store.save(&session) {
            tracing::warn!(error = %err, "failed to persist session");
            self.show_info("Your session could not be saved and will not survive a restart.");
        }
        self.screens.apply(Transition::Registered)?;
        tracing::info!(user_id = %session.user_id, "registered");
        self.session = Some(session.clone());
        self.pipeline
            .with_transcript(|t| t.show_screen(Screen::Preferences, Some(&session)));
        Ok(session)
    }

    /// Sends the preferences form and moves on to chat.
    ///
    /// Free-text fields are trimmed before sending.  On failure the user stays on the
    /// preferences screen and may retry or skip.
    pub async fn save_preferences(&mut self, preferences: Preferences) -> Result<()> {
        let user_id = self.require_screen(Screen::Preferences)?.user_id.clone();
        let params = PreferencesParams::new(user_id, preferences.normalized());
        if let Err(err) = self.pipeline.backend().save_preferences(params).await {
            tracing::warn!(error = %err, "saving preferences failed");
            self.show_error(&err.user_message(PREFERENCES_FALLBACK));
            return Err(err);
        }
        self.screens.apply(Transition::PreferencesSaved)?;
        self.enter_chat();
        Ok(())
    }

    /// Leaves the preferences screen without sending anything.
    pub fn skip_preferences(&mut self) -> Result<()> {
        self.require_screen(Screen::Preferences)?;
        self.screens.apply(Transition::PreferencesSkipped)?;
        self.enter_chat();
        Ok(())
    }

    /// Sends a chat message.  See [`ChatPipeline::submit`].
    pub async fn submit(&self, input: &str) -> Result<SubmitOutcome> {
        let session = self.require_screen(Screen::Chat)?;
        Ok(self.pipeline.submit(session, input).await)
    }

    /// Replaces the transcript with the server's copy of the conversation.
    pub async fn reload_history(&self) -> Result<Option<usize>> {
        let session = self.require_screen(Screen::Chat)?;
        Ok(self.pipeline.reload_history(session).await)
    }

    /// Fetches and shows the stored profile.
    pub async fn profile(&self) -> Result<Profile> {
        let session = self.require_screen(Screen::Chat)?;
        match self.pipeline.backend().profile(&session.user_id).await {
            Ok(profile) => {
                self.pipeline.with_transcript(|t| t.profile(&profile));
                Ok(profile)
            }
            Err(err) => {
                tracing::warn!(error = %err, "loading profile failed");
                self.show_error(&err.user_message(PROFILE_FALLBACK));
                Err(err)
            }
        }
    }

    /// Forgets the session and returns to onboarding.
    ///
    /// Does nothing unless `confirmed`.  Returns whether the reset happened.  If the
    /// stored session cannot be removed the user stays on the chat screen.
    pub fn new_chat(&mut self, confirmed: bool) -> Result<bool> {
        if !confirmed {
            return Ok(false);
        }
        self.pipeline.cancel_pending();
        if let Err(err) = self.screens.reset(&mut self.store) {
            tracing::warn!(error = %err, "failed to clear session");
            self.show_error("Could not start a new chat. Please try again.");
            return Err(err);
        }
        SESSION_RESETS.click();
        tracing::info!("session cleared");
        self.session = None;
        self.pipeline.with_transcript(|t| {
            t.reset();
            t.show_screen(Screen::Onboarding, None);
        });
        Ok(true)
    }

    /// Shows an informational line.
    pub fn show_info(&self, message: &str) {
        self.pipeline.with_transcript(|t| t.info(message));
    }

    /// Shows an error notification.
    pub fn show_error(&self, message: &str) {
        self.pipeline.with_transcript(|t| t.error(message));
    }

    fn enter_chat(&self) {
        if let Some(session) = &self.session {
            self.pipeline.with_transcript(|t| {
                t.show_screen(Screen::Chat, Some(session));
                t.show_welcome(session);
                t.focus_composer();
            });
        }
    }

    fn require_screen(&self, screen: Screen) -> Result<&Session> {
        match &self.session {
            Some(session) if self.screen() == screen => Ok(session),
            _ => Err(Error::validation(
                format!("not available on the {} screen", self.screen()),
                None,
            )),
        }
    }
}
