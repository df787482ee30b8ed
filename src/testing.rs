//! In-memory doubles shared by the unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::chat::Message;
use crate::client::ChatBackend;
use crate::error::{Error, Result};
use crate::render::Renderer;
use crate::screen::Screen;
use crate::session::Session;
use crate::types::{
    ChatParams, ChatReply, HistoryMessage, MessageHistory, MessageRole, PreferencesParams,
    Profile, RegisterParams, RegisteredUser,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderEvent {
    Screen(Screen),
    Welcome(String),
    ClearWelcome,
    Message(MessageRole, String),
    TypingShown,
    TypingHidden,
    Scroll,
    ClearTranscript,
    Focus,
    Profile(String),
    Error(String),
    Info(String),
}

#[derive(Clone, Default)]
pub struct Events(Arc<Mutex<Vec<RenderEvent>>>);

impl Events {
    fn push(&self, event: RenderEvent) {
        self.0.lock().unwrap().push(event);
    }

    /// Returns and forgets everything recorded so far.
    pub fn take(&self) -> Vec<RenderEvent> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }

    pub fn errors(&self) -> Vec<String> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                RenderEvent::Error(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }
}

pub struct RecordingRenderer {
    events: Events,
}

impl RecordingRenderer {
    pub fn new() -> (Self, Events) {
        let events = Events::default();
        (
            Self {
                events: events.clone(),
            },
            events,
        )
    }
}

impl Renderer for RecordingRenderer {
    fn show_screen(&mut self, screen: Screen, _: Option<&Session>) {
        self.events.push(RenderEvent::Screen(screen));
    }

    fn print_welcome(&mut self, session: &Session) {
        self.events
            .push(RenderEvent::Welcome(session.username.clone()));
    }

    fn clear_welcome(&mut self) {
        self.events.push(RenderEvent::ClearWelcome);
    }

    fn print_message(&mut self, message: &Message) {
        self.events
            .push(RenderEvent::Message(message.role, message.content.clone()));
    }

    fn show_typing(&mut self) {
        self.events.push(RenderEvent::TypingShown);
    }

    fn hide_typing(&mut self) {
        self.events.push(RenderEvent::TypingHidden);
    }

    fn scroll_to_latest(&mut self) {
        self.events.push(RenderEvent::Scroll);
    }

    fn clear_transcript(&mut self) {
        self.events.push(RenderEvent::ClearTranscript);
    }

    fn focus_composer(&mut self) {
        self.events.push(RenderEvent::Focus);
    }

    fn print_profile(&mut self, profile: &Profile) {
        self.events
            .push(RenderEvent::Profile(profile.username.clone()));
    }

    fn print_error(&mut self, error: &str) {
        self.events.push(RenderEvent::Error(error.to_string()));
    }

    fn print_info(&mut self, info: &str) {
        self.events.push(RenderEvent::Info(info.to_string()));
    }
}

#[derive(Default)]
struct FakeState {
    replies: VecDeque<Result<String>>,
    chat_gate: Option<Arc<Notify>>,
    chat_requests: Vec<ChatParams>,
    register_result: Option<Result<RegisteredUser>>,
    register_requests: Vec<RegisterParams>,
    preferences_error: Option<Error>,
    preferences_requests: Vec<PreferencesParams>,
    history: Option<Result<MessageHistory>>,
    history_requests: Vec<String>,
    profile: Option<Result<Profile>>,
}

/// A scripted [`ChatBackend`] that records every request.
#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<FakeState>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    /// Queues the result of the next chat request.
    pub fn push_reply(&self, reply: Result<&str>) {
        self.lock().replies.push_back(reply.map(str::to_string));
    }

    /// Makes the next chat request wait until the returned gate is notified.
    pub fn hold_chat(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.lock().chat_gate = Some(gate.clone());
        gate
    }

    pub fn chat_requests(&self) -> Vec<ChatParams> {
        self.lock().chat_requests.clone()
    }

    pub fn set_register(&self, result: Result<RegisteredUser>) {
        self.lock().register_result = Some(result);
    }

    pub fn register_requests(&self) -> Vec<RegisterParams> {
        self.lock().register_requests.clone()
    }

    pub fn fail_preferences(&self, err: Error) {
        self.lock().preferences_error = Some(err);
    }

    pub fn preferences_requests(&self) -> Vec<PreferencesParams> {
        self.lock().preferences_requests.clone()
    }

    pub fn set_history(&self, messages: Vec<HistoryMessage>) {
        self.lock().history = Some(Ok(MessageHistory { messages }));
    }

    pub fn fail_history(&self, err: Error) {
        self.lock().history = Some(Err(err));
    }

    pub fn history_requests(&self) -> Vec<String> {
        self.lock().history_requests.clone()
    }

    pub fn set_profile(&self, profile: Result<Profile>) {
        self.lock().profile = Some(profile);
    }
}

#[async_trait]
impl ChatBackend for FakeBackend {
    async fn register(&self, params: RegisterParams) -> Result<RegisteredUser> {
        let mut state = self.lock();
        state.register_requests.push(params.clone());
        state.register_result.clone().unwrap_or_else(|| {
            Ok(RegisteredUser {
                user_id: "u1".to_string(),
                username: params.username,
                message: None,
            })
        })
    }

    async fn save_preferences(&self, params: PreferencesParams) -> Result<()> {
        let mut state = self.lock();
        state.preferences_requests.push(params);
        match state.preferences_error.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn chat(&self, params: ChatParams) -> Result<ChatReply> {
        let gate = {
            let mut state = self.lock();
            state.chat_requests.push(params);
            state.chat_gate.take()
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let reply = self.lock().replies.pop_front();
        reply
            .unwrap_or_else(|| Err(Error::connection("no reply queued", None)))
            .map(|message| ChatReply {
                message,
                model: None,
            })
    }

    async fn history(&self, user_id: &str) -> Result<MessageHistory> {
        let mut state = self.lock();
        state.history_requests.push(user_id.to_string());
        state.history.clone().unwrap_or_else(|| Ok(MessageHistory::default()))
    }

    async fn profile(&self, user_id: &str) -> Result<Profile> {
        self.lock().profile.clone().unwrap_or_else(|| {
            Err(Error::not_found(
                "User not found",
                Some(user_id.to_string()),
            ))
        })
    }
}
