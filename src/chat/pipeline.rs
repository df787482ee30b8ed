//! Turning typed text into a rendered exchange with the assistant.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio_util::sync::CancellationToken;

use crate::chat::Transcript;
use crate::client::ChatBackend;
use crate::error::{Error, Result};
use crate::observability::{
    CHAT_BUSY_REJECTIONS, CHAT_CANCELLATIONS, CHAT_EMPTY_SUBMISSIONS, CHAT_FAILURES,
    CHAT_SUBMISSIONS, HISTORY_LOAD_FAILURES, HISTORY_LOADS,
};
use crate::render::Renderer;
use crate::session::Session;
use crate::types::{ChatParams, HistoryMessage, MessageRole};

/// Shown when a chat request fails without a server-provided message.
pub const CHAT_FALLBACK: &str = "Failed to send message";

/// What happened to one call to [`ChatPipeline::submit`].
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    /// The input was empty after trimming; nothing was sent or shown.
    Empty,
    /// Another message is still in flight; nothing was sent or shown.
    Busy,
    /// The assistant answered and the reply was appended.
    Replied,
    /// The request was cancelled before it completed.
    Cancelled,
    /// The request failed and the error was shown to the user.
    Failed(Error),
}

impl SubmitOutcome {
    /// True if a chat request was issued.
    pub fn was_sent(&self) -> bool {
        matches!(
            self,
            SubmitOutcome::Replied | SubmitOutcome::Cancelled | SubmitOutcome::Failed(_)
        )
    }
}

/// Cancels whatever request the pipeline currently has in flight.
///
/// Cloneable and `Send`, so it can be moved into a signal handler.
#[derive(Clone, Debug)]
pub struct CancelHandle {
    current: Arc<Mutex<CancellationToken>>,
}

impl CancelHandle {
    /// Creates a handle with a fresh token.
    pub fn new() -> Self {
        Self {
            current: Arc::new(Mutex::new(CancellationToken::new())),
        }
    }

    /// The token requests started now should watch.
    pub fn token(&self) -> CancellationToken {
        self.lock().clone()
    }

    /// Cancels in-flight work.  Requests started afterwards are unaffected.
    pub fn cancel(&self) {
        let mut current = self.lock();
        current.cancel();
        *current = CancellationToken::new();
    }

    fn lock(&self) -> MutexGuard<'_, CancellationToken> {
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Clears the busy flag when dropped, whatever path the submission took.
struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Sends chat messages and renders the exchange.
///
/// At most one chat request is in flight at a time; submissions made meanwhile are
/// rejected with [`SubmitOutcome::Busy`].
pub struct ChatPipeline<B: ChatBackend> {
    backend: B,
    transcript: Mutex<Transcript>,
    busy: AtomicBool,
    cancel: CancelHandle,
}

impl<B: ChatBackend> ChatPipeline<B> {
    /// Creates a pipeline that talks to `backend` and draws with `renderer`.
    pub fn new(backend: B, renderer: Box<dyn Renderer>) -> Self {
        Self {
            backend,
            transcript: Mutex::new(Transcript::new(renderer)),
            busy: AtomicBool::new(false),
            cancel: CancelHandle::new(),
        }
    }

    /// The backend requests are sent to.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// True while a chat request is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// A handle that cancels in-flight requests.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Cancels in-flight requests.
    pub fn cancel_pending(&self) {
        self.cancel.cancel();
    }

    /// Runs `f` with the transcript locked.  Never call this across an `.await`.
    pub fn with_transcript<R>(&self, f: impl FnOnce(&mut Transcript) -> R) -> R {
        let mut transcript = self.transcript.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut transcript)
    }

    /// Sends `input` on behalf of `session` and renders the exchange.
    ///
    /// The user's message is appended before the request goes out.  On success the
    /// reply is appended; on failure the error is shown and nothing else is appended.
    pub async fn submit(&self, session: &Session, input: &str) -> SubmitOutcome {
        let message = input.trim();
        if message.is_empty() {
            CHAT_EMPTY_SUBMISSIONS.click();
            return SubmitOutcome::Empty;
        }
        let Some(_busy) = BusyGuard::acquire(&self.busy) else {
            CHAT_BUSY_REJECTIONS.click();
            tracing::debug!("chat request already in flight; ignoring submission");
            return SubmitOutcome::Busy;
        };
        CHAT_SUBMISSIONS.click();

        self.with_transcript(|transcript| {
            transcript.append(MessageRole::User, message);
            transcript.show_typing();
        });

        let params = ChatParams::new(session.user_id.as_str(), message);
        let result = self
            .cancellable(async { self.backend.chat(params).await })
            .await;

        self.with_transcript(|transcript| {
            transcript.hide_typing();
            let outcome = match result {
                Ok(reply) => {
                    transcript.append(MessageRole::Assistant, reply.message);
                    SubmitOutcome::Replied
                }
                Err(err) if err.is_abort() => {
                    CHAT_CANCELLATIONS.click();
                    tracing::info!("chat request cancelled");
                    SubmitOutcome::Cancelled
                }
                Err(err) => {
                    CHAT_FAILURES.click();
                    tracing::warn!(error = %err, "chat request failed");
                    transcript.error(&err.user_message(CHAT_FALLBACK));
                    SubmitOutcome::Failed(err)
                }
            };
            transcript.focus_composer();
            outcome
        })
    }

    /// Fetches prior messages for `user_id` and appends them in server order.
    ///
    /// History is best-effort: failures are logged and otherwise ignored.  Returns the
    /// number of messages appended.
    pub async fn load_history(&self, user_id: &str) -> usize {
        match self.fetch_history(user_id).await {
            Some(history) if !history.is_empty() => {
                self.with_transcript(|transcript| transcript.extend_from_history(history))
            }
            _ => 0,
        }
    }

    /// Replaces the transcript with the server's copy of the conversation.
    ///
    /// The transcript is left untouched if the history cannot be fetched.
    pub async fn reload_history(&self, session: &Session) -> Option<usize> {
        let history = self.fetch_history(&session.user_id).await?;
        Some(self.with_transcript(|transcript| {
            transcript.reset();
            transcript.show_welcome(session);
            transcript.extend_from_history(history)
        }))
    }

    async fn fetch_history(&self, user_id: &str) -> Option<Vec<HistoryMessage>> {
        HISTORY_LOADS.click();
        let result = self
            .cancellable(async { self.backend.history(user_id).await })
            .await;
        match result {
            Ok(history) => {
                tracing::debug!(count = history.messages.len(), "fetched chat history");
                Some(history.messages)
            }
            Err(err) => {
                HISTORY_LOAD_FAILURES.click();
                tracing::warn!(error = %err, "failed to load chat history");
                None
            }
        }
    }

    async fn cancellable<T>(&self, request: impl Future<Output = Result<T>>) -> Result<T> {
        let token = self.cancel.token();
        tokio::select! {
            result = request => result,
            _ = token.cancelled() => Err(Error::abort("request cancelled")),
        }
    }
}
