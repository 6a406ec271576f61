//! Assistant chat.
//!
//! [`ChatSession`] appends the user's message before the request goes out,
//! then appends the assistant's plain-text reply once it arrives. Replies are
//! stored verbatim; scaffold lines are removed only when a message is
//! rendered, using the session's [`ScaffoldFilter`].

use std::sync::Arc;

use anyhow::{bail, Result};
use roomdesk_core::backend::CatalogBackend;
use roomdesk_core::chat::{BeginTurn, ChatHistory, ChatMessage, CHAT_ERROR_MESSAGE};
use roomdesk_core::sanitize::ScaffoldFilter;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::config::Config;
use crate::state::{Published, SettleGuard};
use crate::status::{Flow, StatusEvent, StatusReporter};

/// How a send ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank input; nothing was sent.
    Ignored,
    /// Another message is still waiting for its reply.
    Busy,
    /// The reply, as received.
    Delivered(String),
    /// The request failed; the reason is also on the history.
    Failed(String),
    /// The session was closed.
    Cancelled,
}

pub struct ChatSession {
    backend: Arc<dyn CatalogBackend>,
    state: Published<ChatHistory>,
    cancel: CancellationToken,
    filter: ScaffoldFilter,
}

impl ChatSession {
    pub fn new(backend: Arc<dyn CatalogBackend>, config: &Config) -> Self {
        Self::with_cancel(backend, config, CancellationToken::new())
    }

    pub fn with_cancel(
        backend: Arc<dyn CatalogBackend>,
        config: &Config,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            backend,
            state: Published::new(ChatHistory::new()),
            cancel,
            filter: config.chat.filter(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ChatHistory> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> ChatHistory {
        self.state.snapshot()
    }

    pub fn filter(&self) -> &ScaffoldFilter {
        &self.filter
    }

    /// Rendered text of `message` with scaffold lines removed.
    pub fn display_text(&self, message: &ChatMessage) -> String {
        message.display_text(&self.filter).into_owned()
    }

    /// Sends `utterance` and waits for the reply.
    pub async fn send(&self, utterance: &str) -> SendOutcome {
        if self.cancel.is_cancelled() {
            return SendOutcome::Cancelled;
        }
        let begin = self.state.update(|h| h.begin_turn(utterance));
        self.run(begin).await
    }

    /// Re-sends the failed user message at `index` in place.
    pub async fn retry(&self, index: usize) -> SendOutcome {
        if self.cancel.is_cancelled() {
            return SendOutcome::Cancelled;
        }
        let begin = self.state.update(|h| h.begin_retry(index));
        self.run(begin).await
    }

    /// Retries the most recent failed message, if any.
    pub async fn retry_last(&self) -> SendOutcome {
        match self.state.read(ChatHistory::last_failed) {
            Some(index) => self.retry(index).await,
            None => SendOutcome::Ignored,
        }
    }

    /// Appends the user message now and waits for the reply on a background
    /// task. Returns `Err` with the outcome when nothing was sent.
    pub fn spawn_send(
        self: &Arc<Self>,
        utterance: &str,
    ) -> Result<JoinHandle<SendOutcome>, SendOutcome> {
        if self.cancel.is_cancelled() {
            return Err(SendOutcome::Cancelled);
        }
        let begin = self.state.update(|h| h.begin_turn(utterance));
        self.spawn_run(begin)
    }

    /// Background variant of [`retry_last`](Self::retry_last).
    pub fn spawn_retry_last(self: &Arc<Self>) -> Result<JoinHandle<SendOutcome>, SendOutcome> {
        if self.cancel.is_cancelled() {
            return Err(SendOutcome::Cancelled);
        }
        let begin = self.state.update(|h| match h.last_failed() {
            Some(index) => h.begin_retry(index),
            None => BeginTurn::Ignored,
        });
        self.spawn_run(begin)
    }

    fn spawn_run(self: &Arc<Self>, begin: BeginTurn) -> Result<JoinHandle<SendOutcome>, SendOutcome> {
        match begin {
            BeginTurn::Ignored => Err(SendOutcome::Ignored),
            BeginTurn::Busy => Err(SendOutcome::Busy),
            started @ BeginTurn::Started(_) => {
                let session = Arc::clone(self);
                Ok(tokio::spawn(async move { session.run(started).await }))
            }
        }
    }

    async fn run(&self, begin: BeginTurn) -> SendOutcome {
        let turn = match begin {
            BeginTurn::Ignored => return SendOutcome::Ignored,
            BeginTurn::Busy => {
                debug!("chat busy; message not sent");
                return SendOutcome::Busy;
            }
            BeginTurn::Started(turn) => turn,
        };

        let abandoned = turn.clone();
        let guard = SettleGuard::new(&self.state, &self.cancel, move |h: &mut ChatHistory| {
            h.fail_turn(&abandoned, CHAT_ERROR_MESSAGE)
        });

        let result = tokio::select! {
            _ = self.cancel.cancelled() => {
                debug!("chat closed while waiting for a reply");
                return SendOutcome::Cancelled;
            }
            result = self.backend.chat(&turn.utterance) => result,
        };
        guard.disarm();

        match result {
            Ok(reply) => {
                debug!(chars = reply.len(), "assistant replied");
                self.state.update(|h| h.complete_turn(&turn, reply.clone()));
                SendOutcome::Delivered(reply)
            }
            Err(e) => {
                error!(error = %e, "chat request failed");
                self.state.update(|h| h.fail_turn(&turn, CHAT_ERROR_MESSAGE));
                SendOutcome::Failed(CHAT_ERROR_MESSAGE.to_string())
            }
        }
    }

    pub fn dispose(&self) {
        self.cancel.cancel();
    }
}

/// CLI entry point for `rooms ask`: one turn, sanitized reply on stdout.
pub async fn run_ask(
    config: &Config,
    backend: Arc<dyn CatalogBackend>,
    message: &str,
    status: &dyn StatusReporter,
) -> Result<()> {
    let session = ChatSession::new(backend, config);

    status.report(StatusEvent::Busy { flow: Flow::Chat });
    let outcome = session.send(message).await;
    status.report(StatusEvent::Settled {
        flow: Flow::Chat,
        ok: matches!(outcome, SendOutcome::Delivered(_)),
    });

    match outcome {
        SendOutcome::Delivered(reply) => {
            println!("{}", session.filter().clean(&reply));
            Ok(())
        }
        SendOutcome::Ignored => bail!("nothing to send: the message is empty"),
        SendOutcome::Failed(reason) => bail!("{}", reason),
        SendOutcome::Busy | SendOutcome::Cancelled => bail!("the chat session is not available"),
    }
}
