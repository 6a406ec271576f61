//! Chat history reducer.
//!
//! [`ChatHistory`] holds the ordered, append-only conversation with the
//! catalog assistant. A turn runs `idle → sending → idle`:
//!
//! 1. [`begin_turn`](ChatHistory::begin_turn) appends the user message
//!    immediately (optimistic) with [`Delivery::Pending`].
//! 2. [`complete_turn`](ChatHistory::complete_turn) marks it delivered and
//!    appends the assistant reply, or [`fail_turn`](ChatHistory::fail_turn)
//!    marks it failed and records a visible error.
//!
//! Role and content of a message never change after it is appended; only the
//! delivery tag of a user message moves forward.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sanitize::ScaffoldFilter;

/// Message shown when the assistant could not be reached.
pub const CHAT_ERROR_MESSAGE: &str = "The assistant could not be reached. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Delivery tag of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum Delivery {
    /// Sent, awaiting the assistant.
    Pending,
    Delivered,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub delivery: Delivery,
    pub at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            delivery: Delivery::Pending,
            at: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            delivery: Delivery::Delivered,
            at: Utc::now(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.delivery, Delivery::Failed { .. })
    }

    /// Text to render: user messages verbatim, assistant messages with
    /// scaffold lines removed.
    pub fn display_text<'a>(&'a self, filter: &ScaffoldFilter) -> Cow<'a, str> {
        match self.role {
            Role::User => Cow::Borrowed(&self.content),
            Role::Assistant => filter.clean(&self.content),
        }
    }
}

/// A turn that has been started and is waiting for the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    /// Position of the user message in the history.
    pub index: usize,
    /// The trimmed utterance to send.
    pub utterance: String,
}

/// Result of trying to start a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BeginTurn {
    /// Blank input: nothing appended, nothing to send.
    Ignored,
    /// Another turn is in flight.
    Busy,
    Started(Turn),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatHistory {
    messages: Vec<ChatMessage>,
    sending: bool,
    last_error: Option<String>,
}

impl ChatHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn is_sending(&self) -> bool {
        self.sending
    }

    /// Visible message for the most recent failed turn, cleared when a turn
    /// completes.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Index of the most recent user message whose delivery failed.
    pub fn last_failed(&self) -> Option<usize> {
        self.messages
            .iter()
            .rposition(|m| m.role == Role::User && m.is_failed())
    }

    /// Appends the trimmed utterance as a pending user message.
    pub fn begin_turn(&mut self, utterance: &str) -> BeginTurn {
        let utterance = utterance.trim();
        if utterance.is_empty() {
            return BeginTurn::Ignored;
        }
        if self.sending {
            return BeginTurn::Busy;
        }
        self.messages.push(ChatMessage::user(utterance));
        self.sending = true;
        BeginTurn::Started(Turn {
            index: self.messages.len() - 1,
            utterance: utterance.to_string(),
        })
    }

    /// Re-sends a failed user message in place, without appending a copy.
    /// Returns `Ignored` when `index` is not a failed user message.
    pub fn begin_retry(&mut self, index: usize) -> BeginTurn {
        if self.sending {
            return BeginTurn::Busy;
        }
        let Some(message) = self.messages.get_mut(index) else {
            return BeginTurn::Ignored;
        };
        if message.role != Role::User || !message.is_failed() {
            return BeginTurn::Ignored;
        }
        message.delivery = Delivery::Pending;
        self.sending = true;
        self.last_error = None;
        BeginTurn::Started(Turn {
            index,
            utterance: message.content.clone(),
        })
    }

    /// The backend replied: the user message is delivered and the reply is
    /// appended as-is.
    pub fn complete_turn(&mut self, turn: &Turn, reply: impl Into<String>) {
        if let Some(message) = self.messages.get_mut(turn.index) {
            message.delivery = Delivery::Delivered;
        }
        self.messages.push(ChatMessage::assistant(reply));
        self.sending = false;
        self.last_error = None;
    }

    /// The backend call failed: no assistant message is appended; the user
    /// message is tagged failed and the error becomes visible.
    pub fn fail_turn(&mut self, turn: &Turn, reason: impl Into<String>) {
        let reason = reason.into();
        if let Some(message) = self.messages.get_mut(turn.index) {
            message.delivery = Delivery::Failed {
                reason: reason.clone(),
            };
        }
        self.sending = false;
        self.last_error = Some(reason);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(begin: BeginTurn) -> Turn {
        match begin {
            BeginTurn::Started(turn) => turn,
            other => panic!("expected a started turn, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_input_is_ignored() {
        let mut history = ChatHistory::new();
        assert_eq!(history.begin_turn(""), BeginTurn::Ignored);
        assert_eq!(history.begin_turn("   \n\t"), BeginTurn::Ignored);
        assert!(history.is_empty());
        assert!(!history.is_sending());
    }

    #[test]
    fn test_user_message_is_appended_before_reply() {
        let mut history = ChatHistory::new();
        let turn = started(history.begin_turn("  What rooms are free?  "));

        assert_eq!(turn.utterance, "What rooms are free?");
        assert_eq!(history.len(), 1);
        assert_eq!(history.messages()[0].role, Role::User);
        assert_eq!(history.messages()[0].content, "What rooms are free?");
        assert_eq!(history.messages()[0].delivery, Delivery::Pending);
        assert!(history.is_sending());

        history.complete_turn(&turn, "Room 101 is available");
        assert_eq!(history.len(), 2);
        assert_eq!(history.messages()[0].delivery, Delivery::Delivered);
        assert_eq!(history.messages()[1].role, Role::Assistant);
        assert_eq!(history.messages()[1].content, "Room 101 is available");
        assert!(!history.is_sending());
    }

    #[test]
    fn test_busy_while_sending() {
        let mut history = ChatHistory::new();
        started(history.begin_turn("first"));
        assert_eq!(history.begin_turn("second"), BeginTurn::Busy);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_failure_tags_message_and_appends_nothing() {
        let mut history = ChatHistory::new();
        let turn = started(history.begin_turn("hello"));
        history.fail_turn(&turn, CHAT_ERROR_MESSAGE);

        assert_eq!(history.len(), 1);
        assert!(history.messages()[0].is_failed());
        assert_eq!(history.last_error(), Some(CHAT_ERROR_MESSAGE));
        assert_eq!(history.last_failed(), Some(0));
        assert!(!history.is_sending());
    }

    #[test]
    fn test_retry_reuses_failed_message() {
        let mut history = ChatHistory::new();
        let turn = started(history.begin_turn("hello"));
        history.fail_turn(&turn, CHAT_ERROR_MESSAGE);

        let retry = started(history.begin_retry(0));
        assert_eq!(retry, turn);
        assert_eq!(history.len(), 1);
        assert_eq!(history.messages()[0].delivery, Delivery::Pending);
        assert!(history.last_error().is_none());

        history.complete_turn(&retry, "hi");
        assert_eq!(history.len(), 2);
        assert_eq!(history.last_failed(), None);
    }

    #[test]
    fn test_retry_rejects_non_failed_messages() {
        let mut history = ChatHistory::new();
        let turn = started(history.begin_turn("hello"));
        history.complete_turn(&turn, "hi");

        assert_eq!(history.begin_retry(0), BeginTurn::Ignored);
        assert_eq!(history.begin_retry(1), BeginTurn::Ignored);
        assert_eq!(history.begin_retry(7), BeginTurn::Ignored);
    }

    #[test]
    fn test_display_text_filters_assistant_only() {
        let filter = ScaffoldFilter::default();
        let user = ChatMessage::user("my-next-app/src/page.tsx");
        let assistant = ChatMessage::assistant("Room 101\nmy-next-app/src/page.tsx\nRoom 102");

        assert_eq!(user.display_text(&filter), "my-next-app/src/page.tsx");
        assert_eq!(assistant.display_text(&filter), "Room 101\nRoom 102");
        assert!(assistant.content.contains("my-next-app/"), "storage is untouched");
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_value(ChatMessage::user("hi")).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["delivery"]["state"], "pending");
    }
}
