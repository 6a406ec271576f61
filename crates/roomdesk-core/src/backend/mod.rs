//! Catalog backend abstraction.
//!
//! The [`CatalogBackend`] trait defines the three remote calls the flows
//! depend on, enabling pluggable implementations (HTTP in the `roomdesk`
//! crate, [`memory::MemoryBackend`] here).
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::models::{DocumentRecord, NewRoom};

/// Failure of a backend call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The request could not be completed (connection, timeout, ...).
    #[error("request failed: {0}")]
    Transport(String),
    /// The backend answered with a non-success status.
    #[error("server responded with {status}")]
    Status { status: u16, detail: Option<String> },
    /// The response body did not have the expected shape.
    #[error("invalid response body: {0}")]
    Decode(String),
}

/// Coarse classification of a [`BackendError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Request did not complete, non-2xx without detail, or unreadable body.
    Network,
    /// The backend explained why it rejected the request.
    Validation,
}

impl BackendError {
    /// Builds a `Status` error, extracting `detail` from the response body.
    pub fn from_status(status: u16, body: &str) -> Self {
        BackendError::Status {
            status,
            detail: extract_detail(body),
        }
    }

    /// Backend-provided explanation, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            BackendError::Status { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    pub fn kind(&self) -> FailureKind {
        if self.detail().is_some() {
            FailureKind::Validation
        } else {
            FailureKind::Network
        }
    }
}

/// Reads the `detail` field of an error body.
///
/// Accepts a plain string or a list of validation errors (objects with a
/// `msg` field), which are joined with `"; "`. Returns `None` for bodies that
/// are not JSON or carry no usable detail.
pub fn extract_detail(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    match json.get("detail")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Array(items) => {
            let msgs: Vec<String> = items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    other => other.get("msg").and_then(|m| m.as_str()).map(String::from),
                })
                .collect();
            if msgs.is_empty() {
                None
            } else {
                Some(msgs.join("; "))
            }
        }
        _ => None,
    }
}

/// The remote catalog service.
///
/// # Operations
///
/// | Method | Endpoint |
/// |--------|----------|
/// | [`list_documents`](CatalogBackend::list_documents) | `GET /get-documents/?skip=&limit=` |
/// | [`add_documents`](CatalogBackend::add_documents) | `POST /add-documents` |
/// | [`chat`](CatalogBackend::chat) | `POST /chat/?msg=` |
#[async_trait]
pub trait CatalogBackend: Send + Sync {
    /// Returns up to `limit` records starting at offset `skip`, in backend order.
    async fn list_documents(&self, skip: u64, limit: u64)
        -> Result<Vec<DocumentRecord>, BackendError>;

    /// Submits a batch of new rooms.
    async fn add_documents(&self, batch: &[NewRoom]) -> Result<(), BackendError>;

    /// Sends one utterance to the assistant and returns its plain-text reply.
    async fn chat(&self, message: &str) -> Result<String, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_detail() {
        assert_eq!(
            extract_detail(r#"{"detail": "Room 101 already exists"}"#),
            Some("Room 101 already exists".to_string())
        );
    }

    #[test]
    fn test_validation_list_detail() {
        let body = r#"{"detail": [
            {"loc": ["body", 0, "room_size"], "msg": "value is not a valid float", "type": "type_error.float"},
            {"loc": ["body", 0, "page_content"], "msg": "field required", "type": "value_error.missing"}
        ]}"#;
        assert_eq!(
            extract_detail(body),
            Some("value is not a valid float; field required".to_string())
        );
    }

    #[test]
    fn test_missing_or_unusable_detail() {
        assert_eq!(extract_detail("Internal Server Error"), None);
        assert_eq!(extract_detail(r#"{"error": "boom"}"#), None);
        assert_eq!(extract_detail(r#"{"detail": ""}"#), None);
        assert_eq!(extract_detail(r#"{"detail": 42}"#), None);
        assert_eq!(extract_detail(r#"{"detail": []}"#), None);
    }

    #[test]
    fn test_failure_kind() {
        let rejected = BackendError::from_status(400, r#"{"detail": "bad"}"#);
        assert_eq!(rejected.kind(), FailureKind::Validation);
        assert_eq!(rejected.detail(), Some("bad"));

        let crashed = BackendError::from_status(500, "oops");
        assert_eq!(crashed.kind(), FailureKind::Network);
        assert_eq!(crashed.to_string(), "server responded with 500");

        let offline = BackendError::Transport("connection refused".to_string());
        assert_eq!(offline.kind(), FailureKind::Network);
    }
}
