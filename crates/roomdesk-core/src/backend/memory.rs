//! In-memory [`CatalogBackend`] implementation for testing and offline use.
//!
//! Records live in a `Vec` behind `std::sync::RwLock`. Chat replies are
//! scripted with [`MemoryBackend::push_reply`], and a single failure can be
//! queued with [`MemoryBackend::fail_next`] to exercise error paths.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;

use crate::models::{DocumentRecord, NewRoom, RoomMetadata};

use super::{BackendError, CatalogBackend};

/// In-memory catalog for tests and environments without a server.
pub struct MemoryBackend {
    records: RwLock<Vec<DocumentRecord>>,
    replies: Mutex<VecDeque<String>>,
    failure: Mutex<Option<BackendError>>,
    batches: Mutex<Vec<Vec<NewRoom>>>,
    calls: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            replies: Mutex::new(VecDeque::new()),
            failure: Mutex::new(None),
            batches: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_records(records: Vec<DocumentRecord>) -> Self {
        let backend = Self::new();
        *backend.records.write().unwrap_or_else(|e| e.into_inner()) = records;
        backend
    }

    /// Queues the reply returned by the next unanswered `chat` call.
    pub fn push_reply(&self, reply: impl Into<String>) {
        self.replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(reply.into());
    }

    /// Makes the next call (of any kind) fail with `error`.
    pub fn fail_next(&self, error: BackendError) {
        *self.failure.lock().unwrap_or_else(|e| e.into_inner()) = Some(error);
    }

    /// Total number of calls received, including failed ones.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every batch accepted by `add_documents`, oldest first.
    pub fn batches(&self) -> Vec<Vec<NewRoom>> {
        self.batches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn records(&self) -> Vec<DocumentRecord> {
        self.records
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn enter(&self) -> Result<(), BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.failure.lock().unwrap_or_else(|e| e.into_inner()).take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn to_record(room: &NewRoom) -> DocumentRecord {
    DocumentRecord {
        id: uuid::Uuid::new_v4().to_string(),
        page_content: room.page_content.clone(),
        metadata: RoomMetadata {
            description: Some(room.description.clone()),
            room_number: Some(room.room_number.clone()),
            room_size: Some(room.room_size),
            image_url: room.image_url.clone(),
            is_booked: Some(room.is_booked),
            digest: None,
            extra: Default::default(),
        },
        extra: Default::default(),
    }
}

#[async_trait]
impl CatalogBackend for MemoryBackend {
    async fn list_documents(
        &self,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<DocumentRecord>, BackendError> {
        self.enter()?;
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        let skip = usize::try_from(skip).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(records.iter().skip(skip).take(limit).cloned().collect())
    }

    async fn add_documents(&self, batch: &[NewRoom]) -> Result<(), BackendError> {
        self.enter()?;
        if batch.is_empty() {
            return Err(BackendError::Status {
                status: 422,
                detail: Some("batch must not be empty".to_string()),
            });
        }
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        records.extend(batch.iter().map(to_record));
        self.batches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(batch.to_vec());
        Ok(())
    }

    async fn chat(&self, _message: &str) -> Result<String, BackendError> {
        self.enter()?;
        self.replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .ok_or(BackendError::Status {
                status: 503,
                detail: None,
            })
    }
}
