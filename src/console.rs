//! The three flows mounted together.
//!
//! A [`Console`] owns a root [`CancellationToken`]; each flow gets a child
//! token. Mounting starts the initial page fetch. Dropping the console
//! cancels every flow, and late responses are discarded without touching
//! state.

use std::sync::Arc;

use roomdesk_core::backend::CatalogBackend;
use roomdesk_core::models::DocumentRecord;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::chat::ChatSession;
use crate::config::Config;
use crate::feed::DocumentFeed;
use crate::submit::RecordSubmitter;

pub struct Console {
    feed: Arc<DocumentFeed>,
    submitter: Arc<RecordSubmitter>,
    chat: Arc<ChatSession>,
    root: CancellationToken,
    initial: Option<JoinHandle<Vec<DocumentRecord>>>,
}

impl Console {
    /// Builds the flows and starts fetching page 0. Must be called inside a
    /// Tokio runtime.
    pub fn mount(config: &Config, backend: Arc<dyn CatalogBackend>) -> Self {
        let root = CancellationToken::new();
        let feed = Arc::new(DocumentFeed::with_cancel(
            Arc::clone(&backend),
            config,
            root.child_token(),
        ));
        let submitter = Arc::new(RecordSubmitter::with_cancel(
            Arc::clone(&backend),
            config,
            root.child_token(),
        ));
        let chat = Arc::new(ChatSession::with_cancel(backend, config, root.child_token()));
        let initial = feed.activate();
        debug!("console mounted");

        Self {
            feed,
            submitter,
            chat,
            root,
            initial,
        }
    }

    pub fn feed(&self) -> &Arc<DocumentFeed> {
        &self.feed
    }

    pub fn submitter(&self) -> &Arc<RecordSubmitter> {
        &self.submitter
    }

    pub fn chat(&self) -> &Arc<ChatSession> {
        &self.chat
    }

    /// Waits for the initial page fetch. Returns an empty list if it was
    /// already awaited or did not complete.
    pub async fn initial_page(&mut self) -> Vec<DocumentRecord> {
        match self.initial.take() {
            Some(handle) => handle.await.unwrap_or_default(),
            None => Vec::new(),
        }
    }

    /// Cancels every flow. Equivalent to dropping the console.
    pub fn unmount(self) {}
}

impl Drop for Console {
    fn drop(&mut self) {
        self.root.cancel();
        debug!("console unmounted");
    }
}
