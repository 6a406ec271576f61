//! Paginated document feed.
//!
//! [`DocumentFeed`] fetches one page of the catalog at a time and publishes a
//! [`FeedState`] that views subscribe to. Fetch failures never escape: they
//! are logged, turned into [`FEED_ERROR_MESSAGE`] on the state, and the call
//! returns an empty page. Every fetch takes a ticket, so only the most
//! recently started request can settle the state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{bail, Result};
use roomdesk_core::backend::CatalogBackend;
use roomdesk_core::feed::{FeedState, FEED_ERROR_MESSAGE};
use roomdesk_core::models::{DocumentRecord, PaginationCursor};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::Config;
use crate::render;
use crate::state::{Published, SettleGuard};
use crate::status::{Flow, StatusEvent, StatusReporter};

pub struct DocumentFeed {
    backend: Arc<dyn CatalogBackend>,
    state: Published<FeedState>,
    cancel: CancellationToken,
    activated: AtomicBool,
    page_size: u32,
}

impl DocumentFeed {
    pub fn new(backend: Arc<dyn CatalogBackend>, config: &Config) -> Self {
        Self::with_cancel(backend, config, CancellationToken::new())
    }

    /// A feed that stops publishing once `cancel` fires.
    pub fn with_cancel(
        backend: Arc<dyn CatalogBackend>,
        config: &Config,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            backend,
            state: Published::new(FeedState::new()),
            cancel,
            activated: AtomicBool::new(false),
            page_size: config.feed.page_size,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<FeedState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> FeedState {
        self.state.snapshot()
    }

    /// Page 0 at the configured page size.
    pub fn first_page(&self) -> PaginationCursor {
        PaginationCursor::new(0, self.page_size).unwrap_or_default()
    }

    /// Cursor of the latest fetch, or the first page if nothing was fetched.
    pub fn current(&self) -> PaginationCursor {
        self.state
            .read(|s| s.cursor())
            .unwrap_or_else(|| self.first_page())
    }

    /// Fetches page `page` with `page_size` records per page. A zero page
    /// size falls back to the configured one.
    pub async fn fetch_page(&self, page: u32, page_size: u32) -> Vec<DocumentRecord> {
        let cursor = PaginationCursor::new(page, page_size).unwrap_or_else(|| {
            warn!(page, "page size 0 requested; using {}", self.page_size);
            PaginationCursor::new(page, self.page_size).unwrap_or_default()
        });
        self.fetch(cursor).await
    }

    /// Fetches the page at `cursor`, publishing `Loading` first and then the
    /// page or an error. Returns the page, or an empty list on failure or
    /// after the feed was disposed.
    pub async fn fetch(&self, cursor: PaginationCursor) -> Vec<DocumentRecord> {
        if self.cancel.is_cancelled() {
            debug!("feed disposed; fetch skipped");
            return Vec::new();
        }

        let ticket = self.state.update(|s| s.begin(cursor));
        let guard = SettleGuard::new(&self.state, &self.cancel, move |s: &mut FeedState| {
            s.fail(ticket, FEED_ERROR_MESSAGE);
        });

        let result = tokio::select! {
            _ = self.cancel.cancelled() => {
                debug!("feed disposed while fetching; response dropped");
                return Vec::new();
            }
            result = self.backend.list_documents(cursor.skip(), cursor.limit()) => result,
        };
        guard.disarm();

        match result {
            Ok(mut records) => {
                records.iter_mut().for_each(DocumentRecord::bound_extras);
                debug!(
                    page = cursor.page(),
                    count = records.len(),
                    "documents fetched"
                );
                let applied = self.state.update(|s| s.succeed(ticket, records.clone()));
                if !applied {
                    debug!(page = cursor.page(), "superseded page ignored");
                }
                records
            }
            Err(e) => {
                warn!(error = %e, page = cursor.page(), "Error fetching documents");
                self.state.update(|s| s.fail(ticket, FEED_ERROR_MESSAGE));
                Vec::new()
            }
        }
    }

    pub async fn next_page(&self) -> Vec<DocumentRecord> {
        self.fetch(self.current().next()).await
    }

    pub async fn prev_page(&self) -> Vec<DocumentRecord> {
        self.fetch(self.current().prev()).await
    }

    /// Re-fetches the current page.
    pub async fn refresh(&self) -> Vec<DocumentRecord> {
        self.fetch(self.current()).await
    }

    /// Runs [`fetch`](Self::fetch) on a background task.
    pub fn spawn_fetch(self: &Arc<Self>, cursor: PaginationCursor) -> JoinHandle<Vec<DocumentRecord>> {
        let feed = Arc::clone(self);
        tokio::spawn(async move { feed.fetch(cursor).await })
    }

    /// Starts the initial fetch of page 0. Only the first call does anything.
    pub fn activate(self: &Arc<Self>) -> Option<JoinHandle<Vec<DocumentRecord>>> {
        if self.activated.swap(true, Ordering::SeqCst) {
            return None;
        }
        Some(self.spawn_fetch(self.first_page()))
    }

    /// Stops publishing. In-flight responses are dropped.
    pub fn dispose(&self) {
        self.cancel.cancel();
    }

    pub fn is_disposed(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// CLI entry point for `rooms list`.
///
/// Prints the page as room cards, or as a JSON array with `--json`. Fails
/// when the page could not be loaded.
pub async fn run_list(
    config: &Config,
    backend: Arc<dyn CatalogBackend>,
    page: u32,
    page_size: Option<u32>,
    json: bool,
    status: &dyn StatusReporter,
) -> Result<()> {
    let feed = DocumentFeed::new(backend, config);

    status.report(StatusEvent::Busy { flow: Flow::Feed });
    let records = feed
        .fetch_page(page, page_size.unwrap_or(config.feed.page_size))
        .await;
    let state = feed.snapshot();
    status.report(StatusEvent::Settled {
        flow: Flow::Feed,
        ok: state.error().is_none(),
    });

    if let Some(message) = state.error() {
        bail!("{}", message);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        print!("{}", render::feed(&state));
    }
    Ok(())
}
