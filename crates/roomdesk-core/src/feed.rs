//! Catalog page state.
//!
//! [`FeedState`] is the reducer behind the document feed:
//! `idle → loading → {success, error}`, re-entrant on every fetch. Each call
//! to [`FeedState::begin`] hands out a [`FetchTicket`]; only the newest ticket
//! may settle the state, so a slow response to an older request can neither
//! overwrite a newer page nor clear the newer request's loading flag.

use crate::models::{DocumentRecord, PaginationCursor};

/// Message shown when a page could not be loaded.
pub const FEED_ERROR_MESSAGE: &str = "Failed to load documents. Please try again.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FeedStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

/// Identifies one fetch started by [`FeedState::begin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket(u64);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedState {
    status: FeedStatus,
    records: Vec<DocumentRecord>,
    error: Option<String>,
    cursor: Option<PaginationCursor>,
    latest: u64,
}

/// What the view should render for the current state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeedView<'a> {
    Loading,
    /// The fetch failed; `stale` holds the previously loaded page, if any.
    Error {
        message: &'a str,
        stale: &'a [DocumentRecord],
    },
    Empty,
    Ready(&'a [DocumentRecord]),
}

impl FeedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> FeedStatus {
        self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status == FeedStatus::Loading
    }

    pub fn records(&self) -> &[DocumentRecord] {
        &self.records
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Cursor of the most recently started fetch.
    pub fn cursor(&self) -> Option<PaginationCursor> {
        self.cursor
    }

    /// Enters `Loading` and clears any previous error. Records are kept
    /// until a newer page replaces them.
    pub fn begin(&mut self, cursor: PaginationCursor) -> FetchTicket {
        self.latest += 1;
        self.status = FeedStatus::Loading;
        self.error = None;
        self.cursor = Some(cursor);
        FetchTicket(self.latest)
    }

    pub fn is_current(&self, ticket: FetchTicket) -> bool {
        ticket.0 == self.latest
    }

    /// Replaces the page wholesale. Returns `false` (and changes nothing)
    /// when `ticket` has been superseded.
    pub fn succeed(&mut self, ticket: FetchTicket, records: Vec<DocumentRecord>) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.records = records;
        self.status = FeedStatus::Success;
        self.error = None;
        true
    }

    /// Records a failure without discarding the previous page. Returns
    /// `false` when `ticket` has been superseded.
    pub fn fail(&mut self, ticket: FetchTicket, message: impl Into<String>) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.status = FeedStatus::Error;
        self.error = Some(message.into());
        true
    }

    pub fn view(&self) -> FeedView<'_> {
        if self.is_loading() {
            return FeedView::Loading;
        }
        if let Some(message) = self.error.as_deref() {
            return FeedView::Error {
                message,
                stale: &self.records,
            };
        }
        if self.records.is_empty() {
            FeedView::Empty
        } else {
            FeedView::Ready(&self.records)
        }
    }
}
