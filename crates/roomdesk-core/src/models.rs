//! Core data models used throughout Roomdesk.
//!
//! These types represent the room records served by the catalog backend,
//! the payload sent when a new room is created, and the cursor used to page
//! through the catalog.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Maximum number of unrecognized attributes kept per record or metadata map.
pub const MAX_EXTRA_ATTRIBUTES: usize = 32;

/// Default number of records per catalog page.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// One catalog entry as returned by `GET /get-documents/`.
///
/// Records are created and owned by the backend. The client replaces its
/// in-memory page wholesale on every successful fetch and never edits a
/// record in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    #[serde(default)]
    pub id: String,
    /// Display title.
    pub page_content: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: RoomMetadata,
    /// Attributes this client does not know about yet.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Descriptive fields attached to a [`DocumentRecord`]. All optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_booked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl DocumentRecord {
    /// Drops unrecognized attributes beyond [`MAX_EXTRA_ATTRIBUTES`] on the
    /// record and on its metadata.
    pub fn bound_extras(&mut self) {
        truncate_extras(&mut self.extra);
        truncate_extras(&mut self.metadata.extra);
    }

    /// `true` only when the backend explicitly marked the room as booked.
    pub fn is_booked(&self) -> bool {
        self.metadata.is_booked.unwrap_or(false)
    }

    /// Badge text shown on a room card.
    pub fn availability(&self) -> &'static str {
        if self.is_booked() {
            "Booked"
        } else {
            "Available"
        }
    }
}

fn truncate_extras(map: &mut BTreeMap<String, Value>) {
    while map.len() > MAX_EXTRA_ATTRIBUTES {
        map.pop_last();
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A single element of the batch posted to `POST /add-documents`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRoom {
    pub room_number: String,
    pub description: String,
    pub room_size: f64,
    /// Serialized as `null` when the form field was left blank.
    pub image_url: Option<String>,
    pub is_booked: bool,
    pub page_content: String,
    #[serde(default)]
    pub metadata: serde_json::Map<String, Value>,
}

/// Page index and page size for one catalog fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationCursor {
    page: u32,
    page_size: u32,
}

impl PaginationCursor {
    /// Returns `None` when `page_size` is zero.
    pub fn new(page: u32, page_size: u32) -> Option<Self> {
        if page_size == 0 {
            return None;
        }
        Some(Self { page, page_size })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Zero-based offset of the first record on this page.
    pub fn skip(&self) -> u64 {
        u64::from(self.page) * u64::from(self.page_size)
    }

    /// Number of records requested.
    pub fn limit(&self) -> u64 {
        u64::from(self.page_size)
    }

    pub fn next(&self) -> Self {
        Self {
            page: self.page.saturating_add(1),
            page_size: self.page_size,
        }
    }

    /// The previous page, or the first page when already there.
    pub fn prev(&self) -> Self {
        Self {
            page: self.page.saturating_sub(1),
            page_size: self.page_size,
        }
    }
}

impl Default for PaginationCursor {
    fn default() -> Self {
        Self {
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}
