//! Plain-text rendering of feed, form and chat state.

use std::fmt::Write;

use roomdesk_core::chat::{ChatMessage, Delivery, Role};
use roomdesk_core::feed::{FeedState, FeedView};
use roomdesk_core::form::{FormField, FormModel, SubmitStatus};
use roomdesk_core::models::DocumentRecord;
use roomdesk_core::sanitize::ScaffoldFilter;

/// One room card: title, details, availability badge and image URL.
pub fn card(record: &DocumentRecord) -> String {
    let meta = &record.metadata;
    let mut out = String::new();
    let _ = writeln!(out, "{}  [{}]", record.page_content, record.availability());
    let _ = writeln!(
        out,
        "  Description: {}",
        meta.description.as_deref().unwrap_or("")
    );
    let _ = writeln!(out, "  Room: {}", meta.room_number.as_deref().unwrap_or(""));
    match meta.room_size {
        Some(size) => {
            let _ = writeln!(out, "  Room Size: {}㎡", size);
        }
        None => {
            let _ = writeln!(out, "  Room Size: ㎡");
        }
    }
    if let Some(url) = meta.image_url.as_deref().filter(|u| !u.is_empty()) {
        let _ = writeln!(out, "  Image: {}", url);
    }
    out
}

/// The feed as the view would show it.
pub fn feed(state: &FeedState) -> String {
    let page = state.cursor().map(|c| c.page()).unwrap_or(0);
    match state.view() {
        FeedView::Loading => "Loading documents...\n".to_string(),
        FeedView::Empty => "No documents found.\n".to_string(),
        FeedView::Error { message, stale } => {
            let mut out = format!("{}\n", message);
            if !stale.is_empty() {
                out.push_str("\nLast loaded page:\n\n");
                out.push_str(&cards(stale));
            }
            out
        }
        FeedView::Ready(records) => {
            let mut out = cards(records);
            let _ = writeln!(out, "-- page {} ({} rooms) --", page, records.len());
            out
        }
    }
}

fn cards(records: &[DocumentRecord]) -> String {
    records.iter().map(card).collect::<Vec<_>>().join("\n")
}

pub fn form(form: &FormModel, status: &SubmitStatus) -> String {
    let mut out = String::new();
    for field in FormField::ALL {
        let _ = writeln!(out, "  {:<13} {}", field.name(), form.value(field));
    }
    match status {
        SubmitStatus::Idle => {}
        SubmitStatus::Submitting => out.push_str("Submitting...\n"),
        SubmitStatus::Succeeded => out.push_str("Last submission: added\n"),
        SubmitStatus::Failed(message) => {
            let _ = writeln!(out, "Last submission failed: {}", message);
        }
    }
    out
}

/// One chat line. Assistant text is sanitized; failed user messages carry a
/// retry hint.
pub fn message(message: &ChatMessage, filter: &ScaffoldFilter) -> String {
    let text = message.display_text(filter);
    match (&message.role, &message.delivery) {
        (Role::User, Delivery::Failed { reason }) => {
            format!("you: {}\n  ! not delivered: {} (/retry)\n", text, reason)
        }
        (Role::User, _) => format!("you: {}\n", text),
        (Role::Assistant, _) => format!("assistant: {}\n", text),
    }
}
