//! # Roomdesk
//!
//! A terminal client for a room catalog service.
//!
//! Roomdesk drives three independent flows against one HTTP backend: a paged
//! feed of room records, a form that adds a room, and a chat with the
//! catalog assistant. Each flow is a controller that publishes its state on a
//! watch channel; the `rooms` CLI and the interactive shell render from those
//! channels.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌───────────────────┐   ┌──────────────┐
//! │ DocumentFeed │   │  RecordSubmitter  │   │ ChatSession  │
//! └──────┬───────┘   └─────────┬─────────┘   └──────┬───────┘
//!        │                     │                    │
//!        └──────────┬──────────┴────────────────────┘
//!                   ▼
//!          ┌─────────────────┐        ┌──────────────────┐
//!          │ CatalogBackend  │──────▶ │ HttpBackend /    │
//!          │     (trait)     │        │ MemoryBackend    │
//!          └─────────────────┘        └──────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! export ROOMS_BACKEND_URL=http://localhost:8000
//! rooms list --page 0
//! rooms add --room-number 101 --title "Corner room" --description "Two windows" --room-size 20
//! rooms ask "Which rooms are free tonight?"
//! rooms shell
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`http`] | HTTP implementation of the catalog backend |
//! | [`state`] | Published flow state and settle guards |
//! | [`feed`] | Paginated document feed |
//! | [`submit`] | Add-room form submission |
//! | [`chat`] | Assistant chat session |
//! | [`console`] | The three flows mounted together |
//! | [`render`] | Plain-text rendering |
//! | [`status`] | Busy indicators on stderr |
//! | [`shell`] | Interactive console |
//!
//! The pure state machines, the data model and the backend trait live in
//! the `roomdesk-core` crate.

pub mod chat;
pub mod config;
pub mod console;
pub mod feed;
pub mod http;
pub mod render;
pub mod shell;
pub mod state;
pub mod status;
pub mod submit;
