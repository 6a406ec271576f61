//! # Roomdesk Core
//!
//! Shared, runtime-free logic for Roomdesk: room records, the pagination
//! cursor, the submission form model, the feed and chat reducers, the
//! scaffold filter applied to assistant replies, and the
//! [`CatalogBackend`](backend::CatalogBackend) trait.
//!
//! This crate contains no tokio, reqwest, filesystem I/O, or other
//! native-only dependencies. Every state transition here is a plain method
//! on a plain struct; the `roomdesk` crate wraps them in async controllers.

pub mod backend;
pub mod chat;
pub mod feed;
pub mod form;
pub mod models;
pub mod sanitize;
