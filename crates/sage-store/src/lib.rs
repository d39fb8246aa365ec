//! SAGE Store - document persistence interface
//!
//! The editor never owns a document; the store does. This crate defines
//! the request/response contract the rest of the system depends on:
//! - [`DocumentStore`]: per-entity create/update/delete/reorder plus
//!   the bulk replace used by undo
//! - [`MemoryStore`]: in-process backend for tests and the demo CLI
//! - [`RestStore`]: the HTTP backend used against the real service

pub mod error;
pub mod memory;
pub mod rest;
pub mod store;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use rest::RestStore;
pub use store::DocumentStore;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
