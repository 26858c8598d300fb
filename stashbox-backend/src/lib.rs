//! Traits and structs for stashbox cache storage.
//!
//! Storage is two-level, matching the browser cache API the worker was
//! designed around:
//!
//! - [`CacheStorage`] owns every named generation and answers cross-generation
//!   lookups.
//! - [`Backend`] is a single generation: a key/value store from request
//!   identity to response snapshot.
//!
//! If you want to implement your own storage, you are in the right place.
mod backend;
mod error;
mod storage;

pub use backend::{Backend, BackendResult};
pub use error::BackendError;
pub use storage::{CacheMatch, CacheStorage};

/// Status of deleting result.
#[derive(Debug, PartialEq, Eq)]
pub enum DeleteStatus {
    /// Record successfully deleted.
    Deleted(u32),
    /// Record already missing.
    Missing,
}
