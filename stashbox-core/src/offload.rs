//! Offload trait for background task execution.
//!
//! This module provides the [`Offload`] trait which abstracts over
//! different implementations for spawning detached background tasks.

use std::future::Future;

use smol_str::SmolStr;

/// Trait for spawning background tasks.
///
/// Stale-while-revalidate uses this to refresh a cache entry after the
/// cached copy has already been handed to the page. The spawned future is
/// never joined by the caller; its outcome is only observed by logging.
///
/// # Implementations
///
/// The primary implementation is `OffloadManager` in the `stashbox` crate.
/// [`DisabledOffload`] drops work on the floor and exists for contexts where
/// background refresh is not wanted.
///
/// # Clone bound
///
/// Implementors should use `Arc` internally to ensure all cloned instances
/// share the same configuration and state.
pub trait Offload: Send + Sync + Clone {
    /// Spawn a future to be executed in the background.
    ///
    /// # Arguments
    ///
    /// * `kind` - A label categorizing the task type (e.g., "revalidate").
    ///   Used for metrics and tracing.
    /// * `future` - The future to execute. Must be `Send + 'static` as it may
    ///   run on a different thread.
    fn spawn<F>(&self, kind: impl Into<SmolStr>, future: F)
    where
        F: Future<Output = ()> + Send + 'static;
}

/// An [`Offload`] that never runs anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledOffload;

impl Offload for DisabledOffload {
    fn spawn<F>(&self, _kind: impl Into<SmolStr>, _future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
    }
}
