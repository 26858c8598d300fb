use http::StatusCode;
use stashbox_backend::BackendError;
use stashbox_core::FetchError;
use thiserror::Error;

use crate::events::EventKind;
use crate::lifecycle::LifecycleState;

/// Errors produced by the worker.
///
/// Install failures are fatal for the worker version that produced them.
/// Fetch failures are returned to the page only after every cache fallback
/// of the active strategy has been exhausted.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// A manifest URL could not be fetched during install.
    #[error("failed to pre-cache {url}: {source}")]
    Install {
        /// The manifest entry that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: FetchError,
    },

    /// A manifest URL answered with a non-success status during install.
    #[error("failed to pre-cache {url}: unexpected status {status}")]
    InstallStatus {
        /// The manifest entry that failed.
        url: String,
        /// The status the network returned.
        status: StatusCode,
    },

    /// The network failed and no cached copy could stand in.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A cache storage operation failed.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// A lifecycle operation was attempted from the wrong state.
    #[error("cannot {operation} while the worker is {state}")]
    InvalidState {
        /// The attempted operation.
        operation: &'static str,
        /// The state the worker was in.
        state: LifecycleState,
    },

    /// A configured URL could not be parsed or resolved.
    #[error("invalid url {url:?}: {source}")]
    InvalidUrl {
        /// The offending input.
        url: String,
        /// The parse failure.
        #[source]
        source: url::ParseError,
    },

    /// An event reached a handler that cannot process it.
    #[error("handler registered for {expected} received a {received} event")]
    UnhandledEvent {
        /// The kind the handler was registered for.
        expected: EventKind,
        /// The kind that actually arrived.
        received: EventKind,
    },
}

impl WorkerError {
    /// Returns `true` if this error failed an install.
    pub fn is_install(&self) -> bool {
        matches!(
            self,
            WorkerError::Install { .. } | WorkerError::InstallStatus { .. }
        )
    }
}
