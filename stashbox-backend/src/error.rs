//! Error types for backend operations.

use thiserror::Error;

/// Error type for backend operations.
///
/// This enum categorizes errors that can occur during cache storage
/// interactions into distinct groups for appropriate handling.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Internal backend error, state or computation error.
    ///
    /// Any error not related to I/O with an external store.
    #[error(transparent)]
    InternalError(Box<dyn std::error::Error + Send + Sync>),

    /// Error talking to an external store.
    #[error(transparent)]
    ConnectionError(Box<dyn std::error::Error + Send + Sync>),
}

impl BackendError {
    /// Builds an [`BackendError::InternalError`] from a message.
    pub fn internal(message: impl Into<String>) -> Self {
        BackendError::InternalError(Box::new(std::io::Error::other(message.into())))
    }
}
