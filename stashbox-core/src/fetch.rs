use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::request::FetchRequest;
use crate::response::ResponseSnapshot;

/// Result of a network fetch.
pub type FetchResult = Result<ResponseSnapshot, FetchError>;

/// Error returned when a request never produced a response.
///
/// An HTTP error status is *not* a fetch error: a `404` is a perfectly good
/// response that simply isn't stored. Only transport-level failures are
/// reported here.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The network could not be reached or the transport failed.
    #[error("network request to {url} failed: {source}")]
    Network {
        /// The URL that was being fetched.
        url: String,
        /// Underlying transport error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// The URL could not be parsed or resolved.
    #[error("invalid url {url:?}: {source}")]
    InvalidUrl {
        /// The offending input.
        url: String,
        /// Parser error.
        #[source]
        source: url::ParseError,
    },
}

impl FetchError {
    /// Wraps a transport error for `url`.
    pub fn network<E>(url: impl Into<String>, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        FetchError::Network {
            url: url.into(),
            source: source.into(),
        }
    }
}

/// Trait for reaching the network with an intercepted request.
///
/// This is the worker's only window to the outside world, so tests can
/// substitute a scripted implementation and integrations can plug in any
/// HTTP client.
///
/// # Examples
///
/// ```rust,ignore
/// use stashbox_core::{Fetch, FetchRequest, FetchResult, ResponseSnapshot};
///
/// struct Static(ResponseSnapshot);
///
/// #[async_trait::async_trait]
/// impl Fetch for Static {
///     async fn fetch(&self, _request: FetchRequest) -> FetchResult {
///         Ok(self.0.clone())
///     }
/// }
/// ```
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Performs the request and buffers the whole response.
    async fn fetch(&self, request: FetchRequest) -> FetchResult;
}

#[async_trait]
impl<T> Fetch for Arc<T>
where
    T: Fetch + ?Sized,
{
    async fn fetch(&self, request: FetchRequest) -> FetchResult {
        (**self).fetch(request).await
    }
}

#[async_trait]
impl<T> Fetch for Box<T>
where
    T: Fetch + ?Sized,
{
    async fn fetch(&self, request: FetchRequest) -> FetchResult {
        (**self).fetch(request).await
    }
}
