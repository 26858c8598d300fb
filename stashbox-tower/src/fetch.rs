//! Network adapter for Tower services.
//!
//! This module provides [`TowerFetch`](crate::fetch::TowerFetch), which lets
//! the worker reach the network through any Tower HTTP service, such as a
//! `hyper-util` client or a test double built with `tower::service_fn`.

use async_trait::async_trait;
use bytes::Bytes;
use http::{Request, Response, Uri};
use http_body::Body as HttpBody;
use http_body_util::{BodyExt, Full};
use stashbox_core::{Fetch, FetchError, FetchRequest, FetchResult, ResponseSnapshot};
use tower::{BoxError, Service, ServiceExt};
use tracing::trace;

/// Adapter that implements [`Fetch`] for Tower services.
///
/// Each fetch clones the service, sends a request with an empty body and
/// buffers the whole response body.
///
/// # Type Parameters
///
/// * `S` - The Tower service performing the HTTP round trip
#[derive(Debug, Clone)]
pub struct TowerFetch<S> {
    service: S,
}

impl<S> TowerFetch<S> {
    /// Creates a new adapter wrapping the given service.
    pub fn new(service: S) -> Self {
        Self { service }
    }

    /// Returns the wrapped service.
    pub fn into_inner(self) -> S {
        self.service
    }
}

/// Converts a worker request into an HTTP request with an empty body.
pub fn into_http_request(request: &FetchRequest) -> Result<Request<Full<Bytes>>, FetchError> {
    let url = request.url().as_str();
    let uri: Uri = url.parse().map_err(|error| FetchError::network(url, error))?;
    let mut http_request = Request::builder()
        .method(request.method().clone())
        .uri(uri)
        .body(Full::new(Bytes::new()))
        .map_err(|error| FetchError::network(url, error))?;
    *http_request.headers_mut() = request.headers().clone();
    Ok(http_request)
}

/// Buffers an HTTP response into a snapshot.
pub async fn into_snapshot<B>(response: Response<B>) -> Result<ResponseSnapshot, BoxError>
where
    B: HttpBody,
    B::Error: Into<BoxError>,
{
    let (parts, body) = response.into_parts();
    let body = body.collect().await.map_err(Into::<BoxError>::into)?.to_bytes();
    Ok(ResponseSnapshot::from_parts(parts.status, parts.headers, body))
}

#[async_trait]
impl<S, B> Fetch for TowerFetch<S>
where
    S: Service<Request<Full<Bytes>>, Response = Response<B>> + Clone + Send + Sync + 'static,
    S::Future: Send,
    S::Error: Into<BoxError>,
    B: HttpBody + Send + 'static,
    B::Data: Send,
    B::Error: Into<BoxError>,
{
    async fn fetch(&self, request: FetchRequest) -> FetchResult {
        let http_request = into_http_request(&request)?;
        let url = request.url().as_str();
        trace!(url, "fetching from network");

        let response = self
            .service
            .clone()
            .oneshot(http_request)
            .await
            .map_err(|error| FetchError::network(url, error))?;
        into_snapshot(response)
            .await
            .map_err(|error| FetchError::network(url, error))
    }
}
