use std::task::{Context, Poll};

use bytes::Bytes;
use futures::future::BoxFuture;
use http::header::HeaderName;
use http::request::Parts;
use http::{HeaderValue, Request, Response};
use http_body::Body as HttpBody;
use http_body_util::Full;
use stashbox::{Destination, FetchRequest, ServiceWorker};
use stashbox_core::ResponseSnapshot;
use tower::{BoxError, Service};
use tracing::debug;
use url::Url;

use crate::fetch::into_snapshot;

/// Request header carrying the request destination.
pub const SEC_FETCH_DEST: HeaderName = HeaderName::from_static("sec-fetch-dest");

/// Tower service that offers every request to a [`ServiceWorker`] before
/// the wrapped service sees it.
///
/// Requests the worker answers never reach the inner service. Everything
/// else, including every request while the worker is not yet active, is
/// forwarded unchanged. Responses are always buffered.
#[derive(Debug, Clone)]
pub struct WorkerService<S> {
    inner: S,
    worker: ServiceWorker,
    source_header: HeaderName,
}

impl<S> WorkerService<S> {
    /// Wraps `inner`.
    pub fn new(inner: S, worker: ServiceWorker, source_header: HeaderName) -> Self {
        Self {
            inner,
            worker,
            source_header,
        }
    }
}

/// Builds the worker's view of an incoming request.
///
/// Origin-form URIs (`/path?query`) are resolved against the worker origin.
fn fetch_request(worker: &ServiceWorker, parts: &Parts) -> Option<FetchRequest> {
    let url = if parts.uri.scheme().is_some() {
        Url::parse(&parts.uri.to_string()).ok()?
    } else {
        let path = parts
            .uri
            .path_and_query()
            .map(|path| path.as_str())
            .unwrap_or("/");
        worker.config().resolve(path).ok()?
    };
    let destination = parts
        .headers
        .get(&SEC_FETCH_DEST)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<Destination>().ok())
        .unwrap_or_default();
    Some(
        FetchRequest::new(parts.method.clone(), url)
            .with_destination(destination)
            .with_headers(parts.headers.clone()),
    )
}

fn into_response(
    snapshot: ResponseSnapshot,
    header: &HeaderName,
    source: &'static str,
) -> Response<Full<Bytes>> {
    let (status, headers, body) = snapshot.into_parts();
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
        .headers_mut()
        .insert(header.clone(), HeaderValue::from_static(source));
    response
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for WorkerService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    S::Error: Into<BoxError>,
    ReqBody: Send + 'static,
    ResBody: HttpBody + Send + 'static,
    ResBody::Data: Send,
    ResBody::Error: Into<BoxError>,
{
    type Response = Response<Full<Bytes>>;
    type Error = BoxError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        // Keep the service that was driven to readiness.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let worker = self.worker.clone();
        let header = self.source_header.clone();

        Box::pin(async move {
            let (parts, body) = request.into_parts();
            if let Some(fetch_request) = fetch_request(&worker, &parts)
                && let Some(served) = worker.handle_fetch(fetch_request).await?
            {
                debug!(uri = %parts.uri, source = served.source.as_str(), "served by worker");
                return Ok(into_response(served.response, &header, served.source.as_str()));
            }

            let response = inner
                .call(Request::from_parts(parts, body))
                .await
                .map_err(Into::into)?;
            let snapshot = into_snapshot(response).await?;
            Ok(into_response(snapshot, &header, "passthrough"))
        })
    }
}
