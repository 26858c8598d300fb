//! Buffered response snapshots.
//!
//! Every response that passes through the worker, whether it came from the
//! network or from a cache generation, is a fully buffered
//! [`ResponseSnapshot`]. Buffering is what makes it possible to hand one copy
//! to the page and store another: cloning a snapshot is cheap because the
//! body is reference-counted [`Bytes`](bytes::Bytes).

use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};

use crate::Raw;

/// A stored or freshly fetched response: status, headers and body bytes.
///
/// # Example
///
/// ```
/// use http::StatusCode;
/// use stashbox_core::ResponseSnapshot;
///
/// let response = ResponseSnapshot::new(StatusCode::OK, "<h1>hello</h1>");
/// assert!(response.is_storable());
///
/// let missing = ResponseSnapshot::new(StatusCode::NOT_FOUND, "");
/// assert!(!missing.is_storable());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSnapshot {
    status: StatusCode,
    headers: HeaderMap,
    body: Raw,
}

impl ResponseSnapshot {
    /// Creates a snapshot with no headers.
    pub fn new(status: StatusCode, body: impl Into<Raw>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Creates a snapshot from its parts.
    pub fn from_parts(status: StatusCode, headers: HeaderMap, body: Raw) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Adds a header, replacing any existing value.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Returns the status code.
    #[inline]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the response headers.
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the response body.
    #[inline]
    pub fn body(&self) -> &Raw {
        &self.body
    }

    /// Returns `true` for any 2xx status.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns `true` if this response may be written to a cache generation.
    ///
    /// Only `200 OK` is stored; partial content, redirects and errors are
    /// passed to the page but never cached.
    pub fn is_storable(&self) -> bool {
        self.status == StatusCode::OK
    }

    /// Consumes the snapshot and returns its parts.
    pub fn into_parts(self) -> (StatusCode, HeaderMap, Raw) {
        (self.status, self.headers, self.body)
    }
}
