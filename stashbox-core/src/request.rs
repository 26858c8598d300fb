//! Intercepted request types.
//!
//! A [`FetchRequest`] is what the worker sees for every request a page makes:
//! the method, the absolute URL, and the semantic [`Destination`] the browser
//! assigned to it (a full page load, a stylesheet, an image, and so on).

use std::fmt;
use std::str::FromStr;

use http::{HeaderMap, Method};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::fetch::FetchError;
use crate::key::RequestKey;

/// The semantic destination of a request.
///
/// Mirrors the values of the `Sec-Fetch-Dest` request header. Only
/// [`Destination::Document`] changes routing decisions; the rest are kept so
/// that logs and metrics can tell requests apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    /// A top-level navigation or full page load.
    Document,
    /// A stylesheet.
    Style,
    /// A classic or module script.
    Script,
    /// An image (`<img>`, favicon, CSS background).
    Image,
    /// A web font.
    Font,
    /// A web app manifest.
    Manifest,
    /// Anything else, including `fetch()` calls with an empty destination.
    #[default]
    Other,
}

impl Destination {
    /// Returns the destination as it appears in `Sec-Fetch-Dest`.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Destination::Document => "document",
            Destination::Style => "style",
            Destination::Script => "script",
            Destination::Image => "image",
            Destination::Font => "font",
            Destination::Manifest => "manifest",
            Destination::Other => "empty",
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Destination {
    type Err = std::convert::Infallible;

    /// Parses a `Sec-Fetch-Dest` value. Unknown values map to [`Destination::Other`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let destination = match s.trim().to_ascii_lowercase().as_str() {
            "document" | "iframe" | "frame" => Destination::Document,
            "style" => Destination::Style,
            "script" | "worker" | "sharedworker" | "serviceworker" => Destination::Script,
            "image" => Destination::Image,
            "font" => Destination::Font,
            "manifest" => Destination::Manifest,
            _ => Destination::Other,
        };
        Ok(destination)
    }
}

/// A request as seen by the worker.
///
/// # Example
///
/// ```
/// use stashbox_core::{Destination, FetchRequest};
///
/// let request = FetchRequest::get("https://example.com/index.html")
///     .unwrap()
///     .with_destination(Destination::Document);
///
/// assert!(request.is_interceptable());
/// assert!(request.is_document());
/// ```
#[derive(Debug, Clone)]
pub struct FetchRequest {
    method: Method,
    url: Url,
    destination: Destination,
    headers: HeaderMap,
}

impl FetchRequest {
    /// Creates a request with the given method and absolute URL.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            destination: Destination::default(),
            headers: HeaderMap::new(),
        }
    }

    /// Creates a `GET` request by parsing an absolute URL.
    pub fn get(url: &str) -> Result<Self, FetchError> {
        let url = Url::parse(url).map_err(|source| FetchError::InvalidUrl {
            url: url.to_owned(),
            source,
        })?;
        Ok(Self::new(Method::GET, url))
    }

    /// Sets the semantic destination.
    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    /// Replaces the request headers.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Returns the request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the absolute request URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Returns the semantic destination.
    pub fn destination(&self) -> Destination {
        self.destination
    }

    /// Returns the request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns `true` for a full document load.
    pub fn is_document(&self) -> bool {
        self.destination == Destination::Document
    }

    /// Returns `true` if the worker may intercept this request.
    ///
    /// Only `GET` requests over `http` or `https` are intercepted; everything
    /// else goes straight to the network.
    pub fn is_interceptable(&self) -> bool {
        self.method == Method::GET && matches!(self.url.scheme(), "http" | "https")
    }

    /// Returns the cache identity of this request.
    pub fn key(&self) -> RequestKey {
        RequestKey::new(self.method.clone(), &self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_http_get_is_interceptable() {
        let get = FetchRequest::get("https://example.com/styles.css").unwrap();
        assert!(get.is_interceptable());

        let post = FetchRequest::new(Method::POST, get.url().clone());
        assert!(!post.is_interceptable());

        let extension = FetchRequest::get("chrome-extension://abcdef/script.js").unwrap();
        assert!(!extension.is_interceptable());
    }

    #[test]
    fn destination_parses_fetch_dest_values() {
        assert_eq!("document".parse::<Destination>().unwrap(), Destination::Document);
        assert_eq!("iframe".parse::<Destination>().unwrap(), Destination::Document);
        assert_eq!("Font".parse::<Destination>().unwrap(), Destination::Font);
        assert_eq!("empty".parse::<Destination>().unwrap(), Destination::Other);
        assert_eq!("audio".parse::<Destination>().unwrap(), Destination::Other);
    }

    #[test]
    fn invalid_url_is_rejected() {
        let err = FetchRequest::get("/relative/path").unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
    }
}
