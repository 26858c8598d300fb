//! Request identity used as the cache key.
//!
//! A [`RequestKey`] is the pair (method, normalized URL). Normalization strips
//! the URL fragment, since fragments never reach the network and two requests
//! that differ only by `#section` are the same resource.
//!
//! ```
//! use http::Method;
//! use stashbox_core::RequestKey;
//! use url::Url;
//!
//! let url = Url::parse("https://example.com/index.html#about").unwrap();
//! let key = RequestKey::new(Method::GET, &url);
//! assert_eq!(format!("{}", key), "GET https://example.com/index.html");
//! ```
//!
//! ## Performance
//!
//! [`RequestKey`] uses `Arc` internally for cheap cloning - copying a key
//! only increments a reference count. Keys are cloned into background
//! revalidation tasks and into every cache write.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use http::Method;
use smol_str::SmolStr;
use url::Url;

#[derive(Debug, Eq, PartialEq, Hash)]
struct RequestKeyInner {
    method: Method,
    url: SmolStr,
}

/// A cache key identifying a stored response.
#[derive(Clone, Debug)]
pub struct RequestKey {
    inner: Arc<RequestKeyInner>,
}

impl RequestKey {
    /// Creates a key for `method` and `url`, dropping the URL fragment.
    pub fn new(method: Method, url: &Url) -> Self {
        let mut normalized = url.clone();
        normalized.set_fragment(None);
        Self {
            inner: Arc::new(RequestKeyInner {
                method,
                url: SmolStr::new(normalized.as_str()),
            }),
        }
    }

    /// Shorthand for a `GET` key.
    pub fn get(url: &Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// Returns the request method.
    pub fn method(&self) -> &Method {
        &self.inner.method
    }

    /// Returns the normalized URL.
    pub fn url(&self) -> &str {
        &self.inner.url
    }
}

impl PartialEq for RequestKey {
    fn eq(&self, other: &Self) -> bool {
        // Fast path: same Arc pointer
        Arc::ptr_eq(&self.inner, &other.inner) || self.inner == other.inner
    }
}

impl Eq for RequestKey {}

impl Hash for RequestKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.hash(state);
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.inner.method, self.inner.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn fragment_is_ignored() {
        let a = RequestKey::get(&url("https://example.com/#projects"));
        let b = RequestKey::get(&url("https://example.com/"));
        assert_eq!(a, b);
    }

    #[test]
    fn query_and_method_are_significant() {
        let plain = RequestKey::get(&url("https://example.com/css2?family=Inter"));
        let other = RequestKey::get(&url("https://example.com/css2?family=Roboto"));
        assert_ne!(plain, other);

        let head = RequestKey::new(Method::HEAD, &url("https://example.com/css2?family=Inter"));
        assert_ne!(plain, head);
    }
}
