//! The install manifest.
//!
//! Every URL in the manifest must be fetched successfully before a worker
//! version may activate. Entries are resolved against the origin once, at
//! construction, so that install only deals with absolute URLs.

use std::collections::HashSet;

use url::Url;

use crate::error::WorkerError;

/// Ordered, de-duplicated list of absolute URLs to pre-cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallManifest {
    urls: Vec<Url>,
}

impl InstallManifest {
    /// Resolves `entries` against `origin`.
    ///
    /// Entries that resolve to the same URL (after dropping any fragment) are
    /// kept once, at the position where they first appeared.
    pub fn resolve<S: AsRef<str>>(origin: &Url, entries: &[S]) -> Result<Self, WorkerError> {
        let mut seen = HashSet::with_capacity(entries.len());
        let mut urls = Vec::with_capacity(entries.len());
        for entry in entries {
            let entry = entry.as_ref();
            let mut url = origin
                .join(entry)
                .map_err(|source| WorkerError::InvalidUrl {
                    url: entry.to_owned(),
                    source,
                })?;
            url.set_fragment(None);
            if seen.insert(url.clone()) {
                urls.push(url);
            }
        }
        Ok(Self { urls })
    }

    /// Returns the URLs in install order.
    pub fn urls(&self) -> &[Url] {
        &self.urls
    }

    /// Returns the number of distinct URLs.
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    /// Returns `true` if there is nothing to pre-cache.
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Iterates over the URLs in install order.
    pub fn iter(&self) -> std::slice::Iter<'_, Url> {
        self.urls.iter()
    }
}

impl<'a> IntoIterator for &'a InstallManifest {
    type Item = &'a Url;
    type IntoIter = std::slice::Iter<'a, Url>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
