//! Scripted network for driving a worker in tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::{DashMap, DashSet};
use http::StatusCode;
use stashbox_core::{Fetch, FetchError, FetchRequest, FetchResult, ResponseSnapshot};
use url::Url;

/// Origin every relative path is resolved against.
pub const TEST_ORIGIN: &str = "https://portfolio.example/";

#[derive(Debug, Clone)]
struct Route {
    status: StatusCode,
    body: Bytes,
}

#[derive(Debug)]
struct NetworkState {
    origin: Url,
    routes: DashMap<String, Route>,
    calls: DashMap<String, usize>,
    unreachable: DashSet<String>,
    offline: AtomicBool,
}

/// A [`Fetch`] implementation answering from a route table.
///
/// Unknown URLs answer `404`. Clones share routes, counters and the offline
/// switch, so a test keeps one handle while the worker owns another.
#[derive(Debug, Clone)]
pub struct MockNetwork {
    state: Arc<NetworkState>,
}

impl Default for MockNetwork {
    fn default() -> Self {
        Self::new(TEST_ORIGIN)
    }
}

impl MockNetwork {
    /// Creates a network resolving relative paths against `origin`.
    ///
    /// # Panics
    ///
    /// Panics if `origin` is not an absolute URL.
    pub fn new(origin: &str) -> Self {
        let origin = Url::parse(origin).expect("test origin must be absolute");
        Self {
            state: Arc::new(NetworkState {
                origin,
                routes: DashMap::new(),
                calls: DashMap::new(),
                unreachable: DashSet::new(),
                offline: AtomicBool::new(false),
            }),
        }
    }

    /// Resolves a path or absolute URL to the key the network uses.
    pub fn url(&self, target: &str) -> String {
        self.state
            .origin
            .join(target)
            .expect("test url must resolve")
            .to_string()
    }

    /// Answers `target` with `200 OK` and `body`.
    pub fn serve(&self, target: &str, body: impl Into<Bytes>) -> &Self {
        self.serve_status(target, StatusCode::OK, body)
    }

    /// Answers `target` with `status` and `body`.
    pub fn serve_status(&self, target: &str, status: StatusCode, body: impl Into<Bytes>) -> &Self {
        self.state.routes.insert(
            self.url(target),
            Route {
                status,
                body: body.into(),
            },
        );
        self
    }

    /// Serves every target with `200 OK` and its own path as the body.
    pub fn serve_paths<'a>(&self, targets: impl IntoIterator<Item = &'a str>) -> &Self {
        for target in targets {
            let url = self.url(target);
            let body = Url::parse(&url)
                .map(|url| url.path().to_owned())
                .unwrap_or_default();
            self.serve(target, body);
        }
        self
    }

    /// Makes a single URL unreachable while the rest of the network works.
    pub fn break_url(&self, target: &str) {
        self.state.unreachable.insert(self.url(target));
    }

    /// Makes a single URL reachable again.
    pub fn repair_url(&self, target: &str) {
        self.state.unreachable.remove(&self.url(target));
    }

    /// Switches the whole network off or back on.
    pub fn set_offline(&self, offline: bool) {
        self.state.offline.store(offline, Ordering::SeqCst);
    }

    /// Returns `true` while the network is switched off.
    pub fn is_offline(&self) -> bool {
        self.state.offline.load(Ordering::SeqCst)
    }

    /// Number of fetches attempted for `target`, including failed ones.
    pub fn calls(&self, target: &str) -> usize {
        self.state
            .calls
            .get(&self.url(target))
            .map(|calls| *calls)
            .unwrap_or(0)
    }

    /// Number of fetches attempted for any URL.
    pub fn total_calls(&self) -> usize {
        self.state.calls.iter().map(|entry| *entry.value()).sum()
    }

    /// Forgets every recorded call.
    pub fn reset_calls(&self) {
        self.state.calls.clear();
    }
}

#[async_trait]
impl Fetch for MockNetwork {
    async fn fetch(&self, request: FetchRequest) -> FetchResult {
        let url = request.url().as_str().to_owned();
        *self.state.calls.entry(url.clone()).or_insert(0) += 1;

        if self.is_offline() || self.state.unreachable.contains(&url) {
            return Err(FetchError::network(url, "network unreachable"));
        }
        let response = match self.state.routes.get(&url) {
            Some(route) => ResponseSnapshot::new(route.status, route.body.clone()),
            None => ResponseSnapshot::new(StatusCode::NOT_FOUND, Bytes::from_static(b"not found")),
        };
        Ok(response)
    }
}
