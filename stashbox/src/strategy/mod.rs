//! Caching strategies.
//!
//! The [`Executor`] runs one [`Strategy`] against a [`CacheStorage`] and a
//! [`Fetch`] implementation. Reads consult every generation; writes always
//! land in the dynamic generation. A failed cache read counts as a miss and
//! a failed cache write is logged: neither fails the request.

mod cache_first;
mod network_first;
mod stale_while_revalidate;

use std::sync::Arc;

use stashbox_backend::{CacheMatch, CacheStorage};
use stashbox_core::{
    Fetch, FetchRequest, Generation, Offload, RequestKey, ResponseSnapshot, ResponseSource,
};
use tracing::{Instrument, debug, info_span, warn};
use url::Url;

use crate::error::WorkerError;
use crate::offload::OffloadManager;
use crate::route::Strategy;

/// A response together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Served {
    /// The response handed to the page.
    pub response: ResponseSnapshot,
    /// Where the response came from.
    pub source: ResponseSource,
}

impl Served {
    /// A response straight from the network.
    pub fn network(response: ResponseSnapshot) -> Self {
        Self {
            response,
            source: ResponseSource::Network,
        }
    }

    fn cached(hit: CacheMatch) -> Self {
        Self {
            response: hit.response,
            source: ResponseSource::Cache(hit.generation),
        }
    }

    fn fallback(hit: CacheMatch) -> Self {
        Self {
            response: hit.response,
            source: ResponseSource::Fallback(hit.generation),
        }
    }
}

/// Runs caching strategies.
///
/// Cloning is cheap; clones share the storage, the network and the offload
/// manager.
#[derive(Clone)]
pub struct Executor<O = OffloadManager> {
    storage: Arc<dyn CacheStorage>,
    fetch: Arc<dyn Fetch>,
    offload: O,
    dynamic: Generation,
    fallback: Url,
}

impl<O> std::fmt::Debug for Executor<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("dynamic", &self.dynamic)
            .field("fallback", &self.fallback.as_str())
            .finish_non_exhaustive()
    }
}

impl<O> Executor<O>
where
    O: Offload + 'static,
{
    /// Creates an executor writing into `dynamic` and falling back to the
    /// cached `fallback` document.
    pub fn new(
        storage: Arc<dyn CacheStorage>,
        fetch: Arc<dyn Fetch>,
        offload: O,
        dynamic: Generation,
        fallback: Url,
    ) -> Self {
        Self {
            storage,
            fetch,
            offload,
            dynamic,
            fallback,
        }
    }

    /// Returns the generation runtime responses are written to.
    pub fn dynamic(&self) -> &Generation {
        &self.dynamic
    }

    /// Answers `request` using `strategy`.
    pub async fn execute(
        &self,
        strategy: Strategy,
        request: FetchRequest,
    ) -> Result<Served, WorkerError> {
        let span = info_span!(
            "stashbox.fetch",
            url = %request.url(),
            strategy = strategy.as_str(),
            source = tracing::field::Empty,
        );
        let result = async {
            match strategy {
                Strategy::CacheFirst => self.cache_first(request).await,
                Strategy::StaleWhileRevalidate => self.stale_while_revalidate(request).await,
                Strategy::NetworkFirst | Strategy::Default => self.network_first(request).await,
            }
        }
        .instrument(span.clone())
        .await;

        match &result {
            Ok(served) => {
                span.record("source", served.source.as_str());
                crate::metrics::record_served(strategy.as_str(), served.source.as_str());
            }
            Err(_) => crate::metrics::record_failure(strategy.as_str()),
        }
        result
    }

    /// Looks `key` up across every generation. Storage errors count as a miss.
    async fn lookup(&self, key: &RequestKey) -> Option<CacheMatch> {
        match self.storage.match_request(key).await {
            Ok(Some(hit)) => {
                debug!(%key, generation = %hit.generation, "cache hit");
                Some(hit)
            }
            Ok(None) => {
                debug!(%key, "cache miss");
                None
            }
            Err(error) => {
                warn!(%key, %error, "cache lookup failed, treating as miss");
                None
            }
        }
    }

    /// Looks up the cached fallback document.
    async fn lookup_fallback(&self) -> Option<CacheMatch> {
        self.lookup(&RequestKey::get(&self.fallback)).await
    }

    /// Stores a copy of `response` in the dynamic generation if it is a
    /// plain `200 OK`.
    async fn store(&self, key: &RequestKey, response: &ResponseSnapshot) {
        store(self.storage.as_ref(), &self.dynamic, key, response).await;
    }
}

async fn store(
    storage: &dyn CacheStorage,
    generation: &Generation,
    key: &RequestKey,
    response: &ResponseSnapshot,
) {
    if !response.is_storable() {
        debug!(%key, status = %response.status(), "response not stored");
        return;
    }
    let written = match storage.open(generation.name()).await {
        Ok(backend) => backend.write(key, response.clone()).await,
        Err(error) => Err(error),
    };
    match written {
        Ok(()) => debug!(%key, generation = %generation, "response stored"),
        Err(error) => warn!(%key, generation = %generation, %error, "cache write failed"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use http::StatusCode;
    use stashbox_backend::CacheStorage;
    use stashbox_core::{DisabledOffload, FetchError, FetchResult, Role};
    use stashbox_moka::MokaStorage;

    use super::*;

    struct Counting {
        calls: AtomicUsize,
        status: StatusCode,
    }

    #[async_trait]
    impl Fetch for Counting {
        async fn fetch(&self, request: FetchRequest) -> FetchResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.status == StatusCode::SERVICE_UNAVAILABLE {
                return Err(FetchError::network(request.url().as_str(), "offline"));
            }
            Ok(ResponseSnapshot::new(self.status, "body"))
        }
    }

    fn executor(status: StatusCode) -> (Executor<DisabledOffload>, Arc<MokaStorage>) {
        let storage = Arc::new(MokaStorage::default());
        let fetch = Arc::new(Counting {
            calls: AtomicUsize::new(0),
            status,
        });
        let executor = Executor::new(
            storage.clone(),
            fetch,
            DisabledOffload,
            Generation::new(Role::Dynamic, "v1"),
            Url::parse("https://portfolio.example/index.html").unwrap(),
        );
        (executor, storage)
    }

    #[tokio::test]
    async fn non_ok_responses_are_returned_but_not_stored() {
        let (executor, storage) = executor(StatusCode::NOT_FOUND);
        let request = FetchRequest::get("https://portfolio.example/assets/missing.png").unwrap();

        let served = executor
            .execute(Strategy::CacheFirst, request.clone())
            .await
            .unwrap();

        assert_eq!(served.response.status(), StatusCode::NOT_FOUND);
        assert_eq!(served.source, ResponseSource::Network);
        assert!(storage.match_request(&request.key()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn default_behaves_like_network_first() {
        let (executor, storage) = executor(StatusCode::OK);
        let request = FetchRequest::get("https://portfolio.example/data.json").unwrap();

        let served = executor
            .execute(Strategy::Default, request.clone())
            .await
            .unwrap();

        assert_eq!(served.source, ResponseSource::Network);
        let stored = storage.match_request(&request.key()).await.unwrap().unwrap();
        assert_eq!(stored.generation, "dynamic-v1");
    }

    #[tokio::test]
    async fn network_error_without_cache_propagates() {
        let (executor, _) = executor(StatusCode::SERVICE_UNAVAILABLE);
        let request = FetchRequest::get("https://api.github.com/users/someone").unwrap();

        let err = executor
            .execute(Strategy::NetworkFirst, request)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkerError::Fetch(FetchError::Network { .. })));
    }
}
