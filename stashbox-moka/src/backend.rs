//! Moka backend implementation.

use async_trait::async_trait;
use moka::future::Cache;
use stashbox_backend::{Backend, BackendResult, DeleteStatus};
use stashbox_core::{GenerationName, RequestKey, ResponseSnapshot};

/// A single cache generation stored in a Moka async cache.
///
/// Moka offers lock-free reads and fine-grained locking for writes, which
/// gives the worker the concurrency model it needs: concurrent reads are
/// always safe and concurrent writes to the same key are last-write-wins.
///
/// # Caveats
///
/// - Data is **not persisted**: the generation is lost on process restart
/// - No capacity and no TTL: entries are never evicted individually
#[derive(Clone)]
pub struct MokaBackend {
    name: GenerationName,
    cache: Cache<RequestKey, ResponseSnapshot>,
}

impl std::fmt::Debug for MokaBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaBackend")
            .field("name", &self.name)
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

impl MokaBackend {
    pub(crate) fn new(name: GenerationName) -> Self {
        let cache = Cache::builder().name(name.as_str()).build();
        Self { name, cache }
    }

    /// Returns the underlying Moka cache.
    pub fn cache(&self) -> &Cache<RequestKey, ResponseSnapshot> {
        &self.cache
    }
}

#[async_trait]
impl Backend for MokaBackend {
    async fn read(&self, key: &RequestKey) -> BackendResult<Option<ResponseSnapshot>> {
        Ok(self.cache.get(key).await)
    }

    async fn write(&self, key: &RequestKey, value: ResponseSnapshot) -> BackendResult<()> {
        self.cache.insert(key.clone(), value).await;
        crate::metrics::record_entries(&self.name, self.cache.entry_count());
        Ok(())
    }

    async fn remove(&self, key: &RequestKey) -> BackendResult<DeleteStatus> {
        match self.cache.remove(key).await {
            Some(_) => Ok(DeleteStatus::Deleted(1)),
            None => Ok(DeleteStatus::Missing),
        }
    }

    async fn keys(&self) -> BackendResult<Vec<RequestKey>> {
        Ok(self
            .cache
            .iter()
            .map(|(key, _)| key.as_ref().clone())
            .collect())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
