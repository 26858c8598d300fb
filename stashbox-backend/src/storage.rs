use std::sync::Arc;

use async_trait::async_trait;
use stashbox_core::{GenerationName, RequestKey, ResponseSnapshot};
use tracing::trace;

use crate::{Backend, BackendResult, DeleteStatus};

/// A cross-generation cache hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheMatch {
    /// Generation the entry was found in.
    pub generation: GenerationName,
    /// The stored response.
    pub response: ResponseSnapshot,
}

/// The set of all named cache generations.
///
/// Only whole generations can be deleted; there is no partial eviction.
/// Implementations must list generations in creation order, because
/// [`match_request`](CacheStorage::match_request) returns the first hit in
/// that order.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Opens the generation called `name`, creating it if it does not exist.
    async fn open(&self, name: &GenerationName) -> BackendResult<Arc<dyn Backend>>;

    /// Creates the generation called `name` only if it does not exist yet.
    ///
    /// Returns `None` when the generation already exists. The check and the
    /// insert must be one atomic step, so at most one concurrent caller sees
    /// `Some` for the same name.
    async fn create(&self, name: &GenerationName) -> BackendResult<Option<Arc<dyn Backend>>>;

    /// Returns the generation called `name` without creating it.
    async fn get(&self, name: &GenerationName) -> BackendResult<Option<Arc<dyn Backend>>>;

    /// Lists generation names in creation order.
    async fn keys(&self) -> BackendResult<Vec<GenerationName>>;

    /// Removes a whole generation and every entry in it.
    async fn delete(&self, name: &GenerationName) -> BackendResult<DeleteStatus>;

    /// Returns `true` if a generation called `name` exists.
    async fn has(&self, name: &GenerationName) -> BackendResult<bool> {
        Ok(self.get(name).await?.is_some())
    }

    /// Looks `key` up in every generation and returns the first hit.
    async fn match_request(&self, key: &RequestKey) -> BackendResult<Option<CacheMatch>> {
        for name in self.keys().await? {
            let Some(backend) = self.get(&name).await? else {
                // Deleted between listing and lookup.
                continue;
            };
            if let Some(response) = backend.read(key).await? {
                trace!(%key, generation = %name, "cache match");
                return Ok(Some(CacheMatch {
                    generation: name,
                    response,
                }));
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl<T> CacheStorage for Arc<T>
where
    T: CacheStorage + ?Sized,
{
    async fn open(&self, name: &GenerationName) -> BackendResult<Arc<dyn Backend>> {
        (**self).open(name).await
    }

    async fn create(&self, name: &GenerationName) -> BackendResult<Option<Arc<dyn Backend>>> {
        (**self).create(name).await
    }

    async fn get(&self, name: &GenerationName) -> BackendResult<Option<Arc<dyn Backend>>> {
        (**self).get(name).await
    }

    async fn keys(&self) -> BackendResult<Vec<GenerationName>> {
        (**self).keys().await
    }

    async fn delete(&self, name: &GenerationName) -> BackendResult<DeleteStatus> {
        (**self).delete(name).await
    }

    async fn has(&self, name: &GenerationName) -> BackendResult<bool> {
        (**self).has(name).await
    }

    async fn match_request(&self, key: &RequestKey) -> BackendResult<Option<CacheMatch>> {
        (**self).match_request(key).await
    }
}
