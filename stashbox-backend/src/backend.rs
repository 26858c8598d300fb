use std::sync::Arc;

use async_trait::async_trait;
use stashbox_core::{RequestKey, ResponseSnapshot};

use crate::{BackendError, DeleteStatus};

pub type BackendResult<T> = Result<T, BackendError>;

/// A single cache generation.
///
/// Entries are keyed by [`RequestKey`] and are never expired by the store
/// itself: a write overwrites, and the only other way an entry disappears is
/// when its whole generation is deleted through
/// [`CacheStorage::delete`](crate::CacheStorage::delete).
///
/// Implementations must be safe for concurrent use. Concurrent writes to the
/// same key are last-write-wins.
#[async_trait]
pub trait Backend: Sync + Send {
    async fn read(&self, key: &RequestKey) -> BackendResult<Option<ResponseSnapshot>>;

    /// Stores `value` under `key`, replacing any existing entry.
    async fn write(&self, key: &RequestKey, value: ResponseSnapshot) -> BackendResult<()>;

    async fn remove(&self, key: &RequestKey) -> BackendResult<DeleteStatus>;

    /// Lists every key currently stored in this generation.
    async fn keys(&self) -> BackendResult<Vec<RequestKey>>;

    /// Stores a batch of entries.
    ///
    /// The default implementation writes sequentially and stops at the first
    /// error.
    async fn write_all(&self, entries: Vec<(RequestKey, ResponseSnapshot)>) -> BackendResult<()> {
        for (key, value) in entries {
            self.write(&key, value).await?;
        }
        Ok(())
    }

    /// Returns the generation name this backend stores.
    fn name(&self) -> &str {
        "backend"
    }
}

#[async_trait]
impl<T> Backend for Arc<T>
where
    T: Backend + ?Sized,
{
    async fn read(&self, key: &RequestKey) -> BackendResult<Option<ResponseSnapshot>> {
        (**self).read(key).await
    }

    async fn write(&self, key: &RequestKey, value: ResponseSnapshot) -> BackendResult<()> {
        (**self).write(key, value).await
    }

    async fn remove(&self, key: &RequestKey) -> BackendResult<DeleteStatus> {
        (**self).remove(key).await
    }

    async fn keys(&self) -> BackendResult<Vec<RequestKey>> {
        (**self).keys().await
    }

    async fn write_all(&self, entries: Vec<(RequestKey, ResponseSnapshot)>) -> BackendResult<()> {
        (**self).write_all(entries).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[async_trait]
impl Backend for Box<dyn Backend> {
    async fn read(&self, key: &RequestKey) -> BackendResult<Option<ResponseSnapshot>> {
        (**self).read(key).await
    }

    async fn write(&self, key: &RequestKey, value: ResponseSnapshot) -> BackendResult<()> {
        (**self).write(key, value).await
    }

    async fn remove(&self, key: &RequestKey) -> BackendResult<DeleteStatus> {
        (**self).remove(key).await
    }

    async fn keys(&self) -> BackendResult<Vec<RequestKey>> {
        (**self).keys().await
    }

    async fn write_all(&self, entries: Vec<(RequestKey, ResponseSnapshot)>) -> BackendResult<()> {
        (**self).write_all(entries).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
