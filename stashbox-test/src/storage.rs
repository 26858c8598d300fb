//! Cache storage with operation counters and injectable faults.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use stashbox_backend::{Backend, BackendError, BackendResult, CacheStorage, DeleteStatus};
use stashbox_core::{GenerationName, RequestKey, ResponseSnapshot};
use stashbox_moka::MokaStorage;

#[derive(Debug, Default)]
pub struct StorageCounters {
    pub read_count: AtomicUsize,
    pub write_count: AtomicUsize,
    pub open_count: AtomicUsize,
    pub delete_count: AtomicUsize,
}

impl StorageCounters {
    pub fn read_count(&self) -> usize {
        self.read_count.load(Ordering::SeqCst)
    }

    pub fn write_count(&self) -> usize {
        self.write_count.load(Ordering::SeqCst)
    }

    pub fn open_count(&self) -> usize {
        self.open_count.load(Ordering::SeqCst)
    }

    pub fn delete_count(&self) -> usize {
        self.delete_count.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.read_count.store(0, Ordering::SeqCst);
        self.write_count.store(0, Ordering::SeqCst);
        self.open_count.store(0, Ordering::SeqCst);
        self.delete_count.store(0, Ordering::SeqCst);
    }
}

#[derive(Debug, Default)]
struct Faults {
    reads: AtomicBool,
    writes: AtomicBool,
    deletes: AtomicBool,
}

fn injected(operation: &str) -> BackendError {
    BackendError::internal(format!("injected {operation} failure"))
}

/// In-memory storage that counts every operation and fails on demand.
#[derive(Clone, Debug, Default)]
pub struct MockStorage {
    inner: MokaStorage,
    pub counters: Arc<StorageCounters>,
    faults: Arc<Faults>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.faults.reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.faults.writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.faults.deletes.store(fail, Ordering::SeqCst);
    }

    pub fn read_count(&self) -> usize {
        self.counters.read_count()
    }

    pub fn write_count(&self) -> usize {
        self.counters.write_count()
    }

    pub fn delete_count(&self) -> usize {
        self.counters.delete_count()
    }

    /// Generation names in creation order, as plain strings.
    pub async fn generation_names(&self) -> Vec<String> {
        self.inner
            .keys()
            .await
            .expect("moka storage keys")
            .into_iter()
            .map(|name| name.to_string())
            .collect()
    }

    /// Keys stored in generation `name`, sorted, or `None` if it does not exist.
    pub async fn entries(&self, name: &str) -> Option<Vec<String>> {
        let backend = self
            .inner
            .get(&GenerationName::from(name))
            .await
            .expect("moka storage get")?;
        let mut keys: Vec<String> = backend
            .keys()
            .await
            .expect("moka backend keys")
            .iter()
            .map(|key| key.url().to_owned())
            .collect();
        keys.sort();
        Some(keys)
    }

    fn wrap(&self, backend: Arc<dyn Backend>) -> Arc<dyn Backend> {
        Arc::new(MockBackend {
            inner: backend,
            counters: self.counters.clone(),
            faults: self.faults.clone(),
        })
    }
}

#[async_trait]
impl CacheStorage for MockStorage {
    async fn open(&self, name: &GenerationName) -> BackendResult<Arc<dyn Backend>> {
        self.counters.open_count.fetch_add(1, Ordering::SeqCst);
        let backend = self.inner.open(name).await?;
        Ok(self.wrap(backend))
    }

    async fn create(&self, name: &GenerationName) -> BackendResult<Option<Arc<dyn Backend>>> {
        self.counters.open_count.fetch_add(1, Ordering::SeqCst);
        let created = self.inner.create(name).await?;
        Ok(created.map(|backend| self.wrap(backend)))
    }

    async fn get(&self, name: &GenerationName) -> BackendResult<Option<Arc<dyn Backend>>> {
        Ok(self.inner.get(name).await?.map(|backend| self.wrap(backend)))
    }

    async fn keys(&self) -> BackendResult<Vec<GenerationName>> {
        self.inner.keys().await
    }

    async fn delete(&self, name: &GenerationName) -> BackendResult<DeleteStatus> {
        self.counters.delete_count.fetch_add(1, Ordering::SeqCst);
        if self.faults.deletes.load(Ordering::SeqCst) {
            return Err(injected("delete"));
        }
        self.inner.delete(name).await
    }
}

struct MockBackend {
    inner: Arc<dyn Backend>,
    counters: Arc<StorageCounters>,
    faults: Arc<Faults>,
}

#[async_trait]
impl Backend for MockBackend {
    async fn read(&self, key: &RequestKey) -> BackendResult<Option<ResponseSnapshot>> {
        self.counters.read_count.fetch_add(1, Ordering::SeqCst);
        if self.faults.reads.load(Ordering::SeqCst) {
            return Err(injected("read"));
        }
        self.inner.read(key).await
    }

    async fn write(&self, key: &RequestKey, value: ResponseSnapshot) -> BackendResult<()> {
        self.counters.write_count.fetch_add(1, Ordering::SeqCst);
        if self.faults.writes.load(Ordering::SeqCst) {
            return Err(injected("write"));
        }
        self.inner.write(key, value).await
    }

    async fn remove(&self, key: &RequestKey) -> BackendResult<DeleteStatus> {
        self.inner.remove(key).await
    }

    async fn keys(&self) -> BackendResult<Vec<RequestKey>> {
        self.inner.keys().await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
