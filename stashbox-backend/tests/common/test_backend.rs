//! Simple in-memory test storage built on DashMap and IndexMap.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use dashmap::DashMap;
use indexmap::IndexMap;
use stashbox_backend::{Backend, BackendError, BackendResult, CacheStorage, DeleteStatus};
use stashbox_core::{GenerationName, RequestKey, ResponseSnapshot};

/// A single generation backed by DashMap.
#[derive(Debug, Default)]
pub struct TestBackend {
    name: String,
    store: DashMap<RequestKey, ResponseSnapshot>,
}

impl TestBackend {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            store: DashMap::new(),
        }
    }
}

#[async_trait]
impl Backend for TestBackend {
    async fn read(&self, key: &RequestKey) -> BackendResult<Option<ResponseSnapshot>> {
        Ok(self.store.get(key).map(|v| v.clone()))
    }

    async fn write(&self, key: &RequestKey, value: ResponseSnapshot) -> BackendResult<()> {
        self.store.insert(key.clone(), value);
        Ok(())
    }

    async fn remove(&self, key: &RequestKey) -> BackendResult<DeleteStatus> {
        match self.store.remove(key) {
            Some(_) => Ok(DeleteStatus::Deleted(1)),
            None => Ok(DeleteStatus::Missing),
        }
    }

    async fn keys(&self) -> BackendResult<Vec<RequestKey>> {
        Ok(self.store.iter().map(|e| e.key().clone()).collect())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Storage keeping generations in creation order.
#[derive(Debug, Default)]
pub struct TestStorage {
    generations: RwLock<IndexMap<GenerationName, Arc<TestBackend>>>,
}

impl TestStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> BackendError {
    BackendError::internal("test storage lock poisoned")
}

#[async_trait]
impl CacheStorage for TestStorage {
    async fn open(&self, name: &GenerationName) -> BackendResult<Arc<dyn Backend>> {
        let mut generations = self.generations.write().map_err(|_| poisoned())?;
        let backend: Arc<dyn Backend> = generations
            .entry(name.clone())
            .or_insert_with(|| Arc::new(TestBackend::new(name)))
            .clone();
        Ok(backend)
    }

    async fn create(&self, name: &GenerationName) -> BackendResult<Option<Arc<dyn Backend>>> {
        let mut generations = self.generations.write().map_err(|_| poisoned())?;
        if generations.contains_key(name) {
            return Ok(None);
        }
        let backend = Arc::new(TestBackend::new(name));
        generations.insert(name.clone(), backend.clone());
        Ok(Some(backend as Arc<dyn Backend>))
    }

    async fn get(&self, name: &GenerationName) -> BackendResult<Option<Arc<dyn Backend>>> {
        let generations = self.generations.read().map_err(|_| poisoned())?;
        Ok(generations
            .get(name)
            .map(|backend| backend.clone() as Arc<dyn Backend>))
    }

    async fn keys(&self) -> BackendResult<Vec<GenerationName>> {
        let generations = self.generations.read().map_err(|_| poisoned())?;
        Ok(generations.keys().cloned().collect())
    }

    async fn delete(&self, name: &GenerationName) -> BackendResult<DeleteStatus> {
        let mut generations = self.generations.write().map_err(|_| poisoned())?;
        match generations.shift_remove(name) {
            Some(_) => Ok(DeleteStatus::Deleted(1)),
            None => Ok(DeleteStatus::Missing),
        }
    }
}
