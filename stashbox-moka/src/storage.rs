use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use indexmap::IndexMap;
use stashbox_backend::{Backend, BackendError, BackendResult, CacheStorage, DeleteStatus};
use stashbox_core::GenerationName;
use tracing::debug;

use crate::backend::MokaBackend;

/// In-memory [`CacheStorage`] holding one [`MokaBackend`] per generation.
///
/// Generations are kept in creation order and are unbounded: an entry only
/// leaves a generation when it is overwritten or the whole generation is
/// deleted. The registry lock is only held
/// while looking up or inserting a handle, never across an `.await`.
#[derive(Debug, Clone)]
pub struct MokaStorage {
    generations: Arc<RwLock<IndexMap<GenerationName, MokaBackend>>>,
}

impl MokaStorage {
    /// Creates an empty storage.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for MokaStorage {
    fn default() -> Self {
        Self {
            generations: Arc::new(RwLock::new(IndexMap::new())),
        }
    }
}

fn poisoned() -> BackendError {
    BackendError::internal("moka storage registry lock poisoned")
}

#[async_trait]
impl CacheStorage for MokaStorage {
    async fn open(&self, name: &GenerationName) -> BackendResult<Arc<dyn Backend>> {
        let mut generations = self.generations.write().map_err(|_| poisoned())?;
        let backend = generations
            .entry(name.clone())
            .or_insert_with(|| {
                debug!(generation = %name, "creating cache generation");
                MokaBackend::new(name.clone())
            })
            .clone();
        Ok(Arc::new(backend) as Arc<dyn Backend>)
    }

    async fn create(&self, name: &GenerationName) -> BackendResult<Option<Arc<dyn Backend>>> {
        let mut generations = self.generations.write().map_err(|_| poisoned())?;
        if generations.contains_key(name) {
            return Ok(None);
        }
        debug!(generation = %name, "creating cache generation");
        let backend = MokaBackend::new(name.clone());
        generations.insert(name.clone(), backend.clone());
        Ok(Some(Arc::new(backend) as Arc<dyn Backend>))
    }

    async fn get(&self, name: &GenerationName) -> BackendResult<Option<Arc<dyn Backend>>> {
        let generations = self.generations.read().map_err(|_| poisoned())?;
        Ok(generations
            .get(name)
            .map(|backend| Arc::new(backend.clone()) as Arc<dyn Backend>))
    }

    async fn keys(&self) -> BackendResult<Vec<GenerationName>> {
        let generations = self.generations.read().map_err(|_| poisoned())?;
        Ok(generations.keys().cloned().collect())
    }

    async fn delete(&self, name: &GenerationName) -> BackendResult<DeleteStatus> {
        let removed = {
            let mut generations = self.generations.write().map_err(|_| poisoned())?;
            generations.shift_remove(name)
        };
        match removed {
            Some(backend) => {
                let entries = backend.cache().entry_count();
                backend.cache().invalidate_all();
                debug!(generation = %name, entries, "deleted cache generation");
                Ok(DeleteStatus::Deleted(1))
            }
            None => Ok(DeleteStatus::Missing),
        }
    }

    async fn has(&self, name: &GenerationName) -> BackendResult<bool> {
        let generations = self.generations.read().map_err(|_| poisoned())?;
        Ok(generations.contains_key(name))
    }
}
