use std::sync::Arc;

use serde::{Deserialize, Serialize};
use stashbox_backend::CacheStorage;

use crate::error::ConfigError;

/// Moka storage settings.
///
/// Generations are always unbounded, so there is nothing to tune yet.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Moka {}

/// Cache storage selection.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Storage {
    Moka(Moka),
}

impl Default for Storage {
    fn default() -> Self {
        Storage::Moka(Moka::default())
    }
}

impl Storage {
    /// Builds the configured storage.
    pub fn into_storage(self) -> Result<Arc<dyn CacheStorage>, ConfigError> {
        match self {
            #[cfg(feature = "moka")]
            Storage::Moka(_) => Ok(Arc::new(stashbox_moka::MokaStorage::new())),
            #[cfg(not(feature = "moka"))]
            Storage::Moka(_) => Err(ConfigError::BackendNotAvailable("Moka".to_string())),
        }
    }
}
