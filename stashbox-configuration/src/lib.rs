//! YAML configuration for the stashbox worker.
//!
//! ```yaml
//! origin: https://portfolio.example/
//! cache_name: personaldevpage-v1.3
//! versions:
//!   static: v1.3
//!   dynamic: v1.3
//! manifest:
//!   - /
//!   - /index.html
//! routes:
//!   network_first: ["https://api.github.com/"]
//!   cache_first: ["/assets/"]
//! fallback_document: /index.html
//! offload:
//!   warn_after: 5s
//! storage:
//!   type: Moka
//! ```
//!
//! Every key is optional; missing keys keep the values of
//! [`WorkerConfig::default`].

mod error;
mod storage;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use stashbox::WorkerConfig;
use stashbox_backend::CacheStorage;
use url::Url;

pub use error::ConfigError;
pub use storage::{Moka, Storage};

/// Version tags of both generations.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Versions {
    #[serde(rename = "static", default)]
    pub static_version: Option<String>,
    #[serde(default)]
    pub dynamic: Option<String>,
}

/// URL substrings per strategy.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Routes {
    #[serde(default)]
    pub network_first: Option<Vec<String>>,
    #[serde(default)]
    pub cache_first: Option<Vec<String>>,
}

/// Background task settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Offload {
    #[serde(default, with = "humantime_serde")]
    pub warn_after: Option<Duration>,
}

/// Worker configuration as written in YAML.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ConfigWorker {
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub cache_name: Option<String>,
    #[serde(default)]
    pub versions: Versions,
    #[serde(default)]
    pub manifest: Option<Vec<String>>,
    #[serde(default)]
    pub routes: Routes,
    #[serde(default)]
    pub fallback_document: Option<String>,
    #[serde(default)]
    pub offload: Offload,
    #[serde(default)]
    pub storage: Storage,
}

impl ConfigWorker {
    /// Parses a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        serde_saphyr::from_str(yaml).map_err(|error| ConfigError::Yaml(error.to_string()))
    }

    /// Reads and parses a YAML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&yaml)
    }

    /// Validates the configuration and converts it into a [`WorkerConfig`].
    pub fn into_config(self) -> Result<WorkerConfig, ConfigError> {
        let defaults = WorkerConfig::default();

        let origin = self.origin.unwrap_or(defaults.origin);
        let origin_url = parse_origin(&origin)?;

        let cache_name = self.cache_name.unwrap_or(defaults.cache_name);
        if cache_name.trim().is_empty() {
            return Err(ConfigError::EmptyCacheName);
        }

        let static_version = non_empty_version(
            self.versions.static_version,
            defaults.static_version,
            "static",
        )?;
        let dynamic_version =
            non_empty_version(self.versions.dynamic, defaults.dynamic_version, "dynamic")?;

        let manifest = self.manifest.unwrap_or(defaults.manifest);
        for entry in &manifest {
            origin_url
                .join(entry)
                .map_err(|source| ConfigError::InvalidManifestEntry {
                    entry: entry.clone(),
                    source,
                })?;
        }

        let fallback_document = self.fallback_document.unwrap_or(defaults.fallback_document);
        origin_url
            .join(&fallback_document)
            .map_err(|source| ConfigError::InvalidFallback {
                path: fallback_document.clone(),
                source,
            })?;

        let network_first = patterns(self.routes.network_first, defaults.network_first)?;
        let cache_first = patterns(self.routes.cache_first, defaults.cache_first)?;

        let mut builder = WorkerConfig::builder()
            .origin(origin)
            .cache_name(cache_name)
            .static_version(static_version)
            .dynamic_version(dynamic_version)
            .manifest(manifest)
            .network_first(network_first)
            .cache_first(cache_first)
            .fallback_document(fallback_document);
        if let Some(duration) = self.offload.warn_after {
            builder = builder.warn_after(duration);
        }
        Ok(builder.build())
    }

    /// Validates the configuration and builds the configured storage.
    pub fn into_parts(self) -> Result<(WorkerConfig, Arc<dyn CacheStorage>), ConfigError> {
        let storage = self.storage.clone().into_storage()?;
        Ok((self.into_config()?, storage))
    }
}

fn parse_origin(origin: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidOrigin {
        origin: origin.to_owned(),
        reason,
    };
    let url = Url::parse(origin).map_err(|error| invalid(error.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(invalid(format!("unsupported scheme {scheme:?}"))),
    }
}

fn non_empty_version(
    value: Option<String>,
    default: String,
    role: &'static str,
) -> Result<String, ConfigError> {
    let version = value.unwrap_or(default);
    if version.trim().is_empty() {
        Err(ConfigError::EmptyVersion { role })
    } else {
        Ok(version)
    }
}

fn patterns(value: Option<Vec<String>>, default: Vec<String>) -> Result<Vec<String>, ConfigError> {
    let patterns = value.unwrap_or(default);
    if patterns.iter().any(|pattern| pattern.is_empty()) {
        return Err(ConfigError::EmptyPattern);
    }
    Ok(patterns)
}
