//! Worker configuration.
//!
//! [`WorkerConfig`] collects every constant the worker depends on: the origin
//! relative paths resolve against, the version tags of both cache
//! generations, the install manifest and the route pattern lists.
//! [`WorkerConfig::default`] reproduces the constants of the personal site
//! the worker was written for.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use stashbox_core::{Generation, Role};
use url::Url;

use crate::error::WorkerError;
use crate::manifest::InstallManifest;
use crate::offload::{OffloadConfig, TimeoutPolicy};
use crate::route::RouteTable;

/// Name reported to pages in reply to `GET_VERSION`.
pub const DEFAULT_CACHE_NAME: &str = "personaldevpage-v1.2";

/// Default version tag for both generations.
pub const DEFAULT_VERSION: &str = "v1.2";

/// Document served when a page load fails and nothing else is cached.
pub const DEFAULT_FALLBACK_DOCUMENT: &str = "/index.html";

/// Origin used when none is configured.
pub const DEFAULT_ORIGIN: &str = "http://localhost/";

/// Assets pre-cached on install.
pub const DEFAULT_MANIFEST: &[&str] = &[
    "/",
    "/index.html",
    "/styles.css",
    "/script.js",
    "/favicon.ico",
    "/assets/profile_avatar_250.webp",
    "/assets/profile_avatar_150.webp",
    "/assets/favicon-32x32.png",
    "/assets/favicon-16x16.png",
    "https://fonts.googleapis.com/css2?family=Inter:wght@300;400;500;600;700&display=swap",
];

/// URL substrings that always prefer the network.
pub const DEFAULT_NETWORK_FIRST: &[&str] = &["https://api.github.com/"];

/// URL substrings that prefer the cache.
pub const DEFAULT_CACHE_FIRST: &[&str] = &[
    "/assets/",
    "/styles.css",
    "/script.js",
    "fonts.googleapis.com",
    "fonts.gstatic.com",
];

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| (*item).to_owned()).collect()
}

/// Settings for background revalidation tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OffloadSettings {
    /// Log a warning when a background task runs longer than this.
    #[serde(with = "humantime_serde")]
    pub warn_after: Option<Duration>,
}

impl OffloadSettings {
    /// Converts the settings into an [`OffloadConfig`].
    pub fn to_offload_config(&self) -> OffloadConfig {
        let policy = match self.warn_after {
            Some(duration) => TimeoutPolicy::Warn(duration),
            None => TimeoutPolicy::None,
        };
        OffloadConfig::builder().timeout_policy(policy).build()
    }
}

/// Complete worker configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Origin that relative manifest entries and the fallback resolve against.
    pub origin: String,
    /// Version string reported to pages.
    pub cache_name: String,
    /// Version tag of the static (pre-cached) generation.
    pub static_version: String,
    /// Version tag of the dynamic (runtime) generation.
    pub dynamic_version: String,
    /// Install manifest entries, absolute or origin-relative.
    pub manifest: Vec<String>,
    /// URL substrings routed network-first.
    pub network_first: Vec<String>,
    /// URL substrings routed cache-first.
    pub cache_first: Vec<String>,
    /// Path of the document served when a page load cannot be satisfied.
    pub fallback_document: String,
    /// Background task settings.
    pub offload: OffloadSettings,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_owned(),
            cache_name: DEFAULT_CACHE_NAME.to_owned(),
            static_version: DEFAULT_VERSION.to_owned(),
            dynamic_version: DEFAULT_VERSION.to_owned(),
            manifest: owned(DEFAULT_MANIFEST),
            network_first: owned(DEFAULT_NETWORK_FIRST),
            cache_first: owned(DEFAULT_CACHE_FIRST),
            fallback_document: DEFAULT_FALLBACK_DOCUMENT.to_owned(),
            offload: OffloadSettings::default(),
        }
    }
}

impl WorkerConfig {
    /// Creates a builder starting from the default configuration.
    pub fn builder() -> WorkerConfigBuilder {
        WorkerConfigBuilder::default()
    }

    /// The static generation this configuration pins.
    pub fn static_generation(&self) -> Generation {
        Generation::new(Role::Static, self.static_version.as_str())
    }

    /// The dynamic generation this configuration pins.
    pub fn dynamic_generation(&self) -> Generation {
        Generation::new(Role::Dynamic, self.dynamic_version.as_str())
    }

    /// Parses the configured origin.
    pub fn origin_url(&self) -> Result<Url, WorkerError> {
        Url::parse(&self.origin).map_err(|source| WorkerError::InvalidUrl {
            url: self.origin.clone(),
            source,
        })
    }

    /// Resolves an absolute or origin-relative reference.
    pub fn resolve(&self, reference: &str) -> Result<Url, WorkerError> {
        self.origin_url()?
            .join(reference)
            .map_err(|source| WorkerError::InvalidUrl {
                url: reference.to_owned(),
                source,
            })
    }

    /// The resolved fallback document URL.
    pub fn fallback_url(&self) -> Result<Url, WorkerError> {
        self.resolve(&self.fallback_document)
    }

    /// The resolved, de-duplicated install manifest.
    pub fn install_manifest(&self) -> Result<InstallManifest, WorkerError> {
        InstallManifest::resolve(&self.origin_url()?, &self.manifest)
    }

    /// Route table built from the configured pattern lists.
    pub fn route_table(&self) -> RouteTable {
        RouteTable::from_patterns(&self.network_first, &self.cache_first)
    }
}

/// Builder for [`WorkerConfig`].
#[derive(Debug, Clone, Default)]
pub struct WorkerConfigBuilder {
    config: WorkerConfig,
}

impl WorkerConfigBuilder {
    /// Sets the origin.
    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.config.origin = origin.into();
        self
    }

    /// Sets the version string reported to pages.
    pub fn cache_name(mut self, name: impl Into<String>) -> Self {
        self.config.cache_name = name.into();
        self
    }

    /// Sets the static generation version tag.
    pub fn static_version(mut self, version: impl Into<String>) -> Self {
        self.config.static_version = version.into();
        self
    }

    /// Sets the dynamic generation version tag.
    pub fn dynamic_version(mut self, version: impl Into<String>) -> Self {
        self.config.dynamic_version = version.into();
        self
    }

    /// Sets both generation version tags.
    pub fn version(self, version: impl Into<String>) -> Self {
        let version = version.into();
        self.static_version(version.clone()).dynamic_version(version)
    }

    /// Replaces the install manifest.
    pub fn manifest<I, S>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.manifest = entries.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the network-first patterns.
    pub fn network_first<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.network_first = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the cache-first patterns.
    pub fn cache_first<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.cache_first = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the fallback document path.
    pub fn fallback_document(mut self, path: impl Into<String>) -> Self {
        self.config.fallback_document = path.into();
        self
    }

    /// Warn when a background task runs longer than `duration`.
    pub fn warn_after(mut self, duration: Duration) -> Self {
        self.config.offload.warn_after = Some(duration);
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> WorkerConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults_name_both_generations() {
        let config = WorkerConfig::default();
        assert_eq!(config.static_generation().name(), "static-v1.2");
        assert_eq!(config.dynamic_generation().name(), "dynamic-v1.2");
        assert_eq!(config.cache_name, "personaldevpage-v1.2");
    }

    #[test]
    fn resolve_keeps_absolute_references() {
        let config = WorkerConfig::builder()
            .origin("https://portfolio.example/")
            .build();
        assert_eq!(
            config.resolve("/styles.css").unwrap().as_str(),
            "https://portfolio.example/styles.css"
        );
        assert_eq!(
            config
                .resolve("https://fonts.gstatic.com/s/inter.woff2")
                .unwrap()
                .as_str(),
            "https://fonts.gstatic.com/s/inter.woff2"
        );
    }

    #[test]
    fn invalid_origin_is_reported() {
        let config = WorkerConfig::builder().origin("not a url").build();
        assert!(matches!(
            config.fallback_url(),
            Err(WorkerError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn warn_after_enables_warn_policy() {
        let config = WorkerConfig::builder()
            .warn_after(Duration::from_secs(5))
            .build();
        assert!(matches!(
            config.offload.to_offload_config().timeout_policy,
            TimeoutPolicy::Warn(duration) if duration == Duration::from_secs(5)
        ));
    }
}
