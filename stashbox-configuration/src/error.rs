use thiserror::Error;

/// Errors raised while loading or validating a worker configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid YAML: {0}")]
    Yaml(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid origin {origin:?}: {reason}")]
    InvalidOrigin { origin: String, reason: String },

    #[error("{role} version must not be empty")]
    EmptyVersion { role: &'static str },

    #[error("cache name must not be empty")]
    EmptyCacheName,

    #[error("manifest entry {entry:?} cannot be resolved: {source}")]
    InvalidManifestEntry {
        entry: String,
        #[source]
        source: url::ParseError,
    },

    #[error("fallback document {path:?} cannot be resolved: {source}")]
    InvalidFallback {
        path: String,
        #[source]
        source: url::ParseError,
    },

    #[error("route pattern must not be empty")]
    EmptyPattern,

    #[error("storage backend not available: {0}. Enable the corresponding feature")]
    BackendNotAvailable(String),
}
