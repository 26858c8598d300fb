//! Where a served response came from.

use crate::generation::GenerationName;

/// Source of a served response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ResponseSource {
    /// Fresh response from the network.
    #[default]
    Network,
    /// Cached copy of the requested URL, found in the named generation.
    Cache(GenerationName),
    /// Cached root document served in place of an unreachable page.
    Fallback(GenerationName),
}

impl ResponseSource {
    /// Returns the source kind as a string slice.
    ///
    /// Used as a metrics label and as the value of the cache status header.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ResponseSource::Network => "network",
            ResponseSource::Cache(_) => "cache",
            ResponseSource::Fallback(_) => "fallback",
        }
    }

    /// Returns the generation that served the response, if any.
    pub fn generation(&self) -> Option<&GenerationName> {
        match self {
            ResponseSource::Network => None,
            ResponseSource::Cache(name) | ResponseSource::Fallback(name) => Some(name),
        }
    }

    /// Returns `true` if the response was read from a cache generation.
    pub fn is_cached(&self) -> bool {
        !matches!(self, ResponseSource::Network)
    }
}
