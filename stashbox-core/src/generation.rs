//! Versioned cache generations.
//!
//! The worker keeps two logical stores, one per [`Role`]. Each store is
//! named after its role and a version tag, e.g. `static-v1.2`. Bumping the
//! tag produces a new, empty store; the old one becomes garbage and is
//! removed the next time the worker activates.

use std::fmt;

use serde::{Deserialize, Serialize};
use smol_str::{SmolStr, format_smolstr};

/// Name of a cache generation, as listed by the cache storage.
pub type GenerationName = SmolStr;

/// Which logical store a generation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Pre-cached install manifest assets.
    Static,
    /// Everything cached at runtime by the fetch strategies.
    Dynamic,
}

impl Role {
    /// Returns the role as a string slice.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Static => "static",
            Role::Dynamic => "dynamic",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A versioned cache store.
///
/// ```
/// use stashbox_core::{Generation, Role};
///
/// let generation = Generation::new(Role::Static, "v1.2");
/// assert_eq!(generation.name(), "static-v1.2");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Generation {
    role: Role,
    version: SmolStr,
    name: GenerationName,
}

impl Generation {
    /// Creates a generation for `role` tagged with `version`.
    pub fn new(role: Role, version: impl Into<SmolStr>) -> Self {
        let version = version.into();
        let name = format_smolstr!("{}-{}", role.as_str(), version);
        Self {
            role,
            version,
            name,
        }
    }

    /// Returns the role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the version tag.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the storage name, `{role}-{version}`.
    pub fn name(&self) -> &GenerationName {
        &self.name
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
