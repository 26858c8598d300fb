//! Offload manager for background task execution.
//!
//! Stale-while-revalidate answers from the cache immediately and refreshes
//! the entry afterwards. The refresh is handed to an [`OffloadManager`],
//! which runs it on the tokio runtime, detached from the response path.
//!
//! # Example
//!
//! ```ignore
//! use stashbox::offload::{OffloadConfig, OffloadManager};
//!
//! let manager = OffloadManager::new(OffloadConfig::default());
//!
//! manager.spawn("revalidate", async {
//!     // refresh a cache entry
//! });
//! ```

mod manager;
mod policy;

pub use manager::{OffloadKey, OffloadManager};
pub use policy::{OffloadConfig, OffloadConfigBuilder, TimeoutPolicy};
pub use smol_str::SmolStr;
