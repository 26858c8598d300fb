//! In-memory cache storage for stashbox, powered by [Moka](https://docs.rs/moka).
//!
//! Each cache generation is a separate Moka cache; [`MokaStorage`] keeps them
//! in creation order so cross-generation lookups are deterministic.
//!
//! ```
//! use stashbox_moka::MokaStorage;
//!
//! let storage = MokaStorage::new();
//! # let _ = storage;
//! ```
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod backend;
pub mod metrics;
mod storage;

pub use backend::MokaBackend;
pub use storage::MokaStorage;
