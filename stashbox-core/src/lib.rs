#![warn(missing_docs)]
//! # stashbox-core
//!
//! Core traits and types for the stashbox offline caching worker.
//!
//! This crate provides the vocabulary shared by every other stashbox crate.
//! It is deliberately free of any storage or runtime specifics so that
//! backends (like `stashbox-moka`) and transports (like `stashbox-tower`)
//! can be swapped independently.
//!
//! ## Architecture
//!
//! The worker intercepts read-only requests and answers them through one of
//! several caching strategies. This crate provides the types the strategies
//! operate on:
//!
//! - **Describe** a request and its destination ([`FetchRequest`], [`Destination`])
//! - **Identify** a request inside a cache ([`RequestKey`])
//! - **Store** a response snapshot ([`ResponseSnapshot`])
//! - **Call** the network ([`Fetch`])
//! - **Name** versioned cache stores ([`Generation`], [`Role`])
//! - **Execute** detached background work ([`Offload`])

pub mod fetch;
pub mod generation;
pub mod key;
pub mod offload;
pub mod request;
pub mod response;
pub mod source;

pub use fetch::{Fetch, FetchError, FetchResult};
pub use generation::{Generation, GenerationName, Role};
pub use key::RequestKey;
pub use offload::{DisabledOffload, Offload};
pub use request::{Destination, FetchRequest};
pub use response::ResponseSnapshot;
#[doc(hidden)]
pub use smol_str::SmolStr;
pub use source::ResponseSource;

/// Raw byte data type used for response bodies.
/// Using `Bytes` provides efficient zero-copy cloning via reference counting.
pub type Raw = bytes::Bytes;
