//! Tower integration for the stashbox offline caching worker.
//!
//! This crate connects a [`ServiceWorker`](stashbox::ServiceWorker) to the
//! Tower ecosystem in both directions:
//!
//! - **[`TowerFetch`]**: lets the worker reach the network through any Tower
//!   HTTP service (a `hyper-util` client, a test double, another layer stack).
//! - **[`WorkerLayer`]**: puts the worker in front of a Tower service, so the
//!   worker answers requests from its caches before the service sees them.
//!
//! # Quick Start
//!
//! ```ignore
//! use stashbox::{ServiceWorker, WorkerConfig};
//! use stashbox_moka::MokaStorage;
//! use stashbox_tower::{TowerFetch, WorkerLayer};
//! use tower::ServiceBuilder;
//!
//! let worker = ServiceWorker::builder()
//!     .storage(MokaStorage::default())
//!     .fetch(TowerFetch::new(client.clone()))
//!     .config(WorkerConfig::default())
//!     .build()?;
//! worker.start().await?;
//!
//! let service = ServiceBuilder::new()
//!     .layer(WorkerLayer::new(worker))
//!     .service(client);
//! ```
//!
//! # Response Headers
//!
//! Every response carries a header naming where it came from:
//!
//! | Header Value | Meaning |
//! |--------------|---------|
//! | `network` | Fetched by the worker from the network |
//! | `cache` | Read from a cache generation |
//! | `fallback` | The cached root document, served for an unreachable page |
//! | `passthrough` | The worker did not intercept the request |
//!
//! The default header name is `x-stashbox-source`. Customize it with
//! [`WorkerLayer::source_header`].
//!
//! # Request Destination
//!
//! The worker routes full page loads differently from subresources. The
//! destination is read from the `Sec-Fetch-Dest` request header; requests
//! without it are treated as `empty`.

#![warn(missing_docs)]

/// Network adapter for Tower services.
pub mod fetch;
/// Tower layer placing the worker in front of a service.
pub mod layer;
/// The Tower service that offers requests to the worker.
pub mod service;

pub use fetch::TowerFetch;
pub use layer::{DEFAULT_SOURCE_HEADER, WorkerLayer};
pub use service::{SEC_FETCH_DEST, WorkerService};
