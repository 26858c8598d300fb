#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

/// Worker configuration.
///
/// [`WorkerConfig`] holds the origin, both generation versions, the install
/// manifest and the route patterns. Its `Default` reproduces the constants
/// of the personal site the worker was built for.
pub mod config;

/// Error types for worker operations.
///
/// Defines [`WorkerError`] which covers:
/// - Install failures (network errors and non-success statuses)
/// - Fetch failures no cache fallback could absorb
/// - Invalid lifecycle transitions and unresolvable URLs
pub mod error;

/// Worker events and the handler dispatch table.
pub mod events;

/// Background sync and push notification hooks.
pub mod hooks;

/// Install, activation and page takeover.
///
/// See [`Lifecycle`](lifecycle::Lifecycle) for the state machine.
pub mod lifecycle;

/// The install manifest.
pub mod manifest;

/// Control messages posted by pages (`SKIP_WAITING`, `GET_VERSION`).
pub mod message;

/// Metrics collection for worker observability.
///
/// When the `metrics` feature is enabled, this module provides counters
/// and histograms for:
/// - Served responses by strategy and source
/// - Requests that failed after every fallback
/// - Background revalidation tasks
pub mod metrics;

/// Background task offloading for stale-while-revalidate.
///
/// Cached pages are served immediately while a fresh copy is fetched in the
/// background. This module provides the
/// [`OffloadManager`](offload::OffloadManager) that runs those fetches.
pub mod offload;

/// Request classification into caching strategies.
pub mod route;

/// Cache-first, network-first and stale-while-revalidate.
pub mod strategy;

/// The worker facade.
pub mod worker;

pub use config::{WorkerConfig, WorkerConfigBuilder};
pub use error::WorkerError;
pub use events::{EventHandler, EventKind, EventOutcome, EventTable, HandlerFn, WorkerEvent};
pub use hooks::Notification;
pub use lifecycle::{ActivationReport, ClientId, Clients, Lifecycle, LifecycleState};
pub use manifest::InstallManifest;
pub use message::{ControlMessage, VersionReply};
pub use route::{Matcher, RouteRule, RouteTable, Strategy};
pub use strategy::{Executor, Served};
pub use worker::{NotSet, ServiceWorker, ServiceWorkerBuilder};

pub use stashbox_core::{
    Destination, Fetch, FetchError, FetchRequest, FetchResult, Generation, GenerationName, Raw,
    RequestKey, ResponseSnapshot, ResponseSource, Role,
};
