//! The worker itself.
//!
//! A [`ServiceWorker`] ties one configured worker version together: its
//! lifecycle, its route table, the strategy executor and the event dispatch
//! table. Hosts feed it [`WorkerEvent`]s, either through
//! [`ServiceWorker::dispatch`] or one of the typed helpers.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use stashbox_backend::CacheStorage;
use stashbox_core::{Fetch, FetchRequest};
use tokio::sync::watch;
use tracing::debug;

use crate::config::WorkerConfig;
use crate::error::WorkerError;
use crate::events::{EventHandler, EventKind, EventOutcome, EventTable, WorkerEvent};
use crate::hooks::{self, Notification};
use crate::lifecycle::{Clients, Lifecycle, LifecycleState};
use crate::message::{ControlMessage, VersionReply};
use crate::offload::{OffloadConfig, OffloadManager};
use crate::route::RouteTable;
use crate::strategy::{Executor, Served};

struct WorkerCore {
    config: WorkerConfig,
    lifecycle: Lifecycle,
    routes: RouteTable,
    executor: Executor<OffloadManager>,
    offload: OffloadManager,
    storage: Arc<dyn CacheStorage>,
}

impl WorkerCore {
    async fn fetch(&self, request: FetchRequest) -> Result<EventOutcome, WorkerError> {
        if !self.lifecycle.is_active() {
            debug!(url = %request.url(), state = %self.lifecycle.state(), "not controlling, passing through");
            return Ok(EventOutcome::Passthrough);
        }
        let Some(strategy) = self.routes.classify(&request) else {
            return Ok(EventOutcome::Passthrough);
        };
        let served = self.executor.execute(strategy, request).await?;
        Ok(EventOutcome::Response(served))
    }

    async fn message(&self, value: Value) -> Result<EventOutcome, WorkerError> {
        match ControlMessage::from_value(&value) {
            Some(ControlMessage::SkipWaiting) => Ok(match self.lifecycle.skip_waiting().await? {
                Some(report) => EventOutcome::Activated(report),
                None => EventOutcome::Done,
            }),
            Some(ControlMessage::GetVersion) => Ok(EventOutcome::Reply(VersionReply {
                version: self.config.cache_name.clone(),
            })),
            None => Ok(EventOutcome::Ignored),
        }
    }

    fn notification_click(&self, notification: Notification) -> Result<EventOutcome, WorkerError> {
        let Some(target) = notification.data else {
            return Ok(EventOutcome::Done);
        };
        let url = self.config.resolve(&target)?;
        self.lifecycle.clients().open_window(url);
        Ok(EventOutcome::Done)
    }
}

/// Default handler for one event kind, backed by the worker core.
struct CoreHandler {
    kind: EventKind,
    core: Arc<WorkerCore>,
}

#[async_trait]
impl EventHandler for CoreHandler {
    async fn handle(&self, event: WorkerEvent) -> Result<EventOutcome, WorkerError> {
        let core = &self.core;
        match (self.kind, event) {
            (EventKind::Install, WorkerEvent::Install) => {
                core.lifecycle.install().await?;
                Ok(EventOutcome::Installed)
            }
            (EventKind::Activate, WorkerEvent::Activate) => {
                Ok(EventOutcome::Activated(core.lifecycle.activate().await?))
            }
            (EventKind::Fetch, WorkerEvent::Fetch(request)) => core.fetch(request).await,
            (EventKind::Message, WorkerEvent::Message(value)) => core.message(value).await,
            (EventKind::Sync, WorkerEvent::Sync(tag)) => Ok(if hooks::background_sync(&tag) {
                EventOutcome::Done
            } else {
                EventOutcome::Ignored
            }),
            (EventKind::Push, WorkerEvent::Push(payload)) => {
                Ok(match Notification::from_push(payload.as_ref()) {
                    Some(notification) => EventOutcome::Notify(notification),
                    None => EventOutcome::Ignored,
                })
            }
            (EventKind::NotificationClick, WorkerEvent::NotificationClick(notification)) => {
                core.notification_click(notification)
            }
            (expected, event) => Err(WorkerError::UnhandledEvent {
                expected,
                received: event.kind(),
            }),
        }
    }
}

const DEFAULT_EVENTS: [EventKind; 7] = [
    EventKind::Install,
    EventKind::Activate,
    EventKind::Fetch,
    EventKind::Message,
    EventKind::Sync,
    EventKind::Push,
    EventKind::NotificationClick,
];

/// One worker version.
///
/// Cloning is cheap and every clone drives the same worker.
///
/// # Example
///
/// ```ignore
/// use stashbox::{ServiceWorker, WorkerConfig};
/// use stashbox_moka::MokaStorage;
///
/// let worker = ServiceWorker::builder()
///     .config(WorkerConfig::default())
///     .storage(MokaStorage::default())
///     .fetch(network)
///     .build()?;
///
/// worker.start().await?;
/// let served = worker.handle_fetch(request).await?;
/// ```
#[derive(Clone)]
pub struct ServiceWorker {
    core: Arc<WorkerCore>,
    events: EventTable,
}

impl std::fmt::Debug for ServiceWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceWorker")
            .field("version", &self.core.config.cache_name)
            .field("lifecycle", &self.core.lifecycle)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

impl ServiceWorker {
    /// Creates a builder.
    pub fn builder() -> ServiceWorkerBuilder<NotSet, NotSet> {
        ServiceWorkerBuilder::new()
    }

    /// Routes `event` through the dispatch table.
    pub async fn dispatch(&self, event: WorkerEvent) -> Result<EventOutcome, WorkerError> {
        self.events.dispatch(event).await
    }

    /// Installs, then activates if promotion was requested.
    ///
    /// Returns the state the worker ended up in.
    pub async fn start(&self) -> Result<LifecycleState, WorkerError> {
        self.dispatch(WorkerEvent::Install).await?;
        if self.core.lifecycle.skip_waiting_requested() {
            self.dispatch(WorkerEvent::Activate).await?;
        }
        Ok(self.state())
    }

    /// Offers a request to the worker.
    ///
    /// `Ok(None)` means the worker does not handle the request and the host
    /// must send it to the network itself.
    pub async fn handle_fetch(&self, request: FetchRequest) -> Result<Option<Served>, WorkerError> {
        match self.dispatch(WorkerEvent::Fetch(request)).await? {
            EventOutcome::Response(served) => Ok(Some(served)),
            _ => Ok(None),
        }
    }

    /// Posts a message from a page and returns the reply, if any.
    pub async fn post_message(&self, message: Value) -> Result<Option<VersionReply>, WorkerError> {
        match self.dispatch(WorkerEvent::Message(message)).await? {
            EventOutcome::Reply(reply) => Ok(Some(reply)),
            _ => Ok(None),
        }
    }

    /// Delivers a push payload and returns the notification to display.
    pub async fn push(&self, payload: Option<Bytes>) -> Result<Option<Notification>, WorkerError> {
        match self.dispatch(WorkerEvent::Push(payload)).await? {
            EventOutcome::Notify(notification) => Ok(Some(notification)),
            _ => Ok(None),
        }
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.core.lifecycle.state()
    }

    /// Subscribes to lifecycle state changes.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.core.lifecycle.subscribe()
    }

    /// Returns `true` once the worker answers requests.
    pub fn is_active(&self) -> bool {
        self.core.lifecycle.is_active()
    }

    /// Returns the version string reported to pages.
    pub fn version(&self) -> &str {
        &self.core.config.cache_name
    }

    /// Returns the configuration.
    pub fn config(&self) -> &WorkerConfig {
        &self.core.config
    }

    /// Returns the route table.
    pub fn routes(&self) -> &RouteTable {
        &self.core.routes
    }

    /// Returns the lifecycle manager.
    pub fn lifecycle(&self) -> &Lifecycle {
        &self.core.lifecycle
    }

    /// Returns the open page registry.
    pub fn clients(&self) -> &Clients {
        self.core.lifecycle.clients()
    }

    /// Returns the background task manager.
    pub fn offload(&self) -> &OffloadManager {
        &self.core.offload
    }

    /// Returns the cache storage.
    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.core.storage
    }
}

/// Marker type for unset builder fields.
///
/// When you see `NotSet` in a compiler error, it means you haven't called
/// the corresponding builder method yet.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotSet;

/// Builder for [`ServiceWorker`].
///
/// Storage and network are required; everything else has a default.
pub struct ServiceWorkerBuilder<S, F> {
    storage: S,
    fetch: F,
    config: WorkerConfig,
    offload: Option<OffloadConfig>,
    routes: Option<RouteTable>,
    clients: Clients,
    handlers: Vec<(EventKind, Arc<dyn EventHandler>)>,
}

impl ServiceWorkerBuilder<NotSet, NotSet> {
    /// Creates a builder with the default configuration.
    pub fn new() -> Self {
        Self {
            storage: NotSet,
            fetch: NotSet,
            config: WorkerConfig::default(),
            offload: None,
            routes: None,
            clients: Clients::new(),
            handlers: Vec::new(),
        }
    }
}

impl Default for ServiceWorkerBuilder<NotSet, NotSet> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, F> ServiceWorkerBuilder<S, F> {
    /// Sets the cache storage.
    pub fn storage<NewS>(self, storage: NewS) -> ServiceWorkerBuilder<NewS, F>
    where
        NewS: CacheStorage + 'static,
    {
        ServiceWorkerBuilder {
            storage,
            fetch: self.fetch,
            config: self.config,
            offload: self.offload,
            routes: self.routes,
            clients: self.clients,
            handlers: self.handlers,
        }
    }

    /// Sets the network.
    pub fn fetch<NewF>(self, fetch: NewF) -> ServiceWorkerBuilder<S, NewF>
    where
        NewF: Fetch + 'static,
    {
        ServiceWorkerBuilder {
            storage: self.storage,
            fetch,
            config: self.config,
            offload: self.offload,
            routes: self.routes,
            clients: self.clients,
            handlers: self.handlers,
        }
    }

    /// Sets the configuration.
    pub fn config(self, config: WorkerConfig) -> Self {
        Self { config, ..self }
    }

    /// Overrides the background task settings from the configuration.
    pub fn offload(self, offload: OffloadConfig) -> Self {
        Self {
            offload: Some(offload),
            ..self
        }
    }

    /// Overrides the route table built from the configuration.
    pub fn routes(self, routes: RouteTable) -> Self {
        Self {
            routes: Some(routes),
            ..self
        }
    }

    /// Shares an existing page registry.
    pub fn clients(self, clients: Clients) -> Self {
        Self { clients, ..self }
    }

    /// Replaces the default handler for `kind`.
    pub fn on<H>(mut self, kind: EventKind, handler: H) -> Self
    where
        H: EventHandler + 'static,
    {
        self.handlers.push((kind, Arc::new(handler)));
        self
    }
}

impl<S, F> ServiceWorkerBuilder<S, F>
where
    S: CacheStorage + 'static,
    F: Fetch + 'static,
{
    /// Builds the worker.
    ///
    /// Fails if the origin, the fallback document or a manifest entry cannot
    /// be resolved.
    pub fn build(self) -> Result<ServiceWorker, WorkerError> {
        let config = self.config;
        let manifest = config.install_manifest()?;
        let fallback = config.fallback_url()?;
        let storage: Arc<dyn CacheStorage> = Arc::new(self.storage);
        let fetch: Arc<dyn Fetch> = Arc::new(self.fetch);
        let offload = OffloadManager::new(
            self.offload
                .unwrap_or_else(|| config.offload.to_offload_config()),
        );
        let routes = self.routes.unwrap_or_else(|| config.route_table());

        let lifecycle = Lifecycle::new(
            storage.clone(),
            fetch.clone(),
            manifest,
            config.static_generation(),
            config.dynamic_generation(),
            config.cache_name.as_str(),
            self.clients,
        );
        let executor = Executor::new(
            storage.clone(),
            fetch,
            offload.clone(),
            config.dynamic_generation(),
            fallback,
        );
        let core = Arc::new(WorkerCore {
            config,
            lifecycle,
            routes,
            executor,
            offload,
            storage,
        });

        let mut events = EventTable::new();
        for kind in DEFAULT_EVENTS {
            events.insert(
                kind,
                Arc::new(CoreHandler {
                    kind,
                    core: core.clone(),
                }),
            );
        }
        for (kind, handler) in self.handlers {
            events.insert(kind, handler);
        }

        Ok(ServiceWorker { core, events })
    }
}
