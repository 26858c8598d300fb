//! Worker events and the dispatch table.
//!
//! Each [`WorkerEvent`] is routed to at most one [`EventHandler`] by its
//! [`EventKind`]. The table is assembled when the worker is built, so a host
//! can override any handler, for example to swap the push hook for one that
//! actually shows notifications.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use stashbox_core::FetchRequest;
use tracing::debug;

use crate::error::WorkerError;
use crate::hooks::Notification;
use crate::lifecycle::ActivationReport;
use crate::message::VersionReply;
use crate::strategy::Served;

/// Kind of a worker event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Pre-cache the manifest.
    Install,
    /// Evict stale generations and claim pages.
    Activate,
    /// A page made a request.
    Fetch,
    /// A page posted a message.
    Message,
    /// Connectivity returned for a registered sync tag.
    Sync,
    /// A push message arrived.
    Push,
    /// The user clicked a notification.
    NotificationClick,
}

impl EventKind {
    /// Returns the event name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            EventKind::Install => "install",
            EventKind::Activate => "activate",
            EventKind::Fetch => "fetch",
            EventKind::Message => "message",
            EventKind::Sync => "sync",
            EventKind::Push => "push",
            EventKind::NotificationClick => "notificationclick",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event delivered to the worker.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    /// Pre-cache the manifest.
    Install,
    /// Evict stale generations and claim pages.
    Activate,
    /// A page made a request.
    Fetch(FetchRequest),
    /// A page posted a message.
    Message(Value),
    /// Connectivity returned for the given sync tag.
    Sync(String),
    /// A push message arrived, with its raw payload.
    Push(Option<Bytes>),
    /// The user clicked a notification.
    NotificationClick(Notification),
}

impl WorkerEvent {
    /// Returns the kind used for dispatch.
    pub fn kind(&self) -> EventKind {
        match self {
            WorkerEvent::Install => EventKind::Install,
            WorkerEvent::Activate => EventKind::Activate,
            WorkerEvent::Fetch(_) => EventKind::Fetch,
            WorkerEvent::Message(_) => EventKind::Message,
            WorkerEvent::Sync(_) => EventKind::Sync,
            WorkerEvent::Push(_) => EventKind::Push,
            WorkerEvent::NotificationClick(_) => EventKind::NotificationClick,
        }
    }
}

/// What handling an event produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// Install finished.
    Installed,
    /// Activation finished.
    Activated(ActivationReport),
    /// The request was answered by the worker.
    Response(Served),
    /// The request is not the worker's business and goes to the network.
    Passthrough,
    /// A reply to post back to the page.
    Reply(VersionReply),
    /// A notification for the host to display.
    Notify(Notification),
    /// The event was handled and produced nothing.
    Done,
    /// No handler took an interest in the event.
    Ignored,
}

/// Handles one kind of event.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handles `event`.
    async fn handle(&self, event: WorkerEvent) -> Result<EventOutcome, WorkerError>;
}

/// Adapts an async closure into an [`EventHandler`].
///
/// ```
/// use stashbox::events::{EventOutcome, HandlerFn, WorkerEvent};
///
/// let handler = HandlerFn::new(|_event: WorkerEvent| async { Ok(EventOutcome::Done) });
/// # let _ = handler;
/// ```
pub struct HandlerFn<F> {
    f: F,
}

impl<F, Fut> HandlerFn<F>
where
    F: Fn(WorkerEvent) -> Fut + Send + Sync,
    Fut: Future<Output = Result<EventOutcome, WorkerError>> + Send,
{
    /// Wraps `f`.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> EventHandler for HandlerFn<F>
where
    F: Fn(WorkerEvent) -> Fut + Send + Sync,
    Fut: Future<Output = Result<EventOutcome, WorkerError>> + Send,
{
    async fn handle(&self, event: WorkerEvent) -> Result<EventOutcome, WorkerError> {
        (self.f)(event).await
    }
}

/// Maps event kinds to handlers.
#[derive(Clone, Default)]
pub struct EventTable {
    handlers: HashMap<EventKind, Arc<dyn EventHandler>>,
}

impl fmt::Debug for EventTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}

impl EventTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `kind`, replacing any previous handler.
    pub fn on<H>(mut self, kind: EventKind, handler: H) -> Self
    where
        H: EventHandler + 'static,
    {
        self.insert(kind, Arc::new(handler));
        self
    }

    /// Registers a shared handler for `kind`, replacing any previous handler.
    pub fn insert(&mut self, kind: EventKind, handler: Arc<dyn EventHandler>) {
        self.handlers.insert(kind, handler);
    }

    /// Removes the handler for `kind`.
    pub fn remove(&mut self, kind: EventKind) -> Option<Arc<dyn EventHandler>> {
        self.handlers.remove(&kind)
    }

    /// Returns `true` if a handler is registered for `kind`.
    pub fn handles(&self, kind: EventKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Routes `event` to its handler.
    ///
    /// Events without a handler are [`EventOutcome::Ignored`], except fetches,
    /// which pass through to the network.
    pub async fn dispatch(&self, event: WorkerEvent) -> Result<EventOutcome, WorkerError> {
        let kind = event.kind();
        match self.handlers.get(&kind) {
            Some(handler) => handler.handle(event).await,
            None if kind == EventKind::Fetch => Ok(EventOutcome::Passthrough),
            None => {
                debug!(event = %kind, "no handler registered");
                Ok(EventOutcome::Ignored)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test]
    async fn dispatch_routes_by_kind() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let table = EventTable::new().on(
            EventKind::Sync,
            HandlerFn::new(move |event: WorkerEvent| {
                let counter = counter.clone();
                async move {
                    assert_eq!(event.kind(), EventKind::Sync);
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(EventOutcome::Done)
                }
            }),
        );

        let outcome = table.dispatch(WorkerEvent::Sync("contact-form".into())).await;
        assert_eq!(outcome.unwrap(), EventOutcome::Done);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_handlers_ignore_or_pass_through() {
        let table = EventTable::new();
        assert_eq!(
            table.dispatch(WorkerEvent::Push(None)).await.unwrap(),
            EventOutcome::Ignored
        );

        let request = FetchRequest::get("https://portfolio.example/").unwrap();
        assert_eq!(
            table.dispatch(WorkerEvent::Fetch(request)).await.unwrap(),
            EventOutcome::Passthrough
        );
    }

    #[tokio::test]
    async fn later_registration_replaces_earlier() {
        let table = EventTable::new()
            .on(
                EventKind::Push,
                HandlerFn::new(|_: WorkerEvent| async { Ok(EventOutcome::Ignored) }),
            )
            .on(
                EventKind::Push,
                HandlerFn::new(|_: WorkerEvent| async { Ok(EventOutcome::Done) }),
            );
        assert_eq!(
            table.dispatch(WorkerEvent::Push(None)).await.unwrap(),
            EventOutcome::Done
        );
    }
}
