//! Worker lifecycle: install, activate, take over.
//!
//! ```text
//! Parsed -> Installing -> Installed -> Activating -> Activated
//!               |
//!               +-> Redundant
//! ```
//!
//! Install pre-caches the [`InstallManifest`] into the static generation as
//! one batch. Activate deletes every generation the configuration no longer
//! names and claims all open pages.

mod clients;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::future::{join_all, try_join_all};
use http::Method;
use serde::Serialize;
use smol_str::SmolStr;
use stashbox_backend::{CacheStorage, DeleteStatus};
use stashbox_core::{Fetch, FetchRequest, Generation, GenerationName, RequestKey, ResponseSnapshot};
use tokio::sync::watch;
use tracing::{Instrument, debug, info, info_span, warn};
use url::Url;

pub use clients::{Client, ClientId, Clients};

use crate::error::WorkerError;
use crate::manifest::InstallManifest;

/// Lifecycle state of a worker version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    /// Constructed, install not yet attempted.
    Parsed,
    /// Pre-caching the manifest.
    Installing,
    /// Pre-cached and waiting to activate.
    Installed,
    /// Evicting stale generations.
    Activating,
    /// Controlling pages and answering requests.
    Activated,
    /// Install failed; this version will never activate.
    Redundant,
}

impl LifecycleState {
    /// Returns the state name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Parsed => "parsed",
            LifecycleState::Installing => "installing",
            LifecycleState::Installed => "installed",
            LifecycleState::Activating => "activating",
            LifecycleState::Activated => "activated",
            LifecycleState::Redundant => "redundant",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What activation did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationReport {
    /// Generations deleted, in storage order.
    pub deleted: Vec<GenerationName>,
    /// Number of pages claimed.
    pub claimed: usize,
}

/// Drives one worker version through its lifecycle.
pub struct Lifecycle {
    state: watch::Sender<LifecycleState>,
    skip_waiting: AtomicBool,
    storage: Arc<dyn CacheStorage>,
    fetch: Arc<dyn Fetch>,
    manifest: InstallManifest,
    static_generation: Generation,
    dynamic_generation: Generation,
    version: SmolStr,
    clients: Clients,
}

impl fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("state", &self.state())
            .field("static_generation", &self.static_generation)
            .field("dynamic_generation", &self.dynamic_generation)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl Lifecycle {
    /// Creates a lifecycle in the [`LifecycleState::Parsed`] state.
    pub fn new(
        storage: Arc<dyn CacheStorage>,
        fetch: Arc<dyn Fetch>,
        manifest: InstallManifest,
        static_generation: Generation,
        dynamic_generation: Generation,
        version: impl Into<SmolStr>,
        clients: Clients,
    ) -> Self {
        Self {
            state: watch::Sender::new(LifecycleState::Parsed),
            skip_waiting: AtomicBool::new(false),
            storage,
            fetch,
            manifest,
            static_generation,
            dynamic_generation,
            version: version.into(),
            clients,
        }
    }

    /// Returns the current state.
    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Subscribes to state changes.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    /// Returns `true` once the worker answers requests.
    pub fn is_active(&self) -> bool {
        self.state() == LifecycleState::Activated
    }

    /// Returns `true` if promotion past `Installed` was requested.
    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting.load(Ordering::Acquire)
    }

    /// Returns the open page registry.
    pub fn clients(&self) -> &Clients {
        &self.clients
    }

    /// Returns the static generation.
    pub fn static_generation(&self) -> &Generation {
        &self.static_generation
    }

    /// Returns the dynamic generation.
    pub fn dynamic_generation(&self) -> &Generation {
        &self.dynamic_generation
    }

    fn transition(
        &self,
        operation: &'static str,
        from: LifecycleState,
        to: LifecycleState,
    ) -> Result<(), WorkerError> {
        let mut actual = from;
        let moved = self.state.send_if_modified(|state| {
            actual = *state;
            if *state == from {
                *state = to;
                true
            } else {
                false
            }
        });
        if moved {
            debug!(%from, %to, "lifecycle transition");
            Ok(())
        } else {
            Err(WorkerError::InvalidState {
                operation,
                state: actual,
            })
        }
    }

    fn set(&self, state: LifecycleState) {
        let previous = self.state.send_replace(state);
        debug!(from = %previous, to = %state, "lifecycle transition");
    }

    /// Pre-caches the manifest into the static generation.
    ///
    /// Either every manifest URL is stored or none is. On failure the worker
    /// becomes [`LifecycleState::Redundant`] and any previously installed
    /// generation is left untouched. On success promotion past `Installed`
    /// is requested.
    pub async fn install(&self) -> Result<(), WorkerError> {
        self.transition("install", LifecycleState::Parsed, LifecycleState::Installing)?;

        let span = info_span!(
            "stashbox.install",
            generation = %self.static_generation,
            urls = self.manifest.len(),
        );
        match self.precache().instrument(span).await {
            Ok(()) => {
                info!(generation = %self.static_generation, urls = self.manifest.len(), "installed");
                self.set(LifecycleState::Installed);
                self.skip_waiting.store(true, Ordering::Release);
                Ok(())
            }
            Err(error) => {
                warn!(%error, "install failed");
                self.set(LifecycleState::Redundant);
                Err(error)
            }
        }
    }

    async fn precache(&self) -> Result<(), WorkerError> {
        let entries = try_join_all(self.manifest.iter().map(|url| self.fetch_required(url))).await?;

        let name = self.static_generation.name();
        let (backend, created) = match self.storage.create(name).await? {
            Some(backend) => (backend, true),
            None => (self.storage.open(name).await?, false),
        };
        if let Err(error) = backend.write_all(entries).await {
            // A generation that existed before belongs to a peer install.
            if created && let Err(cleanup) = self.storage.delete(name).await {
                warn!(generation = %name, error = %cleanup, "failed to drop partial generation");
            }
            return Err(error.into());
        }
        Ok(())
    }

    async fn fetch_required(&self, url: &Url) -> Result<(RequestKey, ResponseSnapshot), WorkerError> {
        let request = FetchRequest::new(Method::GET, url.clone());
        let key = request.key();
        let response = self
            .fetch
            .fetch(request)
            .await
            .map_err(|source| WorkerError::Install {
                url: url.to_string(),
                source,
            })?;
        if !response.is_success() {
            return Err(WorkerError::InstallStatus {
                url: url.to_string(),
                status: response.status(),
            });
        }
        Ok((key, response))
    }

    /// Deletes every generation other than the current static and dynamic
    /// ones, then claims all open pages.
    ///
    /// Deletion failures are logged and skipped.
    pub async fn activate(&self) -> Result<ActivationReport, WorkerError> {
        self.transition("activate", LifecycleState::Installed, LifecycleState::Activating)?;

        let span = info_span!(
            "stashbox.activate",
            static_generation = %self.static_generation,
            dynamic_generation = %self.dynamic_generation,
        );
        let deleted = self.evict_stale().instrument(span).await;
        let claimed = self.clients.claim(&self.version);
        self.set(LifecycleState::Activated);

        Ok(ActivationReport { deleted, claimed })
    }

    async fn evict_stale(&self) -> Vec<GenerationName> {
        let names = match self.storage.keys().await {
            Ok(names) => names,
            Err(error) => {
                warn!(%error, "failed to list cache generations");
                return Vec::new();
            }
        };

        let stale = names.into_iter().filter(|name| {
            name != self.static_generation.name() && name != self.dynamic_generation.name()
        });
        let results = join_all(stale.map(|name| async move {
            let result = self.storage.delete(&name).await;
            (name, result)
        }))
        .await;

        results
            .into_iter()
            .filter_map(|(name, result)| match result {
                Ok(DeleteStatus::Deleted(_)) => {
                    info!(generation = %name, "deleted stale generation");
                    Some(name)
                }
                Ok(DeleteStatus::Missing) => None,
                Err(error) => {
                    warn!(generation = %name, %error, "failed to delete stale generation");
                    None
                }
            })
            .collect()
    }

    /// Requests promotion past `Installed`.
    ///
    /// If the worker is waiting in `Installed`, it activates right away and
    /// the report is returned.
    pub async fn skip_waiting(&self) -> Result<Option<ActivationReport>, WorkerError> {
        self.skip_waiting.store(true, Ordering::Release);
        if self.state() != LifecycleState::Installed {
            return Ok(None);
        }
        match self.activate().await {
            Ok(report) => Ok(Some(report)),
            // Another caller activated first.
            Err(WorkerError::InvalidState { .. }) => Ok(None),
            Err(error) => Err(error),
        }
    }

    /// Installs, then activates if promotion was requested.
    pub async fn run(&self) -> Result<Option<ActivationReport>, WorkerError> {
        self.install().await?;
        if self.skip_waiting_requested() {
            self.activate().await.map(Some)
        } else {
            Ok(None)
        }
    }
}
