use anyhow::{Error, anyhow};
use cucumber::World;
use stashbox::{
    Destination, FetchRequest, LifecycleState, Notification, Served, ServiceWorker,
    VersionReply, WorkerConfig,
};

use crate::network::{MockNetwork, TEST_ORIGIN};
use crate::storage::MockStorage;

/// Manifest installed when a scenario does not set its own.
pub const SITE_MANIFEST: &[&str] = &["/", "/index.html", "/styles.css", "/script.js"];

/// What the worker did with the last request.
#[derive(Debug)]
pub enum Outcome {
    Served(Served),
    Passthrough,
    Failed(String),
}

#[derive(Debug, World)]
pub struct StashboxWorld {
    pub network: MockNetwork,
    pub storage: MockStorage,
    pub manifest: Vec<String>,
    /// Every worker started so far, newest last.
    pub workers: Vec<ServiceWorker>,
    pub start_error: Option<String>,
    pub outcome: Option<Outcome>,
    pub reply: Option<VersionReply>,
    pub notification: Option<Notification>,
}

impl StashboxWorld {
    pub fn new() -> Self {
        Self {
            network: MockNetwork::new(TEST_ORIGIN),
            storage: MockStorage::new(),
            manifest: SITE_MANIFEST.iter().map(|entry| entry.to_string()).collect(),
            workers: Vec::new(),
            start_error: None,
            outcome: None,
            reply: None,
            notification: None,
        }
    }

    /// Configuration for worker `version`, tagging both generations with it.
    pub fn config(&self, version: &str) -> WorkerConfig {
        WorkerConfig::builder()
            .origin(TEST_ORIGIN)
            .cache_name(format!("personaldevpage-{version}"))
            .version(version)
            .manifest(self.manifest.iter().cloned())
            .build()
    }

    /// Builds worker `version` over the shared storage and network, and
    /// runs it through install and activation.
    pub async fn start_worker(&mut self, version: &str) -> Result<LifecycleState, Error> {
        let worker = ServiceWorker::builder()
            .config(self.config(version))
            .storage(self.storage.clone())
            .fetch(self.network.clone())
            .build()?;
        self.workers.push(worker.clone());
        match worker.start().await {
            Ok(state) => {
                self.start_error = None;
                Ok(state)
            }
            Err(error) => {
                self.start_error = Some(error.to_string());
                Ok(worker.state())
            }
        }
    }

    pub fn worker(&self) -> Result<&ServiceWorker, Error> {
        self.workers
            .last()
            .ok_or_else(|| anyhow!("no worker has been started"))
    }

    pub async fn request(&mut self, target: &str, destination: Destination) -> Result<(), Error> {
        let request =
            FetchRequest::get(&self.network.url(target))?.with_destination(destination);
        let outcome = match self.worker()?.handle_fetch(request).await {
            Ok(Some(served)) => Outcome::Served(served),
            Ok(None) => Outcome::Passthrough,
            Err(error) => Outcome::Failed(error.to_string()),
        };
        self.outcome = Some(outcome);
        Ok(())
    }

    pub fn served(&self) -> Result<&Served, Error> {
        match &self.outcome {
            Some(Outcome::Served(served)) => Ok(served),
            Some(other) => Err(anyhow!("expected a served response, got {other:?}")),
            None => Err(anyhow!("no request has been made")),
        }
    }
}

impl Default for StashboxWorld {
    fn default() -> Self {
        Self::new()
    }
}
