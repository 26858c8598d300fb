//! OffloadManager implementation for background task execution.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use smol_str::SmolStr;
use tokio::task::JoinHandle;
use tracing::{Instrument, info_span, warn};

use super::policy::{OffloadConfig, TimeoutPolicy};

/// Identifies an offloaded task.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OffloadKey {
    kind: SmolStr,
    id: u64,
}

impl OffloadKey {
    /// Kind of the task (e.g. "revalidate").
    pub fn kind(&self) -> &SmolStr {
        &self.kind
    }

    /// Identifier, unique per manager.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl fmt::Display for OffloadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.id)
    }
}

#[derive(Debug)]
struct OffloadManagerInner {
    config: OffloadConfig,
    tasks: DashMap<OffloadKey, JoinHandle<()>>,
    key_counter: AtomicU64,
}

/// Runs detached background tasks.
///
/// Tasks are tracked only so that tests and graceful shutdown can wait for
/// them; the code that spawns a task never observes its outcome.
#[derive(Clone, Debug)]
pub struct OffloadManager {
    inner: Arc<OffloadManagerInner>,
}

impl OffloadManager {
    /// Create a new OffloadManager with the given configuration.
    pub fn new(config: OffloadConfig) -> Self {
        Self {
            inner: Arc::new(OffloadManagerInner {
                config,
                tasks: DashMap::new(),
                key_counter: AtomicU64::new(0),
            }),
        }
    }

    /// Create a new OffloadManager with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(OffloadConfig::default())
    }

    fn next_key(&self, kind: impl Into<SmolStr>) -> OffloadKey {
        let id = self.inner.key_counter.fetch_add(1, Ordering::Relaxed);
        OffloadKey {
            kind: kind.into(),
            id,
        }
    }

    /// Spawn a task of the given kind.
    ///
    /// The kind is used for metrics labels and tracing.
    ///
    /// # Example
    /// ```
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// use stashbox::offload::OffloadManager;
    ///
    /// let manager = OffloadManager::with_defaults();
    /// manager.spawn("revalidate", async { /* refresh a cache entry */ });
    /// manager.wait_all().await;
    /// # }
    /// ```
    pub fn spawn<F>(&self, kind: impl Into<SmolStr>, task: F) -> OffloadKey
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let key = self.next_key(kind);
        crate::metrics::offload_spawned(key.kind());
        let handle = self.spawn_inner(task, key.clone());
        self.inner.tasks.insert(key.clone(), handle);
        key
    }

    /// Get the number of currently active tasks.
    pub fn active_task_count(&self) -> usize {
        self.inner
            .tasks
            .iter()
            .filter(|entry| !entry.is_finished())
            .count()
    }

    /// Check if the task with the given key is still running.
    pub fn is_in_flight(&self, key: &OffloadKey) -> bool {
        self.inner
            .tasks
            .get(key)
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Clean up finished task handles.
    pub fn cleanup_finished(&self) {
        self.inner.tasks.retain(|_, handle| !handle.is_finished());
    }

    /// Wait for all currently tracked tasks to complete.
    ///
    /// This polls active tasks until all are finished, with a small yield
    /// between checks to avoid busy-waiting.
    pub async fn wait_all(&self) {
        loop {
            self.cleanup_finished();
            if self.inner.tasks.is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
    }

    /// Wait for all tasks with a timeout.
    ///
    /// Returns `true` if all tasks completed within the timeout,
    /// `false` if the timeout was reached.
    pub async fn wait_all_timeout(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.wait_all()).await.is_ok()
    }

    fn spawn_inner<F>(&self, task: F, key: OffloadKey) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let threshold = match self.inner.config.timeout_policy {
            TimeoutPolicy::None => None,
            TimeoutPolicy::Warn(duration) => Some(duration),
        };
        let inner = self.inner.clone();
        let span = info_span!("offload_task", kind = %key.kind, id = key.id);

        tokio::spawn(
            async move {
                let start = Instant::now();
                task.await;
                let elapsed = start.elapsed();
                if let Some(threshold) = threshold
                    && elapsed > threshold
                {
                    warn!(
                        %key,
                        elapsed_ms = elapsed.as_millis(),
                        threshold_ms = threshold.as_millis(),
                        "Offload task exceeded timeout threshold"
                    );
                }
                inner.tasks.remove(&key);
                crate::metrics::offload_completed(&key.kind, elapsed);
            }
            .instrument(span),
        )
    }
}

impl Default for OffloadManager {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl stashbox_core::Offload for OffloadManager {
    fn spawn<F>(&self, kind: impl Into<SmolStr>, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        OffloadManager::spawn(self, kind, future);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[tokio::test]
    async fn wait_all_drains_spawned_tasks() {
        let manager = OffloadManager::with_defaults();
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..4 {
            let counter = counter.clone();
            manager.spawn("test", async move {
                tokio::task::yield_now().await;
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        manager.wait_all().await;
        assert_eq!(counter.load(Ordering::SeqCst), 4);
        assert_eq!(manager.active_task_count(), 0);
    }

    #[tokio::test]
    async fn keys_are_unique_per_manager() {
        let manager = OffloadManager::with_defaults();
        let first = manager.spawn("revalidate", async {});
        let second = manager.spawn("revalidate", async {});
        assert_ne!(first, second);
        assert_eq!(first.kind(), "revalidate");
        manager.wait_all().await;
        assert!(!manager.is_in_flight(&first));
    }

    #[tokio::test]
    async fn warn_policy_lets_slow_task_finish() {
        let manager = OffloadManager::new(
            OffloadConfig::builder()
                .warn_after(Duration::from_millis(1))
                .build(),
        );
        let done = Arc::new(AtomicUsize::new(0));
        let flag = done.clone();
        manager.spawn("slow", async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            flag.store(1, Ordering::SeqCst);
        });

        assert!(manager.wait_all_timeout(Duration::from_secs(1)).await);
        assert_eq!(done.load(Ordering::SeqCst), 1);
    }
}
