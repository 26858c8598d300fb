//! Metrics declaration and recording.
//!
//! Enable the `metrics` feature to record these metrics. Without it every
//! recording function compiles to nothing.
//!
//! ## Metrics
//!
//! - `stashbox_responses_total` - Responses served, by `strategy` and `source` (counter)
//! - `stashbox_fetch_errors_total` - Requests that failed after every fallback, by `strategy` (counter)
//! - `stashbox_offload_tasks_spawned_total` - Background tasks spawned, by `kind` (counter)
//! - `stashbox_offload_tasks_completed_total` - Background tasks finished, by `kind` (counter)
//! - `stashbox_offload_tasks_active` - Background tasks running, by `kind` (gauge)
//! - `stashbox_offload_task_duration_seconds` - Background task duration, by `kind` (histogram)

use std::time::Duration;

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
lazy_static! {
    /// Track number of served responses.
    pub static ref RESPONSES_TOTAL: &'static str = {
        metrics::describe_counter!(
            "stashbox_responses_total",
            "Total number of responses served by the worker."
        );
        "stashbox_responses_total"
    };
    /// Track number of requests that could not be served.
    pub static ref FETCH_ERRORS_TOTAL: &'static str = {
        metrics::describe_counter!(
            "stashbox_fetch_errors_total",
            "Total number of requests that failed after every cache fallback."
        );
        "stashbox_fetch_errors_total"
    };

    // Offload metrics

    /// Track number of spawned offload tasks.
    pub static ref OFFLOAD_TASKS_SPAWNED: &'static str = {
        metrics::describe_counter!(
            "stashbox_offload_tasks_spawned_total",
            "Total number of background tasks spawned."
        );
        "stashbox_offload_tasks_spawned_total"
    };
    /// Track number of completed offload tasks.
    pub static ref OFFLOAD_TASKS_COMPLETED: &'static str = {
        metrics::describe_counter!(
            "stashbox_offload_tasks_completed_total",
            "Total number of background tasks completed."
        );
        "stashbox_offload_tasks_completed_total"
    };
    /// Gauge of currently running offload tasks.
    pub static ref OFFLOAD_TASKS_ACTIVE: &'static str = {
        metrics::describe_gauge!(
            "stashbox_offload_tasks_active",
            "Number of background tasks currently running."
        );
        "stashbox_offload_tasks_active"
    };
    /// Histogram of offload task durations.
    pub static ref OFFLOAD_TASK_DURATION: &'static str = {
        metrics::describe_histogram!(
            "stashbox_offload_task_duration_seconds",
            metrics::Unit::Seconds,
            "Duration of background tasks in seconds."
        );
        "stashbox_offload_task_duration_seconds"
    };
}

/// Record a served response.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_served(strategy: &'static str, source: &'static str) {
    metrics::counter!(*RESPONSES_TOTAL, "strategy" => strategy, "source" => source).increment(1);
}

/// Record a request that failed after every fallback.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_failure(strategy: &'static str) {
    metrics::counter!(*FETCH_ERRORS_TOTAL, "strategy" => strategy).increment(1);
}

#[cfg(feature = "metrics")]
#[inline]
pub(crate) fn offload_spawned(kind: &str) {
    let kind = kind.to_string();
    metrics::counter!(*OFFLOAD_TASKS_SPAWNED, "kind" => kind.clone()).increment(1);
    metrics::gauge!(*OFFLOAD_TASKS_ACTIVE, "kind" => kind).increment(1.0);
}

#[cfg(feature = "metrics")]
#[inline]
pub(crate) fn offload_completed(kind: &str, elapsed: Duration) {
    let kind = kind.to_string();
    metrics::counter!(*OFFLOAD_TASKS_COMPLETED, "kind" => kind.clone()).increment(1);
    metrics::gauge!(*OFFLOAD_TASKS_ACTIVE, "kind" => kind.clone()).decrement(1.0);
    metrics::histogram!(*OFFLOAD_TASK_DURATION, "kind" => kind).record(elapsed.as_secs_f64());
}

/// Record a served response (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_served(_strategy: &'static str, _source: &'static str) {}

/// Record a failed request (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_failure(_strategy: &'static str) {}

#[cfg(not(feature = "metrics"))]
#[inline]
pub(crate) fn offload_spawned(_kind: &str) {}

#[cfg(not(feature = "metrics"))]
#[inline]
pub(crate) fn offload_completed(_kind: &str, _elapsed: Duration) {}
