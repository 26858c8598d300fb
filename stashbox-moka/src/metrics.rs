//! Moka generation metrics.
//!
//! Enable the `metrics` feature to use these metrics.
//!
//! ## Metrics
//!
//! - `stashbox_moka_entries` - Approximate number of entries in a generation (gauge)
//!
//! The metric carries a `generation` label.

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
lazy_static! {
    /// Metric name for the entry count gauge.
    pub static ref MOKA_ENTRIES: &'static str = {
        metrics::describe_gauge!(
            "stashbox_moka_entries",
            "Approximate number of entries in a Moka cache generation."
        );
        "stashbox_moka_entries"
    };
}

/// Record the current entry count of a generation.
///
/// Moka updates its counters lazily, so the value may lag behind the most
/// recent writes.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_entries(generation: &str, entries: u64) {
    metrics::gauge!(*MOKA_ENTRIES, "generation" => generation.to_string()).set(entries as f64);
}

/// Record the current entry count (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_entries(_generation: &str, _entries: u64) {}
