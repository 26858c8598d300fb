//! Tracing utilities for asserting on worker spans.
//!
//! The worker opens a `stashbox.fetch` span per intercepted request and
//! records the response source on it once the strategy finishes. Install
//! and activation run inside `stashbox.install` and `stashbox.activate`.

use std::future::Future;
use std::sync::{Arc, Mutex};

use tracing::instrument::WithSubscriber;
use tracing::span::{Attributes, Id, Record};
use tracing::{Dispatch, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::Registry;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;

const PREFIX: &str = "stashbox.";

/// Captured span information for testing.
#[derive(Debug, Clone)]
pub struct CapturedSpan {
    /// Unique span ID
    pub id: u64,
    /// The span name (e.g., "stashbox.fetch")
    pub name: String,
    /// Captured field values as strings
    pub fields: Vec<(String, String)>,
}

impl CapturedSpan {
    /// Returns the value of `field`, if recorded.
    pub fn field(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_str())
    }
}

/// A tracing layer that captures worker spans.
pub struct SpanCaptureLayer {
    spans: Arc<Mutex<Vec<CapturedSpan>>>,
}

struct FieldVisitor {
    fields: Vec<(String, String)>,
}

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.fields
            .push((field.name().to_string(), format!("{:?}", value)));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.fields
            .push((field.name().to_string(), value.to_string()));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.fields
            .push((field.name().to_string(), value.to_string()));
    }
}

impl<S> Layer<S> for SpanCaptureLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, _ctx: Context<'_, S>) {
        let metadata = attrs.metadata();
        if !metadata.name().starts_with(PREFIX) {
            return;
        }

        let mut visitor = FieldVisitor { fields: Vec::new() };
        attrs.record(&mut visitor);

        self.spans.lock().unwrap().push(CapturedSpan {
            id: id.into_u64(),
            name: metadata.name().to_string(),
            fields: visitor.fields,
        });
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span_ref) = ctx.span(id) else {
            return;
        };
        if !span_ref.metadata().name().starts_with(PREFIX) {
            return;
        }

        let mut visitor = FieldVisitor { fields: Vec::new() };
        values.record(&mut visitor);

        let span_id = id.into_u64();
        let mut spans = self.spans.lock().unwrap();
        if let Some(captured) = spans.iter_mut().find(|s| s.id == span_id) {
            for (key, value) in visitor.fields {
                if let Some(existing) = captured.fields.iter_mut().find(|(k, _)| k == &key) {
                    existing.1 = value;
                } else {
                    captured.fields.push((key, value));
                }
            }
        }
    }
}

/// Collector for captured spans.
#[derive(Clone)]
pub struct SpanCollector {
    spans: Arc<Mutex<Vec<CapturedSpan>>>,
    dispatch: Dispatch,
}

impl Default for SpanCollector {
    fn default() -> Self {
        let spans = Arc::new(Mutex::new(Vec::new()));
        let layer = SpanCaptureLayer {
            spans: spans.clone(),
        };
        let dispatch = Dispatch::new(Registry::default().with(layer));
        Self { spans, dispatch }
    }
}

impl SpanCollector {
    /// Get the dispatch to run instrumented code under.
    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    /// Get all captured spans.
    pub fn spans(&self) -> Vec<CapturedSpan> {
        self.spans.lock().unwrap().clone()
    }

    /// Get captured span names in order.
    pub fn span_names(&self) -> Vec<String> {
        self.spans
            .lock()
            .unwrap()
            .iter()
            .map(|s| s.name.clone())
            .collect()
    }

    /// Response sources recorded on `stashbox.fetch` spans, in request order.
    ///
    /// Requests that failed have no source and are skipped.
    pub fn fetch_sources(&self) -> Vec<String> {
        self.spans
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.name == "stashbox.fetch")
            .filter_map(|s| s.field("source").map(str::to_owned))
            .collect()
    }

    /// Strategies recorded on `stashbox.fetch` spans, in request order.
    pub fn fetch_strategies(&self) -> Vec<String> {
        self.spans
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.name == "stashbox.fetch")
            .filter_map(|s| s.field("strategy").map(str::to_owned))
            .collect()
    }

    /// Check if a span with the given name was captured.
    pub fn has_span(&self, name: &str) -> bool {
        self.spans.lock().unwrap().iter().any(|s| s.name == name)
    }

    /// Clear all captured spans.
    pub fn clear(&self) {
        self.spans.lock().unwrap().clear();
    }

    /// Assert that spans were captured in the given order.
    /// Only checks that the given spans appear in order, allows other spans in between.
    pub fn assert_span_sequence(&self, expected: &[&str]) {
        let names = self.span_names();
        let mut expected_iter = expected.iter();
        let mut current_expected = expected_iter.next();

        for name in &names {
            if let Some(exp) = current_expected
                && name == *exp
            {
                current_expected = expected_iter.next();
            }
        }

        if current_expected.is_some() {
            panic!("Expected span sequence {:?} but got {:?}", expected, names);
        }
    }
}

/// Runs `future` with span capturing enabled.
///
/// Background tasks the future spawns are not captured.
///
/// # Example
///
/// ```ignore
/// let (state, spans) = capture_spans(worker.start()).await;
/// spans.assert_span_sequence(&["stashbox.install", "stashbox.activate"]);
/// ```
pub async fn capture_spans<F>(future: F) -> (F::Output, SpanCollector)
where
    F: Future,
{
    let collector = SpanCollector::default();
    let output = future.with_subscriber(collector.dispatch().clone()).await;
    (output, collector)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::{Level, span};

    #[tokio::test]
    async fn captures_recorded_fields() {
        let ((), collector) = capture_spans(async {
            let span = span!(
                Level::INFO,
                "stashbox.fetch",
                strategy = "cache_first",
                source = tracing::field::Empty
            );
            span.record("source", "cache");
        })
        .await;

        assert_eq!(collector.fetch_sources(), vec!["cache".to_string()]);
        assert_eq!(collector.fetch_strategies(), vec!["cache_first".to_string()]);
    }

    #[tokio::test]
    async fn ignores_foreign_spans() {
        let ((), collector) = capture_spans(async {
            let _span = span!(Level::INFO, "offload_task").entered();
        })
        .await;

        assert!(collector.spans().is_empty());
    }
}
