//! Tests for the worker's metrics.
//!
//! Run with `--features metrics`.

#![cfg(feature = "metrics")]

use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use metrics_util::{CompositeKey, MetricKind};
use serial_test::serial;
use stashbox::{FetchRequest, ServiceWorker, WorkerConfig};
use stashbox_test::{MockNetwork, MockStorage, TEST_ORIGIN};

type SnapshotEntry = (
    CompositeKey,
    Option<metrics::Unit>,
    Option<metrics::SharedString>,
    DebugValue,
);

fn counter(entries: &[SnapshotEntry], name: &str, labels: &[(&str, &str)]) -> Option<u64> {
    entries.iter().find_map(|(key, _, _, value)| {
        if key.kind() != MetricKind::Counter || key.key().name() != name {
            return None;
        }
        let matches = labels.iter().all(|(label, expected)| {
            key.key()
                .labels()
                .any(|l| l.key() == *label && l.value() == *expected)
        });
        match value {
            DebugValue::Counter(v) if matches => Some(*v),
            _ => None,
        }
    })
}

fn histogram_count(entries: &[SnapshotEntry], name: &str) -> usize {
    entries
        .iter()
        .filter(|(key, _, _, _)| key.kind() == MetricKind::Histogram && key.key().name() == name)
        .map(|(_, _, _, value)| match value {
            DebugValue::Histogram(samples) => samples.len(),
            _ => 0,
        })
        .sum()
}

fn run<F: Future>(future: F) -> F::Output {
    // Single-threaded so every task records into the thread-local recorder.
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

async fn running_worker(network: &MockNetwork) -> ServiceWorker {
    network.serve_paths(["/", "/index.html"]);
    network.serve("/assets/logo.webp", "logo");
    let worker = ServiceWorker::builder()
        .config(
            WorkerConfig::builder()
                .origin(TEST_ORIGIN)
                .manifest(["/", "/index.html"])
                .build(),
        )
        .storage(MockStorage::new())
        .fetch(network.clone())
        .build()
        .unwrap();
    worker.start().await.unwrap();
    worker
}

#[test]
#[serial]
fn served_responses_are_counted_by_strategy_and_source() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        run(async {
            let network = MockNetwork::default();
            let worker = running_worker(&network).await;
            for _ in 0..3 {
                worker
                    .handle_fetch(FetchRequest::get(&network.url("/assets/logo.webp")).unwrap())
                    .await
                    .unwrap();
            }
        })
    });

    let entries = snapshotter.snapshot().into_vec();
    assert_eq!(
        counter(
            &entries,
            "stashbox_responses_total",
            &[("strategy", "cache_first"), ("source", "network")]
        ),
        Some(1)
    );
    assert_eq!(
        counter(
            &entries,
            "stashbox_responses_total",
            &[("strategy", "cache_first"), ("source", "cache")]
        ),
        Some(2)
    );
}

#[test]
#[serial]
fn unrecoverable_failures_are_counted() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        run(async {
            let network = MockNetwork::default();
            let worker = running_worker(&network).await;
            network.set_offline(true);
            let result = worker
                .handle_fetch(FetchRequest::get("https://api.github.com/users/me").unwrap())
                .await;
            assert!(result.is_err());
        })
    });

    let entries = snapshotter.snapshot().into_vec();
    assert_eq!(
        counter(
            &entries,
            "stashbox_fetch_errors_total",
            &[("strategy", "network_first")]
        ),
        Some(1)
    );
}

#[test]
#[serial]
fn background_revalidation_is_measured() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        run(async {
            let network = MockNetwork::default();
            let worker = running_worker(&network).await;
            let page = FetchRequest::get(&network.url("/"))
                .unwrap()
                .with_destination(stashbox::Destination::Document);
            worker.handle_fetch(page).await.unwrap();
            worker.offload().wait_all().await;
        })
    });

    let entries = snapshotter.snapshot().into_vec();
    assert_eq!(
        counter(
            &entries,
            "stashbox_offload_tasks_spawned_total",
            &[("kind", "revalidate")]
        ),
        Some(1)
    );
    assert_eq!(
        counter(
            &entries,
            "stashbox_offload_tasks_completed_total",
            &[("kind", "revalidate")]
        ),
        Some(1)
    );
    assert_eq!(
        histogram_count(&entries, "stashbox_offload_task_duration_seconds"),
        1
    );
}
