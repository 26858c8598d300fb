//! Tests for generation management in MokaStorage.

use http::StatusCode;
use stashbox_backend::{CacheStorage, DeleteStatus};
use stashbox_core::{GenerationName, RequestKey, ResponseSnapshot};
use stashbox_moka::MokaStorage;
use url::Url;

fn key(path: &str) -> RequestKey {
    RequestKey::get(&Url::parse("https://example.com/").unwrap().join(path).unwrap())
}

fn ok(body: &'static str) -> ResponseSnapshot {
    ResponseSnapshot::new(StatusCode::OK, body)
}

#[tokio::test]
async fn write_overwrites_existing_entry() {
    let storage = MokaStorage::new();
    let generation = storage.open(&GenerationName::new("dynamic-v1")).await.unwrap();

    generation.write(&key("/index.html"), ok("old")).await.unwrap();
    generation.write(&key("/index.html"), ok("new")).await.unwrap();

    let stored = generation.read(&key("/index.html")).await.unwrap().unwrap();
    assert_eq!(stored.body().as_ref(), b"new");
    assert_eq!(generation.keys().await.unwrap().len(), 1);
}

#[tokio::test]
async fn handles_share_the_same_generation() {
    let storage = MokaStorage::default();
    let name = GenerationName::new("static-v1");

    let writer = storage.open(&name).await.unwrap();
    writer.write(&key("/styles.css"), ok("body {}")).await.unwrap();

    let reader = storage.get(&name).await.unwrap().expect("generation exists");
    assert_eq!(reader.name(), "static-v1");
    assert!(reader.read(&key("/styles.css")).await.unwrap().is_some());
}

#[tokio::test]
async fn keys_are_listed_in_creation_order() {
    let storage = MokaStorage::default();
    for name in ["static-v1", "dynamic-v1", "static-v2"] {
        storage.open(&GenerationName::new(name)).await.unwrap();
    }

    let names: Vec<_> = storage
        .keys()
        .await
        .unwrap()
        .into_iter()
        .map(|name| name.to_string())
        .collect();
    assert_eq!(names, ["static-v1", "dynamic-v1", "static-v2"]);
}

#[tokio::test]
async fn delete_drops_generation_and_entries() {
    let storage = MokaStorage::default();
    let old = GenerationName::new("static-v1");
    storage
        .open(&old)
        .await
        .unwrap()
        .write(&key("/script.js"), ok("console.log(1)"))
        .await
        .unwrap();

    assert_eq!(storage.delete(&old).await.unwrap(), DeleteStatus::Deleted(1));
    assert!(!storage.has(&old).await.unwrap());
    assert!(storage.match_request(&key("/script.js")).await.unwrap().is_none());

    // Reopening yields a fresh, empty generation.
    let reopened = storage.open(&old).await.unwrap();
    assert!(reopened.read(&key("/script.js")).await.unwrap().is_none());
}

#[tokio::test]
async fn match_request_prefers_older_generation() {
    let storage = MokaStorage::default();
    let first = GenerationName::new("static-v1");
    let second = GenerationName::new("dynamic-v1");

    storage.open(&first).await.unwrap().write(&key("/"), ok("precached")).await.unwrap();
    storage.open(&second).await.unwrap().write(&key("/"), ok("runtime")).await.unwrap();

    let hit = storage.match_request(&key("/")).await.unwrap().unwrap();
    assert_eq!(hit.generation, first);
    assert_eq!(hit.response.body().as_ref(), b"precached");
}

#[tokio::test]
async fn generations_never_evict_entries() {
    let storage = MokaStorage::new();
    let generation = storage.open(&GenerationName::new("static-v1")).await.unwrap();
    let total = 10_000;

    for i in 0..total {
        generation
            .write(&key(&format!("/assets/{i}.webp")), ok("image"))
            .await
            .unwrap();
    }

    let mut present = 0;
    for i in 0..total {
        if storage
            .match_request(&key(&format!("/assets/{i}.webp")))
            .await
            .unwrap()
            .is_some()
        {
            present += 1;
        }
    }
    assert_eq!(present, total);
    assert_eq!(generation.keys().await.unwrap().len(), total);
}

#[tokio::test]
async fn create_only_succeeds_for_new_generations() {
    let storage = MokaStorage::new();
    let name = GenerationName::new("static-v1");

    let created = storage.create(&name).await.unwrap().expect("new generation");
    created.write(&key("/"), ok("root")).await.unwrap();

    assert!(storage.create(&name).await.unwrap().is_none());
    let opened = storage.open(&name).await.unwrap();
    assert!(opened.read(&key("/")).await.unwrap().is_some());
}
