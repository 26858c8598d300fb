mod common;

use common::test_backend::TestStorage;
use http::StatusCode;
use stashbox_backend::{CacheStorage, DeleteStatus};
use stashbox_core::{GenerationName, RequestKey, ResponseSnapshot};
use url::Url;

fn key(url: &str) -> RequestKey {
    RequestKey::get(&Url::parse(url).unwrap())
}

#[tokio::test]
async fn match_request_returns_first_generation_in_creation_order() {
    let storage = TestStorage::new();
    let first = GenerationName::new("static-v1");
    let second = GenerationName::new("dynamic-v1");

    let key = key("https://example.com/styles.css");
    storage
        .open(&first)
        .await
        .unwrap()
        .write(&key, ResponseSnapshot::new(StatusCode::OK, "from static"))
        .await
        .unwrap();
    storage
        .open(&second)
        .await
        .unwrap()
        .write(&key, ResponseSnapshot::new(StatusCode::OK, "from dynamic"))
        .await
        .unwrap();

    let hit = storage.match_request(&key).await.unwrap().unwrap();
    assert_eq!(hit.generation, first);
    assert_eq!(hit.response.body().as_ref(), b"from static");
}

#[tokio::test]
async fn match_request_misses_on_unknown_key() {
    let storage = TestStorage::new();
    storage.open(&GenerationName::new("static-v1")).await.unwrap();

    let miss = storage
        .match_request(&key("https://example.com/missing.png"))
        .await
        .unwrap();
    assert!(miss.is_none());
}

#[tokio::test]
async fn delete_removes_whole_generation() {
    let storage = TestStorage::new();
    let name = GenerationName::new("dynamic-v0");
    let key = key("https://example.com/assets/logo.webp");
    storage
        .open(&name)
        .await
        .unwrap()
        .write(&key, ResponseSnapshot::new(StatusCode::OK, "logo"))
        .await
        .unwrap();

    assert!(storage.has(&name).await.unwrap());
    assert_eq!(storage.delete(&name).await.unwrap(), DeleteStatus::Deleted(1));
    assert_eq!(storage.delete(&name).await.unwrap(), DeleteStatus::Missing);
    assert!(!storage.has(&name).await.unwrap());
    assert!(storage.match_request(&key).await.unwrap().is_none());
}

#[tokio::test]
async fn open_is_idempotent() {
    let storage = TestStorage::new();
    let name = GenerationName::new("static-v2");
    let key = key("https://example.com/");

    storage
        .open(&name)
        .await
        .unwrap()
        .write(&key, ResponseSnapshot::new(StatusCode::OK, "root"))
        .await
        .unwrap();
    let reopened = storage.open(&name).await.unwrap();

    assert_eq!(reopened.keys().await.unwrap(), vec![key]);
    assert_eq!(storage.keys().await.unwrap(), vec![name]);
}

#[tokio::test]
async fn concurrent_creates_have_one_winner() {
    let storage = TestStorage::new();
    let name = GenerationName::new("static-v3");

    let results = futures::future::join_all((0..8).map(|_| storage.create(&name))).await;
    let created = results
        .into_iter()
        .map(|result| result.unwrap())
        .filter(Option::is_some)
        .count();

    assert_eq!(created, 1);
    assert_eq!(storage.keys().await.unwrap(), vec![name]);
}
