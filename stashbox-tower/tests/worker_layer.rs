use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use http::{Method, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use pretty_assertions::assert_eq;
use stashbox::{Fetch, FetchError, FetchRequest, RequestKey, ServiceWorker, WorkerConfig};
use stashbox_backend::CacheStorage;
use stashbox_moka::MokaStorage;
use stashbox_tower::{DEFAULT_SOURCE_HEADER, SEC_FETCH_DEST, TowerFetch, WorkerLayer};
use tower::{Layer, ServiceExt, service_fn};

const ORIGIN: &str = "https://portfolio.example/";

async fn origin(request: Request<Full<Bytes>>) -> Result<Response<Full<Bytes>>, Infallible> {
    let body = format!("origin {}", request.uri().path());
    let status = if request.uri().path() == "/missing" {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::OK
    };
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    Ok(response)
}

fn config() -> WorkerConfig {
    WorkerConfig::builder()
        .origin(ORIGIN)
        .manifest(["/", "/index.html", "/styles.css"])
        .build()
}

fn worker() -> ServiceWorker {
    ServiceWorker::builder()
        .config(config())
        .storage(MokaStorage::default())
        .fetch(TowerFetch::new(service_fn(origin)))
        .build()
        .expect("worker builds")
}

async fn body_text(response: Response<Full<Bytes>>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn tower_fetch_buffers_the_response() {
    let fetch = TowerFetch::new(service_fn(origin));
    let response = fetch
        .fetch(FetchRequest::get("https://portfolio.example/styles.css").unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body(), &Bytes::from_static(b"origin /styles.css"));
}

#[tokio::test]
async fn tower_fetch_reports_service_errors_as_network_errors() {
    let fetch = TowerFetch::new(service_fn(|_: Request<Full<Bytes>>| async {
        Err::<Response<Full<Bytes>>, _>(std::io::Error::other("connection refused"))
    }));
    let error = fetch
        .fetch(FetchRequest::get("https://portfolio.example/").unwrap())
        .await
        .unwrap_err();

    match error {
        FetchError::Network { url, .. } => assert_eq!(url, "https://portfolio.example/"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn precached_document_is_served_by_the_worker() {
    let worker = worker();
    worker.start().await.unwrap();

    let service = WorkerLayer::new(worker.clone()).layer(service_fn(origin));
    let request = Request::builder()
        .uri("/")
        .header(SEC_FETCH_DEST, "document")
        .body(Full::new(Bytes::new()))
        .unwrap();
    let response = service.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[DEFAULT_SOURCE_HEADER], "cache");
    assert_eq!(body_text(response).await, "origin /");
    worker.offload().wait_all().await;
}

#[tokio::test]
async fn non_get_requests_reach_the_inner_service() {
    let worker = worker();
    worker.start().await.unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let counted = calls.clone();
    let inner = service_fn(move |request: Request<Full<Bytes>>| {
        counted.fetch_add(1, Ordering::SeqCst);
        origin(request)
    });
    let service = WorkerLayer::new(worker).layer(inner);
    let request = Request::builder()
        .method(Method::POST)
        .uri("/contact")
        .body(Full::new(Bytes::from_static(b"hello")))
        .unwrap();
    let response = service.oneshot(request).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(response.headers()[DEFAULT_SOURCE_HEADER], "passthrough");
    assert_eq!(body_text(response).await, "origin /contact");
}

#[tokio::test]
async fn requests_pass_through_before_activation() {
    let worker = worker();

    let service = WorkerLayer::new(worker).layer(service_fn(origin));
    let request = Request::builder()
        .uri("/styles.css")
        .body(Full::new(Bytes::new()))
        .unwrap();
    let response = service.oneshot(request).await.unwrap();

    assert_eq!(response.headers()[DEFAULT_SOURCE_HEADER], "passthrough");
}

#[tokio::test]
async fn custom_source_header() {
    let worker = worker();
    worker.start().await.unwrap();

    let header = http::header::HeaderName::from_static("x-served-by");
    let service = WorkerLayer::new(worker)
        .source_header(header.clone())
        .layer(service_fn(origin));
    let request = Request::builder()
        .uri("https://portfolio.example/styles.css")
        .body(Full::new(Bytes::new()))
        .unwrap();
    let response = service.oneshot(request).await.unwrap();

    assert_eq!(response.headers()[&header], "cache");
    assert!(response.headers().get(DEFAULT_SOURCE_HEADER).is_none());
}

#[tokio::test]
async fn error_statuses_are_served_but_not_stored() {
    let worker = worker();
    worker.start().await.unwrap();

    let service = WorkerLayer::new(worker.clone()).layer(service_fn(origin));
    let request = Request::builder()
        .uri("/missing")
        .body(Full::new(Bytes::new()))
        .unwrap();
    let response = service.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.headers()[DEFAULT_SOURCE_HEADER], "network");
    let key = FetchRequest::get("https://portfolio.example/missing")
        .unwrap()
        .key();
    assert!(!is_cached(&worker, &key).await);
}

async fn is_cached(worker: &ServiceWorker, key: &RequestKey) -> bool {
    worker
        .storage()
        .match_request(key)
        .await
        .unwrap()
        .is_some()
}
