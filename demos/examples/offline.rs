//! Offline Walkthrough
//!
//! Drives a worker through one visit to a personal site, in process:
//!   - The worker configuration is read from YAML
//!   - The "network" is a Tower `service_fn` that can be switched off
//!   - Install pre-caches the manifest, activation takes over the page
//!   - The same requests are then replayed with the network down
//!
//! Run:
//!   cargo run -p stashbox-demos --example offline

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use http::{Request, Response, StatusCode};
use http_body_util::Full;
use serde_json::json;
use stashbox::{Destination, FetchRequest, ServiceWorker};
use stashbox_configuration::ConfigWorker;
use stashbox_tower::TowerFetch;
use tower::service_fn;

const CONFIG: &str = r#"
origin: https://portfolio.example/
cache_name: personaldevpage-v1.2
versions:
  static: v1.2
  dynamic: v1.2
manifest:
  - /
  - /index.html
  - /styles.css
  - /script.js
  - /assets/profile_avatar_250.webp
offload:
  warn_after: 2s
storage:
  type: Moka
"#;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

async fn visit(worker: &ServiceWorker, path: &str, destination: Destination) {
    let url = worker.config().resolve(path).expect("path resolves");
    let request = FetchRequest::new(http::Method::GET, url).with_destination(destination);
    match worker.handle_fetch(request).await {
        Ok(Some(served)) => tracing::info!(
            path,
            status = %served.response.status(),
            source = served.source.as_str(),
            "served"
        ),
        Ok(None) => tracing::info!(path, "passed through"),
        Err(error) => tracing::warn!(path, %error, "failed"),
    }
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter("info,stashbox=debug")
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let online = Arc::new(AtomicBool::new(true));
    let switch = online.clone();
    let site = service_fn(move |request: Request<Full<Bytes>>| {
        let online = switch.load(Ordering::SeqCst);
        async move {
            if !online {
                return Err(std::io::Error::other("network is down"));
            }
            let body = match request.uri().path() {
                "/" | "/index.html" => "<h1>Hi, I build things</h1>".to_string(),
                path => format!("contents of {path}"),
            };
            let mut response = Response::new(Full::new(Bytes::from(body)));
            *response.status_mut() = StatusCode::OK;
            Ok(response)
        }
    });

    let (config, storage) = ConfigWorker::from_yaml(CONFIG)?.into_parts()?;
    let worker = ServiceWorker::builder()
        .config(config)
        .storage(storage)
        .fetch(TowerFetch::new(site))
        .build()?;

    let state = worker.start().await?;
    tracing::info!(%state, version = worker.version(), "worker started");

    tracing::info!("--- online ---");
    visit(&worker, "/", Destination::Document).await;
    visit(&worker, "/assets/profile_avatar_250.webp", Destination::Image).await;
    visit(&worker, "/assets/project-cover.webp", Destination::Image).await;
    visit(&worker, "/projects/", Destination::Document).await;
    worker.offload().wait_all().await;

    tracing::info!("--- offline ---");
    online.store(false, Ordering::SeqCst);
    visit(&worker, "/", Destination::Document).await;
    visit(&worker, "/assets/project-cover.webp", Destination::Image).await;
    visit(&worker, "/projects/", Destination::Document).await;
    visit(&worker, "/contact/", Destination::Document).await;
    visit(&worker, "https://api.github.com/users/octocat", Destination::Other).await;
    worker.offload().wait_all().await;

    if let Some(reply) = worker.post_message(json!({ "type": "GET_VERSION" })).await? {
        tracing::info!(version = %reply.version, "version reply");
    }

    let push = Bytes::from_static(br#"{"title":"New project","url":"/projects/"}"#);
    if let Some(notification) = worker.push(Some(push)).await? {
        tracing::info!(title = %notification.title, icon = %notification.icon, "notification");
    }

    Ok(())
}
