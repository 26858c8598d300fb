//! Tower Service Example
//!
//! Puts a stashbox worker in front of a plain Tower service served by Hyper.
//!
//! Features shown:
//!   - `WorkerLayer` wrapping a hand-written `tower::Service`
//!   - The same service doubling as the worker's network through `TowerFetch`
//!   - Hyper HTTP server integration through `TowerToHyperService`
//!   - The `x-stashbox-source` response header
//!
//! Run:
//!   cargo run -p stashbox-demos --example tower
//!
//! Try it:
//!   curl -v http://localhost:3001/                                 # precached, "cache"
//!   curl -v -H 'sec-fetch-dest: image' http://localhost:3001/logo  # network, then cache
//!   curl -v -X POST http://localhost:3001/contact                  # "passthrough"

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use http::{Request, Response, StatusCode};
use http_body_util::Full;
use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use hyper_util::service::TowerToHyperService;
use stashbox::{ServiceWorker, WorkerConfig};
use stashbox_moka::MokaStorage;
use stashbox_tower::{TowerFetch, WorkerLayer};
use tokio::net::TcpListener;
use tower::{Service, ServiceBuilder};

/// The site itself: a handful of pages routed by path.
#[derive(Clone)]
struct SiteService;

impl<B> Service<Request<B>> for SiteService
where
    B: Send + 'static,
{
    type Response = Response<Full<Bytes>>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        let path = req.uri().path().to_string();

        Box::pin(async move {
            // Simulate a slow origin
            tokio::time::sleep(Duration::from_millis(50)).await;

            let (status, body) = match path.as_str() {
                "/" | "/index.html" => (StatusCode::OK, "<h1>Hello from stashbox</h1>"),
                "/styles.css" => (StatusCode::OK, "body { margin: 0 }"),
                "/script.js" => (StatusCode::OK, "console.log('hi')"),
                "/logo" => (StatusCode::OK, "<svg/>"),
                "/contact" => (StatusCode::OK, "thanks!"),
                _ => (StatusCode::NOT_FOUND, "Not Found"),
            };
            let mut response = Response::new(Full::new(Bytes::from_static(body.as_bytes())));
            *response.status_mut() = status;
            Ok(response)
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let subscriber = tracing_subscriber::fmt()
        .pretty()
        .with_env_filter("info,stashbox=debug")
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = WorkerConfig::builder()
        .origin("http://localhost:3001/")
        .cache_name("tower-demo-v1")
        .version("v1")
        .manifest(["/", "/index.html", "/styles.css", "/script.js"])
        .build();

    let worker = ServiceWorker::builder()
        .config(config)
        .storage(MokaStorage::default())
        .fetch(TowerFetch::new(SiteService))
        .build()?;
    let state = worker.start().await?;
    tracing::info!(%state, "worker started");

    let service = ServiceBuilder::new()
        .layer(WorkerLayer::new(worker))
        .service(SiteService);

    let addr = SocketAddr::from(([127, 0, 0, 1], 3001));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);

    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let svc = service.clone();

        tokio::task::spawn(async move {
            let hyper_service = TowerToHyperService::new(svc);

            if let Err(err) = http1::Builder::new()
                .serve_connection(io, hyper_service)
                .await
            {
                tracing::error!(?err, "Error serving connection");
            }
        });
    }
}
