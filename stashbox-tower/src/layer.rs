use http::header::HeaderName;
use stashbox::ServiceWorker;
use tower::Layer;

use crate::service::WorkerService;

/// Default name of the response header reporting where a response came from.
pub const DEFAULT_SOURCE_HEADER: HeaderName = HeaderName::from_static("x-stashbox-source");

/// Tower [`Layer`] that puts a [`ServiceWorker`] in front of a service.
#[derive(Debug, Clone)]
pub struct WorkerLayer {
    worker: ServiceWorker,
    source_header: HeaderName,
}

impl WorkerLayer {
    /// Creates a layer reporting the response source in
    /// [`DEFAULT_SOURCE_HEADER`].
    pub fn new(worker: ServiceWorker) -> Self {
        Self {
            worker,
            source_header: DEFAULT_SOURCE_HEADER,
        }
    }

    /// Reports the response source in `header` instead.
    pub fn source_header(self, header: HeaderName) -> Self {
        Self {
            source_header: header,
            ..self
        }
    }
}

impl<S> Layer<S> for WorkerLayer {
    type Service = WorkerService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        WorkerService::new(inner, self.worker.clone(), self.source_header.clone())
    }
}
