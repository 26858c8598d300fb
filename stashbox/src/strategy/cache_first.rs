use stashbox_core::{FetchRequest, Offload};
use tracing::debug;

use super::{Executor, Served};
use crate::error::WorkerError;

impl<O> Executor<O>
where
    O: Offload + 'static,
{
    /// Serves a cached copy from any generation without touching the network.
    /// On a miss, fetches and stores the response in the dynamic generation
    /// before returning it.
    pub(crate) async fn cache_first(&self, request: FetchRequest) -> Result<Served, WorkerError> {
        let key = request.key();
        if let Some(hit) = self.lookup(&key).await {
            return Ok(Served::cached(hit));
        }

        let response = self.fetch.fetch(request).await.inspect_err(|error| {
            debug!(%key, %error, "cache-first fetch failed");
        })?;
        self.store(&key, &response).await;
        Ok(Served::network(response))
    }
}
