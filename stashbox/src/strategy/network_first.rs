use stashbox_core::{FetchRequest, Offload};
use tracing::debug;

use super::{Executor, Served};
use crate::error::WorkerError;

impl<O> Executor<O>
where
    O: Offload + 'static,
{
    /// Prefers the network. Only when the network fails does it fall back to
    /// a cached copy, and for page loads to the cached fallback document.
    ///
    /// A non-success status is a response, not a failure: it is returned
    /// as-is and simply not stored.
    pub(crate) async fn network_first(
        &self,
        request: FetchRequest,
    ) -> Result<Served, WorkerError> {
        let key = request.key();
        let is_document = request.is_document();

        let error = match self.fetch.fetch(request).await {
            Ok(response) => {
                self.store(&key, &response).await;
                return Ok(Served::network(response));
            }
            Err(error) => error,
        };
        debug!(%key, %error, "network unavailable, trying cache");

        if let Some(hit) = self.lookup(&key).await {
            return Ok(Served::cached(hit));
        }
        if is_document && let Some(hit) = self.lookup_fallback().await {
            return Ok(Served::fallback(hit));
        }
        Err(error.into())
    }
}
