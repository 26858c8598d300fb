use stashbox_core::{FetchRequest, Offload, RequestKey};
use tracing::{debug, warn};

use super::{Executor, Served};
use crate::error::WorkerError;

impl<O> Executor<O>
where
    O: Offload + 'static,
{
    /// Answers from the cache when it can and refreshes the entry in the
    /// background. Without a cached copy the network response is awaited,
    /// and a network failure falls back to the cached fallback document.
    ///
    /// Refreshes land in the dynamic generation, but lookups search the
    /// static generation first. A precached page such as `/` therefore keeps
    /// serving its install-time copy until the next version is installed;
    /// only pages outside the manifest ever see their refreshed copy.
    pub(crate) async fn stale_while_revalidate(
        &self,
        request: FetchRequest,
    ) -> Result<Served, WorkerError> {
        let key = request.key();

        if let Some(hit) = self.lookup(&key).await {
            let executor = self.clone();
            self.offload.spawn("revalidate", async move {
                executor.revalidate(request, key).await;
            });
            return Ok(Served::cached(hit));
        }

        match self.fetch.fetch(request).await {
            Ok(response) => {
                self.store(&key, &response).await;
                Ok(Served::network(response))
            }
            Err(error) => {
                warn!(%key, %error, "fetch failed with nothing cached");
                match self.lookup_fallback().await {
                    Some(hit) => Ok(Served::fallback(hit)),
                    None => Err(error.into()),
                }
            }
        }
    }

    async fn revalidate(self, request: FetchRequest, key: RequestKey) {
        match self.fetch.fetch(request).await {
            Ok(response) => {
                debug!(%key, status = %response.status(), "revalidated");
                self.store(&key, &response).await;
            }
            Err(error) => warn!(%key, %error, "background revalidation failed"),
        }
    }
}
