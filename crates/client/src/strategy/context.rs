//! Per-request view of the shared collaborators a strategy may touch.

use std::future::Future;
use std::sync::Arc;

use tokio_util::task::TaskTracker;

use tether_core::{Connectivity, Error, Request, Response, ResponseCache};

use crate::fetch::NetworkFetch;

/// Cache, connectivity oracle and network primitive as seen by one request.
///
/// Built by the interception manager at dispatch time, so a network
/// primitive swapped in between requests is picked up by the next one.
#[derive(Clone)]
pub struct FetchContext {
    cache: ResponseCache,
    connectivity: Connectivity,
    network: Arc<dyn NetworkFetch>,
    tasks: TaskTracker,
}

impl FetchContext {
    pub fn new(
        cache: ResponseCache, connectivity: Connectivity, network: Arc<dyn NetworkFetch>, tasks: TaskTracker,
    ) -> Self {
        Self { cache, connectivity, network, tasks }
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn connectivity(&self) -> &Connectivity {
        &self.connectivity
    }

    /// Go to the network through the current primitive.
    pub async fn browser_fetch(&self, request: &Request) -> Result<Response, Error> {
        self.network.fetch(request).await
    }

    /// Run `task` detached from the caller.
    ///
    /// The caller's result never waits on it and its failure is only logged.
    pub fn spawn_background<F>(&self, label: &'static str, url: String, task: F)
    where
        F: Future<Output = Result<(), Error>> + Send + 'static,
    {
        self.tasks.spawn(async move {
            match task.await {
                Ok(()) => tracing::debug!(task = label, %url, "background task finished"),
                Err(e) => tracing::warn!(task = label, %url, error = %e, "background task failed"),
            }
        });
    }
}
