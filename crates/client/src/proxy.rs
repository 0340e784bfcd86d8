//! Response proxy: adapts a fetch strategy into a fetch event listener.

use std::sync::Arc;

use tether_core::{Error, Request};

use crate::intercept::FetchHandler;
use crate::strategy::{FetchContext, FetchStrategy, TaggedResponse, pass_through};

#[derive(Debug, Clone)]
pub struct ProxyOptions {
    pub fetch_strategy: FetchStrategy,
}

/// Applies one strategy to the GET and HEAD requests of a scope.
#[derive(Debug, Clone)]
pub struct ResponseProxy {
    strategy: FetchStrategy,
}

impl ResponseProxy {
    pub fn new(options: ProxyOptions) -> Self {
        Self { strategy: options.fetch_strategy }
    }

    pub fn strategy(&self) -> &FetchStrategy {
        &self.strategy
    }

    /// Handler to pass to `Registration::add_event_listener`.
    pub fn fetch_event_listener(&self) -> Arc<dyn FetchHandler> {
        Arc::new(self.clone())
    }
}

#[async_trait::async_trait]
impl FetchHandler for ResponseProxy {
    async fn on_fetch(&self, request: Request, ctx: &FetchContext) -> Result<TaggedResponse, Error> {
        if !request.is_cacheable_method() {
            tracing::debug!(method = %request.method(), url = %request.url(), "method not cacheable, passing through");
            return pass_through(request, ctx).await;
        }
        self.strategy.handle(request, ctx).await
    }
}
