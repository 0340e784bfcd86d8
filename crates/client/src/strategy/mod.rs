//! Fetch strategies.
//!
//! A strategy decides, per request, how the response cache and the network
//! combine to produce an answer:
//!
//! - **cache-first**: serve a cached entry when present (optionally
//!   refreshing it in the background), otherwise go to the network and cache
//!   the result.
//! - **cache-if-offline**: always prefer the network; fall back to the cache
//!   when the network rejects, answers 5xx, or the oracle reports offline.
//! - **pass-through**: the implicit default for unmatched requests and
//!   non-GET/HEAD methods. Network only, never cached.
//!
//! Strategies hold no state between calls. Everything a request needs lives
//! in its [`FetchContext`] and on its own call stack.

mod cache_first;
mod cache_if_offline;
pub mod context;

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use tether_core::{CachedResponse, Error, Request, Response};

pub use context::FetchContext;

/// Transforms a network response before it is cached and returned.
pub type ServerResponseCallback =
    Arc<dyn Fn(Request, Response) -> BoxFuture<'static, Result<Response, Error>> + Send + Sync>;

/// Wrap an async closure as a [`ServerResponseCallback`].
pub fn server_response_callback<F, Fut>(f: F) -> ServerResponseCallback
where
    F: Fn(Request, Response) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, Error>> + Send + 'static,
{
    Arc::new(move |request, response| Box::pin(f(request, response)))
}

/// Whether a cache-first hit also revalidates against the network.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackgroundFetch {
    #[default]
    Enabled,
    Disabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    CacheFirst,
    CacheIfOffline,
}

impl FromStr for StrategyKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cache-first" => Ok(Self::CacheFirst),
            "cache-if-offline" => Ok(Self::CacheIfOffline),
            other => Err(Error::InvalidInput(format!("unknown strategy: {other}"))),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CacheFirst => "cache-first",
            Self::CacheIfOffline => "cache-if-offline",
        })
    }
}

/// Options for [`cache_first`].
#[derive(Clone, Default)]
pub struct CacheFirstOptions {
    pub server_response_callback: Option<ServerResponseCallback>,
    pub background_fetch: BackgroundFetch,
}

/// An immutable strategy configuration, consumed by a response proxy.
#[derive(Clone)]
pub struct FetchStrategy {
    kind: StrategyKind,
    background_fetch: BackgroundFetch,
    server_response_callback: Option<ServerResponseCallback>,
}

impl fmt::Debug for FetchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchStrategy")
            .field("kind", &self.kind)
            .field("background_fetch", &self.background_fetch)
            .field("server_response_callback", &self.server_response_callback.is_some())
            .finish()
    }
}

/// Cache-first strategy.
pub fn cache_first(options: CacheFirstOptions) -> FetchStrategy {
    FetchStrategy {
        kind: StrategyKind::CacheFirst,
        background_fetch: options.background_fetch,
        server_response_callback: options.server_response_callback,
    }
}

/// Cache-if-offline strategy.
pub fn cache_if_offline() -> FetchStrategy {
    FetchStrategy {
        kind: StrategyKind::CacheIfOffline,
        background_fetch: BackgroundFetch::Disabled,
        server_response_callback: None,
    }
}

impl FetchStrategy {
    pub fn kind(&self) -> StrategyKind {
        self.kind
    }

    pub fn background_fetch(&self) -> BackgroundFetch {
        self.background_fetch
    }

    /// Produce a tagged response for `request`.
    pub async fn handle(&self, request: Request, ctx: &FetchContext) -> Result<TaggedResponse, Error> {
        match self.kind {
            StrategyKind::CacheFirst => {
                cache_first::handle(request, ctx, self.background_fetch, self.server_response_callback.clone()).await
            }
            StrategyKind::CacheIfOffline => cache_if_offline::handle(request, ctx).await,
        }
    }
}

/// Network only, never cached.
pub async fn pass_through(request: Request, ctx: &FetchContext) -> Result<TaggedResponse, Error> {
    let response = ctx.browser_fetch(&request).await?;
    Ok(TaggedResponse::from_network(&request, response))
}

/// A response plus whether it came from the cache.
///
/// The flag travels alongside the response, never inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedResponse {
    response: Response,
    served_from_cache: bool,
}

impl TaggedResponse {
    pub(crate) fn from_network(request: &Request, response: Response) -> Self {
        let response = if request.is_head() { response.without_body() } else { response };
        Self { response, served_from_cache: false }
    }

    pub(crate) fn from_cache(request: &Request, entry: &CachedResponse) -> Result<Self, Error> {
        let response = entry.to_response()?;
        let response = if request.is_head() { response.without_body() } else { response };
        Ok(Self { response, served_from_cache: true })
    }

    pub fn is_cached_response(&self) -> bool {
        self.served_from_cache
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn into_response(self) -> Response {
        self.response
    }
}
