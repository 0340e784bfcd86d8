//! Request interception and fetch strategies for tether.
//!
//! This crate provides the network primitive, the cache-first and
//! cache-if-offline strategies, the response proxy that binds a strategy to a
//! scope, and the interception manager that routes requests between them.

pub mod fetch;
pub mod intercept;
pub mod proxy;
pub mod strategy;

#[cfg(test)]
mod testing;

pub use fetch::{FetchConfig, HttpFetcher, NetworkFetch};
pub use intercept::{FetchHandler, InterceptEvent, InterceptionManager, RegisterOptions, Registration};
pub use proxy::{ProxyOptions, ResponseProxy};
pub use strategy::{
    BackgroundFetch, CacheFirstOptions, FetchContext, FetchStrategy, ServerResponseCallback, StrategyKind,
    TaggedResponse, cache_first, cache_if_offline, server_response_callback,
};
