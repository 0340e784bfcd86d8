//! Interception manager: binds URL scopes to fetch handlers and routes requests.
//!
//! Every outgoing request goes through [`InterceptionManager::fetch`]. The
//! request URL is matched against the registered scopes by longest prefix; the
//! bound handler (usually a [`ResponseProxy`](crate::proxy::ResponseProxy)
//! listener) produces the tagged response. Requests outside every scope, or
//! inside a scope with no listener yet, go straight to the network.
//!
//! A [`Registration`] is the ownership handle for one binding. Registering a
//! scope again supersedes the previous registration: its handle can no longer
//! add listeners or remove the newer binding.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;
use tokio_util::task::TaskTracker;
use url::Url;

use tether_core::message::canonicalize;
use tether_core::store::{CacheDb, StoreManager};
use tether_core::{AppConfig, Connectivity, Error, Request, ResponseCache};

use crate::fetch::{FetchConfig, HttpFetcher, NetworkFetch};
use crate::strategy::{FetchContext, TaggedResponse, pass_through};

/// Handles intercepted requests for a scope.
#[async_trait::async_trait]
pub trait FetchHandler: Send + Sync {
    async fn on_fetch(&self, request: Request, ctx: &FetchContext) -> Result<TaggedResponse, Error>;
}

/// Events a registration can listen for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterceptEvent {
    Fetch,
}

#[derive(Debug, Clone)]
pub struct RegisterOptions {
    /// Absolute URL or path relative to the manager's origin.
    pub scope: String,
}

impl RegisterOptions {
    pub fn new(scope: impl Into<String>) -> Self {
        Self { scope: scope.into() }
    }
}

struct Binding {
    id: u64,
    handler: Option<Arc<dyn FetchHandler>>,
}

struct Inner {
    origin: Url,
    cache: ResponseCache,
    connectivity: Connectivity,
    network: RwLock<Arc<dyn NetworkFetch>>,
    bindings: RwLock<BTreeMap<String, Binding>>,
    next_id: AtomicU64,
    tasks: TaskTracker,
}

/// Process-wide request router. Clones share the same bindings.
#[derive(Clone)]
pub struct InterceptionManager {
    inner: Arc<Inner>,
}

impl InterceptionManager {
    pub fn new(origin: Url, cache: ResponseCache, network: Arc<dyn NetworkFetch>) -> Self {
        Self::with_connectivity(origin, cache, network, Connectivity::new())
    }

    pub fn with_connectivity(
        origin: Url, cache: ResponseCache, network: Arc<dyn NetworkFetch>, connectivity: Connectivity,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                origin,
                cache,
                connectivity,
                network: RwLock::new(network),
                bindings: RwLock::new(BTreeMap::new()),
                next_id: AtomicU64::new(1),
                tasks: TaskTracker::new(),
            }),
        }
    }

    /// Build a manager from configuration: SQLite-backed cache plus the reqwest fetcher.
    pub async fn open(config: &AppConfig) -> Result<Self, Error> {
        let origin = config.origin_url().map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let stores = StoreManager::new(CacheDb::open(&config.db_path).await?);
        let store = stores.open_store(&config.cache_store_name)?;
        let cache = ResponseCache::new(Arc::new(store)).with_vary_headers(config.vary_headers.clone());
        let network = HttpFetcher::new(FetchConfig::from(config))?;

        tracing::info!(
            db = %config.db_path.display(),
            store = %config.cache_store_name,
            %origin,
            "interception manager ready"
        );
        Ok(Self::new(origin, cache, Arc::new(network)))
    }

    /// Bind `options.scope`, replacing any earlier binding for the same scope.
    pub async fn register(&self, options: RegisterOptions) -> Result<Registration, Error> {
        let scope = canonicalize(&options.scope, &self.inner.origin)
            .map_err(|e| Error::InvalidUrl(format!("scope {}: {}", options.scope, e)))?
            .to_string();
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);

        let previous = self.inner.bindings.write().await.insert(scope.clone(), Binding { id, handler: None });
        if previous.is_some() {
            tracing::info!(%scope, "scope re-registered, previous binding replaced");
        } else {
            tracing::debug!(%scope, "scope registered");
        }

        Ok(Registration { inner: self.inner.clone(), scope, id })
    }

    /// Route `request` to the handler of its longest matching scope.
    pub async fn fetch(&self, request: Request) -> Result<TaggedResponse, Error> {
        let ctx = self.context().await;
        let url = request.url().as_str();

        let handler = {
            let bindings = self.inner.bindings.read().await;
            bindings
                .iter()
                .filter(|(scope, _)| url.starts_with(scope.as_str()))
                .max_by_key(|(scope, _)| scope.len())
                .and_then(|(_, binding)| binding.handler.clone())
        };

        match handler {
            Some(handler) => handler.on_fetch(request, &ctx).await,
            None => pass_through(request, &ctx).await,
        }
    }

    /// Parse `input` against the origin and [`fetch`](Self::fetch) it.
    pub async fn fetch_url(&self, method: &str, input: &str) -> Result<TaggedResponse, Error> {
        let request = Request::parse(method, input, &self.inner.origin)?;
        self.fetch(request).await
    }

    /// The network primitive strategies currently call.
    pub async fn browser_fetch(&self) -> Arc<dyn NetworkFetch> {
        self.inner.network.read().await.clone()
    }

    /// Swap the network primitive. Returns the previous one so callers can restore it.
    pub async fn set_browser_fetch(&self, network: Arc<dyn NetworkFetch>) -> Arc<dyn NetworkFetch> {
        std::mem::replace(&mut *self.inner.network.write().await, network)
    }

    pub fn force_offline(&self, offline: bool) {
        self.inner.connectivity.force_offline(offline);
    }

    pub fn is_online(&self) -> bool {
        self.inner.connectivity.is_online()
    }

    pub fn connectivity(&self) -> &Connectivity {
        &self.inner.connectivity
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.inner.cache
    }

    pub fn origin(&self) -> &Url {
        &self.inner.origin
    }

    /// Registered scopes, in lexical order.
    pub async fn scopes(&self) -> Vec<String> {
        self.inner.bindings.read().await.keys().cloned().collect()
    }

    /// Wait until every background task spawned so far has finished.
    pub async fn settle(&self) {
        self.inner.tasks.close();
        self.inner.tasks.wait().await;
        self.inner.tasks.reopen();
    }

    async fn context(&self) -> FetchContext {
        FetchContext::new(
            self.inner.cache.clone(),
            self.inner.connectivity.clone(),
            self.browser_fetch().await,
            self.inner.tasks.clone(),
        )
    }
}

/// Ownership handle for one scope binding.
pub struct Registration {
    inner: Arc<Inner>,
    scope: String,
    id: u64,
}

impl Registration {
    /// Canonical scope URL this registration binds.
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Set the handler for `event`, replacing any earlier one.
    pub async fn add_event_listener(&self, event: InterceptEvent, handler: Arc<dyn FetchHandler>) -> Result<(), Error> {
        match event {
            InterceptEvent::Fetch => {
                let mut bindings = self.inner.bindings.write().await;
                match bindings.get_mut(&self.scope) {
                    Some(binding) if binding.id == self.id => {
                        binding.handler = Some(handler);
                        Ok(())
                    }
                    _ => Err(Error::RegistrationClosed(self.scope.clone())),
                }
            }
        }
    }

    /// Remove this binding. Only the first call on a live registration returns `true`.
    pub async fn unregister(&self) -> bool {
        let mut bindings = self.inner.bindings.write().await;
        match bindings.get(&self.scope) {
            Some(binding) if binding.id == self.id => {
                bindings.remove(&self.scope);
                tracing::debug!(scope = %self.scope, "scope unregistered");
                true
            }
            _ => false,
        }
    }
}
