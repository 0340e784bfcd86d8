//! Scripted network primitive and harnesses shared by the client tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use http::{Method, StatusCode};
use tokio::sync::Notify;
use tokio_util::task::TaskTracker;
use url::Url;

use tether_core::cache::DEFAULT_STORE_NAME;
use tether_core::{CacheDb, Connectivity, Error, PersistenceStore, Request, Response, ResponseCache, StoreManager};

use crate::fetch::NetworkFetch;
use crate::intercept::InterceptionManager;
use crate::strategy::FetchContext;

pub(crate) const DEPARTMENTS: &str = r#"[{"id":1},{"id":2},{"id":3}]"#;

pub(crate) fn origin() -> Url {
    Url::parse("http://localhost/").unwrap()
}

pub(crate) fn request(method: &str, path: &str) -> Request {
    Request::parse(method, path, &origin()).unwrap()
}

pub(crate) fn departments() -> Response {
    Response::new(StatusCode::OK).with_header("content-type", "application/json").with_body(DEPARTMENTS)
}

enum Reply {
    Respond(Response),
    Reject,
}

/// Network primitive answering from scripted replies keyed by method and path.
///
/// Unscripted requests reject like an unreachable host.
#[derive(Default)]
pub(crate) struct MockFetch {
    replies: Mutex<HashMap<(Method, String), Reply>>,
    calls: AtomicUsize,
}

impl MockFetch {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn add_request_reply(&self, method: Method, path: &str, response: Response) {
        self.replies.lock().unwrap().insert((method, path.to_string()), Reply::Respond(response));
    }

    pub(crate) fn add_rejection(&self, method: Method, path: &str) {
        self.replies.lock().unwrap().insert((method, path.to_string()), Reply::Reject);
    }

    pub(crate) fn clear_all_request_replies(&self) {
        self.replies.lock().unwrap().clear();
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl NetworkFetch for MockFetch {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let key = (request.method().clone(), request.url().path().to_string());
        match self.replies.lock().unwrap().get(&key) {
            Some(Reply::Respond(response)) => Ok(response.clone()),
            Some(Reply::Reject) => Err(Error::Transport(format!("connection refused: {}", request.url()))),
            None => Err(Error::Transport(format!("no route to {}", request.url()))),
        }
    }
}

/// Network primitive that never answers.
pub(crate) struct HangingFetch;

#[async_trait::async_trait]
impl NetworkFetch for HangingFetch {
    async fn fetch(&self, _request: &Request) -> Result<Response, Error> {
        std::future::pending().await
    }
}

/// Network primitive whose first call is held until [`GatedFetch::release`].
///
/// The held call answers `held`, every later call answers `immediate` at once.
pub(crate) struct GatedFetch {
    gate: Notify,
    calls: AtomicUsize,
    held: Response,
    immediate: Response,
}

impl GatedFetch {
    pub(crate) fn new(held: Response, immediate: Response) -> Arc<Self> {
        Arc::new(Self { gate: Notify::new(), calls: AtomicUsize::new(0), held, immediate })
    }

    pub(crate) fn release(&self) {
        self.gate.notify_one();
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl NetworkFetch for GatedFetch {
    async fn fetch(&self, _request: &Request) -> Result<Response, Error> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            self.gate.notified().await;
            return Ok(self.held.clone());
        }
        Ok(self.immediate.clone())
    }
}

/// Store whose every operation fails.
pub(crate) struct FailingStore;

#[async_trait::async_trait]
impl PersistenceStore for FailingStore {
    fn name(&self) -> &str {
        "failing"
    }

    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, Error> {
        Err(Error::Serialization("store unavailable".into()))
    }

    async fn put(&self, _key: &str, _value: Vec<u8>) -> Result<(), Error> {
        Err(Error::Serialization("store unavailable".into()))
    }

    async fn delete(&self, _key: &str) -> Result<bool, Error> {
        Err(Error::Serialization("store unavailable".into()))
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        Err(Error::Serialization("store unavailable".into()))
    }

    async fn clear(&self) -> Result<u64, Error> {
        Err(Error::Serialization("store unavailable".into()))
    }
}

pub(crate) async fn memory_cache() -> ResponseCache {
    let manager = StoreManager::new(CacheDb::open_in_memory().await.unwrap());
    ResponseCache::new(Arc::new(manager.open_store(DEFAULT_STORE_NAME).unwrap()))
}

/// A strategy context over an in-memory cache.
pub(crate) struct Harness {
    pub(crate) ctx: FetchContext,
    pub(crate) cache: ResponseCache,
    pub(crate) connectivity: Connectivity,
    tasks: TaskTracker,
}

impl Harness {
    pub(crate) async fn new(network: Arc<dyn NetworkFetch>) -> Self {
        Self::with_cache(memory_cache().await, network)
    }

    pub(crate) async fn with_failing_store(network: Arc<dyn NetworkFetch>) -> Self {
        Self::with_cache(ResponseCache::new(Arc::new(FailingStore)), network)
    }

    fn with_cache(cache: ResponseCache, network: Arc<dyn NetworkFetch>) -> Self {
        let connectivity = Connectivity::new();
        let tasks = TaskTracker::new();
        let ctx = FetchContext::new(cache.clone(), connectivity.clone(), network, tasks.clone());
        Self { ctx, cache, connectivity, tasks }
    }

    /// Wait for background tasks spawned so far.
    pub(crate) async fn settle(&self) {
        self.tasks.close();
        self.tasks.wait().await;
        self.tasks.reopen();
    }
}

pub(crate) async fn manager(network: Arc<MockFetch>) -> InterceptionManager {
    InterceptionManager::new(origin(), memory_cache().await, network)
}
