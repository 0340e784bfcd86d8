//! Raw network primitive used by the strategies.
//!
//! [`NetworkFetch`] is the "go to the network" operation. The interception
//! manager owns the active implementation and lets callers swap it, which is
//! how tests inject scripted replies and how retry/backoff wrappers slot in.
//!
//! [`HttpFetcher`] is the reqwest-backed implementation:
//! - Sends the request method, headers and body unchanged
//! - Follows up to 5 redirects (configurable)
//! - Max body bytes: 5MB (configurable)
//! - HEAD and null-body statuses (204, 205, 304) produce no body
//! - Any transport failure (DNS, connect, TLS, timeout) is `Error::Transport`

use reqwest::{Client, header};
use std::time::{Duration, Instant};

use tether_core::message::Headers;
use tether_core::{AppConfig, Error, Request, Response};

/// The network fetch operation strategies call.
#[async_trait::async_trait]
pub trait NetworkFetch: Send + Sync {
    /// Send `request` to the network.
    ///
    /// Resolves with whatever the server answered, including 4xx/5xx.
    /// Rejects only when no response was received.
    async fn fetch(&self, request: &Request) -> Result<Response, Error>;
}

/// Configuration for the HTTP fetcher.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "tether/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "tether/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            ..Default::default()
        }
    }
}

/// reqwest-backed network primitive.
pub struct HttpFetcher {
    http: Client,
    config: FetchConfig,
}

impl HttpFetcher {
    /// Create a new fetcher with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }
}

#[async_trait::async_trait]
impl NetworkFetch for HttpFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let start = Instant::now();

        let mut builder = self.http.request(request.method().clone(), request.url().as_str());
        for (name, value) in request.headers().iter() {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body() {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Transport(format!("network error: {}", e)))?;

        let status = response.status();

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
        }

        let headers = collect_headers(response.headers());
        let mut reply = Response::new(status);
        reply.headers = headers;

        if !request.is_head() && !Response::is_null_body_status(status) {
            let bytes = response
                .bytes()
                .await
                .map_err(|e| Error::Transport(format!("failed to read response: {}", e)))?;

            if bytes.len() > self.config.max_bytes {
                return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", bytes.len(), self.config.max_bytes)));
            }
            reply.body = Some(bytes);
        }

        tracing::debug!(
            "fetched {} {} -> {} in {}ms ({} bytes)",
            request.method(),
            request.url(),
            status.as_u16(),
            start.elapsed().as_millis(),
            reply.body.as_ref().map_or(0, |b| b.len())
        );

        Ok(reply)
    }
}

/// Copy reqwest headers into the ordered header list, keeping wire order.
fn collect_headers(map: &header::HeaderMap) -> Headers {
    map.iter()
        .map(|(name, value)| (name.as_str().to_string(), String::from_utf8_lossy(value.as_bytes()).into_owned()))
        .collect()
}
