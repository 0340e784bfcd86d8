//! Request and response model shared by the cache and the strategies.
//!
//! Headers are kept as an ordered list so a response served from cache
//! replays them in exactly the order the network produced them.

pub mod url;

use bytes::Bytes;
use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};

pub use self::url::{UrlError, canonicalize, parse_origin};
use crate::Error;

/// Ordered header list with case-insensitive lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a header, keeping any existing values for the same name.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    /// First value for `name`, compared case-insensitively.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(n, v)| (n.into(), v.into())).collect())
    }
}

/// An outgoing request as seen by the interception layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: Method,
    url: ::url::Url,
    headers: Headers,
    body: Option<Bytes>,
}

impl Request {
    pub fn new(method: Method, url: ::url::Url) -> Self {
        Self { method, url, headers: Headers::new(), body: None }
    }

    pub fn head(url: ::url::Url) -> Self {
        Self::new(Method::HEAD, url)
    }

    /// Build a request from a method name and a possibly relative URL.
    ///
    /// The method is upper-cased; the URL is canonicalized against `origin`.
    pub fn parse(method: &str, input: &str, origin: &::url::Url) -> Result<Self, Error> {
        let method = Method::from_bytes(method.trim().to_ascii_uppercase().as_bytes())
            .map_err(|e| Error::InvalidInput(format!("invalid method {method:?}: {e}")))?;
        let url = canonicalize(input, origin).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        Ok(Self::new(method, url))
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &::url::Url {
        &self.url
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub fn is_head(&self) -> bool {
        self.method == Method::HEAD
    }

    /// Only GET and HEAD go through a caching strategy; everything else passes through.
    pub fn is_cacheable_method(&self) -> bool {
        self.method == Method::GET || self.method == Method::HEAD
    }
}

/// A response produced by the network primitive or rebuilt from the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: StatusCode,
    pub status_text: String,
    pub headers: Headers,
    /// `None` for HEAD responses and null-body statuses.
    pub body: Option<Bytes>,
}

impl Response {
    /// Response with the canonical reason phrase and no headers or body.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers: Headers::new(),
            body: None,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Drop the body, as required for HEAD responses.
    pub fn without_body(mut self) -> Self {
        self.body = None;
        self
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Any status of 500 or above, including non-standard codes past 599.
    pub fn is_server_error(&self) -> bool {
        self.status.as_u16() >= 500
    }

    /// Statuses that never carry a body on the wire.
    pub fn is_null_body_status(status: StatusCode) -> bool {
        status.is_informational()
            || status == StatusCode::NO_CONTENT
            || status == StatusCode::RESET_CONTENT
            || status == StatusCode::NOT_MODIFIED
    }
}
