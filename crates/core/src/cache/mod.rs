//! Response cache on top of a persistence store.
//!
//! Maps request fingerprints to whole response snapshots. Entries are only
//! ever replaced as a unit: `put` serializes the complete entry and hands it
//! to the store in one write, so a concurrent `get` sees the old entry or the
//! new one. The last completed write wins.

pub mod hash;

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::Error;
use crate::message::{Headers, Request, Response};
use crate::store::PersistenceStore;

pub use hash::fingerprint;

/// Default name of the store holding cached responses.
pub const DEFAULT_STORE_NAME: &str = "offlineCaches-systemCache";

/// A stored response snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    pub fingerprint: String,
    pub method: String,
    pub url: String,
    pub status: u16,
    pub status_text: String,
    pub headers: Headers,
    /// `None` iff the request was HEAD or the response had no body.
    pub body: Option<Bytes>,
    pub stored_at: DateTime<Utc>,
}

impl CachedResponse {
    /// Snapshot `response` for `request`. HEAD responses never keep a body.
    pub fn from_response(fingerprint: String, request: &Request, response: &Response) -> Self {
        let body = if request.is_head() { None } else { response.body.clone() };
        Self {
            fingerprint,
            method: request.method().as_str().to_string(),
            url: request.url().to_string(),
            status: response.status.as_u16(),
            status_text: response.status_text.clone(),
            headers: response.headers.clone(),
            body,
            stored_at: Utc::now(),
        }
    }

    /// Rebuild the wire response exactly as it was stored.
    pub fn to_response(&self) -> Result<Response, Error> {
        let status = StatusCode::from_u16(self.status)
            .map_err(|e| Error::Serialization(format!("entry {} has bad status: {e}", self.fingerprint)))?;
        Ok(Response {
            status,
            status_text: self.status_text.clone(),
            headers: self.headers.clone(),
            body: self.body.clone(),
        })
    }
}

/// Fingerprint-keyed response cache shared by every scope in the process.
#[derive(Clone)]
pub struct ResponseCache {
    store: Arc<dyn PersistenceStore>,
    vary_headers: Arc<Vec<String>>,
}

impl fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseCache")
            .field("store", &self.store.name())
            .field("vary_headers", &self.vary_headers)
            .finish()
    }
}

impl ResponseCache {
    pub fn new(store: Arc<dyn PersistenceStore>) -> Self {
        Self { store, vary_headers: Arc::new(Vec::new()) }
    }

    /// Include these request headers in every fingerprint.
    pub fn with_vary_headers(mut self, vary_headers: Vec<String>) -> Self {
        self.vary_headers = Arc::new(vary_headers);
        self
    }

    pub fn fingerprint(&self, request: &Request) -> String {
        fingerprint(request, &self.vary_headers)
    }

    /// Entry for `fingerprint`, or `None` on a miss.
    pub async fn get(&self, fingerprint: &str) -> Result<Option<CachedResponse>, Error> {
        match self.store.get(fingerprint).await? {
            Some(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            None => Ok(None),
        }
    }

    /// Store `entry` under `fingerprint`, replacing any previous entry.
    pub async fn put(&self, fingerprint: &str, entry: &CachedResponse) -> Result<(), Error> {
        let raw = serde_json::to_vec(entry)?;
        self.store.put(fingerprint, raw).await?;
        tracing::debug!(fingerprint, url = %entry.url, status = entry.status, "stored response");
        Ok(())
    }

    pub async fn delete(&self, fingerprint: &str) -> Result<bool, Error> {
        self.store.delete(fingerprint).await
    }

    pub async fn clear(&self) -> Result<u64, Error> {
        self.store.clear().await
    }

    pub async fn keys(&self) -> Result<Vec<String>, Error> {
        self.store.keys().await
    }

    /// Every readable entry, oldest write first.
    ///
    /// Entries that fail to decode are logged and skipped. Store failures still propagate.
    pub async fn entries(&self) -> Result<Vec<CachedResponse>, Error> {
        let mut entries = Vec::new();
        for key in self.keys().await? {
            match self.get(&key).await {
                Ok(Some(entry)) => entries.push(entry),
                Ok(None) => {}
                Err(Error::Serialization(reason)) => {
                    tracing::warn!(fingerprint = %key, %reason, "skipping corrupt cache entry");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(entries)
    }

    /// Look up the entry for `request`.
    pub async fn match_request(&self, request: &Request) -> Result<Option<CachedResponse>, Error> {
        self.get(&self.fingerprint(request)).await
    }

    /// Snapshot and store `response` as the entry for `request`.
    pub async fn put_response(&self, request: &Request, response: &Response) -> Result<CachedResponse, Error> {
        let entry = CachedResponse::from_response(self.fingerprint(request), request, response);
        self.put(&entry.fingerprint, &entry).await?;
        Ok(entry)
    }
}
