//! Request fingerprints (cache keys).

use sha2::{Digest, Sha256};

use crate::message::Request;

/// Compute the cache key for a request.
///
/// SHA-256 over the method and absolute URL (query included), followed by
/// `name:value` for each vary header in the order given. The request body
/// never participates, so two requests that differ only in body share a key.
pub fn fingerprint(request: &Request, vary_headers: &[String]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(request.method().as_str().as_bytes());
    hasher.update(b"\n");
    hasher.update(request.url().as_str().as_bytes());
    for name in vary_headers {
        let name = name.to_ascii_lowercase();
        hasher.update(b"\n");
        hasher.update(name.as_bytes());
        hasher.update(b":");
        hasher.update(request.headers().get(&name).unwrap_or("").as_bytes());
    }
    hex::encode(hasher.finalize())
}
