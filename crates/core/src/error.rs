//! Unified error types for tether.
//!
//! Every error carries a stable code prefix so callers (and the CLI) can
//! classify failures without matching on message text.

use tokio_rusqlite::rusqlite;

/// Unified error type for the caching engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The network primitive rejected the request (no route, DNS, TLS, reset, timeout).
    #[error("TRANSPORT_ERROR: {0}")]
    Transport(String),

    /// The server answered 5xx and there was no cached copy to fall back to.
    #[error("SERVER_FAILURE: status {status} for {url}")]
    ServerFailure { status: u16, url: String },

    /// Offline and nothing cached for the request.
    #[error("OFFLINE: no cached response for {0}")]
    Offline(String),

    /// Persistence store operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// A stored payload could not be encoded or decoded.
    #[error("CACHE_ERROR: corrupt entry: {0}")]
    Serialization(String),

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Invalid input parameters (e.g., unknown method or strategy name).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Response body exceeded the configured limit.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// The registration was unregistered or superseded by a newer one.
    #[error("REGISTRATION_CLOSED: {0}")]
    RegistrationClosed(String),
}

impl Error {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Transport(_) => "TRANSPORT_ERROR",
            Error::ServerFailure { .. } => "SERVER_FAILURE",
            Error::Offline(_) => "OFFLINE",
            Error::Database(_) | Error::MigrationFailed(_) | Error::Serialization(_) => "CACHE_ERROR",
            Error::InvalidUrl(_) => "INVALID_URL",
            Error::InvalidInput(_) => "INVALID_INPUT",
            Error::FetchTooLarge(_) => "FETCH_TOO_LARGE",
            Error::RegistrationClosed(_) => "REGISTRATION_CLOSED",
        }
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
