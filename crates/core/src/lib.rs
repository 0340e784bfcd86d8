//! Core types and shared functionality for tether.
//!
//! This crate provides:
//! - Request/response model and URL canonicalization
//! - Request fingerprints and the response cache
//! - Named persistence stores with a SQLite backend
//! - The connectivity oracle
//! - Unified error types and configuration

pub mod cache;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod message;
pub mod store;

pub use cache::{CachedResponse, ResponseCache};
pub use config::AppConfig;
pub use connectivity::Connectivity;
pub use error::Error;
pub use message::{Headers, Request, Response};
pub use store::{CacheDb, PersistenceStore, StoreManager};
