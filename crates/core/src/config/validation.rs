//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` or `cache_store_name` is empty
    /// - `origin` is not an absolute http(s) URL
    /// - a vary header name is blank
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_bytes == 0 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must be greater than 0".into() });
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must not exceed 50MB".into() });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.cache_store_name.trim().is_empty() {
            return Err(ConfigError::Invalid { field: "cache_store_name".into(), reason: "must not be empty".into() });
        }

        self.origin_url()?;

        if self.vary_headers.iter().any(|h| h.trim().is_empty()) {
            return Err(ConfigError::Invalid {
                field: "vary_headers".into(),
                reason: "header names must not be blank".into(),
            });
        }

        let mut seen = std::collections::HashSet::new();
        if self.vary_headers.iter().any(|h| !seen.insert(h.to_ascii_lowercase())) {
            tracing::warn!(
                vary_headers = ?self.vary_headers,
                "vary_headers lists the same header more than once; duplicates still hash separately"
            );
        }

        Ok(())
    }
}
