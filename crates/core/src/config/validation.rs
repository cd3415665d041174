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

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    /// - `origin` is not an absolute http(s) URL
    /// - `api_prefix` or `sync_history_endpoint` is not root-relative
    /// - a manifest entry is blank, or `offline_document` is not in `offline_pages`
    ///
    /// Returns `ConfigError::Missing` if a partition kind has no version.
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

        match url::Url::parse(&self.origin) {
            Ok(origin) if matches!(origin.scheme(), "http" | "https") && origin.host_str().is_some() => {}
            Ok(_) => {
                return Err(ConfigError::Invalid {
                    field: "origin".into(),
                    reason: "must be an absolute http(s) URL".into(),
                });
            }
            Err(e) => return Err(ConfigError::Invalid { field: "origin".into(), reason: e.to_string() }),
        }

        if !self.api_prefix.starts_with('/') {
            return Err(ConfigError::Invalid { field: "api_prefix".into(), reason: "must start with '/'".into() });
        }

        if !self.sync_history_endpoint.starts_with('/') {
            return Err(ConfigError::Invalid {
                field: "sync_history_endpoint".into(),
                reason: "must start with '/'".into(),
            });
        }

        self.partition_set()?;

        for (field, entries) in [("precache", &self.precache), ("offline_pages", &self.offline_pages)] {
            if entries.iter().any(|entry| entry.trim().is_empty()) {
                return Err(ConfigError::Invalid { field: field.into(), reason: "entries must not be blank".into() });
            }
        }

        if !self.offline_pages.contains(&self.offline_document) {
            return Err(ConfigError::Invalid {
                field: "offline_document".into(),
                reason: format!("'{}' is not listed in offline_pages", self.offline_document),
            });
        }

        if self.precache.is_empty() {
            tracing::warn!("precache manifest is empty; the static shell will only fill lazily");
        }

        Ok(())
    }
}
