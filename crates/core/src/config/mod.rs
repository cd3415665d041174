//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (TETHER_*)
//! 2. TOML config file (if TETHER_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod partitions;
mod validation;

pub use partitions::{PartitionKind, PartitionSet, PartitionSpec};
pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (TETHER_*)
/// 2. TOML config file (if TETHER_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to SQLite cache database.
    ///
    /// Set via TETHER_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Origin that root-relative paths resolve against.
    ///
    /// Set via TETHER_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via TETHER_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via TETHER_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via TETHER_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Path prefix that marks a request as an API call.
    ///
    /// Set via TETHER_API_PREFIX environment variable.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Logical partition names paired with their current version tag.
    ///
    /// Bumping a version here is the only change needed to roll partitions
    /// over; the stale ones are dropped on the next activation.
    #[serde(default = "default_partitions")]
    pub partitions: Vec<PartitionSpec>,

    /// Static-shell manifest seeded at install time.
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,

    /// Offline partition manifest seeded at install time.
    #[serde(default = "default_offline_pages")]
    pub offline_pages: Vec<String>,

    /// Document served to navigations that miss both cache and network.
    ///
    /// Set via TETHER_OFFLINE_DOCUMENT environment variable.
    #[serde(default = "default_offline_document")]
    pub offline_document: String,

    /// Endpoint that accepts batched search-history records.
    ///
    /// Set via TETHER_SYNC_HISTORY_ENDPOINT environment variable.
    #[serde(default = "default_sync_history_endpoint")]
    pub sync_history_endpoint: String,

    /// Message placed in the JSON body of offline API responses.
    #[serde(default = "default_offline_message")]
    pub offline_message: String,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./tether-cache.sqlite")
}

fn default_origin() -> String {
    "http://localhost:3000".into()
}

fn default_user_agent() -> String {
    "tether/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_api_prefix() -> String {
    "/api/".into()
}

fn default_partitions() -> Vec<PartitionSpec> {
    PartitionKind::ALL
        .iter()
        .map(|kind| PartitionSpec { logical: *kind, version: "v1.0.0".into() })
        .collect()
}

fn default_precache() -> Vec<String> {
    [
        "/",
        "/posts",
        "/events",
        "/jobs",
        "/companies",
        "/brands",
        "/search",
        "/offline.html",
        "/css/style.css",
        "/js/main.js",
        "/js/accessibility.js",
        "/manifest.json",
        "https://cdn.jsdelivr.net/npm/bootstrap@5.3.2/dist/css/bootstrap.min.css",
        "https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.5.1/css/all.min.css",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_offline_pages() -> Vec<String> {
    vec![default_offline_document()]
}

fn default_offline_document() -> String {
    "/offline.html".into()
}

fn default_sync_history_endpoint() -> String {
    "/api/search/sync-history".into()
}

fn default_offline_message() -> String {
    "オフラインです。インターネット接続を確認してください。".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            origin: default_origin(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            api_prefix: default_api_prefix(),
            partitions: default_partitions(),
            precache: default_precache(),
            offline_pages: default_offline_pages(),
            offline_document: default_offline_document(),
            sync_history_endpoint: default_sync_history_endpoint(),
            offline_message: default_offline_message(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Resolve the configured `{logical, version}` pairs into concrete partition names.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if a partition kind is missing,
    /// duplicated, or carries an empty version.
    pub fn partition_set(&self) -> Result<PartitionSet, ConfigError> {
        PartitionSet::resolve(&self.partitions)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `TETHER_`
    /// 2. TOML file from `TETHER_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("TETHER_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("TETHER_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
