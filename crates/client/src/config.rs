//! Resolved worker settings.
//!
//! `AppConfig` holds strings as loaded; `WorkerConfig` is the same data with
//! every URL resolved against the origin and partition names fixed, so
//! request handling never re-parses configuration.

use tether_core::{AppConfig, Error, PartitionSet};
use url::Url;

use crate::fetch::resolve;

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub origin: Url,
    pub api_prefix: String,
    pub partitions: PartitionSet,
    /// Static-shell manifest.
    pub precache: Vec<Url>,
    /// Offline partition manifest.
    pub offline_pages: Vec<Url>,
    pub offline_document: Url,
    pub sync_history_endpoint: Url,
    pub offline_message: String,
}

impl WorkerConfig {
    pub fn from_app_config(config: &AppConfig) -> Result<Self, Error> {
        let origin = Url::parse(&config.origin).map_err(|e| Error::InvalidUrl(format!("origin: {e}")))?;
        let partitions = config.partition_set().map_err(|e| Error::InvalidInput(e.to_string()))?;

        let resolve_all = |entries: &[String]| -> Result<Vec<Url>, Error> {
            entries
                .iter()
                .map(|entry| resolve(&origin, entry).map_err(|e| Error::InvalidUrl(format!("{entry}: {e}"))))
                .collect()
        };
        let precache = resolve_all(&config.precache)?;
        let offline_pages = resolve_all(&config.offline_pages)?;
        let offline_document = resolve(&origin, &config.offline_document)
            .map_err(|e| Error::InvalidUrl(format!("{}: {e}", config.offline_document)))?;
        let sync_history_endpoint = resolve(&origin, &config.sync_history_endpoint)
            .map_err(|e| Error::InvalidUrl(format!("{}: {e}", config.sync_history_endpoint)))?;

        Ok(Self {
            origin,
            api_prefix: config.api_prefix.clone(),
            partitions,
            precache,
            offline_pages,
            offline_document,
            sync_history_endpoint,
            offline_message: config.offline_message.clone(),
        })
    }

    /// Resolve a request target against the origin.
    pub fn resolve(&self, input: &str) -> Result<Url, Error> {
        resolve(&self.origin, input).map_err(|e| Error::InvalidUrl(e.to_string()))
    }
}
