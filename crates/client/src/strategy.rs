//! Caching strategies, one per route class.
//!
//! | class  | strategy                               | partition |
//! |--------|----------------------------------------|-----------|
//! | API    | network first, cache fallback, 503 JSON| dynamic   |
//! | IMAGE  | cache first, network, SVG placeholder  | images    |
//! | STATIC | cache first, network, offline document | static    |
//!
//! Only 2xx network responses are stored. A failed store is logged and
//! never turns into a failed response.

use serde::{Deserialize, Serialize};
use tether_core::{CacheDb, Error, Partition, PartitionKind, ResponseSnapshot};

use crate::classify::{RouteClass, classify};
use crate::config::WorkerConfig;
use crate::fallback;
use crate::fetch::{Destination, Method, Network, Request, request_identity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    NetworkFirst,
    CacheFirst,
    CacheFirstWithDocumentFallback,
}

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    Network,
    Cache,
    Fallback,
}

/// A response handed back to the requester.
#[derive(Debug, Clone)]
pub struct Served {
    pub class: RouteClass,
    pub source: ResponseSource,
    pub response: ResponseSnapshot,
}

/// Runs the strategy for one request. Borrowed per request.
pub struct StrategyExecutor<'a> {
    config: &'a WorkerConfig,
    db: &'a CacheDb,
    network: &'a dyn Network,
}

impl<'a> StrategyExecutor<'a> {
    pub fn new(config: &'a WorkerConfig, db: &'a CacheDb, network: &'a dyn Network) -> Self {
        Self { config, db, network }
    }

    /// Classify once, then let the class's strategy own the request.
    pub async fn execute(&self, request: &Request) -> Result<Served, Error> {
        let class = classify(request, &self.config.api_prefix);
        if request.method != Method::GET {
            tracing::debug!(method = %request.method, url = %request.url, "uncached method, going to network");
            let response = self.network.fetch(request).await?;
            return Ok(Served { class, source: ResponseSource::Network, response });
        }

        let identity = request_identity(request.method.as_str(), &request.url, &self.config.origin);
        let partition = self
            .db
            .open_partition(self.config.partitions.name(class.partition()))
            .await?;

        tracing::debug!(%identity, ?class, strategy = ?class.strategy(), "handling fetch");

        match class.strategy() {
            Strategy::NetworkFirst => self.network_first(class, request, &partition, &identity).await,
            Strategy::CacheFirst | Strategy::CacheFirstWithDocumentFallback => {
                self.cache_first(class, request, &partition, &identity).await
            }
        }
    }

    async fn network_first(
        &self, class: RouteClass, request: &Request, partition: &Partition, identity: &str,
    ) -> Result<Served, Error> {
        match self.network.fetch(request).await {
            Ok(response) => {
                if response.is_success() {
                    store(partition, identity, &response).await;
                }
                Ok(Served { class, source: ResponseSource::Network, response })
            }
            Err(err) => {
                tracing::warn!(%identity, error = %err, "network failed, trying dynamic cache");
                match lookup(partition, identity).await {
                    Some(response) => Ok(Served { class, source: ResponseSource::Cache, response }),
                    None => Ok(Served {
                        class,
                        source: ResponseSource::Fallback,
                        response: fallback::offline_api_response(request.url.as_str(), &self.config.offline_message),
                    }),
                }
            }
        }
    }

    async fn cache_first(
        &self, class: RouteClass, request: &Request, partition: &Partition, identity: &str,
    ) -> Result<Served, Error> {
        if let Some(response) = lookup(partition, identity).await {
            tracing::debug!(%identity, partition = partition.name(), "cache hit");
            return Ok(Served { class, source: ResponseSource::Cache, response });
        }

        let err = match self.network.fetch(request).await {
            Ok(response) => {
                if response.is_success() {
                    store(partition, identity, &response).await;
                }
                return Ok(Served { class, source: ResponseSource::Network, response });
            }
            Err(err) => err,
        };

        tracing::warn!(%identity, error = %err, "cache miss and network failed");

        match class {
            RouteClass::Image => Ok(Served {
                class,
                source: ResponseSource::Fallback,
                response: fallback::offline_image(request.url.as_str()),
            }),
            _ if request.destination == Destination::Document => {
                Ok(self.offline_document(class, request).await)
            }
            _ => Err(err),
        }
    }

    async fn offline_document(&self, class: RouteClass, request: &Request) -> Served {
        let identity = request_identity("GET", &self.config.offline_document, &self.config.origin);
        let seeded = match self.db.open_partition(self.config.partitions.name(PartitionKind::Offline)).await {
            Ok(partition) => lookup(&partition, &identity).await,
            Err(err) => {
                tracing::warn!(error = %err, "offline partition unavailable");
                None
            }
        };

        let response = seeded.unwrap_or_else(|| fallback::offline_document(request.url.as_str()));
        Served { class, source: ResponseSource::Fallback, response }
    }
}

/// Cache read where a storage error counts as a miss.
async fn lookup(partition: &Partition, identity: &str) -> Option<ResponseSnapshot> {
    match partition.get(identity).await {
        Ok(found) => found,
        Err(err) => {
            tracing::warn!(%identity, partition = partition.name(), error = %err, "cache read failed");
            None
        }
    }
}

async fn store(partition: &Partition, identity: &str, response: &ResponseSnapshot) {
    if let Err(err) = partition.put(identity, response).await {
        tracing::warn!(%identity, partition = partition.name(), error = %err, "cache write failed");
    }
}
