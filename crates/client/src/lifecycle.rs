//! Install/activate lifecycle of one worker version.
//!
//! ```text
//! installing --install ok--> installed --activate--> activating --> activated
//!      ^  |
//!      +--+ install failed (previous version keeps serving)
//! ```
//!
//! Install seeds the static-shell and offline partitions. Every manifest
//! entry is fetched before anything is written, and both partitions are
//! written in one transaction, so a single failure leaves both untouched.
//! Activate drops partitions from other versions.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tether_core::{CacheDb, Error, PartitionKind, PartitionSet, ResponseSnapshot};
use tokio::sync::{RwLock, Semaphore};
use tokio::task::JoinSet;
use url::Url;

use crate::config::WorkerConfig;
use crate::fetch::{Network, Request, request_identity};
use crate::host::ClientHost;

/// Maximum manifest fetches in flight during install.
const SEED_CONCURRENCY: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Installing,
    Installed,
    Activating,
    Activated,
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct InstallReport {
    /// `(partition, entries written)` for each seeded partition.
    pub seeded: Vec<(String, usize)>,
    pub skip_waiting: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ActivateReport {
    pub deleted: Vec<String>,
    pub kept: Vec<String>,
    pub clients_claimed: bool,
}

pub struct LifecycleManager {
    origin: Url,
    partitions: PartitionSet,
    precache: Vec<Url>,
    offline_pages: Vec<Url>,
    state: RwLock<LifecycleState>,
    skip_waiting: AtomicBool,
    clients_claimed: AtomicBool,
}

impl LifecycleManager {
    pub fn new(config: &WorkerConfig) -> Self {
        Self {
            origin: config.origin.clone(),
            partitions: config.partitions.clone(),
            precache: config.precache.clone(),
            offline_pages: config.offline_pages.clone(),
            state: RwLock::new(LifecycleState::Installing),
            skip_waiting: AtomicBool::new(false),
            clients_claimed: AtomicBool::new(false),
        }
    }

    pub async fn state(&self) -> LifecycleState {
        *self.state.read().await
    }

    pub fn partitions(&self) -> &PartitionSet {
        &self.partitions
    }

    /// Whether this version asked to activate without waiting for old clients.
    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    pub fn request_skip_waiting(&self) {
        self.skip_waiting.store(true, Ordering::SeqCst);
    }

    pub fn clients_claimed(&self) -> bool {
        self.clients_claimed.load(Ordering::SeqCst)
    }

    /// Seed both install-time partitions and move to `installed`.
    pub async fn install(&self, db: &CacheDb, network: Arc<dyn Network>) -> Result<InstallReport, Error> {
        let mut state = self.state.write().await;
        if *state != LifecycleState::Installing {
            return Err(Error::InvalidState(format!("install requested while {:?}", *state)));
        }

        tracing::info!(
            static_entries = self.precache.len(),
            offline_entries = self.offline_pages.len(),
            "installing worker version"
        );

        let seeded = match self.seed_all(db, network).await {
            Ok(seeded) => seeded,
            Err(err) => {
                tracing::error!(error = %err, "install failed; previous version keeps serving");
                return Err(err);
            }
        };

        *state = LifecycleState::Installed;
        self.request_skip_waiting();
        tracing::info!("worker installed; skipping wait for old clients");

        Ok(InstallReport { seeded, skip_waiting: true })
    }

    async fn seed_all(&self, db: &CacheDb, network: Arc<dyn Network>) -> Result<Vec<(String, usize)>, Error> {
        let shell = self.partitions.name(PartitionKind::Static);
        let offline = self.partitions.name(PartitionKind::Offline);

        let shell_entries = fetch_manifest(&self.origin, &self.precache, network.clone()).await?;
        let offline_entries = fetch_manifest(&self.origin, &self.offline_pages, network).await?;

        db.seed_partitions(&[(shell, shell_entries.as_slice()), (offline, offline_entries.as_slice())])
            .await?;

        Ok(vec![(shell.to_string(), shell_entries.len()), (offline.to_string(), offline_entries.len())])
    }

    /// Drop stale partitions, then take control of open clients.
    pub async fn activate(&self, db: &CacheDb, clients: &dyn ClientHost) -> Result<ActivateReport, Error> {
        let mut state = self.state.write().await;
        if *state != LifecycleState::Installed {
            return Err(Error::InvalidState(format!("activate requested while {:?}", *state)));
        }
        *state = LifecycleState::Activating;

        let kept = self.partitions.names();
        let deleted = match db.delete_partitions_not_in(&kept).await {
            Ok(deleted) => deleted,
            Err(err) => {
                *state = LifecycleState::Installed;
                return Err(err);
            }
        };
        for name in &deleted {
            tracing::info!(partition = %name, "deleted stale partition");
        }

        *state = LifecycleState::Activated;

        match clients.claim().await {
            Ok(()) => self.clients_claimed.store(true, Ordering::SeqCst),
            Err(err) => tracing::warn!(error = %err, "failed to claim clients"),
        }

        tracing::info!(deleted = deleted.len(), "worker activated");
        Ok(ActivateReport { deleted, kept, clients_claimed: self.clients_claimed() })
    }
}

/// Fetch every manifest entry; any transport failure or non-2xx aborts.
async fn fetch_manifest(
    origin: &Url, manifest: &[Url], network: Arc<dyn Network>,
) -> Result<Vec<(String, ResponseSnapshot)>, Error> {
    let semaphore = Arc::new(Semaphore::new(SEED_CONCURRENCY));
    let mut join_set = JoinSet::new();

    for (index, url) in manifest.iter().cloned().enumerate() {
        let semaphore = semaphore.clone();
        let network = network.clone();
        join_set.spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|e| Error::InstallFailed(format!("seed limiter closed: {e}")))?;
            let response = network
                .fetch(&Request::get(url.clone()))
                .await
                .map_err(|e| Error::InstallFailed(format!("{url}: {e}")))?;
            if !response.is_success() {
                return Err(Error::InstallFailed(format!("{url}: status {}", response.status)));
            }
            Ok((index, url, response))
        });
    }

    let mut fetched = Vec::with_capacity(manifest.len());
    while let Some(joined) = join_set.join_next().await {
        let result = joined.map_err(|e| Error::InstallFailed(format!("seed task failed: {e}")))?;
        match result {
            Ok(entry) => fetched.push(entry),
            Err(err) => {
                join_set.abort_all();
                return Err(err);
            }
        }
    }

    fetched.sort_by_key(|(index, _, _)| *index);
    Ok(fetched
        .into_iter()
        .map(|(_, url, response)| (request_identity("GET", &url, origin), response))
        .collect())
}
