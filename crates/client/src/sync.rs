//! Background sync: routes sync tags to their drain routines.

use serde::{Deserialize, Serialize};
use tether_core::{CacheDb, Error};
use url::Url;

use crate::fetch::{Network, Request};

pub const BACKGROUND_SYNC_TAG: &str = "background-sync";
pub const SEARCH_HISTORY_TAG: &str = "sync-search-history";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncTag {
    BackgroundSync,
    SearchHistory,
    Other(String),
}

impl SyncTag {
    pub fn parse(tag: &str) -> Self {
        match tag {
            BACKGROUND_SYNC_TAG => SyncTag::BackgroundSync,
            SEARCH_HISTORY_TAG => SyncTag::SearchHistory,
            other => SyncTag::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SyncReport {
    pub submitted: usize,
    pub marked_synced: u64,
    /// Why the batch was not delivered; records stay queued.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Submit unsynced search history in one batch and mark it synced on 2xx.
///
/// A failed submit is not an error: it is logged and reported with
/// `submitted: 0`. Records stay unsynced and go out again on the next
/// trigger, so the endpoint has to tolerate duplicates.
pub async fn sync_search_history(db: &CacheDb, network: &dyn Network, endpoint: &Url) -> Result<SyncReport, Error> {
    let pending: Vec<_> = db.all_searches().await?.into_iter().filter(|r| !r.synced).collect();
    if pending.is_empty() {
        tracing::debug!("search history: nothing to sync");
        return Ok(SyncReport::default());
    }

    let body = serde_json::json!({ "searches": pending });
    let request = Request::post_json(endpoint.clone(), &body)?;

    if let Err(err) = submit(network, &request).await {
        tracing::warn!(error = %err, pending = pending.len(), "search history sync failed; will retry on next trigger");
        return Ok(SyncReport { error: Some(err.to_string()), ..SyncReport::default() });
    }

    let ids: Vec<i64> = pending.iter().map(|r| r.id).collect();
    let marked_synced = db.mark_searches_synced(&ids).await?;
    tracing::info!(submitted = ids.len(), marked_synced, "search history synced");

    Ok(SyncReport { submitted: ids.len(), marked_synced, error: None })
}

async fn submit(network: &dyn Network, request: &Request) -> Result<(), Error> {
    let response = network
        .fetch(request)
        .await
        .map_err(|e| Error::SyncFailed(format!("search history submit: {e}")))?;
    if !response.is_success() {
        return Err(Error::SyncFailed(format!("search history rejected with status {}", response.status)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockNetwork;
    use reqwest::Method;

    const ENDPOINT: &str = "http://localhost:3000/api/search/sync-history";

    #[test]
    fn test_parse_tags() {
        assert_eq!(SyncTag::parse("background-sync"), SyncTag::BackgroundSync);
        assert_eq!(SyncTag::parse("sync-search-history"), SyncTag::SearchHistory);
        assert_eq!(SyncTag::parse("other"), SyncTag::Other("other".into()));
    }

    #[tokio::test]
    async fn test_two_records_one_post() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.enqueue_search("rust jobs").await.unwrap();
        db.enqueue_search("tokyo events").await.unwrap();
        let network = MockNetwork::new();
        network.route(ENDPOINT, 200, "application/json", "{}");

        let report = sync_search_history(&db, &network, &Url::parse(ENDPOINT).unwrap()).await.unwrap();

        assert_eq!(report, SyncReport { submitted: 2, marked_synced: 2, error: None });
        let calls = network.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, Method::POST);
        assert_eq!(calls[0].url.path(), "/api/search/sync-history");

        let body: serde_json::Value = serde_json::from_slice(calls[0].body.as_ref().unwrap()).unwrap();
        let searches = body["searches"].as_array().unwrap();
        assert_eq!(searches.len(), 2);
        assert_eq!(searches[0]["query"], "rust jobs");

        assert!(db.all_searches().await.unwrap().iter().all(|r| r.synced));
    }

    #[tokio::test]
    async fn test_failure_is_reported_and_leaves_records_unsynced() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.enqueue_search("rust jobs").await.unwrap();
        let network = MockNetwork::new();
        network.route(ENDPOINT, 500, "application/json", "{}");

        let report = sync_search_history(&db, &network, &Url::parse(ENDPOINT).unwrap()).await.unwrap();
        assert_eq!(report.submitted, 0);
        assert_eq!(report.marked_synced, 0);
        assert!(report.error.as_deref().unwrap().contains("SYNC_FAILED"));

        network.set_offline(true);
        let report = sync_search_history(&db, &network, &Url::parse(ENDPOINT).unwrap()).await.unwrap();
        assert_eq!(report.submitted, 0);
        assert!(report.error.is_some());

        assert!(db.all_searches().await.unwrap().iter().all(|r| !r.synced));
    }

    #[tokio::test]
    async fn test_empty_queue_makes_no_request() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let network = MockNetwork::new();

        let report = sync_search_history(&db, &network, &Url::parse(ENDPOINT).unwrap()).await.unwrap();

        assert_eq!(report, SyncReport::default());
        assert_eq!(network.call_count(), 0);
    }

    #[tokio::test]
    async fn test_already_synced_not_resubmitted() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let first = db.enqueue_search("old").await.unwrap();
        db.mark_searches_synced(&[first.id]).await.unwrap();
        db.enqueue_search("new").await.unwrap();
        let network = MockNetwork::new();
        network.route(ENDPOINT, 200, "application/json", "{}");

        let report = sync_search_history(&db, &network, &Url::parse(ENDPOINT).unwrap()).await.unwrap();
        assert_eq!(report.submitted, 1);
    }
}
