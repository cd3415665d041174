//! sw_sync and search_history_record tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tether_client::{Event, ServiceWorker};

use super::{json_result, outcome_json};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwSyncParams {
    /// Sync tag: "background-sync" or "sync-search-history".
    pub tag: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchHistoryRecordParams {
    /// The search query to queue for sync.
    pub query: String,
}

pub async fn sync_impl(worker: &ServiceWorker, params: SwSyncParams) -> Result<CallToolResult, McpError> {
    let outcome = worker.dispatch(Event::Sync(params.tag)).await?;
    json_result(&outcome_json(outcome))
}

/// Queue a search as an unsynced record.
pub async fn record_impl(worker: &ServiceWorker, params: SearchHistoryRecordParams) -> Result<CallToolResult, McpError> {
    let record = worker.context().db.enqueue_search(&params.query).await?;
    tracing::debug!(id = record.id, "queued search for sync");
    json_result(&record)
}
