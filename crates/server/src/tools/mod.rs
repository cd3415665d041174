//! MCP tool implementations.
//!
//! Each `sw_*` tool dispatches one worker event and renders its outcome as
//! pretty JSON text content.

pub mod cache;
pub mod fetch;
pub mod lifecycle;
pub mod notify;
pub mod sync;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;
use tether_client::EventOutcome;
use tether_core::Error;

pub use cache::{CacheGetParams, CachePartitionsParams};
pub use fetch::SwFetchParams;
pub use lifecycle::{SwActivateParams, SwInstallParams, SwMessageParams};
pub use notify::{SwNotificationClickParams, SwPushParams};
pub use sync::{SearchHistoryRecordParams, SwSyncParams};

pub(crate) fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| Error::Serialization(format!("failed to serialize tool output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Any outcome as JSON, for tools whose handler may have been replaced.
pub(crate) fn outcome_json(outcome: EventOutcome) -> serde_json::Value {
    use serde_json::json;

    match outcome {
        EventOutcome::Installed(report) => json!({ "outcome": "installed", "report": report }),
        EventOutcome::Activated(report) => json!({ "outcome": "activated", "report": report }),
        EventOutcome::Served(served) => json!({ "outcome": "served", "response": fetch::FetchOutput::from(served) }),
        EventOutcome::Passthrough => json!({ "outcome": "passthrough" }),
        EventOutcome::Notified(notification) => json!({ "outcome": "notified", "notification": notification }),
        EventOutcome::Clicked(click) => json!({ "outcome": "clicked", "click": click }),
        EventOutcome::SearchHistorySynced(report) => json!({ "outcome": "search_history_synced", "report": report }),
        EventOutcome::PendingWritesDrained(count) => json!({ "outcome": "pending_writes_drained", "count": count }),
        EventOutcome::Reply(reply) => json!({ "outcome": "reply", "reply": reply }),
        EventOutcome::Ignored => json!({ "outcome": "ignored" }),
    }
}
