//! sw_push and sw_notification_click tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tether_client::{Event, ServiceWorker};

use super::{json_result, outcome_json};

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SwPushParams {
    /// Push data: a JSON object of notification fields, or plain text used
    /// as the body. Omit for the default notification.
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwNotificationClickParams {
    /// Tag of the clicked notification.
    pub tag: String,

    /// Clicked action ("view", "dismiss"); omit for a click on the body.
    #[serde(default)]
    pub action: Option<String>,
}

pub async fn push_impl(worker: &ServiceWorker, params: SwPushParams) -> Result<CallToolResult, McpError> {
    let data = params.data.map(String::into_bytes);
    let outcome = worker.dispatch(Event::Push(data)).await?;
    json_result(&outcome_json(outcome))
}

pub async fn click_impl(worker: &ServiceWorker, params: SwNotificationClickParams) -> Result<CallToolResult, McpError> {
    let event = Event::NotificationClick { tag: params.tag, action: params.action.filter(|a| !a.is_empty()) };
    let outcome = worker.dispatch(event).await?;
    json_result(&outcome_json(outcome))
}
