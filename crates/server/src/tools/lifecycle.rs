//! sw_install, sw_activate and sw_message tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tether_client::{Event, ServiceWorker};
use tether_core::Error;

use super::{json_result, outcome_json};

/// sw_install takes no parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SwInstallParams {}

/// sw_activate takes no parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SwActivateParams {}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwMessageParams {
    /// Message type, e.g. "SKIP_WAITING" or "GET_VERSION".
    #[serde(rename = "type")]
    pub kind: String,
}

/// Seed the install-time partitions.
pub async fn install_impl(worker: &ServiceWorker, _params: SwInstallParams) -> Result<CallToolResult, McpError> {
    let outcome = worker.dispatch(Event::Install).await?;
    json_result(&outcome_json(outcome))
}

/// Drop stale partitions and claim clients.
pub async fn activate_impl(worker: &ServiceWorker, _params: SwActivateParams) -> Result<CallToolResult, McpError> {
    let outcome = worker.dispatch(Event::Activate).await?;
    json_result(&outcome_json(outcome))
}

pub async fn message_impl(worker: &ServiceWorker, params: SwMessageParams) -> Result<CallToolResult, McpError> {
    if params.kind.trim().is_empty() {
        return Err(Error::InvalidInput("message type cannot be empty".into()).into());
    }

    let outcome = worker.dispatch(Event::Message(params.kind)).await?;
    json_result(&outcome_json(outcome))
}
