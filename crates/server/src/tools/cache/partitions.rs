//! cache_partitions tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tether_client::{LifecycleState, ServiceWorker};
use tether_core::PartitionSummary;

use crate::tools::json_result;

/// cache_partitions takes no parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CachePartitionsParams {}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePartitionsOutput {
    pub state: LifecycleState,
    /// The versioned names this worker keeps on activation.
    pub current: Vec<String>,
    /// Existing partitions the next activation will delete.
    pub stale: Vec<String>,
    pub partitions: Vec<PartitionSummary>,
}

pub async fn partitions_impl(worker: &ServiceWorker, _params: CachePartitionsParams) -> Result<CallToolResult, McpError> {
    let ctx = worker.context();
    let current = ctx.lifecycle.partitions();
    let partitions = ctx.db.partition_summaries().await?;
    let stale = partitions.iter().filter(|p| !current.contains(&p.name)).map(|p| p.name.clone()).collect();

    let output = CachePartitionsOutput {
        state: ctx.lifecycle.state().await,
        current: current.names(),
        stale,
        partitions,
    };
    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{offline_worker, text_json};

    #[tokio::test]
    async fn test_lists_partitions_with_counts() {
        let worker = offline_worker().await;
        worker.context().db.open_partition("static-v0.9.0").await.unwrap();
        worker.context().db.open_partition("static-v1.0.0").await.unwrap();

        let output = text_json(&partitions_impl(&worker, CachePartitionsParams::default()).await.unwrap());

        assert_eq!(output["state"], "installing");
        assert_eq!(output["current"].as_array().unwrap().len(), 4);
        assert_eq!(output["partitions"][0]["name"], "static-v0.9.0");
        assert_eq!(output["partitions"][0]["entries"], 0);
        assert_eq!(output["stale"], serde_json::json!(["static-v0.9.0"]));
    }
}
