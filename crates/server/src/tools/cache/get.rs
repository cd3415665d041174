//! cache_get tool implementation.
//!
//! Looks up one entry in a partition by request identity.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tether_client::ServiceWorker;
use tether_client::fetch::request_identity;
use tether_core::{Error, PartitionKind};

use crate::tools::json_result;

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// Partition kind: "static", "dynamic", "images" or "offline".
    pub partition: PartitionKind,

    /// URL or origin-relative path of the cached request.
    pub url: String,

    /// HTTP method of the cached request (default: GET).
    #[serde(default = "default_method")]
    pub method: String,
}

fn default_method() -> String {
    "GET".into()
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    pub partition: String,
    pub identity: String,
    pub stored_at: String,
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(worker: &ServiceWorker, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let ctx = worker.context();
    let url = ctx.config.resolve(&params.url)?;
    let identity = request_identity(&params.method, &url, &ctx.config.origin);
    let name = ctx.config.partitions.name(params.partition);

    let entry = ctx
        .db
        .open_partition(name)
        .await?
        .entry(&identity)
        .await?
        .ok_or_else(|| Error::CacheMiss(format!("{identity} in {name}")))?;

    let output = CacheGetOutput {
        body: entry.response.body_text(),
        partition: entry.partition,
        identity: entry.identity,
        stored_at: entry.stored_at,
        url: entry.response.url,
        status: entry.response.status,
        headers: entry.response.headers,
    };
    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{offline_worker, text_json};
    use tether_core::ResponseSnapshot;

    #[tokio::test]
    async fn test_get_missing() {
        let worker = offline_worker().await;
        let params = CacheGetParams { partition: PartitionKind::Dynamic, url: "/api/events".into(), method: default_method() };

        let err = get_impl(&worker, params).await.unwrap_err();
        assert_eq!(err.code.0, -32001);
    }

    #[tokio::test]
    async fn test_get_found() {
        let worker = offline_worker().await;
        let partition = worker.context().db.open_partition("dynamic-v1.0.0").await.unwrap();
        partition
            .put(
                "GET /api/events",
                &ResponseSnapshot::new("http://localhost:3000/api/events", 200).with_body(r#"{"events":[]}"#),
            )
            .await
            .unwrap();

        let params = CacheGetParams {
            partition: PartitionKind::Dynamic,
            url: "http://localhost:3000/api/events".into(),
            method: "get".into(),
        };
        let output = text_json(&get_impl(&worker, params).await.unwrap());

        assert_eq!(output["identity"], "GET /api/events");
        assert_eq!(output["status"], 200);
        assert_eq!(output["body"], r#"{"events":[]}"#);
    }
}
