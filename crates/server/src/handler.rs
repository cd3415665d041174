//! MCP server handler implementation.
//!
//! Each tool dispatches one worker event (or reads the partition store)
//! and returns the result as JSON text.
use std::sync::Arc;

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use tether_client::ServiceWorker;

use crate::tools::{
    self, CacheGetParams, CachePartitionsParams, SearchHistoryRecordParams, SwActivateParams, SwFetchParams,
    SwInstallParams, SwMessageParams, SwNotificationClickParams, SwPushParams, SwSyncParams,
};

/// The MCP server handler for tether.
#[derive(Clone)]
pub struct TetherServer {
    worker: Arc<ServiceWorker>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
#[tool_router]
impl TetherServer {
    pub fn new(worker: ServiceWorker) -> Self {
        Self { worker: Arc::new(worker), tool_router: Self::tool_router() }
    }

    #[tool(
        description = "Install the worker: fetch the static-shell and offline manifests and seed both partitions. All-or-nothing."
    )]
    async fn sw_install(&self, params: Parameters<SwInstallParams>) -> Result<CallToolResult, McpError> {
        tools::lifecycle::install_impl(&self.worker, params.0).await
    }

    #[tool(description = "Activate the installed worker: delete partitions from other versions and claim open clients.")]
    async fn sw_activate(&self, params: Parameters<SwActivateParams>) -> Result<CallToolResult, McpError> {
        tools::lifecycle::activate_impl(&self.worker, params.0).await
    }

    /// Route a request through the caching strategies.
    ///
    /// API paths go network-first, images and static assets cache-first, with
    /// offline fallbacks for each.
    #[tool(
        description = "Fetch a URL through the worker. Returns the response with its route class and whether it came from network, cache or a fallback."
    )]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        tools::fetch::fetch_impl(&self.worker, params.0).await
    }

    #[tool(description = "Deliver push data and display the resulting notification.")]
    async fn sw_push(&self, params: Parameters<SwPushParams>) -> Result<CallToolResult, McpError> {
        tools::notify::push_impl(&self.worker, params.0).await
    }

    #[tool(description = "Click a notification or one of its actions (\"view\", \"dismiss\").")]
    async fn sw_notification_click(
        &self, params: Parameters<SwNotificationClickParams>,
    ) -> Result<CallToolResult, McpError> {
        tools::notify::click_impl(&self.worker, params.0).await
    }

    #[tool(description = "Fire a background sync event for a tag (\"background-sync\", \"sync-search-history\").")]
    async fn sw_sync(&self, params: Parameters<SwSyncParams>) -> Result<CallToolResult, McpError> {
        tools::sync::sync_impl(&self.worker, params.0).await
    }

    #[tool(description = "Post a message to the worker (\"SKIP_WAITING\", \"GET_VERSION\").")]
    async fn sw_message(&self, params: Parameters<SwMessageParams>) -> Result<CallToolResult, McpError> {
        tools::lifecycle::message_impl(&self.worker, params.0).await
    }

    #[tool(description = "Record a search in the durable search-history queue as unsynced.")]
    async fn search_history_record(
        &self, params: Parameters<SearchHistoryRecordParams>,
    ) -> Result<CallToolResult, McpError> {
        tools::sync::record_impl(&self.worker, params.0).await
    }

    #[tool(description = "Look up a cached response by partition and request URL.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        tools::cache::get_impl(&self.worker, params.0).await
    }

    #[tool(description = "List cache partitions with entry counts and the current lifecycle state.")]
    async fn cache_partitions(&self, params: Parameters<CachePartitionsParams>) -> Result<CallToolResult, McpError> {
        tools::cache::partitions_impl(&self.worker, params.0).await
    }
}

impl ServerHandler for TetherServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "tether".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "Offline request-caching worker. Call sw_install then sw_activate, then route requests with sw_fetch."
                    .into(),
            ),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::offline_worker;

    #[tokio::test]
    async fn test_lists_every_tool() {
        let server = TetherServer::new(offline_worker().await);
        let mut names: Vec<String> = server.tool_router.list_all().into_iter().map(|t| t.name.to_string()).collect();
        names.sort();

        assert_eq!(
            names,
            vec![
                "cache_get",
                "cache_partitions",
                "search_history_record",
                "sw_activate",
                "sw_fetch",
                "sw_install",
                "sw_message",
                "sw_notification_click",
                "sw_push",
                "sw_sync",
            ]
        );
    }
}
