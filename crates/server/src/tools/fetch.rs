//! sw_fetch tool implementation.
//!
//! Routes a request through the worker's fetch handler. Requests the worker
//! does not intercept are performed directly on the network.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tether_client::fetch::Method;
use tether_client::{
    Destination, Event, EventOutcome, Network, Request, ResponseSource, RouteClass, Served, ServiceWorker,
};
use tether_core::{Error, ResponseSnapshot};

use super::{json_result, outcome_json};

/// Input parameters for sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// Absolute URL, or a path resolved against the configured origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Request destination: "document", "image", "style", "script", "font",
    /// "manifest" or empty.
    #[serde(default)]
    pub destination: Option<String>,

    /// Extra request headers as name/value pairs.
    #[serde(default)]
    pub headers: Vec<(String, String)>,

    /// Optional request body (UTF-8).
    #[serde(default)]
    pub body: Option<String>,
}

fn default_method() -> String {
    "GET".into()
}

/// Output structure for sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FetchOutput {
    /// Route class; absent for passthrough requests.
    pub class: Option<RouteClass>,
    /// "network", "cache", "fallback" or "passthrough".
    pub source: String,
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub headers: Vec<(String, String)>,
    pub bytes: usize,
    /// Body decoded as UTF-8 (lossy).
    pub body: String,
}

impl FetchOutput {
    fn from_response(class: Option<RouteClass>, source: &str, response: ResponseSnapshot) -> Self {
        Self {
            class,
            source: source.to_string(),
            content_type: response.content_type().map(str::to_string),
            bytes: response.body.len(),
            body: response.body_text(),
            url: response.url,
            status: response.status,
            headers: response.headers,
        }
    }
}

impl From<Served> for FetchOutput {
    fn from(served: Served) -> Self {
        let source = match served.source {
            ResponseSource::Network => "network",
            ResponseSource::Cache => "cache",
            ResponseSource::Fallback => "fallback",
        };
        Self::from_response(Some(served.class), source, served.response)
    }
}

fn build_request(worker: &ServiceWorker, params: &SwFetchParams) -> Result<Request, Error> {
    if params.url.trim().is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()));
    }

    let url = worker.context().config.resolve(&params.url)?;
    let method = parse_method(&params.method)?;

    let mut request = Request::get(url);
    request.method = method;
    request.destination = params.destination.as_deref().map(Destination::parse).unwrap_or_default();
    for (name, value) in &params.headers {
        request = request.with_header(name.clone(), value.clone());
    }
    request.body = params.body.clone().map(Into::into);
    Ok(request)
}

fn parse_method(method: &str) -> Result<Method, Error> {
    Method::from_bytes(method.trim().to_ascii_uppercase().as_bytes())
        .map_err(|_| Error::InvalidInput(format!("invalid method: {method}")))
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl(worker: &ServiceWorker, params: SwFetchParams) -> Result<CallToolResult, McpError> {
    let request = build_request(worker, &params)?;

    match worker.dispatch(Event::Fetch(request.clone())).await? {
        EventOutcome::Served(served) => json_result(&FetchOutput::from(served)),
        EventOutcome::Passthrough => {
            let response = worker.context().network.fetch(&request).await?;
            json_result(&FetchOutput::from_response(None, "passthrough", response))
        }
        other => json_result(&outcome_json(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{offline_worker, text_json};

    fn params(url: &str, destination: Option<&str>) -> SwFetchParams {
        SwFetchParams {
            url: url.into(),
            method: default_method(),
            destination: destination.map(str::to_string),
            headers: Vec::new(),
            body: None,
        }
    }

    #[tokio::test]
    async fn test_fetch_api_offline_returns_503_json() {
        let worker = offline_worker().await;

        let result = fetch_impl(&worker, params("/api/events", None)).await.unwrap();
        let output = text_json(&result);

        assert_eq!(output["class"], "api");
        assert_eq!(output["source"], "fallback");
        assert_eq!(output["status"], 503);
        let body: serde_json::Value = serde_json::from_str(output["body"].as_str().unwrap()).unwrap();
        assert_eq!(body["offline"], true);
    }

    #[tokio::test]
    async fn test_fetch_image_offline_returns_placeholder() {
        let worker = offline_worker().await;

        let result = fetch_impl(&worker, params("/img/a.jpg", None)).await.unwrap();
        let output = text_json(&result);

        assert_eq!(output["class"], "image");
        assert_eq!(output["content_type"], "image/svg+xml");
    }

    #[tokio::test]
    async fn test_fetch_script_offline_is_error() {
        let worker = offline_worker().await;
        let result = fetch_impl(&worker, params("/js/main.js", Some("script"))).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_fetch_empty_url() {
        let worker = offline_worker().await;
        assert!(fetch_impl(&worker, params("  ", None)).await.is_err());
    }

    #[tokio::test]
    async fn test_fetch_invalid_method() {
        let worker = offline_worker().await;
        let mut p = params("/posts", None);
        p.method = "GE T".into();
        assert!(fetch_impl(&worker, p).await.is_err());
    }
}
