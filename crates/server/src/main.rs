//! tether server entry point.
//!
//! Boots the worker and serves it as MCP tools on stdio.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::{Context, Result};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tether_client::{FetchClient, FetchConfig, ServiceWorker, WorkerConfig, WorkerContext};
use tether_core::{AppConfig, CacheDb};
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod host;
mod tools;

use host::{HostNotifier, WindowTable};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("loading configuration")?;
    let worker_config = WorkerConfig::from_app_config(&config)?;

    tracing::info!(
        db_path = %config.db_path.display(),
        origin = %worker_config.origin,
        partitions = ?worker_config.partitions.names(),
        "starting tether on stdio transport"
    );

    let db = CacheDb::open(&config.db_path).await?;
    let network = FetchClient::new(FetchConfig::from(&config))?;

    let ctx = WorkerContext::new(
        worker_config,
        db,
        Arc::new(network),
        Arc::new(HostNotifier::new()),
        Arc::new(WindowTable::new()),
    );
    let handler = handler::TetherServer::new(ServiceWorker::new(ctx));

    let server = serve_server(handler, stdio()).await?;
    server.waiting().await?;

    Ok(())
}
