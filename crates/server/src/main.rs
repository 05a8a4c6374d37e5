//! waypost server entry point.
//!
//! Boots the MCP server on stdio transport. Logging goes to stderr to
//! avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;
use waypost_core::AppConfig;

mod context;
mod gateway;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(
        geocoder = %config.geocoder_base_url,
        crawler = %config.crawler_base_url,
        max_concurrent_crawls = config.max_concurrent_crawls,
        "starting waypost server on stdio transport"
    );

    let context = Arc::new(context::GatewayContext::from_config(config)?);
    let handler = handler::WaypostServer::new(context);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
