//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the gateway-backed implementations.

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

use crate::context::GatewayContext;
use crate::tools::cache::{
    CacheInvalidateParams, crawl_cache_clear_impl, crawl_cache_invalidate_impl,
    gateway_stats_impl, geocode_cache_clear_impl,
};
use crate::tools::crawl_batch::{CrawlBatchParams, crawl_batch_impl};
use crate::tools::geocode::{GeocodeCityParams, geocode_impl};

/// The main MCP server handler for waypost.
#[derive(Clone)]
pub struct WaypostServer {
    context: Arc<GatewayContext>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl WaypostServer {
    /// Create a new server handler over shared gateway state.
    pub fn new(context: Arc<GatewayContext>) -> Self {
        Self { context, tool_router: Self::tool_router() }
    }

    #[tool(
        description = "Resolve a city name to coordinates. Returns latitude, longitude, display name, and bounding box; results are cached and upstream requests are rate limited."
    )]
    async fn geocode_city(&self, params: Parameters<GeocodeCityParams>) -> Result<CallToolResult, McpError> {
        geocode_impl(&self.context, params.0).await
    }

    #[tool(
        description = "Crawl a batch of URLs concurrently, optionally following discovered internal or external links up to a depth and page budget. Returns markdown content per URL with optional links and screenshots; per-URL failures are reported in-band."
    )]
    async fn crawl_batch(&self, params: Parameters<CrawlBatchParams>) -> Result<CallToolResult, McpError> {
        crawl_batch_impl(&self.context, params.0).await
    }

    #[tool(description = "Clear the geocoding result cache.")]
    async fn geocode_cache_clear(&self) -> Result<CallToolResult, McpError> {
        geocode_cache_clear_impl(&self.context).await
    }

    #[tool(description = "Clear the crawl result cache.")]
    async fn crawl_cache_clear(&self) -> Result<CallToolResult, McpError> {
        crawl_cache_clear_impl(&self.context).await
    }

    #[tool(
        description = "Drop cached crawl results for one URL across every option combination it was crawled with."
    )]
    async fn crawl_cache_invalidate(
        &self, params: Parameters<CacheInvalidateParams>,
    ) -> Result<CallToolResult, McpError> {
        crawl_cache_invalidate_impl(&self.context, params.0).await
    }

    #[tool(description = "Report cache sizes, TTLs, concurrency limits, and crawler upstream health.")]
    async fn gateway_stats(&self) -> Result<CallToolResult, McpError> {
        gateway_stats_impl(&self.context).await
    }
}

impl ServerHandler for WaypostServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "waypost".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
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
