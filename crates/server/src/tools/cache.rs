//! Cache administration and stats tools.

use rmcp::{ErrorData as McpError, model::*};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::context::GatewayContext;

/// Output structure for the cache clear tools.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheClearOutput {
    /// Human-readable confirmation.
    pub message: String,
    /// Number of entries evicted, including already-expired ones.
    pub cleared_entries: usize,
    /// RFC3339 timestamp of the clear.
    pub timestamp: String,
}

/// Input parameters for the crawl_cache_invalidate tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheInvalidateParams {
    /// URL whose cached results should be dropped.
    pub url: String,
}

/// Output structure for the gateway_stats tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GatewayStatsOutput {
    pub geocoding: GeocodingStats,
    pub crawling: CrawlingStats,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GeocodingStats {
    /// Live entries in the geocode cache.
    pub cache_size: usize,
    /// Cache TTL in hours.
    pub cache_ttl_hours: f64,
    /// Minimum spacing between upstream requests, in milliseconds.
    pub min_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CrawlingStats {
    /// Live entries in the crawl cache.
    pub cache_size: usize,
    /// Cache TTL in hours.
    pub cache_ttl_hours: f64,
    /// Concurrent crawl permit count.
    pub max_concurrent_crawls: usize,
    /// Whether the crawler upstream answered its health probe.
    pub crawler_healthy: bool,
}

fn clear_output(what: &str, cleared_entries: usize) -> CacheClearOutput {
    CacheClearOutput {
        message: format!("{what} cache cleared"),
        cleared_entries,
        timestamp: chrono::Utc::now().to_rfc3339(),
    }
}

fn to_result(output: &impl Serialize) -> CallToolResult {
    CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(output).unwrap_or_default(),
    )])
}

/// Implementation of the geocode_cache_clear tool.
pub async fn geocode_cache_clear_impl(
    context: &GatewayContext,
) -> Result<CallToolResult, McpError> {
    let cleared = context.geocoding.clear_cache();
    tracing::info!(cleared, "geocode cache cleared");
    Ok(to_result(&clear_output("geocoding", cleared)))
}

/// Implementation of the crawl_cache_clear tool.
pub async fn crawl_cache_clear_impl(context: &GatewayContext) -> Result<CallToolResult, McpError> {
    let cleared = context.crawler.clear_cache();
    tracing::info!(cleared, "crawl cache cleared");
    Ok(to_result(&clear_output("crawling", cleared)))
}

/// Implementation of the crawl_cache_invalidate tool. Clears every cached
/// result for one URL across all option sets.
pub async fn crawl_cache_invalidate_impl(
    context: &GatewayContext,
    params: CacheInvalidateParams,
) -> Result<CallToolResult, McpError> {
    let cleared = context.crawler.invalidate_url(&params.url)?;
    tracing::info!(url = params.url, cleared, "crawl cache invalidated");
    Ok(to_result(&CacheClearOutput {
        message: format!("cache entries for {} invalidated", params.url),
        cleared_entries: cleared,
        timestamp: chrono::Utc::now().to_rfc3339(),
    }))
}

/// Implementation of the gateway_stats tool.
pub async fn gateway_stats_impl(context: &GatewayContext) -> Result<CallToolResult, McpError> {
    let output = GatewayStatsOutput {
        geocoding: GeocodingStats {
            cache_size: context.geocoding.cache_len(),
            cache_ttl_hours: context.geocoding.cache_ttl().as_secs_f64() / 3600.0,
            min_interval_ms: context.geocoding.min_interval().as_millis() as u64,
        },
        crawling: CrawlingStats {
            cache_size: context.crawler.cache_len(),
            cache_ttl_hours: context.crawler.cache_ttl().as_secs_f64() / 3600.0,
            max_concurrent_crawls: context.crawler.max_concurrency(),
            crawler_healthy: context.crawler.backend_healthy().await,
        },
    };
    Ok(to_result(&output))
}
