//! Backend traits: the network call seam consumed by the gateways.
//!
//! Both operations are opaque and fallible; the gateways absorb their
//! latency and failure modes without leaking raw errors. Tests swap in
//! mock implementations to assert call counts and failure isolation.

use crate::error::ClientError;
use async_trait::async_trait;
use serde::Deserialize;
use waypost_core::models::CrawlOptions;

/// One place record as the geocoding upstream serializes it.
///
/// Coordinates arrive as strings on the wire; parsing into floats is the
/// gateway's job so a malformed payload surfaces as an upstream error
/// there, not a silent deserialization failure here.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPlace {
    pub lat: String,
    pub lon: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub place_id: Option<i64>,
    #[serde(default)]
    pub boundingbox: Option<Vec<String>>,
}

/// Normalized content for one crawled page, before gateway shaping.
#[derive(Debug, Clone, Default)]
pub struct RawCrawl {
    pub status_code: Option<u16>,
    pub markdown: Option<String>,
    pub cleaned_html: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub internal_links: Option<Vec<String>>,
    pub external_links: Option<Vec<String>>,
    pub screenshot_base64: Option<String>,
}

/// Geocoding upstream.
#[async_trait]
pub trait GeocodeBackend: Send + Sync {
    /// Look up a free-text query, returning zero or more candidate
    /// places ordered by relevance.
    async fn geocode(&self, query: &str) -> Result<Vec<RawPlace>, ClientError>;
}

/// Crawling upstream.
#[async_trait]
pub trait CrawlBackend: Send + Sync {
    /// Crawl one URL under the given option set.
    async fn crawl(&self, url: &str, options: &CrawlOptions) -> Result<RawCrawl, ClientError>;

    /// Probe upstream liveness.
    async fn health(&self) -> bool;
}
