//! Crawling domain models.
//!
//! Every per-item field is always present in the serialized envelope and
//! nulled when inapplicable, so batch consumers never branch on field
//! presence.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Cache behavior for a batch crawl.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum CacheMode {
    /// Read from and write to the crawl cache.
    #[default]
    Enabled,
    /// Neither read from nor write to the cache.
    Disabled,
    /// Skip the cache lookup but store fresh results.
    Bypass,
}

/// The option set that shapes a single crawl.
///
/// Participates in the cache key, so two crawls of one URL under
/// different options never share an entry.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CrawlOptions {
    /// Return only markdown content; strips HTML, metadata, links, and
    /// screenshots from the result.
    pub markdown_only: bool,
    /// Extract same-origin links from crawled pages.
    pub scrape_internal_links: bool,
    /// Extract cross-origin links from crawled pages.
    pub scrape_external_links: bool,
    /// Capture a screenshot of each page.
    pub capture_screenshots: bool,
    /// Screenshot viewport width in pixels.
    pub screenshot_width: u32,
    /// Screenshot viewport height in pixels.
    pub screenshot_height: u32,
    /// Seconds to wait before taking the screenshot.
    pub screenshot_wait_for: u32,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            markdown_only: false,
            scrape_internal_links: false,
            scrape_external_links: false,
            capture_screenshots: false,
            screenshot_width: 1920,
            screenshot_height: 1080,
            screenshot_wait_for: 2,
        }
    }
}

/// Screenshot dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ScreenshotSize {
    pub width: u32,
    pub height: u32,
}

/// Result for one URL in a batch crawl.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CrawlResult {
    /// The crawled URL.
    pub url: String,
    /// Whether the crawl succeeded.
    pub success: bool,
    /// Extracted markdown content.
    pub markdown: Option<String>,
    /// Cleaned HTML (null in markdown_only mode).
    pub cleaned_html: Option<String>,
    /// Page metadata (null in markdown_only mode).
    pub metadata: Option<serde_json::Value>,
    /// Same-origin links found on the page.
    pub internal_links: Option<Vec<String>>,
    /// Cross-origin links found on the page.
    pub external_links: Option<Vec<String>>,
    /// Base64-encoded screenshot image data.
    pub screenshot_base64: Option<String>,
    /// Screenshot dimensions.
    pub screenshot_size: Option<ScreenshotSize>,
    /// HTTP status code reported by the crawler.
    pub status_code: Option<u16>,
    /// Time taken to crawl this URL.
    pub crawl_time_seconds: Option<f64>,
    /// Crawl depth, 0 for seed URLs.
    #[serde(default)]
    pub depth: u32,
    /// Error message when the crawl failed.
    pub error_message: Option<String>,
}

impl CrawlResult {
    /// Build an in-band failure item.
    pub fn failed(url: impl Into<String>, message: impl Into<String>, crawl_time_seconds: f64) -> Self {
        Self {
            url: url.into(),
            success: false,
            markdown: None,
            cleaned_html: None,
            metadata: None,
            internal_links: None,
            external_links: None,
            screenshot_base64: None,
            screenshot_size: None,
            status_code: None,
            crawl_time_seconds: Some(crawl_time_seconds),
            depth: 0,
            error_message: Some(message.into()),
        }
    }

    /// Null out everything but markdown, honoring `markdown_only` even
    /// when the backend produced richer content.
    pub fn strip_to_markdown(&mut self) {
        self.cleaned_html = None;
        self.metadata = None;
        self.internal_links = None;
        self.external_links = None;
        self.screenshot_base64 = None;
        self.screenshot_size = None;
    }
}

/// Envelope for a batch crawl: exact tallies plus ordered results.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BatchCrawlResponse {
    /// Total number of URLs in the batch.
    pub total_urls: usize,
    /// Count of items with `success = true`.
    pub successful_crawls: usize,
    /// Count of items with `success = false`.
    pub failed_crawls: usize,
    /// Count of items served from the cache.
    pub cached_results: usize,
    /// Per-URL results in input order.
    pub results: Vec<CrawlResult>,
    /// RFC3339 timestamp of the response.
    pub timestamp: String,
    /// Wall-clock duration of the whole batch. Not the sum of item
    /// durations, since items run concurrently.
    pub total_time_seconds: f64,
}

impl BatchCrawlResponse {
    /// Assemble the envelope from ordered results; tallies are derived,
    /// never passed in, so they cannot drift from the items.
    pub fn from_results(results: Vec<CrawlResult>, cached_results: usize, total_time_seconds: f64) -> Self {
        let successful_crawls = results.iter().filter(|r| r.success).count();
        let failed_crawls = results.len() - successful_crawls;

        Self {
            total_urls: results.len(),
            successful_crawls,
            failed_crawls,
            cached_results,
            results,
            timestamp: chrono::Utc::now().to_rfc3339(),
            total_time_seconds,
        }
    }
}
