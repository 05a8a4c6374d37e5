//! crawl_batch tool implementation.

use rmcp::{ErrorData as McpError, model::*};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use waypost_core::Error;
use waypost_core::models::{BatchCrawlResponse, CacheMode, CrawlOptions};

use crate::context::GatewayContext;
use crate::gateway::{BatchCrawlRequest, FollowOptions};

const MIN_SCREENSHOT_WIDTH: u32 = 320;
const MAX_SCREENSHOT_WIDTH: u32 = 3840;
const MIN_SCREENSHOT_HEIGHT: u32 = 240;
const MAX_SCREENSHOT_HEIGHT: u32 = 2160;
const MAX_SCREENSHOT_WAIT_SECS: u32 = 30;

const MAX_SEED_URLS_WHEN_FOLLOWING: usize = 3;
const MAX_CRAWL_DEPTH: u32 = 5;
const MAX_CRAWL_DEPTH_EXTERNAL: u32 = 3;
const MAX_CRAWL_PAGES: usize = 50;
const MAX_CRAWL_PAGES_EXTERNAL: usize = 20;

/// Input parameters for the crawl_batch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CrawlBatchParams {
    /// URLs to crawl. http(s) only.
    pub urls: Vec<String>,

    /// Return only markdown content per page.
    #[serde(default)]
    pub markdown_only: bool,

    /// Extract same-origin links from each page.
    #[serde(default)]
    pub scrape_internal_links: bool,

    /// Extract cross-origin links from each page.
    #[serde(default)]
    pub scrape_external_links: bool,

    /// Capture a screenshot of each page.
    #[serde(default)]
    pub capture_screenshots: bool,

    /// Crawl discovered same-host links too. Requires
    /// scrape_internal_links.
    #[serde(default)]
    pub follow_internal_links: bool,

    /// Crawl discovered cross-host links too. Requires
    /// scrape_external_links.
    #[serde(default)]
    pub follow_external_links: bool,

    /// Maximum crawl depth when following links; 1 means seeds only.
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Cap on total pages crawled when following links.
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Screenshot viewport width in pixels.
    #[serde(default = "default_screenshot_width")]
    pub screenshot_width: u32,

    /// Screenshot viewport height in pixels.
    #[serde(default = "default_screenshot_height")]
    pub screenshot_height: u32,

    /// Seconds to wait before taking the screenshot.
    #[serde(default = "default_screenshot_wait")]
    pub screenshot_wait_for: u32,

    /// Cache behavior: "enabled" (default), "disabled", or "bypass".
    #[serde(default)]
    pub cache_mode: CacheMode,
}

fn default_screenshot_width() -> u32 {
    1920
}

fn default_screenshot_height() -> u32 {
    1080
}

fn default_screenshot_wait() -> u32 {
    2
}

fn default_max_depth() -> u32 {
    1
}

fn default_max_pages() -> usize {
    10
}

/// Output structure for the crawl_batch tool.
pub type CrawlBatchOutput = BatchCrawlResponse;

/// Implementation of the crawl_batch tool.
pub async fn crawl_batch_impl(
    context: &GatewayContext,
    params: CrawlBatchParams,
) -> Result<CallToolResult, McpError> {
    validate_params(&params, context.config.max_batch_urls)?;

    let request = BatchCrawlRequest {
        urls: params.urls,
        options: CrawlOptions {
            markdown_only: params.markdown_only,
            scrape_internal_links: params.scrape_internal_links,
            scrape_external_links: params.scrape_external_links,
            capture_screenshots: params.capture_screenshots,
            screenshot_width: params.screenshot_width,
            screenshot_height: params.screenshot_height,
            screenshot_wait_for: params.screenshot_wait_for,
        },
        cache_mode: params.cache_mode,
        follow: FollowOptions {
            internal: params.follow_internal_links,
            external: params.follow_external_links,
            max_depth: params.max_depth,
            max_pages: params.max_pages,
        },
    };

    let response = context.crawler.crawl_batch(request).await?;

    Ok(CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(&response).unwrap_or_default(),
    )]))
}

/// Batch-level validation. Per-URL problems are handled in-band by the
/// orchestrator; only whole-request problems reject the call.
fn validate_params(params: &CrawlBatchParams, max_batch_urls: usize) -> Result<(), Error> {
    if params.urls.is_empty() {
        return Err(Error::Validation("urls cannot be empty".into()));
    }
    if params.urls.len() > max_batch_urls {
        return Err(Error::Validation(format!(
            "batch of {} URLs exceeds the limit of {max_batch_urls}",
            params.urls.len()
        )));
    }

    if params.follow_internal_links && !params.scrape_internal_links {
        return Err(Error::Validation(
            "follow_internal_links requires scrape_internal_links".into(),
        ));
    }
    if params.follow_external_links && !params.scrape_external_links {
        return Err(Error::Validation(
            "follow_external_links requires scrape_external_links".into(),
        ));
    }

    let following = params.follow_internal_links || params.follow_external_links;
    if following {
        if params.urls.len() > MAX_SEED_URLS_WHEN_FOLLOWING {
            return Err(Error::Validation(format!(
                "at most {MAX_SEED_URLS_WHEN_FOLLOWING} seed URLs are allowed when following links"
            )));
        }
        // External following fans out fast, so its limits are tighter.
        let depth_limit = if params.follow_external_links {
            MAX_CRAWL_DEPTH_EXTERNAL
        } else {
            MAX_CRAWL_DEPTH
        };
        if params.max_depth < 1 || params.max_depth > depth_limit {
            return Err(Error::Validation(format!(
                "max_depth must be between 1 and {depth_limit}"
            )));
        }
        let pages_limit = if params.follow_external_links {
            MAX_CRAWL_PAGES_EXTERNAL
        } else {
            MAX_CRAWL_PAGES
        };
        if params.max_pages < 1 || params.max_pages > pages_limit {
            return Err(Error::Validation(format!(
                "max_pages must be between 1 and {pages_limit}"
            )));
        }
    }

    if params.capture_screenshots {
        let width_ok =
            (MIN_SCREENSHOT_WIDTH..=MAX_SCREENSHOT_WIDTH).contains(&params.screenshot_width);
        if !width_ok {
            return Err(Error::Validation(format!(
                "screenshot_width must be between {MIN_SCREENSHOT_WIDTH} and {MAX_SCREENSHOT_WIDTH}"
            )));
        }
        let height_ok =
            (MIN_SCREENSHOT_HEIGHT..=MAX_SCREENSHOT_HEIGHT).contains(&params.screenshot_height);
        if !height_ok {
            return Err(Error::Validation(format!(
                "screenshot_height must be between {MIN_SCREENSHOT_HEIGHT} and {MAX_SCREENSHOT_HEIGHT}"
            )));
        }
        if params.screenshot_wait_for > MAX_SCREENSHOT_WAIT_SECS {
            return Err(Error::Validation(format!(
                "screenshot_wait_for must be at most {MAX_SCREENSHOT_WAIT_SECS} seconds"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(urls: &[&str]) -> CrawlBatchParams {
        CrawlBatchParams {
            urls: urls.iter().map(|s| s.to_string()).collect(),
            markdown_only: false,
            scrape_internal_links: false,
            scrape_external_links: false,
            capture_screenshots: false,
            follow_internal_links: false,
            follow_external_links: false,
            max_depth: default_max_depth(),
            max_pages: default_max_pages(),
            screenshot_width: default_screenshot_width(),
            screenshot_height: default_screenshot_height(),
            screenshot_wait_for: default_screenshot_wait(),
            cache_mode: CacheMode::Enabled,
        }
    }

    #[test]
    fn test_rejects_empty_and_oversized_batches() {
        assert!(validate_params(&params(&[]), 10).is_err());

        let urls: Vec<String> = (0..11).map(|i| format!("https://site{i}.test")).collect();
        let refs: Vec<&str> = urls.iter().map(String::as_str).collect();
        assert!(validate_params(&params(&refs), 10).is_err());
        assert!(validate_params(&params(&refs), 11).is_ok());
    }

    #[test]
    fn test_screenshot_bounds_checked_only_when_capturing() {
        let mut p = params(&["https://a.test"]);
        p.screenshot_width = 10;
        assert!(validate_params(&p, 10).is_ok());

        p.capture_screenshots = true;
        assert!(validate_params(&p, 10).is_err());

        p.screenshot_width = 1280;
        p.screenshot_height = 4000;
        assert!(validate_params(&p, 10).is_err());

        p.screenshot_height = 720;
        p.screenshot_wait_for = 31;
        assert!(validate_params(&p, 10).is_err());

        p.screenshot_wait_for = 5;
        assert!(validate_params(&p, 10).is_ok());
    }

    #[test]
    fn test_following_requires_matching_scrape_flags() {
        let mut p = params(&["https://a.test"]);
        p.follow_internal_links = true;
        assert!(validate_params(&p, 10).is_err());
        p.scrape_internal_links = true;
        assert!(validate_params(&p, 10).is_ok());

        let mut p = params(&["https://a.test"]);
        p.follow_external_links = true;
        assert!(validate_params(&p, 10).is_err());
        p.scrape_external_links = true;
        assert!(validate_params(&p, 10).is_ok());
    }

    #[test]
    fn test_following_caps_seed_count_depth_and_pages() {
        let mut p = params(&["https://a.test", "https://b.test", "https://c.test", "https://d.test"]);
        p.scrape_internal_links = true;
        p.follow_internal_links = true;
        assert!(validate_params(&p, 10).is_err());

        let mut p = params(&["https://a.test"]);
        p.scrape_internal_links = true;
        p.follow_internal_links = true;
        p.max_depth = 6;
        assert!(validate_params(&p, 10).is_err());
        p.max_depth = 5;
        assert!(validate_params(&p, 10).is_ok());
        p.max_pages = 51;
        assert!(validate_params(&p, 10).is_err());
        p.max_pages = 0;
        assert!(validate_params(&p, 10).is_err());
    }

    #[test]
    fn test_external_following_has_tighter_limits() {
        let mut p = params(&["https://a.test"]);
        p.scrape_external_links = true;
        p.follow_external_links = true;
        p.max_depth = 4;
        assert!(validate_params(&p, 10).is_err());
        p.max_depth = 3;
        assert!(validate_params(&p, 10).is_ok());
        p.max_pages = 21;
        assert!(validate_params(&p, 10).is_err());
        p.max_pages = 20;
        assert!(validate_params(&p, 10).is_ok());

        // Without following, depth and page knobs are inert.
        let mut p = params(&["https://a.test"]);
        p.max_depth = 6;
        p.max_pages = 100;
        assert!(validate_params(&p, 10).is_ok());
    }

    #[test]
    fn test_params_defaults_from_sparse_json() {
        let p: CrawlBatchParams =
            serde_json::from_str(r#"{"urls": ["https://a.test"]}"#).unwrap();
        assert!(!p.markdown_only);
        assert!(!p.capture_screenshots);
        assert!(!p.follow_internal_links);
        assert!(!p.follow_external_links);
        assert_eq!(p.max_depth, 1);
        assert_eq!(p.max_pages, 10);
        assert_eq!(p.screenshot_width, 1920);
        assert_eq!(p.screenshot_height, 1080);
        assert_eq!(p.screenshot_wait_for, 2);
        assert_eq!(p.cache_mode, CacheMode::Enabled);
    }
}
