//! Cache key generation for gateway request signatures.
//!
//! Keys are SHA-256 hex digests of a normalized signature so that
//! equivalent requests ("London", " london ") collapse onto one entry and
//! different crawl option sets never collide.

use crate::models::crawling::CrawlOptions;
use sha2::{Digest, Sha256};

/// Compute the cache key for a geocoding lookup.
///
/// The city is trimmed and case-folded for the key only; callers keep the
/// original casing for display.
pub fn geocode_cache_key(city: &str) -> String {
    let normalized = city.trim().to_lowercase();
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    hex::encode(hasher.finalize())
}

/// Compute the cache key for a crawl of `url` under `options`.
///
/// The URL is normalized (trimmed, lowercased, trailing slash stripped)
/// and combined with the canonical JSON of the cache-relevant options.
/// Screenshot dimensions participate only when screenshots are enabled,
/// so toggling unrelated viewport defaults does not split the cache.
pub fn crawl_cache_key(url: &str, options: &CrawlOptions) -> String {
    let normalized_url = normalize_url(url);

    let mut relevant = serde_json::json!({
        "markdown_only": options.markdown_only,
        "scrape_internal_links": options.scrape_internal_links,
        "scrape_external_links": options.scrape_external_links,
        "capture_screenshots": options.capture_screenshots,
    });

    if options.capture_screenshots
        && let Some(map) = relevant.as_object_mut()
    {
        map.insert("screenshot_width".into(), options.screenshot_width.into());
        map.insert("screenshot_height".into(), options.screenshot_height.into());
        map.insert("screenshot_wait_for".into(), options.screenshot_wait_for.into());
    }

    let signature = serde_json::json!({ "url": normalized_url, "options": relevant });

    let mut hasher = Sha256::new();
    hasher.update(signature.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

/// Normalize a URL string for cache-key purposes.
///
/// Lowercases, trims, and strips the trailing slash (except for the bare
/// scheme://host form where the slash count says there is no path).
fn normalize_url(url: &str) -> String {
    let mut s = url.trim().to_lowercase();
    if s.ends_with('/') && s.matches('/').count() >= 3 {
        s.truncate(s.trim_end_matches('/').len());
    }
    s
}
