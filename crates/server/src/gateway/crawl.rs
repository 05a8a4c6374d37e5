//! Bounded-concurrency batch crawl orchestration.
//!
//! Each URL in a batch is an isolated unit of work: it resolves from the
//! cache, crawls under a semaphore permit with a per-item deadline, or
//! fails in-band without disturbing its siblings. Results are reassembled
//! in input order regardless of completion order.
//!
//! With link following enabled, the batch becomes a breadth-first crawl:
//! each depth level runs as one concurrent wave under the same gate, and
//! discovered links feed the next level until `max_depth` or `max_pages`
//! is reached. A normalized-URL set guarantees each page is crawled at
//! most once per batch, fragments and trailing slashes included.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use waypost_client::screenshot::probe_png_dimensions;
use waypost_client::{CrawlBackend, RawCrawl, canonicalize};
use waypost_core::cache::key::crawl_cache_key;
use waypost_core::models::{
    BatchCrawlResponse, CacheMode, CrawlOptions, CrawlResult, ScreenshotSize,
};
use waypost_core::{Error, TtlCache};

/// Link-following policy for a batch.
///
/// Excluded from the cache key on purpose: following changes which pages
/// get crawled, not what any one page's result looks like.
#[derive(Debug, Clone)]
pub struct FollowOptions {
    /// Follow discovered same-host links.
    pub internal: bool,
    /// Follow discovered cross-host links.
    pub external: bool,
    /// Maximum crawl depth; 1 means seeds only.
    pub max_depth: u32,
    /// Cap on total pages crawled across all depths.
    pub max_pages: usize,
}

impl Default for FollowOptions {
    fn default() -> Self {
        Self { internal: false, external: false, max_depth: 1, max_pages: 10 }
    }
}

impl FollowOptions {
    pub fn is_enabled(&self) -> bool {
        self.internal || self.external
    }
}

/// One batch as the tool layer hands it down, already count-validated.
#[derive(Debug, Clone)]
pub struct BatchCrawlRequest {
    pub urls: Vec<String>,
    pub options: CrawlOptions,
    pub cache_mode: CacheMode,
    pub follow: FollowOptions,
}

pub struct CrawlOrchestrator {
    cache: TtlCache<CrawlResult>,
    backend: Arc<dyn CrawlBackend>,
    gate: Arc<Semaphore>,
    max_concurrent: usize,
    item_deadline: Duration,
}

impl CrawlOrchestrator {
    pub fn new(
        cache_ttl: Duration,
        max_concurrent: usize,
        item_deadline: Duration,
        backend: Arc<dyn CrawlBackend>,
    ) -> Self {
        Self {
            cache: TtlCache::new(cache_ttl),
            backend,
            gate: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            item_deadline,
        }
    }

    /// Run a batch. Per-item failures (bad URL, upstream error, deadline)
    /// land in-band as failed items; only an empty batch is an error.
    pub async fn crawl_batch(&self, request: BatchCrawlRequest) -> Result<BatchCrawlResponse, Error> {
        if request.urls.is_empty() {
            return Err(Error::Validation("url list cannot be empty".into()));
        }

        let started = Instant::now();
        let (results, cached_results) = if request.follow.is_enabled() {
            self.crawl_following(&request).await
        } else {
            self.crawl_flat(&request).await
        };

        let response =
            BatchCrawlResponse::from_results(results, cached_results, started.elapsed().as_secs_f64());
        tracing::info!(
            total = response.total_urls,
            ok = response.successful_crawls,
            failed = response.failed_crawls,
            cached = response.cached_results,
            elapsed_s = response.total_time_seconds,
            "batch crawl complete"
        );
        Ok(response)
    }

    /// Seed URLs only, results in input order.
    async fn crawl_flat(&self, request: &BatchCrawlRequest) -> (Vec<CrawlResult>, usize) {
        let total = request.urls.len();
        let mut slots: Vec<Option<CrawlResult>> = vec![None; total];
        let mut items: Vec<(usize, String)> = Vec::new();

        for (idx, raw_url) in request.urls.iter().enumerate() {
            match canonicalize(raw_url) {
                Ok(parsed) => items.push((idx, display_url(&parsed))),
                Err(e) => {
                    tracing::debug!(url = raw_url, error = %e, "rejecting batch item");
                    slots[idx] = Some(CrawlResult::failed(raw_url.clone(), e.to_string(), 0.0));
                }
            }
        }

        let level: Vec<(String, u32)> = items.iter().map(|(_, url)| (url.clone(), 0)).collect();
        let (level_results, cached) = self.run_level(&level, &request.options, request.cache_mode).await;
        for ((idx, _), result) in items.into_iter().zip(level_results) {
            slots[idx] = Some(result);
        }

        let results = slots
            .into_iter()
            .enumerate()
            .map(|(idx, slot)| {
                slot.unwrap_or_else(|| {
                    CrawlResult::failed(
                        request.urls[idx].clone(),
                        "crawl task was cancelled before completing",
                        0.0,
                    )
                })
            })
            .collect();
        (results, cached)
    }

    /// Breadth-first crawl from the seeds, one concurrent wave per depth.
    async fn crawl_following(&self, request: &BatchCrawlRequest) -> (Vec<CrawlResult>, usize) {
        let follow = &request.follow;
        let mut results: Vec<CrawlResult> = Vec::new();
        let mut cached_total = 0usize;
        let mut seen: HashSet<String> = HashSet::new();
        // (page url, followable base host, depth)
        let mut frontier: Vec<(String, String, u32)> = Vec::new();

        for raw_url in &request.urls {
            match canonicalize(raw_url) {
                Ok(parsed) => {
                    if seen.insert(dedup_key(&parsed)) {
                        let host = parsed.host_str().unwrap_or_default().to_string();
                        frontier.push((display_url(&parsed), host, 0));
                    }
                }
                Err(e) => {
                    results.push(CrawlResult::failed(raw_url.clone(), e.to_string(), 0.0));
                }
            }
        }

        while !frontier.is_empty() && results.len() < follow.max_pages {
            let budget = follow.max_pages - results.len();
            let level: Vec<(String, String, u32)> =
                frontier.drain(..).take(budget).collect();

            let items: Vec<(String, u32)> =
                level.iter().map(|(url, _, depth)| (url.clone(), *depth)).collect();
            let (level_results, cached) =
                self.run_level(&items, &request.options, request.cache_mode).await;
            cached_total += cached;

            for ((url, base_host, depth), result) in level.iter().zip(&level_results) {
                if result.success && depth + 1 < follow.max_depth {
                    discover_links(url, base_host, *depth, result, follow, &mut seen, &mut frontier);
                }
            }
            results.extend(level_results);
        }

        (results, cached_total)
    }

    /// Crawl one wave of (url, depth) items concurrently, cache-aside per
    /// item, returning results in item order plus the cache-hit count.
    async fn run_level(
        &self,
        items: &[(String, u32)],
        options: &CrawlOptions,
        cache_mode: CacheMode,
    ) -> (Vec<CrawlResult>, usize) {
        let mut slots: Vec<Option<CrawlResult>> = vec![None; items.len()];
        let mut keys: Vec<Option<String>> = vec![None; items.len()];
        let mut cached = 0usize;
        let mut tasks: JoinSet<(usize, CrawlResult)> = JoinSet::new();

        for (idx, (url, depth)) in items.iter().enumerate() {
            if cache_mode != CacheMode::Disabled {
                let key = crawl_cache_key(url, options);
                if cache_mode == CacheMode::Enabled
                    && let Some(mut hit) = self.cache.get(&key)
                {
                    tracing::debug!(url, "crawl cache hit");
                    hit.depth = *depth;
                    slots[idx] = Some(hit);
                    cached += 1;
                    continue;
                }
                keys[idx] = Some(key);
            }

            let backend = self.backend.clone();
            let gate = self.gate.clone();
            let task_options = options.clone();
            let task_url = url.clone();
            let depth = *depth;
            let deadline = self.item_deadline;
            tasks.spawn(async move {
                let mut result = crawl_one(backend, gate, &task_url, &task_options, deadline).await;
                result.depth = depth;
                (idx, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, result)) => {
                    if result.success
                        && cache_mode != CacheMode::Disabled
                        && let Some(key) = &keys[idx]
                    {
                        self.cache.set(key, result.clone());
                    }
                    slots[idx] = Some(result);
                }
                Err(e) => {
                    // The slot stays empty and is filled below; we no
                    // longer know which item this was.
                    tracing::warn!(error = %e, "crawl task did not complete");
                }
            }
        }

        let results = slots
            .into_iter()
            .enumerate()
            .map(|(idx, slot)| {
                slot.unwrap_or_else(|| {
                    CrawlResult::failed(
                        items[idx].0.clone(),
                        "crawl task was cancelled before completing",
                        0.0,
                    )
                })
            })
            .collect();
        (results, cached)
    }

    pub fn clear_cache(&self) -> usize {
        self.cache.clear()
    }

    /// Drop every cached result for one URL regardless of the option set
    /// it was crawled under.
    pub fn invalidate_url(&self, url: &str) -> Result<usize, Error> {
        let parsed = canonicalize(url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let target = dedup_key(&parsed);
        let removed = self.cache.remove_where(|result| result.url.to_lowercase() == target);
        tracing::info!(url = %parsed, removed, "invalidated crawl cache entries");
        Ok(removed)
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache.default_ttl()
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrent
    }

    pub async fn backend_healthy(&self) -> bool {
        self.backend.health().await
    }
}

/// Crawl one URL under a semaphore permit and a wall-clock deadline.
/// Never propagates an error; every failure mode becomes an in-band item.
async fn crawl_one(
    backend: Arc<dyn CrawlBackend>,
    gate: Arc<Semaphore>,
    url: &str,
    options: &CrawlOptions,
    deadline: Duration,
) -> CrawlResult {
    let started = Instant::now();
    let Ok(_permit) = gate.acquire_owned().await else {
        return CrawlResult::failed(url, "admission gate closed", started.elapsed().as_secs_f64());
    };

    let outcome = tokio::time::timeout(deadline, backend.crawl(url, options)).await;
    let elapsed = started.elapsed().as_secs_f64();

    match outcome {
        Err(_) => CrawlResult::failed(
            url,
            format!("crawl exceeded {}ms deadline", deadline.as_millis()),
            elapsed,
        ),
        Ok(Err(e)) => {
            tracing::debug!(url, error = %e, "crawl failed");
            CrawlResult::failed(url, e.to_string(), elapsed)
        }
        Ok(Ok(raw)) => shape_result(url, raw, options, elapsed),
    }
}

/// Fold the raw crawler payload into the response item shape, honoring
/// the option set. A non-200 status is a failure with the status kept.
fn shape_result(url: &str, raw: RawCrawl, options: &CrawlOptions, elapsed: f64) -> CrawlResult {
    match raw.status_code {
        Some(200) => {}
        Some(status) => {
            let mut item = CrawlResult::failed(url, format!("HTTP {status}"), elapsed);
            item.status_code = Some(status);
            return item;
        }
        None => {
            return CrawlResult::failed(url, "crawler response missing status code", elapsed);
        }
    }

    let screenshot_size = if options.capture_screenshots {
        raw.screenshot_base64.as_deref().map(|data| {
            probe_png_dimensions(data).unwrap_or(ScreenshotSize {
                width: options.screenshot_width,
                height: options.screenshot_height,
            })
        })
    } else {
        None
    };

    let mut item = CrawlResult {
        url: url.to_string(),
        success: true,
        markdown: Some(raw.markdown.unwrap_or_default()),
        cleaned_html: raw.cleaned_html,
        metadata: raw.metadata,
        internal_links: raw.internal_links,
        external_links: raw.external_links,
        screenshot_base64: if options.capture_screenshots {
            raw.screenshot_base64
        } else {
            None
        },
        screenshot_size,
        status_code: Some(200),
        crawl_time_seconds: Some(elapsed),
        depth: 0,
        error_message: None,
    };

    if options.markdown_only {
        item.strip_to_markdown();
    }
    item
}

/// Enqueue the links a page discovered, deduplicated and host-filtered.
/// Internal links stay on the followable base host; an external hop makes
/// the new host the base for links found beneath it.
fn discover_links(
    page_url: &str,
    base_host: &str,
    depth: u32,
    result: &CrawlResult,
    follow: &FollowOptions,
    seen: &mut HashSet<String>,
    frontier: &mut Vec<(String, String, u32)>,
) {
    if follow.internal && let Some(links) = &result.internal_links {
        for link in links {
            let Some(joined) = absolutize(page_url, link) else { continue };
            if joined.host_str() != Some(base_host) {
                continue;
            }
            if seen.insert(dedup_key(&joined)) {
                frontier.push((display_url(&joined), base_host.to_string(), depth + 1));
            }
        }
    }

    if follow.external && let Some(links) = &result.external_links {
        for link in links {
            let Some(joined) = absolutize(page_url, link) else { continue };
            let Some(host) = joined.host_str() else { continue };
            if host == base_host {
                continue;
            }
            let host = host.to_string();
            if seen.insert(dedup_key(&joined)) {
                frontier.push((display_url(&joined), host, depth + 1));
            }
        }
    }
}

/// Resolve a discovered href against the page it was found on, keeping
/// only fragment-free http(s) targets.
fn absolutize(page_url: &str, link: &str) -> Option<url::Url> {
    let base = url::Url::parse(page_url).ok()?;
    let mut joined = base.join(link).ok()?;
    if !matches!(joined.scheme(), "http" | "https") {
        return None;
    }
    joined.set_fragment(None);
    Some(joined)
}

/// Case-folded form of a URL used for within-batch deduplication.
fn dedup_key(url: &url::Url) -> String {
    display_url(url).to_lowercase()
}

/// Canonical URL rendered for responses, with the bare-root trailing
/// slash dropped so "https://example.com" round-trips unchanged.
fn display_url(url: &url::Url) -> String {
    let s = url.to_string();
    if s.ends_with('/') && s.matches('/').count() == 3 {
        s[..s.len() - 1].to_string()
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use base64::Engine;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use waypost_client::ClientError;

    #[derive(Default)]
    struct MockCrawler {
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        peak_in_flight: AtomicUsize,
        delay: Duration,
        screenshot_base64: Option<String>,
    }

    impl MockCrawler {
        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CrawlBackend for MockCrawler {
        async fn crawl(&self, url: &str, options: &CrawlOptions) -> Result<RawCrawl, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if url.contains("bad.invalid") {
                return Err(ClientError::TaskFailed("dns failure".into()));
            }
            if url.contains("/teapot") {
                return Ok(RawCrawl { status_code: Some(418), ..Default::default() });
            }

            // A "/hub" page links to two same-host pages (one with a
            // fragment duplicate) and one cross-host page.
            let internal = if options.scrape_internal_links && url.contains("/hub") {
                Some(vec!["/a".to_string(), "/b".to_string(), "/a#section".to_string()])
            } else if options.scrape_internal_links {
                Some(vec![])
            } else {
                None
            };
            let external = if options.scrape_external_links && url.contains("/hub") {
                Some(vec!["https://other.test/x".to_string()])
            } else if options.scrape_external_links {
                Some(vec![])
            } else {
                None
            };

            Ok(RawCrawl {
                status_code: Some(200),
                markdown: Some(format!("# Page at {url}")),
                cleaned_html: Some("<p>Page</p>".into()),
                metadata: Some(serde_json::json!({"title": "Page"})),
                internal_links: internal,
                external_links: external,
                screenshot_base64: self.screenshot_base64.clone(),
            })
        }

        async fn health(&self) -> bool {
            true
        }
    }

    fn orchestrator(backend: Arc<MockCrawler>) -> CrawlOrchestrator {
        CrawlOrchestrator::new(Duration::from_secs(3600), 4, Duration::from_secs(5), backend)
    }

    fn request(urls: &[&str]) -> BatchCrawlRequest {
        BatchCrawlRequest {
            urls: urls.iter().map(|s| s.to_string()).collect(),
            options: CrawlOptions::default(),
            cache_mode: CacheMode::Enabled,
            follow: FollowOptions::default(),
        }
    }

    fn following_request(urls: &[&str], follow: FollowOptions) -> BatchCrawlRequest {
        BatchCrawlRequest {
            urls: urls.iter().map(|s| s.to_string()).collect(),
            options: CrawlOptions {
                scrape_internal_links: true,
                scrape_external_links: true,
                ..Default::default()
            },
            cache_mode: CacheMode::Enabled,
            follow,
        }
    }

    #[tokio::test]
    async fn batch_preserves_input_order_and_tallies() {
        let backend = Arc::new(MockCrawler::default());
        let orch = orchestrator(backend);

        let response = orch
            .crawl_batch(request(&[
                "https://a.test",
                "https://bad.invalid/x",
                "https://b.test/page",
            ]))
            .await
            .unwrap();

        assert_eq!(response.total_urls, 3);
        assert_eq!(response.successful_crawls, 2);
        assert_eq!(response.failed_crawls, 1);
        assert_eq!(response.cached_results, 0);
        assert_eq!(response.results[0].url, "https://a.test");
        assert_eq!(response.results[1].url, "https://bad.invalid/x");
        assert!(!response.results[1].success);
        assert!(response.results[1].error_message.as_deref().unwrap().contains("dns failure"));
        assert_eq!(response.results[2].url, "https://b.test/page");
        assert!(response.results.iter().all(|r| r.depth == 0));
    }

    #[tokio::test]
    async fn empty_batch_is_rejected() {
        let orch = orchestrator(Arc::new(MockCrawler::default()));
        assert!(matches!(orch.crawl_batch(request(&[])).await, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn repeat_batch_serves_from_cache() {
        let backend = Arc::new(MockCrawler::default());
        let orch = orchestrator(backend.clone());

        let first = orch.crawl_batch(request(&["https://a.test"])).await.unwrap();
        assert_eq!(first.cached_results, 0);

        let second = orch.crawl_batch(request(&["https://a.test"])).await.unwrap();
        assert_eq!(second.cached_results, 1);
        assert!(second.results[0].success);
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn bypass_refetches_but_still_stores() {
        let backend = Arc::new(MockCrawler::default());
        let orch = orchestrator(backend.clone());

        orch.crawl_batch(request(&["https://a.test"])).await.unwrap();

        let mut bypass = request(&["https://a.test"]);
        bypass.cache_mode = CacheMode::Bypass;
        let response = orch.crawl_batch(bypass).await.unwrap();
        assert_eq!(response.cached_results, 0);
        assert_eq!(backend.call_count(), 2);

        // The bypass run refreshed the entry, so an enabled run hits it.
        let third = orch.crawl_batch(request(&["https://a.test"])).await.unwrap();
        assert_eq!(third.cached_results, 1);
        assert_eq!(backend.call_count(), 2);
    }

    #[tokio::test]
    async fn disabled_mode_never_touches_the_cache() {
        let backend = Arc::new(MockCrawler::default());
        let orch = orchestrator(backend.clone());

        let mut disabled = request(&["https://a.test"]);
        disabled.cache_mode = CacheMode::Disabled;
        orch.crawl_batch(disabled).await.unwrap();
        assert_eq!(orch.cache_len(), 0);

        orch.crawl_batch(request(&["https://a.test"])).await.unwrap();
        assert_eq!(backend.call_count(), 2);
    }

    #[tokio::test]
    async fn failed_crawls_are_not_cached() {
        let backend = Arc::new(MockCrawler::default());
        let orch = orchestrator(backend.clone());

        orch.crawl_batch(request(&["https://bad.invalid/x"])).await.unwrap();
        assert_eq!(orch.cache_len(), 0);

        orch.crawl_batch(request(&["https://bad.invalid/x"])).await.unwrap();
        assert_eq!(backend.call_count(), 2);
    }

    #[tokio::test]
    async fn invalid_url_fails_in_band_without_reaching_backend() {
        let backend = Arc::new(MockCrawler::default());
        let orch = orchestrator(backend.clone());

        let response = orch
            .crawl_batch(request(&["not a url", "https://a.test"]))
            .await
            .unwrap();

        assert!(!response.results[0].success);
        assert!(response.results[0].error_message.is_some());
        assert!(response.results[1].success);
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn non_200_status_is_a_failure_with_status_kept() {
        let orch = orchestrator(Arc::new(MockCrawler::default()));
        let response = orch.crawl_batch(request(&["https://a.test/teapot"])).await.unwrap();

        let item = &response.results[0];
        assert!(!item.success);
        assert_eq!(item.status_code, Some(418));
        assert_eq!(item.error_message.as_deref(), Some("HTTP 418"));
    }

    #[tokio::test]
    async fn concurrency_stays_within_the_gate() {
        let backend = Arc::new(MockCrawler {
            delay: Duration::from_millis(30),
            ..Default::default()
        });
        let orch = CrawlOrchestrator::new(
            Duration::from_secs(3600),
            2,
            Duration::from_secs(5),
            backend.clone(),
        );

        let urls: Vec<String> = (0..6).map(|i| format!("https://site{i}.test")).collect();
        let refs: Vec<&str> = urls.iter().map(String::as_str).collect();
        orch.crawl_batch(request(&refs)).await.unwrap();

        assert_eq!(backend.call_count(), 6);
        assert!(backend.peak_in_flight.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn slow_item_hits_deadline_without_stalling_siblings() {
        let backend = Arc::new(MockCrawler {
            delay: Duration::from_millis(200),
            ..Default::default()
        });
        let orch = CrawlOrchestrator::new(
            Duration::from_secs(3600),
            4,
            Duration::from_millis(50),
            backend,
        );

        let response = orch.crawl_batch(request(&["https://slow.test"])).await.unwrap();
        let item = &response.results[0];
        assert!(!item.success);
        // Sub-second deadlines must not be reported as "0s".
        assert!(item.error_message.as_deref().unwrap().contains("50ms deadline"));
    }

    #[tokio::test]
    async fn markdown_only_nulls_extra_content() {
        let orch = orchestrator(Arc::new(MockCrawler::default()));
        let mut req = request(&["https://a.test"]);
        req.options.markdown_only = true;

        let response = orch.crawl_batch(req).await.unwrap();
        let item = &response.results[0];
        assert!(item.success);
        assert!(item.markdown.is_some());
        assert!(item.cleaned_html.is_none());
        assert!(item.metadata.is_none());
        assert!(item.internal_links.is_none());
    }

    #[tokio::test]
    async fn screenshot_size_falls_back_to_requested_viewport() {
        let backend = Arc::new(MockCrawler {
            // Not a decodable PNG, so the probe fails.
            screenshot_base64: Some(base64::engine::general_purpose::STANDARD.encode(b"nope")),
            ..Default::default()
        });
        let orch = orchestrator(backend);

        let mut req = request(&["https://a.test"]);
        req.options.capture_screenshots = true;
        req.options.screenshot_width = 800;
        req.options.screenshot_height = 600;

        let response = orch.crawl_batch(req).await.unwrap();
        let item = &response.results[0];
        assert!(item.screenshot_base64.is_some());
        assert_eq!(item.screenshot_size, Some(ScreenshotSize { width: 800, height: 600 }));
    }

    #[tokio::test]
    async fn following_internal_links_crawls_discovered_pages_once() {
        let backend = Arc::new(MockCrawler::default());
        let orch = orchestrator(backend.clone());

        let follow = FollowOptions { internal: true, max_depth: 2, ..Default::default() };
        let response = orch
            .crawl_batch(following_request(&["https://a.test/hub"], follow))
            .await
            .unwrap();

        // Seed plus /a and /b; the /a#section duplicate collapses.
        assert_eq!(response.total_urls, 3);
        assert_eq!(backend.call_count(), 3);
        assert_eq!(response.results[0].url, "https://a.test/hub");
        assert_eq!(response.results[0].depth, 0);
        let discovered: Vec<_> =
            response.results[1..].iter().map(|r| (r.url.as_str(), r.depth)).collect();
        assert!(discovered.contains(&("https://a.test/a", 1)));
        assert!(discovered.contains(&("https://a.test/b", 1)));
        // The cross-host link is not followed without the external flag.
        assert!(response.results.iter().all(|r| !r.url.contains("other.test")));
    }

    #[tokio::test]
    async fn max_depth_one_crawls_seeds_only() {
        let backend = Arc::new(MockCrawler::default());
        let orch = orchestrator(backend.clone());

        let follow = FollowOptions { internal: true, max_depth: 1, ..Default::default() };
        let response = orch
            .crawl_batch(following_request(&["https://a.test/hub"], follow))
            .await
            .unwrap();

        assert_eq!(response.total_urls, 1);
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn max_pages_caps_the_whole_crawl() {
        let backend = Arc::new(MockCrawler::default());
        let orch = orchestrator(backend.clone());

        let follow =
            FollowOptions { internal: true, max_depth: 3, max_pages: 2, ..Default::default() };
        let response = orch
            .crawl_batch(following_request(&["https://a.test/hub"], follow))
            .await
            .unwrap();

        assert_eq!(response.total_urls, 2);
        assert_eq!(backend.call_count(), 2);
    }

    #[tokio::test]
    async fn following_external_links_hops_hosts() {
        let backend = Arc::new(MockCrawler::default());
        let orch = orchestrator(backend.clone());

        let follow = FollowOptions {
            internal: false,
            external: true,
            max_depth: 2,
            ..Default::default()
        };
        let response = orch
            .crawl_batch(following_request(&["https://a.test/hub"], follow))
            .await
            .unwrap();

        // Seed plus the one cross-host link; internal links are ignored.
        assert_eq!(response.total_urls, 2);
        let hop = &response.results[1];
        assert_eq!(hop.url, "https://other.test/x");
        assert_eq!(hop.depth, 1);
    }

    #[tokio::test]
    async fn following_serves_discovered_pages_from_cache() {
        let backend = Arc::new(MockCrawler::default());
        let orch = orchestrator(backend.clone());

        let follow = FollowOptions { internal: true, max_depth: 2, ..Default::default() };
        orch.crawl_batch(following_request(&["https://a.test/hub"], follow.clone()))
            .await
            .unwrap();
        assert_eq!(backend.call_count(), 3);

        let second = orch
            .crawl_batch(following_request(&["https://a.test/hub"], follow))
            .await
            .unwrap();
        // All three pages, seed links included, resolve from the cache.
        assert_eq!(second.total_urls, 3);
        assert_eq!(second.cached_results, 3);
        assert_eq!(backend.call_count(), 3);
    }

    #[tokio::test]
    async fn invalidate_url_drops_all_option_variants() {
        let backend = Arc::new(MockCrawler::default());
        let orch = orchestrator(backend.clone());

        orch.crawl_batch(request(&["https://a.test/page"])).await.unwrap();
        let mut markdown = request(&["https://a.test/page"]);
        markdown.options.markdown_only = true;
        orch.crawl_batch(markdown).await.unwrap();
        orch.crawl_batch(request(&["https://b.test"])).await.unwrap();
        assert_eq!(orch.cache_len(), 3);

        assert_eq!(orch.invalidate_url("https://a.test/page").unwrap(), 2);
        assert_eq!(orch.cache_len(), 1);
        assert_eq!(orch.invalidate_url("https://a.test/page").unwrap(), 0);

        orch.crawl_batch(request(&["https://a.test/page"])).await.unwrap();
        assert_eq!(backend.call_count(), 4);
    }

    #[tokio::test]
    async fn invalidate_rejects_malformed_urls() {
        let orch = orchestrator(Arc::new(MockCrawler::default()));
        assert!(matches!(orch.invalidate_url("not a url"), Err(Error::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn clear_cache_is_idempotent() {
        let orch = orchestrator(Arc::new(MockCrawler::default()));
        orch.crawl_batch(request(&["https://a.test"])).await.unwrap();

        assert_eq!(orch.clear_cache(), 1);
        assert_eq!(orch.clear_cache(), 0);
    }

    #[test]
    fn display_url_strips_only_bare_root_slash() {
        let root = canonicalize("https://example.com").unwrap();
        assert_eq!(display_url(&root), "https://example.com");

        let page = canonicalize("https://example.com/page/").unwrap();
        assert_eq!(display_url(&page), "https://example.com/page/");
    }
}
