//! HTTP crawler client (submit-and-poll task API).
//!
//! The crawler upstream is asynchronous: POST `/crawl` returns a task id,
//! and the task is polled at `/task/{id}` until it completes or fails.
//! The first task result is normalized into [`RawCrawl`]; shaping it into
//! the gateway's response envelope happens in the orchestrator.

use crate::backend::{CrawlBackend, RawCrawl};
use crate::error::ClientError;
use async_trait::async_trait;
use reqwest::header;
use serde::Deserialize;
use std::time::Duration;
use waypost_core::models::CrawlOptions;

/// Crawler client configuration.
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// Base URL of the crawler service.
    pub base_url: String,
    /// Optional bearer token.
    pub api_token: Option<String>,
    /// User-agent string.
    pub user_agent: String,
    /// Per-request HTTP timeout (default: 30s).
    pub timeout: Duration,
    /// Interval between task status polls (default: 1s).
    pub poll_interval: Duration,
    /// Maximum status polls before the task is abandoned (default: 30).
    pub max_polls: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11235".to_string(),
            api_token: None,
            user_agent: "waypost/0.1".to_string(),
            timeout: Duration::from_secs(30),
            poll_interval: Duration::from_secs(1),
            max_polls: 30,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    task_id: String,
}

#[derive(Debug, Deserialize)]
struct TaskResponse {
    status: String,
    #[serde(default)]
    results: Vec<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

/// HTTP client for the crawler upstream.
#[derive(Debug, Clone)]
pub struct CrawlerClient {
    http: reqwest::Client,
    config: CrawlerConfig,
}

impl CrawlerClient {
    /// Create a new crawler client with the given configuration.
    pub fn new(config: CrawlerConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;

        Ok(Self { http, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_token {
            Some(token) => req.header(header::AUTHORIZATION, format!("Bearer {token}")),
            None => req,
        }
    }

    /// Build the submit payload for one URL under the given options.
    fn build_payload(url: &str, options: &CrawlOptions) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        map.insert("urls".into(), serde_json::json!([url]));

        if options.capture_screenshots {
            map.insert("screenshot".into(), true.into());
            map.insert(
                "screenshot_options".into(),
                serde_json::json!({
                    "width": options.screenshot_width,
                    "height": options.screenshot_height,
                    "wait_for": options.screenshot_wait_for,
                    "format": "png",
                    "full_page": false,
                }),
            );
        }

        if options.scrape_internal_links || options.scrape_external_links {
            map.insert("extract_links".into(), true.into());
            let mut link_types = Vec::new();
            if options.scrape_internal_links {
                link_types.push("internal");
            }
            if options.scrape_external_links {
                link_types.push("external");
            }
            map.insert("link_types".into(), serde_json::json!(link_types));
        }

        serde_json::Value::Object(map)
    }

    async fn submit(&self, url: &str, options: &CrawlOptions) -> Result<String, ClientError> {
        let request = self
            .authorize(self.http.post(self.endpoint("crawl")))
            .json(&Self::build_payload(url, options));

        let response = request.send().await.map_err(ClientError::from)?;
        let status = response.status();

        if status == 401 || status == 403 {
            return Err(ClientError::AuthFailed);
        }
        if status.is_client_error() || status.is_server_error() {
            return Err(ClientError::HttpStatus { status: status.as_u16() });
        }

        let submit: SubmitResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Parse(format!("submit response: {e}")))?;

        tracing::debug!(url, task_id = %submit.task_id, "crawl task submitted");
        Ok(submit.task_id)
    }

    async fn poll_until_complete(&self, task_id: &str) -> Result<TaskResponse, ClientError> {
        for _ in 0..self.config.max_polls {
            tokio::time::sleep(self.config.poll_interval).await;

            let response = self
                .authorize(self.http.get(self.endpoint(&format!("task/{task_id}"))))
                .send()
                .await
                .map_err(ClientError::from)?;

            let status = response.status();
            if status.is_client_error() || status.is_server_error() {
                return Err(ClientError::HttpStatus { status: status.as_u16() });
            }

            let task: TaskResponse = response
                .json()
                .await
                .map_err(|e| ClientError::Parse(format!("task response: {e}")))?;

            match task.status.as_str() {
                "completed" => return Ok(task),
                "failed" => {
                    let reason = task.error.unwrap_or_else(|| "unknown error".to_string());
                    return Err(ClientError::TaskFailed(reason));
                }
                "pending" | "running" | "processing" => continue,
                other => return Err(ClientError::Parse(format!("unknown task status: {other}"))),
            }
        }

        Err(ClientError::TaskTimeout(format!(
            "task {task_id} still incomplete after {} polls",
            self.config.max_polls
        )))
    }

    /// Normalize the first task result into a [`RawCrawl`].
    ///
    /// The upstream serializes markdown either as a plain string or as an
    /// object carrying `raw_markdown`; link lists arrive as objects with
    /// an `href` field.
    fn normalize_result(result: &serde_json::Value, options: &CrawlOptions) -> RawCrawl {
        let markdown = match result.get("markdown") {
            Some(serde_json::Value::Object(map)) => map
                .get("raw_markdown")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string()),
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            _ => None,
        };

        let links = result.get("links");
        let hrefs = |kind: &str| -> Option<Vec<String>> {
            links.and_then(|l| l.get(kind)).and_then(|v| v.as_array()).map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.get("href").and_then(|h| h.as_str()))
                    .filter(|href| !href.is_empty())
                    .map(|href| href.to_string())
                    .collect()
            })
        };

        RawCrawl {
            status_code: result
                .get("status_code")
                .and_then(|v| v.as_u64())
                .map(|s| s as u16),
            markdown,
            cleaned_html: result
                .get("cleaned_html")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string()),
            metadata: result.get("metadata").cloned().filter(|v| !v.is_null()),
            internal_links: if options.scrape_internal_links { hrefs("internal") } else { None },
            external_links: if options.scrape_external_links { hrefs("external") } else { None },
            screenshot_base64: if options.capture_screenshots {
                result
                    .get("screenshot")
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string())
            } else {
                None
            },
        }
    }
}

#[async_trait]
impl CrawlBackend for CrawlerClient {
    async fn crawl(&self, url: &str, options: &CrawlOptions) -> Result<RawCrawl, ClientError> {
        let task_id = self.submit(url, options).await?;
        let task = self.poll_until_complete(&task_id).await?;

        let first = task
            .results
            .first()
            .ok_or_else(|| ClientError::Parse("no results in task response".to_string()))?;

        Ok(Self::normalize_result(first, options))
    }

    async fn health(&self) -> bool {
        let request = self.authorize(self.http.get(self.endpoint("health")));
        match request.send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::warn!(error = %e, "crawler health probe failed");
                false
            }
        }
    }
}
