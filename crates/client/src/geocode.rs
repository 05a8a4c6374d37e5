//! HTTP geocoding client (Nominatim-style search API).
//!
//! ### Upstream policy
//!
//! - A User-Agent header is mandatory.
//! - Callers are expected to rate-limit and cache; both live in the
//!   gateway, not here.

use crate::backend::{GeocodeBackend, RawPlace};
use crate::error::ClientError;
use async_trait::async_trait;
use reqwest::header;
use std::time::{Duration, Instant};

/// Geocoder client configuration.
#[derive(Debug, Clone)]
pub struct GeocoderConfig {
    /// Base URL of the search API.
    pub base_url: String,
    /// User-agent string; required by the upstream's usage policy.
    pub user_agent: String,
    /// Request timeout (default: 10s).
    pub timeout: Duration,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: "waypost/0.1".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// HTTP client for the geocoding upstream.
#[derive(Debug, Clone)]
pub struct GeocoderClient {
    http: reqwest::Client,
    config: GeocoderConfig,
}

impl GeocoderClient {
    /// Create a new geocoder client with the given configuration.
    pub fn new(config: GeocoderConfig) -> Result<Self, ClientError> {
        if config.user_agent.is_empty() {
            return Err(ClientError::Build("user_agent must not be empty".into()));
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;

        Ok(Self { http, config })
    }
}

#[async_trait]
impl GeocodeBackend for GeocoderClient {
    async fn geocode(&self, query: &str) -> Result<Vec<RawPlace>, ClientError> {
        let url = format!("{}/search", self.config.base_url.trim_end_matches('/'));
        let start = Instant::now();

        tracing::debug!(query, "calling geocoding upstream");

        let response = self
            .http
            .get(&url)
            .header(header::USER_AGENT, &self.config.user_agent)
            .header(header::ACCEPT, "application/json")
            .query(&[
                ("q", query),
                ("format", "json"),
                ("addressdetails", "1"),
                // Multiple candidates so the first result is the most relevant.
                ("limit", "5"),
                ("accept-language", "en"),
            ])
            .send()
            .await
            .map_err(ClientError::from)?;

        let status = response.status();
        tracing::debug!(status = status.as_u16(), "geocoding upstream response");

        if status == 401 || status == 403 {
            return Err(ClientError::AuthFailed);
        }
        if status.is_client_error() || status.is_server_error() {
            return Err(ClientError::HttpStatus { status: status.as_u16() });
        }

        let bytes = response.bytes().await.map_err(ClientError::from)?;
        let places: Vec<RawPlace> =
            serde_json::from_slice(&bytes).map_err(|e| ClientError::Parse(e.to_string()))?;

        tracing::debug!(
            query,
            results = places.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "geocoding completed"
        );

        Ok(places)
    }
}
