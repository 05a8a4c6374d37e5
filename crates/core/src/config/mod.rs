//! Application configuration with layered loading.
//!
//! Loading precedence (highest wins):
//! 1. Environment variables (WAYPOST_*)
//! 2. TOML config file (if WAYPOST_CONFIG_FILE set)
//! 3. Built-in defaults

use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Gateway configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the geocoding upstream.
    ///
    /// Set via WAYPOST_GEOCODER_BASE_URL.
    #[serde(default = "default_geocoder_base_url")]
    pub geocoder_base_url: String,

    /// Base URL of the crawler upstream.
    ///
    /// Set via WAYPOST_CRAWLER_BASE_URL.
    #[serde(default = "default_crawler_base_url")]
    pub crawler_base_url: String,

    /// Optional bearer token for the crawler upstream.
    ///
    /// Set via WAYPOST_CRAWLER_API_TOKEN.
    #[serde(default)]
    pub crawler_api_token: Option<String>,

    /// User-Agent string sent to both upstreams. The geocoding provider's
    /// usage policy makes this mandatory.
    ///
    /// Set via WAYPOST_USER_AGENT.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// TTL for cached geocoding results, in hours.
    ///
    /// Set via WAYPOST_GEOCODE_CACHE_TTL_HOURS.
    #[serde(default = "default_geocode_cache_ttl_hours")]
    pub geocode_cache_ttl_hours: u64,

    /// TTL for cached crawl results, in hours.
    ///
    /// Set via WAYPOST_CRAWL_CACHE_TTL_HOURS.
    #[serde(default = "default_crawl_cache_ttl_hours")]
    pub crawl_cache_ttl_hours: u64,

    /// Minimum interval between geocoding dispatches, in milliseconds.
    ///
    /// Set via WAYPOST_GEOCODE_MIN_INTERVAL_MS.
    #[serde(default = "default_geocode_min_interval_ms")]
    pub geocode_min_interval_ms: u64,

    /// HTTP timeout for geocoding requests, in milliseconds.
    ///
    /// Set via WAYPOST_GEOCODE_TIMEOUT_MS.
    #[serde(default = "default_geocode_timeout_ms")]
    pub geocode_timeout_ms: u64,

    /// HTTP timeout for individual crawler requests, in milliseconds.
    ///
    /// Set via WAYPOST_CRAWL_TIMEOUT_MS.
    #[serde(default = "default_crawl_timeout_ms")]
    pub crawl_timeout_ms: u64,

    /// Interval between crawl task status polls, in milliseconds.
    ///
    /// Set via WAYPOST_CRAWL_POLL_INTERVAL_MS.
    #[serde(default = "default_crawl_poll_interval_ms")]
    pub crawl_poll_interval_ms: u64,

    /// Maximum number of status polls before a crawl task is abandoned.
    ///
    /// Set via WAYPOST_CRAWL_MAX_POLLS.
    #[serde(default = "default_crawl_max_polls")]
    pub crawl_max_polls: u32,

    /// Overall deadline for one batch item, in milliseconds.
    ///
    /// Set via WAYPOST_CRAWL_DEADLINE_MS.
    #[serde(default = "default_crawl_deadline_ms")]
    pub crawl_deadline_ms: u64,

    /// Cap on simultaneous outbound crawls (1-16).
    ///
    /// Set via WAYPOST_MAX_CONCURRENT_CRAWLS.
    #[serde(default = "default_max_concurrent_crawls")]
    pub max_concurrent_crawls: usize,

    /// Maximum URLs accepted per batch request.
    ///
    /// Set via WAYPOST_MAX_BATCH_URLS.
    #[serde(default = "default_max_batch_urls")]
    pub max_batch_urls: usize,
}

fn default_geocoder_base_url() -> String {
    "https://nominatim.openstreetmap.org".into()
}

fn default_crawler_base_url() -> String {
    "http://localhost:11235".into()
}

fn default_user_agent() -> String {
    "waypost/0.1".into()
}

fn default_geocode_cache_ttl_hours() -> u64 {
    24
}

fn default_crawl_cache_ttl_hours() -> u64 {
    1
}

fn default_geocode_min_interval_ms() -> u64 {
    1000
}

fn default_geocode_timeout_ms() -> u64 {
    10_000
}

fn default_crawl_timeout_ms() -> u64 {
    30_000
}

fn default_crawl_poll_interval_ms() -> u64 {
    1000
}

fn default_crawl_max_polls() -> u32 {
    30
}

fn default_crawl_deadline_ms() -> u64 {
    60_000
}

fn default_max_concurrent_crawls() -> usize {
    4
}

fn default_max_batch_urls() -> usize {
    10
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            geocoder_base_url: default_geocoder_base_url(),
            crawler_base_url: default_crawler_base_url(),
            crawler_api_token: None,
            user_agent: default_user_agent(),
            geocode_cache_ttl_hours: default_geocode_cache_ttl_hours(),
            crawl_cache_ttl_hours: default_crawl_cache_ttl_hours(),
            geocode_min_interval_ms: default_geocode_min_interval_ms(),
            geocode_timeout_ms: default_geocode_timeout_ms(),
            crawl_timeout_ms: default_crawl_timeout_ms(),
            crawl_poll_interval_ms: default_crawl_poll_interval_ms(),
            crawl_max_polls: default_crawl_max_polls(),
            crawl_deadline_ms: default_crawl_deadline_ms(),
            max_concurrent_crawls: default_max_concurrent_crawls(),
            max_batch_urls: default_max_batch_urls(),
        }
    }
}

impl AppConfig {
    /// Geocoding cache TTL as a Duration.
    pub fn geocode_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.geocode_cache_ttl_hours * 3600)
    }

    /// Crawl cache TTL as a Duration.
    pub fn crawl_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.crawl_cache_ttl_hours * 3600)
    }

    /// Minimum geocoding dispatch interval as a Duration.
    pub fn geocode_min_interval(&self) -> Duration {
        Duration::from_millis(self.geocode_min_interval_ms)
    }

    /// Geocoding HTTP timeout as a Duration.
    pub fn geocode_timeout(&self) -> Duration {
        Duration::from_millis(self.geocode_timeout_ms)
    }

    /// Crawler HTTP timeout as a Duration.
    pub fn crawl_timeout(&self) -> Duration {
        Duration::from_millis(self.crawl_timeout_ms)
    }

    /// Crawl task poll interval as a Duration.
    pub fn crawl_poll_interval(&self) -> Duration {
        Duration::from_millis(self.crawl_poll_interval_ms)
    }

    /// Per-item batch deadline as a Duration.
    pub fn crawl_deadline(&self) -> Duration {
        Duration::from_millis(self.crawl_deadline_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read, environment
    /// variables cannot be parsed, or validation fails after loading.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("WAYPOST_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("WAYPOST_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
