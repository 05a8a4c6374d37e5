//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values after
//! they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - either base URL or the user agent is empty
    /// - a cache TTL is 0 (a zero TTL is indistinguishable from cache
    ///   corruption at read time)
    /// - `geocode_min_interval_ms` is 0
    /// - `max_concurrent_crawls` is outside 1..=16
    /// - `max_batch_urls` is 0
    /// - a timeout or poll budget is 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.geocoder_base_url.is_empty() {
            return Err(invalid("geocoder_base_url", "must not be empty"));
        }
        if self.crawler_base_url.is_empty() {
            return Err(invalid("crawler_base_url", "must not be empty"));
        }
        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if self.geocode_cache_ttl_hours == 0 {
            return Err(invalid("geocode_cache_ttl_hours", "must be greater than 0"));
        }
        if self.crawl_cache_ttl_hours == 0 {
            return Err(invalid("crawl_cache_ttl_hours", "must be greater than 0"));
        }

        if self.geocode_min_interval_ms == 0 {
            return Err(invalid("geocode_min_interval_ms", "must be greater than 0"));
        }

        if self.max_concurrent_crawls == 0 || self.max_concurrent_crawls > 16 {
            return Err(invalid("max_concurrent_crawls", "must be between 1 and 16"));
        }
        if self.max_batch_urls == 0 {
            return Err(invalid("max_batch_urls", "must be greater than 0"));
        }

        if self.geocode_timeout_ms == 0 || self.crawl_timeout_ms == 0 {
            return Err(invalid("timeout_ms", "timeouts must be greater than 0"));
        }
        if self.crawl_poll_interval_ms == 0 || self.crawl_max_polls == 0 {
            return Err(invalid("crawl_poll", "poll interval and budget must be greater than 0"));
        }
        if self.crawl_deadline_ms < self.crawl_timeout_ms {
            tracing::warn!(
                deadline_ms = self.crawl_deadline_ms,
                timeout_ms = self.crawl_timeout_ms,
                "crawl_deadline_ms is below crawl_timeout_ms; the deadline wins"
            );
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}
