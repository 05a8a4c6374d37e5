//! Shared server state: configuration plus the two gateways.

use std::sync::Arc;

use waypost_client::{
    ClientError, CrawlBackend, CrawlerClient, CrawlerConfig, GeocodeBackend, GeocoderClient,
    GeocoderConfig,
};
use waypost_core::AppConfig;

use crate::gateway::{CrawlOrchestrator, GeocodingGateway};

/// Everything a tool call needs, built once at startup.
pub struct GatewayContext {
    pub config: AppConfig,
    pub geocoding: GeocodingGateway,
    pub crawler: CrawlOrchestrator,
}

impl GatewayContext {
    /// Build the context with real HTTP backends from configuration.
    pub fn from_config(config: AppConfig) -> Result<Self, ClientError> {
        let geocoder = GeocoderClient::new(GeocoderConfig {
            base_url: config.geocoder_base_url.clone(),
            user_agent: config.user_agent.clone(),
            timeout: config.geocode_timeout(),
        })?;

        let crawler = CrawlerClient::new(CrawlerConfig {
            base_url: config.crawler_base_url.clone(),
            api_token: config.crawler_api_token.clone(),
            user_agent: config.user_agent.clone(),
            timeout: config.crawl_timeout(),
            poll_interval: config.crawl_poll_interval(),
            max_polls: config.crawl_max_polls,
        })?;

        Ok(Self::with_backends(config, Arc::new(geocoder), Arc::new(crawler)))
    }

    /// Build the context over arbitrary backends. Tests inject mocks here.
    pub fn with_backends(
        config: AppConfig,
        geocode_backend: Arc<dyn GeocodeBackend>,
        crawl_backend: Arc<dyn CrawlBackend>,
    ) -> Self {
        let geocoding = GeocodingGateway::new(
            config.geocode_cache_ttl(),
            config.geocode_min_interval(),
            geocode_backend,
        );
        let crawler = CrawlOrchestrator::new(
            config.crawl_cache_ttl(),
            config.max_concurrent_crawls,
            config.crawl_deadline(),
            crawl_backend,
        );
        Self { config, geocoding, crawler }
    }
}
