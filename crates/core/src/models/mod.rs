//! Domain models shared across the gateway.

pub mod crawling;
pub mod geocoding;

pub use crawling::{BatchCrawlResponse, CacheMode, CrawlOptions, CrawlResult, ScreenshotSize};
pub use geocoding::{GeocodingResult, Location};
