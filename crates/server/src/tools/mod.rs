//! MCP tool implementations.
//!
//! Each tool validates its parameters, delegates to a gateway, and
//! serializes the output envelope as pretty JSON text content.
#![allow(unused_imports)]

pub mod cache;
pub mod crawl_batch;
pub mod geocode;

pub use cache::{CacheClearOutput, CacheInvalidateParams, GatewayStatsOutput};
pub use crawl_batch::{CrawlBatchOutput, CrawlBatchParams};
pub use geocode::{GeocodeCityOutput, GeocodeCityParams};
