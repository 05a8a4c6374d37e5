//! Gateway orchestration: cache-aside lookups and batch dispatch.
//!
//! The gateways compose the core cache and limiter with the client
//! backends. All upstream failure modes are absorbed here; handlers above
//! only ever see the unified error taxonomy or in-band item failures.

pub mod crawl;
pub mod geocoding;

pub use crawl::{BatchCrawlRequest, CrawlOrchestrator, FollowOptions};
pub use geocoding::GeocodingGateway;
