//! Remote client abstractions for waypost.
//!
//! This crate provides the network call seam between the gateway and its
//! upstream providers: async backend traits, their HTTP implementations
//! (a Nominatim-style geocoder and a submit-and-poll crawler service),
//! URL canonicalization, and screenshot payload probing.

pub mod backend;
pub mod crawl;
pub mod error;
pub mod geocode;
pub mod screenshot;
pub mod url;

pub use backend::{CrawlBackend, GeocodeBackend, RawCrawl, RawPlace};
pub use crawl::{CrawlerClient, CrawlerConfig};
pub use error::ClientError;
pub use geocode::{GeocoderClient, GeocoderConfig};
pub use self::url::{UrlError, canonicalize};
