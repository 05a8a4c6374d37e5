//! Geocoding domain models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Geographic coordinates in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Location {
    /// Latitude, -90.0..=90.0.
    pub lat: f64,
    /// Longitude, -180.0..=180.0.
    pub lon: f64,
}

/// A resolved geocoding lookup.
///
/// `city` preserves the caller's original casing; normalization applies
/// to the cache key only.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GeocodingResult {
    /// The city name as the caller supplied it.
    pub city: String,
    /// Resolved coordinates.
    pub location: Location,
    /// Full formatted address from the geocoding upstream.
    pub display_name: String,
    /// Upstream place identifier, when provided.
    pub place_id: Option<i64>,
    /// Bounding box `[min_lat, max_lat, min_lon, max_lon]`, when provided.
    pub boundingbox: Option<Vec<f64>>,
    /// RFC3339 timestamp of when the result was produced.
    pub timestamp: String,
    /// Whether this result was served from the cache.
    pub cached: bool,
}
