//! Cache-aside geocoding with request coalescing.
//!
//! Equal concurrent lookups collapse to a single upstream request: the
//! first caller becomes the leader and everyone else subscribes to a
//! per-key broadcast channel for the outcome. Upstream dispatch always
//! passes through the rate limiter, so a cold burst of distinct cities
//! still spaces its requests.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::broadcast;
use waypost_client::{GeocodeBackend, RawPlace};
use waypost_core::cache::key::geocode_cache_key;
use waypost_core::models::{GeocodingResult, Location};
use waypost_core::{Error, RateLimiter, TtlCache};

/// Outcome shared between the leader and its followers. `Ok(None)` means
/// the upstream answered but had no match for the query.
type FlightOutcome = Result<Option<GeocodingResult>, Error>;

const MAX_CITY_CHARS: usize = 200;

pub struct GeocodingGateway {
    cache: TtlCache<GeocodingResult>,
    limiter: RateLimiter,
    backend: Arc<dyn GeocodeBackend>,
    inflight: Mutex<HashMap<String, broadcast::Sender<FlightOutcome>>>,
}

/// Removes the in-flight entry if the leader is dropped before publishing,
/// so followers get a closed channel instead of hanging forever.
struct FlightGuard<'a> {
    inflight: &'a Mutex<HashMap<String, broadcast::Sender<FlightOutcome>>>,
    key: &'a str,
    armed: bool,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            lock_inflight(self.inflight).remove(self.key);
        }
    }
}

fn lock_inflight<'a>(
    inflight: &'a Mutex<HashMap<String, broadcast::Sender<FlightOutcome>>>,
) -> std::sync::MutexGuard<'a, HashMap<String, broadcast::Sender<FlightOutcome>>> {
    inflight.lock().unwrap_or_else(|e| e.into_inner())
}

impl GeocodingGateway {
    pub fn new(
        cache_ttl: Duration,
        min_interval: Duration,
        backend: Arc<dyn GeocodeBackend>,
    ) -> Self {
        Self {
            cache: TtlCache::new(cache_ttl),
            limiter: RateLimiter::new(min_interval),
            backend,
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Resolves a city name to coordinates, serving from cache when a
    /// fresh entry exists. Returns `Ok(None)` when the upstream has no
    /// match; not-found answers are never cached.
    pub async fn resolve(&self, city: &str) -> FlightOutcome {
        let trimmed = city.trim();
        if trimmed.is_empty() {
            return Err(Error::Validation("city name cannot be empty".into()));
        }
        if trimmed.chars().count() > MAX_CITY_CHARS {
            return Err(Error::Validation(format!(
                "city name exceeds {MAX_CITY_CHARS} characters"
            )));
        }

        let key = geocode_cache_key(city);
        loop {
            if let Some(mut hit) = self.cache.get(&key) {
                tracing::debug!(city = trimmed, "geocode cache hit");
                hit.cached = true;
                return Ok(Some(hit));
            }

            // Either join an in-flight lookup or become its leader. The
            // subscription happens under the lock so a follower can never
            // miss the leader's single send.
            let subscription = {
                let mut inflight = lock_inflight(&self.inflight);
                match inflight.entry(key.clone()) {
                    Entry::Occupied(entry) => Some(entry.get().subscribe()),
                    Entry::Vacant(entry) => {
                        let (tx, _) = broadcast::channel(1);
                        entry.insert(tx);
                        None
                    }
                }
            };

            let Some(mut rx) = subscription else {
                return self.lead(trimmed, &key).await;
            };

            match rx.recv().await {
                Ok(outcome) => return outcome,
                // Leader cancelled before publishing; try again and
                // possibly become the new leader.
                Err(_) => continue,
            }
        }
    }

    async fn lead(&self, city: &str, key: &str) -> FlightOutcome {
        let mut guard = FlightGuard {
            inflight: &self.inflight,
            key,
            armed: true,
        };
        let outcome = self.fetch_uncached(city, key).await;
        guard.armed = false;
        if let Some(tx) = lock_inflight(&self.inflight).remove(key) {
            // No receivers is fine; nobody else asked while we flew.
            let _ = tx.send(outcome.clone());
        }
        outcome
    }

    async fn fetch_uncached(&self, city: &str, key: &str) -> FlightOutcome {
        self.limiter.acquire().await;
        let places = self
            .backend
            .geocode(city)
            .await
            .map_err(|e| Error::Upstream(e.to_string()))?;

        let Some(first) = places.first() else {
            tracing::info!(city, "no geocoding match");
            return Ok(None);
        };

        let result = shape_result(city, first)?;
        self.cache.set(key, result.clone());
        tracing::debug!(city, lat = result.location.lat, lon = result.location.lon, "geocoded");
        Ok(Some(result))
    }

    pub fn clear_cache(&self) -> usize {
        self.cache.clear()
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache.default_ttl()
    }

    pub fn min_interval(&self) -> Duration {
        self.limiter.min_interval()
    }
}

/// Converts a wire place into the response shape. Coordinates must parse;
/// a malformed bounding box degrades to `None` rather than failing the
/// whole lookup.
fn shape_result(city: &str, place: &RawPlace) -> Result<GeocodingResult, Error> {
    let lat: f64 = place.lat.parse().map_err(|_| {
        Error::Upstream(format!("malformed latitude {:?} in upstream response", place.lat))
    })?;
    let lon: f64 = place.lon.parse().map_err(|_| {
        Error::Upstream(format!("malformed longitude {:?} in upstream response", place.lon))
    })?;

    let boundingbox = place.boundingbox.as_ref().and_then(|raw| {
        if raw.len() != 4 {
            tracing::warn!(city, len = raw.len(), "bounding box is not four values, dropping");
            return None;
        }
        let parsed: Option<Vec<f64>> = raw.iter().map(|s| s.parse().ok()).collect();
        if parsed.is_none() {
            tracing::warn!(city, "bounding box has non-numeric values, dropping");
        }
        parsed
    });

    Ok(GeocodingResult {
        city: city.to_string(),
        location: Location { lat, lon },
        display_name: place
            .display_name
            .clone()
            .unwrap_or_else(|| city.to_string()),
        place_id: place.place_id,
        boundingbox,
        timestamp: chrono::Utc::now().to_rfc3339(),
        cached: false,
    })
}
