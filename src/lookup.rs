//! Read-through weather lookup
//!
//! `WeatherLookup` answers a city query from the cache when it can, and on a
//! miss geocodes the city, fetches its weather, and stores the result. Every
//! request makes at most one cache read, one geocode call, one weather fetch
//! and one cache write, with no retries.
//!
//! Concurrent misses for the same city share a single upstream resolution:
//! the first miss spawns it as its own task and registers a shared handle in
//! the in-flight map, and later misses await that handle instead of starting
//! their own. The task runs to completion and clears its map entry even if
//! every waiter goes away.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use thiserror::Error;

use crate::cache::CacheStore;
use crate::data::{Geocoder, WeatherFetcher, WeatherResult};
use crate::key::CityKey;

/// Why a lookup produced no weather
///
/// Upstream failures carry the rendered error message so the outcome can be
/// shared with every request coalesced onto the same resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// Geocoding found no match for the city
    #[error("City not found")]
    NotFound(CityKey),

    /// The geocoding service failed at the transport level
    #[error("Geocoding failed: {0}")]
    Geocoding(String),

    /// The weather service failed
    #[error("Weather fetch failed: {0}")]
    Weather(String),

    /// The resolution task panicked or was cancelled by runtime shutdown
    #[error("Lookup interrupted: {0}")]
    Interrupted(String),
}

type Resolution = Shared<BoxFuture<'static, Result<WeatherResult, LookupError>>>;

type InFlight = Arc<Mutex<HashMap<CityKey, Resolution>>>;

/// Removes a key from the in-flight map when the resolution task ends
struct InFlightEntry {
    in_flight: InFlight,
    key: CityKey,
}

impl Drop for InFlightEntry {
    fn drop(&mut self) {
        self.in_flight.lock().remove(&self.key);
    }
}

/// Cache-aside orchestrator over a cache store and two upstream collaborators
pub struct WeatherLookup {
    cache: Arc<dyn CacheStore>,
    geocoder: Arc<dyn Geocoder>,
    fetcher: Arc<dyn WeatherFetcher>,
    in_flight: InFlight,
}

impl WeatherLookup {
    pub fn new(
        cache: Arc<dyn CacheStore>,
        geocoder: Arc<dyn Geocoder>,
        fetcher: Arc<dyn WeatherFetcher>,
    ) -> Self {
        Self {
            cache,
            geocoder,
            fetcher,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns weather for `raw_city`, from cache if present
    pub async fn lookup(&self, raw_city: &str) -> Result<WeatherResult, LookupError> {
        let key = CityKey::normalize(raw_city);

        match self.cache.get(&key).await {
            Ok(Some(cached)) => {
                tracing::debug!(city = %key, "Cache hit");
                return Ok(cached);
            }
            Ok(None) => tracing::debug!(city = %key, "Cache miss"),
            Err(e) => {
                tracing::warn!(city = %key, error = %e, "Cache read failed, treating as miss");
            }
        }

        let resolution = {
            let mut in_flight = self.in_flight.lock();
            match in_flight.get(&key) {
                Some(pending) => {
                    tracing::debug!(city = %key, "Joining in-flight resolution");
                    pending.clone()
                }
                None => {
                    let pending = self.start_resolution(key.clone());
                    in_flight.insert(key, pending.clone());
                    pending
                }
            }
        };

        resolution.await
    }

    /// Number of cities currently being resolved upstream
    pub fn in_flight(&self) -> usize {
        self.in_flight.lock().len()
    }

    /// Spawns the upstream resolution for `key`
    ///
    /// Called with the in-flight lock held; the task's entry guard takes the
    /// same lock, so the entry is always inserted before it can be removed.
    fn start_resolution(&self, key: CityKey) -> Resolution {
        let cache = Arc::clone(&self.cache);
        let geocoder = Arc::clone(&self.geocoder);
        let fetcher = Arc::clone(&self.fetcher);
        let entry = InFlightEntry {
            in_flight: Arc::clone(&self.in_flight),
            key,
        };

        let task = tokio::spawn(async move {
            let entry = entry;
            resolve(&*cache, &*geocoder, &*fetcher, &entry.key).await
        });

        task.map(|joined| {
            joined.unwrap_or_else(|e| {
                tracing::error!(error = %e, "Lookup task failed");
                Err(LookupError::Interrupted(e.to_string()))
            })
        })
        .boxed()
        .shared()
    }
}

/// Geocode, fetch, and store the result for a key that missed the cache
async fn resolve(
    cache: &dyn CacheStore,
    geocoder: &dyn Geocoder,
    fetcher: &dyn WeatherFetcher,
    key: &CityKey,
) -> Result<WeatherResult, LookupError> {
    let best = match geocoder.resolve(key).await {
        Ok(best) => best,
        Err(e) if e.is_not_found() => {
            tracing::debug!(city = %key, "City not found");
            return Err(LookupError::NotFound(key.clone()));
        }
        Err(e) => {
            tracing::warn!(city = %key, error = %e, "Geocoding failed");
            return Err(LookupError::Geocoding(e.to_string()));
        }
    };

    let coords = best.coordinates;
    let result = fetcher
        .fetch(coords)
        .await
        .map_err(|e| {
            tracing::warn!(city = %key, error = %e, "Weather fetch failed");
            LookupError::Weather(e.to_string())
        })?
        .with_city(&best.display_name(key));

    match cache.put(key, &result).await {
        Ok(()) => tracing::info!(
            city = %key,
            latitude = coords.latitude,
            longitude = coords.longitude,
            "Cached weather"
        ),
        Err(e) => tracing::warn!(city = %key, error = %e, "Cache write failed, returning uncached result"),
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::data::{Coordinates, GeocodeError, GeocodeMatch, WeatherError};
    use async_trait::async_trait;
    use serde_json::json;

    struct FixedGeocoder(Result<Coordinates, u16>);

    #[async_trait]
    impl Geocoder for FixedGeocoder {
        async fn resolve(&self, key: &CityKey) -> Result<GeocodeMatch, GeocodeError> {
            match self.0 {
                Ok(coords) => Ok(GeocodeMatch::from(coords)),
                Err(0) => Err(GeocodeError::NotFound(key.clone())),
                Err(status) => Err(GeocodeError::UnexpectedStatus(status)),
            }
        }
    }

    struct EchoFetcher;

    #[async_trait]
    impl WeatherFetcher for EchoFetcher {
        async fn fetch(&self, coords: Coordinates) -> Result<WeatherResult, WeatherError> {
            Ok(WeatherResult::try_from(json!({"lat": coords.latitude})).unwrap())
        }
    }

    fn lookup_with(geocoder: FixedGeocoder) -> (WeatherLookup, Arc<MemoryCache>) {
        let cache = Arc::new(MemoryCache::new());
        let lookup = WeatherLookup::new(cache.clone(), Arc::new(geocoder), Arc::new(EchoFetcher));
        (lookup, cache)
    }

    #[tokio::test]
    async fn test_miss_resolves_and_caches_under_normalized_key() {
        let (lookup, cache) = lookup_with(FixedGeocoder(Ok(Coordinates {
            latitude: 1.5,
            longitude: 2.5,
        })));

        let result = lookup.lookup("  Quito ").await.unwrap();

        assert_eq!(result.get("lat"), Some(&json!(1.5)));
        assert_eq!(result.get("city"), Some(&json!("Quito")));
        let stored = cache.get(&CityKey::normalize("quito")).await.unwrap();
        assert_eq!(stored, Some(result));
        assert_eq!(lookup.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_not_found_maps_to_not_found() {
        let (lookup, cache) = lookup_with(FixedGeocoder(Err(0)));

        let err = lookup.lookup("Atlantis").await.unwrap_err();

        assert_eq!(err, LookupError::NotFound(CityKey::normalize("atlantis")));
        assert_eq!(err.to_string(), "City not found");
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_geocoding_transport_failure_is_distinct() {
        let (lookup, cache) = lookup_with(FixedGeocoder(Err(503)));

        let err = lookup.lookup("Quito").await.unwrap_err();

        assert!(matches!(err, LookupError::Geocoding(ref msg) if msg.contains("503")));
        assert!(cache.is_empty().await);
        assert_eq!(lookup.in_flight(), 0);
    }
}
