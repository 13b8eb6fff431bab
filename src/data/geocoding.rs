//! Open-Meteo geocoding API client
//!
//! Resolves a normalized city name to a single best-match coordinate pair.
//! "No match" is an expected outcome and is reported separately from
//! transport failures so callers can tell a misspelled city from an outage.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use super::Coordinates;
use crate::key::CityKey;

/// Default base URL for the Open-Meteo geocoding API
pub const DEFAULT_GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com";

/// Path of the search endpoint, relative to the base URL
const SEARCH_PATH: &str = "/v1/search";

/// Errors that can occur when geocoding a city name
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// The upstream source returned no match for the name
    #[error("No geocoding match for '{0}'")]
    NotFound(CityKey),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Upstream answered with a non-success status
    #[error("Geocoding service returned status {0}")]
    UnexpectedStatus(u16),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),
}

impl GeocodeError {
    /// Whether this is a "no match" outcome rather than a transport failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Best match for a city name
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeMatch {
    pub coordinates: Coordinates,
    /// Place name as spelled by the geocoding source, if it gave one
    pub name: Option<String>,
}

impl GeocodeMatch {
    pub fn named(coordinates: Coordinates, name: impl Into<String>) -> Self {
        Self {
            coordinates,
            name: Some(name.into()),
        }
    }

    /// Name to show for this match, falling back to the title-cased key
    pub fn display_name(&self, key: &CityKey) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => key.title_case(),
        }
    }
}

impl From<Coordinates> for GeocodeMatch {
    fn from(coordinates: Coordinates) -> Self {
        Self {
            coordinates,
            name: None,
        }
    }
}

/// Resolves city names to coordinates
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn resolve(&self, key: &CityKey) -> Result<GeocodeMatch, GeocodeError>;
}

/// Client for the Open-Meteo geocoding search endpoint
#[derive(Debug, Clone)]
pub struct GeocodingClient {
    client: Client,
    base_url: String,
}

impl GeocodingClient {
    /// Create a client against the public Open-Meteo geocoding API
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, DEFAULT_GEOCODING_URL)
    }

    /// Create a client against a custom base URL (mirrors, test servers)
    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn parse_response(key: &CityKey, response: SearchResponse) -> Result<GeocodeMatch, GeocodeError> {
        // Open-Meteo omits `results` entirely when nothing matches
        let best = response
            .results
            .and_then(|results| results.into_iter().next())
            .ok_or_else(|| GeocodeError::NotFound(key.clone()))?;

        tracing::debug!(
            city = %key,
            matched = best.name.as_deref().unwrap_or("?"),
            country = best.country.as_deref().unwrap_or("?"),
            "Geocoded city"
        );

        Ok(GeocodeMatch {
            coordinates: Coordinates {
                latitude: best.latitude,
                longitude: best.longitude,
            },
            name: best.name,
        })
    }
}

#[async_trait]
impl Geocoder for GeocodingClient {
    async fn resolve(&self, key: &CityKey) -> Result<GeocodeMatch, GeocodeError> {
        if key.is_empty() {
            return Err(GeocodeError::NotFound(key.clone()));
        }

        let url = format!("{}{}", self.base_url, SEARCH_PATH);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("name", key.as_str()),
                ("count", "1"),
                ("language", "en"),
                ("format", "json"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::UnexpectedStatus(status.as_u16()));
        }

        let text = response.text().await?;
        let search: SearchResponse = serde_json::from_str(&text)?;

        Self::parse_response(key, search)
    }
}

/// Open-Meteo geocoding search response
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Option<Vec<SearchResult>>,
}

/// A single ranked match
#[derive(Debug, Deserialize)]
struct SearchResult {
    name: Option<String>,
    latitude: f64,
    longitude: f64,
    country: Option<String>,
}
