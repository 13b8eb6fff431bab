//! Core data models for the weather lookup service
//!
//! This module contains the types passed between the lookup orchestrator and
//! its upstream collaborators: coordinates from geocoding and the opaque
//! weather document that is returned to callers and stored in the cache.

pub mod geocoding;
pub mod weather;

pub use geocoding::{GeocodeError, GeocodeMatch, Geocoder, GeocodingClient};
pub use weather::{WeatherClient, WeatherError, WeatherFetcher};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A latitude/longitude pair produced by geocoding
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

/// Current-weather document returned to callers
///
/// The shape is defined by the weather fetcher. The lookup core never
/// inspects it; it is stored and replayed exactly as produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeatherResult(Map<String, Value>);

impl WeatherResult {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }

    /// Labels the document with a display name under `"city"`, as its first field
    ///
    /// Any `"city"` field the document already carries is replaced.
    pub fn with_city(self, city: &str) -> Self {
        let mut fields = Map::with_capacity(self.0.len() + 1);
        fields.insert("city".to_string(), Value::String(city.to_string()));
        for (name, value) in self.0 {
            if name != "city" {
                fields.insert(name, value);
            }
        }
        Self(fields)
    }
}

impl From<Map<String, Value>> for WeatherResult {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

impl TryFrom<Value> for WeatherResult {
    type Error = Value;

    /// Accepts JSON objects only; any other value is handed back unchanged.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(other),
        }
    }
}

/// Types of weather conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherCondition {
    Clear,
    PartlyCloudy,
    Cloudy,
    Rain,
    Showers,
    Thunderstorm,
    Snow,
    Fog,
}

impl WeatherCondition {
    /// Get a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::PartlyCloudy => "Partly Cloudy",
            Self::Cloudy => "Cloudy",
            Self::Rain => "Rain",
            Self::Showers => "Showers",
            Self::Thunderstorm => "Thunderstorm",
            Self::Snow => "Snow",
            Self::Fog => "Fog",
        }
    }
}
