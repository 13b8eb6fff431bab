//! Open-Meteo weather API client
//!
//! This module fetches current conditions for a coordinate pair from the
//! Open-Meteo forecast API and, when an API key is configured, enriches them
//! with OpenWeatherMap's current reading. The result is a loosely-shaped JSON
//! document: fields missing upstream are carried through as `null`. Open-Meteo
//! is required; OpenWeatherMap is best-effort and a failed enrichment leaves
//! its fields `null` instead of failing the fetch.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Map, Value};
use thiserror::Error;

use super::{Coordinates, WeatherCondition, WeatherResult};

/// Default base URL for the Open-Meteo forecast API
pub const DEFAULT_OPEN_METEO_URL: &str = "https://api.open-meteo.com";

/// Default base URL for the OpenWeatherMap API
pub const DEFAULT_OPENWEATHER_URL: &str = "https://api.openweathermap.org";

const FORECAST_PATH: &str = "/v1/forecast";
const OPENWEATHER_PATH: &str = "/data/2.5/weather";

/// Errors that can occur when fetching weather data
#[derive(Debug, Error)]
pub enum WeatherError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Upstream answered with a non-success status
    #[error("{service} returned status {status}")]
    UnexpectedStatus { service: &'static str, status: u16 },

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Missing expected field in response
    #[error("Missing expected field in response: {0}")]
    MissingField(String),
}

/// Fetches current weather for a coordinate pair
#[async_trait]
pub trait WeatherFetcher: Send + Sync {
    async fn fetch(&self, coords: Coordinates) -> Result<WeatherResult, WeatherError>;
}

/// Client for fetching current weather from Open-Meteo (and optionally OpenWeatherMap)
#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Client,
    open_meteo_url: String,
    openweather_url: String,
    openweather_api_key: Option<String>,
}

impl WeatherClient {
    /// Create a new WeatherClient against the public Open-Meteo API
    pub fn new(client: Client) -> Self {
        Self {
            client,
            open_meteo_url: DEFAULT_OPEN_METEO_URL.to_string(),
            openweather_url: DEFAULT_OPENWEATHER_URL.to_string(),
            openweather_api_key: None,
        }
    }

    /// Use a custom Open-Meteo base URL
    pub fn with_open_meteo_url(mut self, url: impl Into<String>) -> Self {
        self.open_meteo_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Use a custom OpenWeatherMap base URL
    pub fn with_openweather_url(mut self, url: impl Into<String>) -> Self {
        self.openweather_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Enable OpenWeatherMap enrichment with the given API key
    pub fn with_openweather_key(mut self, api_key: Option<String>) -> Self {
        self.openweather_api_key = api_key.filter(|k| !k.trim().is_empty());
        self
    }

    /// Fetch the raw Open-Meteo response for the given coordinates
    async fn fetch_open_meteo(&self, coords: Coordinates) -> Result<Value, WeatherError> {
        let url = format!(
            "{}{}?latitude={}&longitude={}&current_weather=true",
            self.open_meteo_url, FORECAST_PATH, coords.latitude, coords.longitude
        );

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::UnexpectedStatus {
                service: "Open-Meteo",
                status: status.as_u16(),
            });
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Fetch the raw OpenWeatherMap response for the given coordinates
    async fn fetch_openweather(
        &self,
        coords: Coordinates,
        api_key: &str,
    ) -> Result<Value, WeatherError> {
        let url = format!("{}{}", self.openweather_url, OPENWEATHER_PATH);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", coords.latitude.to_string()),
                ("lon", coords.longitude.to_string()),
                ("units", "metric".to_string()),
                ("appid", api_key.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::UnexpectedStatus {
                service: "OpenWeatherMap",
                status: status.as_u16(),
            });
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Build the result document from the upstream responses
    fn parse_response(
        &self,
        coords: Coordinates,
        open_meteo: Value,
        openweather: Option<Value>,
    ) -> Result<WeatherResult, WeatherError> {
        let Value::Object(mut meteo) = open_meteo else {
            return Err(WeatherError::MissingField(
                "Open-Meteo response is not a JSON object".to_string(),
            ));
        };

        let current = match meteo.remove("current_weather") {
            Some(Value::Object(current)) => current,
            _ => Map::new(),
        };

        let condition = current
            .get("weathercode")
            .and_then(Value::as_u64)
            .and_then(|code| u8::try_from(code).ok())
            .map(|code| weather_code_to_condition(code).description());

        let mut fields = Map::new();
        fields.insert("latitude".to_string(), json!(coords.latitude));
        fields.insert("longitude".to_string(), json!(coords.longitude));
        fields.insert("condition".to_string(), json!(condition));
        fields.insert("open_meteo".to_string(), Value::Object(current));

        if let Some(openweather) = openweather {
            fields.insert("open_weather".to_string(), summarize_openweather(&openweather));
        }

        Ok(WeatherResult::new(fields))
    }
}

#[async_trait]
impl WeatherFetcher for WeatherClient {
    async fn fetch(&self, coords: Coordinates) -> Result<WeatherResult, WeatherError> {
        let open_meteo = self.fetch_open_meteo(coords).await?;

        let openweather = match &self.openweather_api_key {
            Some(api_key) => match self.fetch_openweather(coords, api_key).await {
                Ok(response) => Some(response),
                Err(e) => {
                    tracing::warn!(error = %e, "OpenWeatherMap enrichment failed, leaving its fields empty");
                    Some(Value::Null)
                }
            },
            None => None,
        };

        self.parse_response(coords, open_meteo, openweather)
    }
}

/// Reduce an OpenWeatherMap response to the four fields we expose
///
/// Anything that is not the expected object shape yields all-`null` fields.
fn summarize_openweather(response: &Value) -> Value {
    let pick = |pointer: &str| response.pointer(pointer).cloned().unwrap_or(Value::Null);

    json!({
        "temp": pick("/main/temp"),
        "feels_like": pick("/main/feels_like"),
        "weather": pick("/weather/0/description"),
        "wind_speed": pick("/wind/speed")
    })
}

/// Map WMO weather code to WeatherCondition enum
///
/// Weather codes from WMO (World Meteorological Organization):
/// - 0: Clear sky
/// - 1-2: Mainly clear, partly cloudy
/// - 3: Overcast
/// - 45, 48: Fog
/// - 51-55: Drizzle
/// - 56-57: Freezing drizzle
/// - 61-65: Rain
/// - 66-67: Freezing rain
/// - 71-77: Snow
/// - 80-82: Rain showers
/// - 85-86: Snow showers
/// - 95-99: Thunderstorm
pub fn weather_code_to_condition(code: u8) -> WeatherCondition {
    match code {
        0 => WeatherCondition::Clear,
        1..=2 => WeatherCondition::PartlyCloudy,
        3 => WeatherCondition::Cloudy,
        45 | 48 => WeatherCondition::Fog,
        51..=55 | 61..=65 => WeatherCondition::Rain,
        56..=57 | 66..=67 | 80..=82 => WeatherCondition::Showers,
        71..=77 | 85..=86 => WeatherCondition::Snow,
        95..=99 => WeatherCondition::Thunderstorm,
        _ => WeatherCondition::Cloudy, // Default for unknown codes
    }
}
