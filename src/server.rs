//! HTTP surface of the weather lookup service
//!
//! `GET /` answers a liveness message and `GET /weather/{city}` runs a lookup.
//! A city that cannot be geocoded is reported as `{"error": "City not found"}`
//! with a success status; upstream failures are `502 Bad Gateway`.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use reqwest::Client;
use serde_json::{json, Value};
use tokio::signal;

use crate::cli::{ServerConfig, UpstreamConfig};
use crate::cors::OriginPolicy;
use crate::data::{GeocodingClient, WeatherClient, WeatherResult};
use crate::lookup::{LookupError, WeatherLookup};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    lookup: Arc<WeatherLookup>,
}

impl AppState {
    pub fn new(lookup: Arc<WeatherLookup>) -> Self {
        Self { lookup }
    }

    /// Wires the configured cache store and upstream clients into a lookup
    pub fn from_config(config: &ServerConfig) -> Result<Self, reqwest::Error> {
        let (geocoder, fetcher) = build_upstream_clients(&config.upstream)?;
        let lookup = WeatherLookup::new(config.cache.build(), Arc::new(geocoder), Arc::new(fetcher));
        Ok(Self::new(Arc::new(lookup)))
    }
}

/// Builds both upstream clients over one shared HTTP client with a bounded timeout
pub fn build_upstream_clients(
    upstream: &UpstreamConfig,
) -> Result<(GeocodingClient, WeatherClient), reqwest::Error> {
    let client = Client::builder()
        .timeout(upstream.timeout)
        .connect_timeout(upstream.timeout.min(Duration::from_secs(5)))
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let geocoder = GeocodingClient::with_base_url(client.clone(), upstream.geocoding_url.clone());
    let fetcher = WeatherClient::new(client)
        .with_open_meteo_url(upstream.open_meteo_url.clone())
        .with_openweather_url(upstream.openweather_url.clone())
        .with_openweather_key(upstream.openweather_api_key.clone());

    Ok((geocoder, fetcher))
}

/// Builds the API router with the cross-origin policy applied
pub fn build_router(state: AppState, origins: OriginPolicy) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/weather/{city}", get(weather_handler))
        .layer(origins.into_layer())
        .with_state(state)
}

async fn root_handler() -> Json<Value> {
    Json(json!({ "message": "Weather API is running!" }))
}

async fn weather_handler(
    State(state): State<AppState>,
    Path(city): Path<String>,
) -> Result<Json<WeatherResult>, LookupError> {
    let result = state.lookup.lookup(&city).await?;
    Ok(Json(result))
}

impl LookupError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::OK,
            Self::Geocoding(_) | Self::Weather(_) => StatusCode::BAD_GATEWAY,
            Self::Interrupted(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for LookupError {
    fn into_response(self) -> Response {
        let body = json!({ "error": self.to_string() });
        (self.status_code(), Json(body)).into_response()
    }
}

/// Resolves on Ctrl+C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM signal");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::CityKey;

    #[test]
    fn test_not_found_is_success_level() {
        let err = LookupError::NotFound(CityKey::normalize("atlantis"));
        assert_eq!(err.status_code(), StatusCode::OK);
    }

    #[test]
    fn test_upstream_failures_are_bad_gateway() {
        assert_eq!(
            LookupError::Geocoding("timeout".to_string()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            LookupError::Weather("status 500".to_string()).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_interrupted_lookup_is_internal_error() {
        assert_eq!(
            LookupError::Interrupted("task panicked".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_build_upstream_clients() {
        let upstream = UpstreamConfig {
            geocoding_url: "http://localhost:1".to_string(),
            open_meteo_url: "http://localhost:2".to_string(),
            openweather_url: "http://localhost:3".to_string(),
            openweather_api_key: None,
            timeout: Duration::from_secs(3),
        };
        assert!(build_upstream_clients(&upstream).is_ok());
    }
}
