//! City Weather - cached current weather by city name
//!
//! An HTTP service that geocodes a city, fetches its current weather, and
//! caches the combined result per normalized city name.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cityweather::cache::CacheBackend;
use cityweather::cli::{Cli, ServerConfig};
use cityweather::server::{build_router, shutdown_signal, AppState};

/// Sets up log output, honoring `RUST_LOG` and defaulting to `info`
fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Values from .env only fill in variables the environment doesn't already set
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();
    setup_logging();

    if let Err(e) = dotenv {
        tracing::debug!("No .env file loaded: {}", e);
    }

    let config = ServerConfig::from_cli(&cli)?;

    match &config.cache {
        CacheBackend::Memory => tracing::info!("Using in-memory cache"),
        CacheBackend::Directory(dir) => tracing::info!("Using cache directory {}", dir.display()),
    }
    if config.upstream.openweather_api_key.is_none() {
        tracing::info!("OPENWEATHER_API_KEY not set; results will not include OpenWeatherMap data");
    }

    let state = AppState::from_config(&config)?;
    let router = build_router(state, config.origins.clone());

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    tracing::info!("Weather API listening on {}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
