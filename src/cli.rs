//! Command-line interface parsing for the weather lookup service
//!
//! This module handles parsing of CLI arguments using clap. Every flag can
//! also be supplied through an environment variable (or a `.env` file loaded
//! at startup), and `ServerConfig::from_cli` validates the combination.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

use crate::cache::{CacheBackend, CacheManager};
use crate::cors::OriginPolicy;
use crate::data::geocoding::DEFAULT_GEOCODING_URL;
use crate::data::weather::{DEFAULT_OPENWEATHER_URL, DEFAULT_OPEN_METEO_URL};

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// The upstream timeout must be positive
    #[error("Invalid upstream timeout: must be at least 1 second")]
    InvalidTimeout,

    /// An origin pattern is not of the form `*.domain`
    #[error("Invalid origin pattern: '{0}'. Patterns must look like '*.example.com'")]
    InvalidOriginPattern(String),

    /// No cache directory was given and none could be determined
    #[error("Could not determine a cache directory; pass --cache-dir or --memory-cache")]
    NoCacheDir,
}

/// City weather service - cached current weather by city name
#[derive(Parser, Debug)]
#[command(name = "cityweather")]
#[command(about = "Read-through weather lookup service with a persistent per-city cache")]
#[command(version)]
pub struct Cli {
    /// Address to listen on
    #[arg(long, env = "BIND_ADDRESS", default_value = "0.0.0.0:8000")]
    pub bind: SocketAddr,

    /// Directory holding cached weather documents (defaults to the XDG cache dir)
    #[arg(long, env = "CACHE_DIR", value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Keep the cache in memory only
    #[arg(long, conflicts_with = "cache_dir")]
    pub memory_cache: bool,

    /// OpenWeatherMap API key; enables the `open_weather` block in results
    #[arg(long, env = "OPENWEATHER_API_KEY", hide_env_values = true)]
    pub openweather_api_key: Option<String>,

    /// Base URL of the geocoding API
    #[arg(long, env = "GEOCODING_URL", default_value = DEFAULT_GEOCODING_URL)]
    pub geocoding_url: String,

    /// Base URL of the Open-Meteo forecast API
    #[arg(long, env = "OPEN_METEO_URL", default_value = DEFAULT_OPEN_METEO_URL)]
    pub open_meteo_url: String,

    /// Base URL of the OpenWeatherMap API
    #[arg(long, env = "OPENWEATHER_URL", default_value = DEFAULT_OPENWEATHER_URL)]
    pub openweather_url: String,

    /// Timeout for each upstream request, in seconds
    #[arg(long, env = "UPSTREAM_TIMEOUT_SECS", default_value_t = 10)]
    pub upstream_timeout_secs: u64,

    /// Frontend origin allowed to make cross-origin requests (repeatable)
    #[arg(
        long = "allowed-origin",
        env = "ALLOWED_ORIGINS",
        value_delimiter = ',',
        default_value = "http://localhost:5173"
    )]
    pub allowed_origins: Vec<String>,

    /// Wildcard subdomain pattern allowed for cross-origin requests, e.g. '*.vercel.app' (repeatable)
    #[arg(
        long = "allowed-origin-pattern",
        env = "ALLOWED_ORIGIN_PATTERNS",
        value_delimiter = ',',
        default_value = "*.vercel.app"
    )]
    pub allowed_origin_patterns: Vec<String>,
}

/// Upstream service endpoints and request settings
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub geocoding_url: String,
    pub open_meteo_url: String,
    pub openweather_url: String,
    pub openweather_api_key: Option<String>,
    pub timeout: Duration,
}

/// Validated configuration derived from CLI arguments
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub cache: CacheBackend,
    pub upstream: UpstreamConfig,
    pub origins: OriginPolicy,
}

impl ServerConfig {
    /// Creates a ServerConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(ServerConfig)` with defaults resolved
    /// * `Err(CliError)` if a value is invalid or no cache location is available
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        if cli.upstream_timeout_secs == 0 {
            return Err(CliError::InvalidTimeout);
        }

        let patterns: Vec<&str> = cli
            .allowed_origin_patterns
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .collect();
        if let Some(bad) = patterns.iter().find(|p| !is_wildcard_pattern(p)) {
            return Err(CliError::InvalidOriginPattern(bad.to_string()));
        }

        let cache = match (&cli.cache_dir, cli.memory_cache) {
            (_, true) => CacheBackend::Memory,
            (Some(dir), false) => CacheBackend::Directory(dir.clone()),
            (None, false) => {
                let manager = CacheManager::new().ok_or(CliError::NoCacheDir)?;
                CacheBackend::Directory(manager.cache_dir().to_path_buf())
            }
        };

        let exact = cli
            .allowed_origins
            .iter()
            .map(|o| o.trim())
            .filter(|o| !o.is_empty())
            .map(str::to_string);

        Ok(ServerConfig {
            bind: cli.bind,
            cache,
            upstream: UpstreamConfig {
                geocoding_url: cli.geocoding_url.clone(),
                open_meteo_url: cli.open_meteo_url.clone(),
                openweather_url: cli.openweather_url.clone(),
                openweather_api_key: cli.openweather_api_key.clone(),
                timeout: Duration::from_secs(cli.upstream_timeout_secs),
            },
            origins: OriginPolicy::new(exact, patterns),
        })
    }
}

/// `*.` followed by at least one more character
fn is_wildcard_pattern(pattern: &str) -> bool {
    pattern.strip_prefix("*.").is_some_and(|domain| !domain.is_empty())
}
