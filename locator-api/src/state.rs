//! App state: geocode cache, config.

use std::sync::Arc;
use std::time::Instant;

use tracing::warn;

use locator_cache::{CacheConfig, GeocodeCache};
use locator_core::error::Result;
use locator_core::traits::GeocodingProvider;
use locator_geocode::{GeocoderConfig, NominatimClient};

/// API server configuration.
#[derive(Clone, Debug, Default)]
pub struct ApiConfig {
    /// Geocoding provider settings
    pub geocoder: GeocoderConfig,
    /// Cache settings
    pub cache: CacheConfig,
}

impl ApiConfig {
    /// Loads configuration from the environment (and `.env` if present).
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        let mut config = Self::default();

        if let Ok(endpoint) = std::env::var("GEOCODER_ENDPOINT") {
            config.geocoder.endpoint = endpoint;
        }
        if let Ok(user_agent) = std::env::var("GEOCODER_USER_AGENT") {
            config.geocoder.user_agent = user_agent;
        }
        if let Some(secs) = parse_env::<u64>("GEOCODER_TIMEOUT_SECONDS") {
            config.geocoder.timeout_seconds = Some(secs);
        }
        if let Some(secs) = parse_env::<u64>("CACHE_EVICTION_SECONDS") {
            config.cache.eviction_interval_seconds = secs;
        }

        config
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring unparseable environment variable");
            None
        }
    }
}

/// Shared application state.
pub struct AppState {
    /// Configuration the state was built from
    pub config: ApiConfig,
    /// Geocode cache shared by all handlers
    pub cache: GeocodeCache,
    /// Server start time
    pub started_at: Instant,
}

impl AppState {
    /// Builds the state with a Nominatim client. Needs a tokio runtime.
    pub fn new(config: ApiConfig) -> Result<Self> {
        let client = NominatimClient::with_config(config.geocoder.clone())?;
        Self::with_provider(config, Arc::new(client))
    }

    /// Builds the state around any provider.
    pub fn with_provider(config: ApiConfig, provider: Arc<dyn GeocodingProvider>) -> Result<Self> {
        let cache = GeocodeCache::with_config(provider, config.cache.clone())?;

        Ok(Self {
            config,
            cache,
            started_at: Instant::now(),
        })
    }
}
