//! Nominatim search client.
//!
//! Sends one GET per query to a Nominatim-compatible `/search` endpoint and
//! reads the first match. Anything unexpected becomes a [`LocatorError`]; the
//! cache decides what to do with it.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use locator_core::constants::{DEFAULT_GEOCODER_ENDPOINT, DEFAULT_USER_AGENT, PROVIDER_RESULT_LIMIT};
use locator_core::error::{LocatorError, Result};
use locator_core::traits::GeocodingProvider;
use locator_core::types::{Coordinate, QueryKey};

/// Geocoder client configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeocoderConfig {
    /// Search endpoint (e.g. "https://nominatim.openstreetmap.org/search")
    pub endpoint: String,
    /// Client identifier sent as the `User-Agent` header
    pub user_agent: String,
    /// Request timeout in seconds; `None` waits as long as the provider does
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_GEOCODER_ENDPOINT.into(),
            user_agent: DEFAULT_USER_AGENT.into(),
            timeout_seconds: None,
        }
    }
}

impl GeocoderConfig {
    /// Creates a configuration for the given search endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Sets the client identifier.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Bounds every request by the given number of seconds.
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }

    /// Checks that the endpoint is an http(s) URL and the client identifier is set.
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.endpoint)
            .map_err(|e| LocatorError::ConfigError(format!("invalid endpoint {:?}: {}", self.endpoint, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(LocatorError::ConfigError(format!(
                "endpoint must be http or https, got {}",
                url.scheme()
            )));
        }

        if self.user_agent.trim().is_empty() {
            return Err(LocatorError::ConfigError("user agent cannot be empty".into()));
        }

        Ok(())
    }
}

/// Client for a Nominatim-compatible search endpoint.
pub struct NominatimClient {
    config: GeocoderConfig,
    http_client: reqwest::Client,
}

impl NominatimClient {
    /// Creates a client against the public Nominatim instance.
    pub fn new() -> Result<Self> {
        Self::with_config(GeocoderConfig::default())
    }

    /// Creates a client with custom configuration.
    pub fn with_config(config: GeocoderConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(secs) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http_client = builder
            .build()
            .map_err(|e| LocatorError::ConfigError(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &GeocoderConfig {
        &self.config
    }

    /// Sends the search request and returns the first match, if any.
    #[instrument(skip(self, query), fields(query = %query))]
    pub async fn lookup(&self, query: &QueryKey) -> Result<Option<Coordinate>> {
        let limit = PROVIDER_RESULT_LIMIT.to_string();
        let response = self
            .http_client
            .get(&self.config.endpoint)
            .query(&[("q", query.as_str()), ("format", "json"), ("limit", limit.as_str())])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LocatorError::ConnectionTimeout(e.to_string())
                } else {
                    LocatorError::Http(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LocatorError::ProviderStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| LocatorError::Http(e.to_string()))?;

        let first = parse_first_match(&body)?;
        debug!(found = first.is_some(), "Provider answered");
        Ok(first)
    }
}

#[async_trait]
impl GeocodingProvider for NominatimClient {
    async fn search(&self, query: &QueryKey) -> Result<Option<Coordinate>> {
        self.lookup(query).await
    }

    fn name(&self) -> &str {
        "nominatim"
    }
}

/// One entry of a Nominatim search response. Other fields are ignored.
#[derive(Debug, Deserialize)]
struct SearchMatch {
    lat: String,
    lon: String,
}

/// Parses a search response body, returning the first match's coordinate.
fn parse_first_match(body: &str) -> Result<Option<Coordinate>> {
    let matches: Vec<SearchMatch> = serde_json::from_str(body)
        .map_err(|e| LocatorError::MalformedResponse(e.to_string()))?;

    match matches.first() {
        Some(m) => Coordinate::parse(&m.lat, &m.lon).map(Some),
        None => Ok(None),
    }
}
