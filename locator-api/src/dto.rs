//! DTOs for API requests and responses.

use serde::{Deserialize, Serialize};

use locator_core::types::{Address, Resolution, ResolutionSource};

/// Address passed as query parameters.
#[derive(Debug, Deserialize)]
pub struct AddressQuery {
    /// Street line
    pub street: String,
    /// City
    pub city: String,
    /// State code
    pub state: String,
    /// Postal code
    pub zip: String,
}

impl From<AddressQuery> for Address {
    fn from(q: AddressQuery) -> Self {
        Address::new(q.street, q.city, q.state, q.zip)
    }
}

/// Geocoding result for one address.
#[derive(Debug, Serialize)]
pub struct GeocodeResponse {
    /// Query key sent to the provider
    pub query: String,
    /// Latitude
    pub lat: f64,
    /// Longitude
    pub lng: f64,
    /// "provider" or "fallback"
    pub source: &'static str,
    /// Why the fallback was applied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl GeocodeResponse {
    /// Builds a response from the query key and its resolution.
    pub fn new(query: String, resolution: Resolution) -> Self {
        let (source, reason) = match resolution.source {
            ResolutionSource::Provider => ("provider", None),
            ResolutionSource::Fallback { reason } => ("fallback", Some(reason)),
        };

        Self {
            query,
            lat: resolution.coordinate.lat,
            lng: resolution.coordinate.lng,
            source,
            reason,
        }
    }
}

/// Request to geocode a store listing.
#[derive(Debug, Deserialize)]
pub struct BatchGeocodeRequest {
    /// Addresses to resolve
    pub addresses: Vec<Address>,
}

/// Results in request order.
#[derive(Debug, Serialize)]
pub struct BatchGeocodeResponse {
    /// One result per requested address
    pub results: Vec<GeocodeResponse>,
}

/// Query key for an address.
#[derive(Debug, Serialize)]
pub struct QueryKeyResponse {
    /// Rendered query key
    pub query: String,
}

/// Response for a manual cache clear.
#[derive(Debug, Serialize)]
pub struct ClearCacheResponse {
    /// Number of entries dropped
    pub cleared: usize,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status
    pub status: String,
    /// Version
    pub version: String,
    /// Uptime in seconds
    pub uptime_seconds: u64,
    /// Entries currently cached
    pub cached_addresses: usize,
}
