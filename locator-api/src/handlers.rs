//! API route handlers.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use tracing::{debug, info};

use locator_cache::CacheStats;
use locator_core::constants::MAX_BATCH_SIZE;
use locator_core::error::LocatorError;
use locator_core::types::Address;

use crate::dto::*;
use crate::error::ApiError;
use crate::state::AppState;

type Result<T> = std::result::Result<T, ApiError>;

/// GET /api/v1/geocode?street=&city=&state=&zip=
///
/// Always answers 200 for a well-formed request; provider trouble shows up as
/// `source: "fallback"`.
pub async fn geocode(
    State(state): State<Arc<AppState>>,
    query: std::result::Result<Query<AddressQuery>, QueryRejection>,
) -> Result<Json<GeocodeResponse>> {
    let Query(query) = query?;
    let address = Address::from(query);
    let key = address.query_key();

    let resolution = state.cache.resolve_key(&key).await;
    debug!(query = %key, fallback = resolution.is_fallback(), "Geocoded address");

    Ok(Json(GeocodeResponse::new(key.into_string(), resolution)))
}

/// POST /api/v1/geocode/batch
pub async fn geocode_batch(
    State(state): State<Arc<AppState>>,
    req: std::result::Result<Json<BatchGeocodeRequest>, JsonRejection>,
) -> Result<Json<BatchGeocodeResponse>> {
    let Json(req) = req?;

    if req.addresses.is_empty() {
        return Err(LocatorError::ValidationError("addresses cannot be empty".into()).into());
    }
    if req.addresses.len() > MAX_BATCH_SIZE {
        return Err(LocatorError::ValidationError(format!(
            "at most {} addresses per request, got {}",
            MAX_BATCH_SIZE,
            req.addresses.len()
        ))
        .into());
    }

    let resolutions = state.cache.resolve_many(&req.addresses).await;

    let results: Vec<GeocodeResponse> = req
        .addresses
        .iter()
        .zip(resolutions)
        .map(|(address, resolution)| {
            GeocodeResponse::new(address.query_key().into_string(), resolution)
        })
        .collect();

    info!(count = results.len(), "Geocoded batch");
    Ok(Json(BatchGeocodeResponse { results }))
}

/// GET /api/v1/geocode/key?street=&city=&state=&zip=
pub async fn query_key(
    query: std::result::Result<Query<AddressQuery>, QueryRejection>,
) -> Result<Json<QueryKeyResponse>> {
    let Query(query) = query?;
    let key = Address::from(query).query_key();

    Ok(Json(QueryKeyResponse {
        query: key.into_string(),
    }))
}

/// GET /api/v1/cache/stats
pub async fn cache_stats(State(state): State<Arc<AppState>>) -> Json<CacheStats> {
    Json(state.cache.stats())
}

/// POST /api/v1/cache/clear
pub async fn clear_cache(State(state): State<Arc<AppState>>) -> Json<ClearCacheResponse> {
    let cleared = state.cache.clear();
    info!(cleared, "Cache cleared via API");
    Json(ClearCacheResponse { cleared })
}

/// GET /health
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        cached_addresses: state.cache.len(),
    })
}
