//! API route configuration.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::state::AppState;

/// Creates the API router with all routes configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))

        // Geocoding
        .route("/api/v1/geocode", get(handlers::geocode))
        .route("/api/v1/geocode/batch", post(handlers::geocode_batch))
        .route("/api/v1/geocode/key", get(handlers::query_key))

        // Cache administration
        .route("/api/v1/cache/stats", get(handlers::cache_stats))
        .route("/api/v1/cache/clear", post(handlers::clear_cache))

        .with_state(state)
}
