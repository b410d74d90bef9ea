//! # Locator API Server
//!
//! REST API over the geocode cache, consumed by the store map front-end.
//!
//! ## Endpoints
//!
//! - `GET /api/v1/geocode` - Resolve one address (query parameters)
//! - `POST /api/v1/geocode/batch` - Resolve a store listing
//! - `GET /api/v1/geocode/key` - Show the query key for an address
//! - `GET /api/v1/cache/stats` - Cache statistics
//! - `POST /api/v1/cache/clear` - Drop every cache entry
//!
//! ## Example
//!
//! ```rust,ignore
//! use locator_api::{ApiServer, ApiConfig};
//!
//! let server = ApiServer::new(ApiConfig::from_env())?;
//! server.run(([0, 0, 0, 0], 3001)).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod routes;
mod handlers;
mod state;
mod dto;
mod error;

pub use routes::create_router;
pub use state::{AppState, ApiConfig};
pub use error::ApiError;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use locator_core::error::Result;

/// Largest accepted request body (a full batch fits comfortably).
const MAX_BODY_BYTES: usize = 64 * 1024;

/// API server for the locator.
pub struct ApiServer {
    state: Arc<AppState>,
}

impl ApiServer {
    /// Creates a new API server with the given configuration.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: ApiConfig) -> Result<Self> {
        Ok(Self {
            state: Arc::new(AppState::new(config)?),
        })
    }

    /// Creates the router with all routes configured.
    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        create_router(self.state.clone())
            .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }

    /// Runs the server on the given address.
    pub async fn run(self, addr: impl Into<SocketAddr>) -> std::io::Result<()> {
        let addr = addr.into();
        let listener = tokio::net::TcpListener::bind(addr).await?;

        info!("Locator API server listening on {}", addr);

        axum::serve(listener, self.router()).await
    }
}

/// Starts the API server with configuration from the environment.
pub async fn start_server(port: u16) -> std::io::Result<()> {
    let server = ApiServer::new(ApiConfig::from_env())
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;
    server.run(([0, 0, 0, 0], port)).await
}
