//! Common traits for the locator.
//!
//! The cache only needs something that can turn a query key into an optional
//! coordinate, which keeps the HTTP client swappable and the cache testable
//! without a network.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Coordinate, QueryKey};

// ═══════════════════════════════════════════════════════════════════════════════
// GEOCODING PROVIDER TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Interface for forward geocoding.
///
/// Implementations might use:
/// - A public Nominatim instance (the default)
/// - A self-hosted search endpoint with the same response shape
/// - A canned table (tests)
#[async_trait]
pub trait GeocodingProvider: Send + Sync {
    /// Looks up the first match for a query.
    ///
    /// Returns `Ok(None)` when the provider found nothing.
    async fn search(&self, query: &QueryKey) -> Result<Option<Coordinate>>;

    /// Short name used in logs.
    fn name(&self) -> &str {
        "geocoder"
    }
}

#[async_trait]
impl<T: GeocodingProvider + ?Sized> GeocodingProvider for Arc<T> {
    async fn search(&self, query: &QueryKey) -> Result<Option<Coordinate>> {
        (**self).search(query).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
