//! Fixed values shared by the geocoding stack.
//!
//! Query key format, the fallback location and the provider defaults all live
//! here so the cache, the HTTP client and the API agree on them.

// ═══════════════════════════════════════════════════════════════════════════════
// QUERY KEY
// ═══════════════════════════════════════════════════════════════════════════════

/// Separator placed between the address fields of a query key.
pub const QUERY_KEY_SEPARATOR: &str = ", ";

/// Country appended to every query key.
pub const QUERY_KEY_COUNTRY: &str = "USA";

// ═══════════════════════════════════════════════════════════════════════════════
// FALLBACK LOCATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Latitude of the geographic center of the contiguous United States.
pub const FALLBACK_LAT: f64 = 39.8283;

/// Longitude of the geographic center of the contiguous United States.
pub const FALLBACK_LNG: f64 = -98.5795;

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE
// ═══════════════════════════════════════════════════════════════════════════════

/// Period after which the whole cache mapping is discarded (one hour).
pub const DEFAULT_EVICTION_INTERVAL_SECS: u64 = 3600;

// ═══════════════════════════════════════════════════════════════════════════════
// GEOCODING PROVIDER
// ═══════════════════════════════════════════════════════════════════════════════

/// Search endpoint of the public Nominatim instance.
pub const DEFAULT_GEOCODER_ENDPOINT: &str = "https://nominatim.openstreetmap.org/search";

/// Client identifier sent as `User-Agent`. Nominatim rejects anonymous clients.
pub const DEFAULT_USER_AGENT: &str = "LocatorStoreMap/1.0";

/// Number of matches requested from the provider. Only the first is used.
pub const PROVIDER_RESULT_LIMIT: u32 = 1;

// ═══════════════════════════════════════════════════════════════════════════════
// API LIMITS
// ═══════════════════════════════════════════════════════════════════════════════

/// Maximum number of addresses accepted by one batch request.
pub const MAX_BATCH_SIZE: usize = 100;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_is_inside_contiguous_us() {
        assert!((24.0..50.0).contains(&FALLBACK_LAT));
        assert!((-125.0..-66.0).contains(&FALLBACK_LNG));
    }

    #[test]
    fn test_eviction_interval_is_one_hour() {
        assert_eq!(DEFAULT_EVICTION_INTERVAL_SECS, 60 * 60);
    }
}
