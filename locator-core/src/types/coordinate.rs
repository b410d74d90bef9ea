//! Coordinate types.
//!
//! - [`Coordinate`]: A latitude/longitude pair in decimal degrees
//! - [`Resolution`]: The settled value of a lookup, with where it came from

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{FALLBACK_LAT, FALLBACK_LNG};
use crate::error::{LocatorError, Result};

/// A point on the map in decimal degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude, positive north
    pub lat: f64,
    /// Longitude, positive east
    pub lng: f64,
}

impl Coordinate {
    /// Creates a coordinate.
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// The location used whenever geocoding yields nothing usable.
    pub const fn fallback() -> Self {
        Self::new(FALLBACK_LAT, FALLBACK_LNG)
    }

    /// Parses the decimal-degree strings returned by the provider.
    pub fn parse(lat: &str, lon: &str) -> Result<Self> {
        let lat: f64 = lat
            .trim()
            .parse()
            .map_err(|e| LocatorError::InvalidCoordinate(format!("lat {lat:?}: {e}")))?;
        let lng: f64 = lon
            .trim()
            .parse()
            .map_err(|e| LocatorError::InvalidCoordinate(format!("lon {lon:?}: {e}")))?;

        if !lat.is_finite() || !lng.is_finite() {
            return Err(LocatorError::InvalidCoordinate(format!(
                "non-finite value ({lat}, {lng})"
            )));
        }

        Ok(Self { lat, lng })
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.lat, self.lng)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RESOLUTION
// ═══════════════════════════════════════════════════════════════════════════════

/// Where a resolved coordinate came from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ResolutionSource {
    /// First match returned by the geocoding provider.
    Provider,
    /// Provider gave nothing usable; the fallback location was applied.
    Fallback {
        /// Why the provider result was not used
        reason: String,
    },
}

/// The settled value of a geocoding lookup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    /// Resolved location
    pub coordinate: Coordinate,
    /// Where the location came from
    #[serde(flatten)]
    pub source: ResolutionSource,
}

impl Resolution {
    /// A provider match.
    pub fn found(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            source: ResolutionSource::Provider,
        }
    }

    /// The fallback location, with the reason it was applied.
    pub fn fallback(reason: impl Into<String>) -> Self {
        Self {
            coordinate: Coordinate::fallback(),
            source: ResolutionSource::Fallback {
                reason: reason.into(),
            },
        }
    }

    /// Returns true if the fallback location was applied.
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, ResolutionSource::Fallback { .. })
    }
}
