//! Geocoding provider client for the locator.
//!
//! Talks to a Nominatim-compatible search endpoint over HTTPS.

mod nominatim;

pub use nominatim::{GeocoderConfig, NominatimClient};
