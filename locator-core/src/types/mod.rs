//! Domain types for the locator.
//!
//! - [`Address`]: A store's postal address
//! - [`QueryKey`]: Canonical search string for an address
//! - [`Coordinate`]: Latitude/longitude pair
//! - [`Resolution`]: A settled lookup with its source

mod address;
mod coordinate;

pub use address::*;
pub use coordinate::*;
