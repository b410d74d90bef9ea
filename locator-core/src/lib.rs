//! # Locator Core
//!
//! Core types, errors, and traits for the store-locator geocoding stack.
//!
//! This crate provides the building blocks used by the other locator crates:
//!
//! - **Types**: Addresses, query keys, coordinates, resolutions
//! - **Errors**: Provider and validation errors with context
//! - **Constants**: Query key format, fallback location, provider defaults
//! - **Traits**: The geocoding provider interface
//!
//! ## Example
//!
//! ```rust
//! use locator_core::{Address, Coordinate};
//!
//! let addr = Address::new("1 Main St", "Springfield", "IL", "62701");
//! let key = addr.query_key();
//! assert!(key.as_str().ends_with("USA"));
//! assert_eq!(Coordinate::fallback().lat, 39.8283);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{LocatorError, Result};
pub use traits::*;
pub use types::*;
