//! Deduplicating geocoding cache for store addresses.
//!
//! - [`GeocodeCache`]: one provider call per address per eviction epoch, with
//!   a fallback location instead of errors
//! - [`AddressWatcher`]: pending / ready / fallback view of a single address

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod cache;
mod watcher;

#[cfg(test)]
mod testing;

pub use cache::{CacheConfig, CacheStats, GeocodeCache};
pub use watcher::{AddressWatcher, GeocodeState};
