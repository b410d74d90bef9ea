//! Per-address view of the geocode cache.
//!
//! An [`AddressWatcher`] follows one address at a time and publishes its
//! lookup state on a `tokio::sync::watch` channel. Changing the address
//! starts a new subscription; results belonging to an older address are
//! discarded instead of overwriting the newer state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use locator_core::types::{Address, Coordinate, QueryKey, Resolution};

use crate::cache::GeocodeCache;

/// Lookup state for the watched address.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "state", content = "coordinate", rename_all = "snake_case")]
pub enum GeocodeState {
    /// Lookup for the current address has not settled.
    Pending,
    /// Provider returned a location.
    Ready(Coordinate),
    /// Provider gave nothing usable; the fallback location applies.
    Fallback(Coordinate),
}

impl GeocodeState {
    /// Returns the coordinate once settled.
    pub fn coordinate(&self) -> Option<Coordinate> {
        match self {
            GeocodeState::Pending => None,
            GeocodeState::Ready(c) | GeocodeState::Fallback(c) => Some(*c),
        }
    }

    /// Returns true while the lookup is in flight.
    pub fn is_pending(&self) -> bool {
        matches!(self, GeocodeState::Pending)
    }
}

impl From<Resolution> for GeocodeState {
    fn from(resolution: Resolution) -> Self {
        if resolution.is_fallback() {
            GeocodeState::Fallback(resolution.coordinate)
        } else {
            GeocodeState::Ready(resolution.coordinate)
        }
    }
}

/// Aborts the subscription task when dropped.
struct Subscription(JoinHandle<()>);

impl Drop for Subscription {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Follows the geocoding state of a single address.
///
/// Must be created and updated from within a tokio runtime.
pub struct AddressWatcher {
    cache: Arc<GeocodeCache>,
    address: Address,
    key: QueryKey,
    generation: Arc<AtomicU64>,
    state: Arc<watch::Sender<GeocodeState>>,
    subscription: Subscription,
}

impl AddressWatcher {
    /// Starts watching `address`.
    pub fn new(cache: Arc<GeocodeCache>, address: Address) -> Self {
        let key = address.query_key();
        let generation = Arc::new(AtomicU64::new(0));
        let (tx, _rx) = watch::channel(GeocodeState::Pending);
        let state = Arc::new(tx);

        let subscription = subscribe(&cache, &key, &generation, &state);

        Self {
            cache,
            address,
            key,
            generation,
            state,
            subscription,
        }
    }

    /// Current state.
    pub fn state(&self) -> GeocodeState {
        *self.state.borrow()
    }

    /// Receiver that sees every state change.
    pub fn subscribe(&self) -> watch::Receiver<GeocodeState> {
        self.state.subscribe()
    }

    /// The address being watched.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Switches to a new address.
    ///
    /// If the query key changed, the state goes back to `Pending` and a new
    /// lookup is started. The previous lookup keeps running inside the cache
    /// but its result is no longer applied here.
    pub fn set_address(&mut self, address: Address) {
        let key = address.query_key();
        self.address = address;

        if key == self.key {
            return;
        }

        debug!(from = %self.key, to = %key, "Watched address changed");
        self.key = key;
        self.subscription = subscribe(&self.cache, &self.key, &self.generation, &self.state);
    }

    /// Waits until the current address has settled and returns its state.
    pub async fn settled(&self) -> GeocodeState {
        let mut rx = self.state.subscribe();
        let state = rx.wait_for(|s| !s.is_pending()).await.map(|s| *s);
        state.unwrap_or(GeocodeState::Pending)
    }
}

impl Drop for AddressWatcher {
    fn drop(&mut self) {
        // Invalidate before the subscription aborts so a write racing the abort is refused.
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

/// Opens a new generation and spawns the task that applies its result.
fn subscribe(
    cache: &Arc<GeocodeCache>,
    key: &QueryKey,
    generation: &Arc<AtomicU64>,
    state: &Arc<watch::Sender<GeocodeState>>,
) -> Subscription {
    let current = generation.fetch_add(1, Ordering::SeqCst) + 1;
    state.send_replace(GeocodeState::Pending);

    let cache = Arc::clone(cache);
    let key = key.clone();
    let generation = Arc::clone(generation);
    let state = Arc::clone(state);

    Subscription(tokio::spawn(async move {
        let next = GeocodeState::from(cache.resolve_key(&key).await);

        // The watch lock serializes this check with `send_replace` above.
        let applied = state.send_if_modified(|s| {
            if generation.load(Ordering::SeqCst) != current {
                return false;
            }
            *s = next;
            true
        });

        if !applied {
            debug!(query = %key, "Discarded result for stale address");
        }
    }))
}
