//! Deduplicating geocoding cache.
//!
//! Every distinct query key gets at most one provider call per eviction epoch.
//! The first caller for a key inserts an in-flight lookup into the map before
//! the provider is contacted; later callers clone that lookup and wait on it.
//! The whole map is dropped on a fixed period, pending entries included.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::{join_all, BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

use locator_core::constants::DEFAULT_EVICTION_INTERVAL_SECS;
use locator_core::error::{LocatorError, Result};
use locator_core::traits::GeocodingProvider;
use locator_core::types::{Address, Coordinate, QueryKey, Resolution};

/// A lookup in flight or already settled. Cloning attaches another waiter.
type Lookup = Shared<BoxFuture<'static, Resolution>>;

/// Map slot: the shared lookup plus a flag set when its task exits.
struct Entry {
    lookup: Lookup,
    settled: Arc<AtomicBool>,
}

/// Marks the entry settled when the lookup task finishes, even by panic.
struct SettleOnDrop(Arc<AtomicBool>);

impl Drop for SettleOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Release);
    }
}

/// Cache configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Seconds between full evictions of the map
    pub eviction_interval_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            eviction_interval_seconds: DEFAULT_EVICTION_INTERVAL_SECS,
        }
    }
}

impl CacheConfig {
    /// Creates a configuration with the given eviction period.
    pub fn with_eviction_interval(seconds: u64) -> Self {
        Self {
            eviction_interval_seconds: seconds,
        }
    }

    /// Eviction period as a [`Duration`].
    pub fn eviction_interval(&self) -> Duration {
        Duration::from_secs(self.eviction_interval_seconds)
    }

    /// Rejects a zero eviction period.
    pub fn validate(&self) -> Result<()> {
        if self.eviction_interval_seconds == 0 {
            return Err(LocatorError::ConfigError(
                "eviction interval must be at least one second".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Default)]
struct Counters {
    provider_calls: AtomicU64,
    hits: AtomicU64,
    fallbacks: AtomicU64,
    evictions: AtomicU64,
}

/// State shared between the cache handle, its lookups and its eviction task.
struct CacheState {
    entries: Mutex<HashMap<QueryKey, Entry>>,
    provider: Arc<dyn GeocodingProvider>,
    counters: Counters,
    last_evicted_at: Mutex<Option<DateTime<Utc>>>,
}

impl CacheState {
    fn clear(&self) -> usize {
        let mut entries = self.entries.lock();
        let cleared = entries.len();
        entries.clear();
        cleared
    }
}

/// Address geocoding cache.
///
/// Thread-safe. Owns a background task that clears the map every
/// [`CacheConfig::eviction_interval`]; the task stops when the cache is dropped.
///
/// # Example
///
/// ```rust,ignore
/// let provider = Arc::new(NominatimClient::new()?);
/// let cache = GeocodeCache::new(provider)?;
/// let coord = cache.resolve(&Address::new("1 Main St", "Springfield", "IL", "62701")).await;
/// ```
pub struct GeocodeCache {
    state: Arc<CacheState>,
    config: CacheConfig,
    evictor: JoinHandle<()>,
}

impl GeocodeCache {
    /// Creates a cache with the default one-hour eviction period.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(provider: Arc<dyn GeocodingProvider>) -> Result<Self> {
        Self::with_config(provider, CacheConfig::default())
    }

    /// Creates a cache with custom configuration.
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_config(provider: Arc<dyn GeocodingProvider>, config: CacheConfig) -> Result<Self> {
        config.validate()?;
        tokio::runtime::Handle::try_current()
            .map_err(|e| LocatorError::ConfigError(format!("geocode cache needs a tokio runtime: {e}")))?;

        let state = Arc::new(CacheState {
            entries: Mutex::new(HashMap::new()),
            provider,
            counters: Counters::default(),
            last_evicted_at: Mutex::new(None),
        });

        let evictor = spawn_evictor(Arc::downgrade(&state), config.eviction_interval());

        debug!(
            provider = state.provider.name(),
            interval_secs = config.eviction_interval_seconds,
            "Geocode cache started"
        );

        Ok(Self {
            state,
            config,
            evictor,
        })
    }

    /// Resolves an address to a coordinate.
    ///
    /// Never fails: provider errors and empty results resolve to
    /// [`Coordinate::fallback`].
    pub async fn resolve(&self, address: &Address) -> Coordinate {
        self.resolve_key(&address.query_key()).await.coordinate
    }

    /// Resolves an address, reporting whether the fallback was applied.
    pub async fn resolve_detailed(&self, address: &Address) -> Resolution {
        self.resolve_key(&address.query_key()).await
    }

    /// Resolves a precomputed query key.
    #[instrument(skip(self, key), fields(query = %key))]
    pub async fn resolve_key(&self, key: &QueryKey) -> Resolution {
        let lookup = {
            let mut entries = self.state.entries.lock();
            if let Some(existing) = entries.get(key) {
                self.state.counters.hits.fetch_add(1, Ordering::Relaxed);
                debug!("Cache hit");
                existing.lookup.clone()
            } else {
                debug!("Cache miss, starting lookup");
                let entry = start_lookup(Arc::clone(&self.state), key.clone());
                let lookup = entry.lookup.clone();
                entries.insert(key.clone(), entry);
                lookup
            }
        };

        lookup.await
    }

    /// Resolves many addresses concurrently, preserving input order.
    pub async fn resolve_many(&self, addresses: &[Address]) -> Vec<Resolution> {
        join_all(addresses.iter().map(|a| self.resolve_detailed(a))).await
    }

    /// Drops every entry, pending ones included.
    ///
    /// Lookups already in flight still complete for whoever awaits them; the
    /// next resolve for the same key starts a new lookup.
    pub fn clear(&self) -> usize {
        let cleared = self.state.clear();
        debug!(cleared, "Cache cleared");
        cleared
    }

    /// Returns true if the address has an entry, pending or settled.
    pub fn contains(&self, address: &Address) -> bool {
        self.state.entries.lock().contains_key(&address.query_key())
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.state.entries.lock().len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.state.entries.lock().is_empty()
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> CacheStats {
        let (entries, pending) = {
            let entries = self.state.entries.lock();
            let pending = entries
                .values()
                .filter(|e| !e.settled.load(Ordering::Acquire))
                .count();
            (entries.len(), pending)
        };
        let counters = &self.state.counters;

        CacheStats {
            entries,
            pending,
            provider_calls: counters.provider_calls.load(Ordering::Relaxed),
            hits: counters.hits.load(Ordering::Relaxed),
            fallbacks: counters.fallbacks.load(Ordering::Relaxed),
            evictions: counters.evictions.load(Ordering::Relaxed),
            last_evicted_at: *self.state.last_evicted_at.lock(),
            eviction_interval_seconds: self.config.eviction_interval_seconds,
        }
    }
}

impl Drop for GeocodeCache {
    fn drop(&mut self) {
        self.evictor.abort();
    }
}

/// Cache statistics.
#[derive(Clone, Debug, Serialize)]
pub struct CacheStats {
    /// Entries currently in the map
    pub entries: usize,
    /// Entries whose lookup has not settled yet
    pub pending: usize,
    /// Provider calls issued since the cache was created
    pub provider_calls: u64,
    /// Resolves served by an existing entry
    pub hits: u64,
    /// Lookups that settled on the fallback location
    pub fallbacks: u64,
    /// Scheduled evictions performed
    pub evictions: u64,
    /// Time of the last scheduled eviction
    pub last_evicted_at: Option<DateTime<Utc>>,
    /// Eviction period in seconds
    pub eviction_interval_seconds: u64,
}

/// Spawns the provider call for `key` and wraps it as a shareable lookup.
///
/// The call runs on its own task so it finishes even if every waiter is
/// dropped.
fn start_lookup(state: Arc<CacheState>, key: QueryKey) -> Entry {
    state.counters.provider_calls.fetch_add(1, Ordering::Relaxed);
    let settled = Arc::new(AtomicBool::new(false));
    let task = tokio::spawn(run_lookup(state, key, SettleOnDrop(Arc::clone(&settled))));

    let lookup = async move {
        match task.await {
            Ok(resolution) => resolution,
            Err(e) => {
                let err = LocatorError::InternalError(format!("lookup task ended: {e}"));
                warn!(error = %err, "Geocoding lookup lost, using fallback location");
                Resolution::fallback(err.to_string())
            }
        }
    }
    .boxed()
    .shared();

    Entry { lookup, settled }
}

async fn run_lookup(state: Arc<CacheState>, key: QueryKey, _settle: SettleOnDrop) -> Resolution {
    let resolution = match state.provider.search(&key).await {
        Ok(Some(coordinate)) => {
            debug!(query = %key, %coordinate, "Geocoded");
            Resolution::found(coordinate)
        }
        Ok(None) => {
            warn!(query = %key, "No geocoding match, using fallback location");
            Resolution::fallback("no match")
        }
        Err(e) => {
            warn!(query = %key, error = %e, "Geocoding failed, using fallback location");
            Resolution::fallback(e.to_string())
        }
    };

    if resolution.is_fallback() {
        state.counters.fallbacks.fetch_add(1, Ordering::Relaxed);
    }
    resolution
}

fn spawn_evictor(state: Weak<CacheState>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let Some(state) = state.upgrade() else { break };

            let cleared = state.clear();
            state.counters.evictions.fetch_add(1, Ordering::Relaxed);
            *state.last_evicted_at.lock() = Some(Utc::now());
            info!(cleared, "Evicted geocode cache");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{springfield, ScriptedProvider};
    use locator_core::types::ResolutionSource;

    fn cache_with(provider: &Arc<ScriptedProvider>) -> GeocodeCache {
        GeocodeCache::new(provider.clone()).unwrap()
    }

    async fn wait_for_evictions(cache: &GeocodeCache, n: u64) {
        for _ in 0..1000 {
            if cache.stats().evictions >= n {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("eviction did not run");
    }

    #[tokio::test]
    async fn test_resolve_first_match() {
        let provider = Arc::new(ScriptedProvider::new().found(
            "1 Main St, Springfield, IL, 62701, USA",
            Coordinate::new(40.7128, -74.0060),
        ));
        let cache = cache_with(&provider);

        let coord = cache.resolve(&springfield()).await;

        assert_eq!(coord, Coordinate::new(40.7128, -74.0060));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_result_uses_fallback() {
        let provider = Arc::new(ScriptedProvider::new());
        let cache = cache_with(&provider);

        let resolution = cache.resolve_detailed(&springfield()).await;

        assert_eq!(resolution.coordinate, Coordinate::new(39.8283, -98.5795));
        assert_eq!(
            resolution.source,
            ResolutionSource::Fallback { reason: "no match".into() }
        );
        assert_eq!(cache.stats().fallbacks, 1);
    }

    #[tokio::test]
    async fn test_provider_failure_uses_fallback() {
        let provider = Arc::new(
            ScriptedProvider::new().failing("1 Main St, Springfield, IL, 62701, USA"),
        );
        let cache = cache_with(&provider);

        let resolution = cache.resolve_detailed(&springfield()).await;

        assert!(resolution.is_fallback());
        assert_eq!(resolution.coordinate, Coordinate::fallback());
    }

    #[tokio::test]
    async fn test_failed_lookup_stays_cached() {
        let provider = Arc::new(ScriptedProvider::new());
        let cache = cache_with(&provider);

        cache.resolve(&springfield()).await;
        cache.resolve(&springfield()).await;

        assert_eq!(provider.calls(), 1);
        assert_eq!(cache.stats().hits, 1);
    }

    #[tokio::test]
    async fn test_concurrent_same_key_single_call() {
        let provider = Arc::new(ScriptedProvider::new().gated());
        let cache = cache_with(&provider);

        let a = springfield();
        let b = Address::new(" 1 Main St ", "Springfield", "IL ", " 62701").with_visibility(true);

        let (ra, rb, _) = tokio::join!(cache.resolve(&a), cache.resolve(&b), async {
            provider.wait_for_calls(1).await;
            provider.release(1);
        });

        assert_eq!(ra, rb);
        assert_eq!(provider.calls(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_tasks_single_call() {
        let provider = Arc::new(ScriptedProvider::new().gated().found(
            "1 Main St, Springfield, IL, 62701, USA",
            Coordinate::new(39.799, -89.644),
        ));
        let cache = Arc::new(cache_with(&provider));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.resolve(&springfield()).await })
            })
            .collect();

        provider.wait_for_calls(1).await;
        provider.release(1);

        for handle in handles {
            assert_eq!(handle.await.unwrap(), Coordinate::new(39.799, -89.644));
        }
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_distinct_keys_each_call_provider() {
        let provider = Arc::new(ScriptedProvider::new());
        let cache = cache_with(&provider);

        let other = Address::new("2 Oak Ave", "Springfield", "IL", "62701");
        cache.resolve_many(&[springfield(), other, springfield()]).await;

        assert_eq!(provider.calls(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_resolve_many_preserves_order() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .found("a, b, c, 1, USA", Coordinate::new(1.0, 1.0))
                .found("d, e, f, 2, USA", Coordinate::new(2.0, 2.0)),
        );
        let cache = cache_with(&provider);

        let results = cache
            .resolve_many(&[Address::new("d", "e", "f", "2"), Address::new("a", "b", "c", "1")])
            .await;

        assert_eq!(results[0].coordinate, Coordinate::new(2.0, 2.0));
        assert_eq!(results[1].coordinate, Coordinate::new(1.0, 1.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_eviction_forces_new_lookup() {
        let provider = Arc::new(ScriptedProvider::new());
        let cache = cache_with(&provider);

        cache.resolve(&springfield()).await;
        cache.resolve(&springfield()).await;
        assert_eq!(provider.calls(), 1);

        time::sleep(Duration::from_secs(DEFAULT_EVICTION_INTERVAL_SECS + 1)).await;
        wait_for_evictions(&cache, 1).await;
        assert!(cache.is_empty());
        assert!(cache.stats().last_evicted_at.is_some());

        cache.resolve(&springfield()).await;
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_eviction_before_interval() {
        let provider = Arc::new(ScriptedProvider::new());
        let cache = cache_with(&provider);

        cache.resolve(&springfield()).await;
        time::sleep(Duration::from_secs(DEFAULT_EVICTION_INTERVAL_SECS - 1)).await;

        assert_eq!(cache.stats().evictions, 0);
        assert!(cache.contains(&springfield()));
    }

    #[tokio::test]
    async fn test_clear_while_pending() {
        let provider = Arc::new(ScriptedProvider::new().gated().found(
            "1 Main St, Springfield, IL, 62701, USA",
            Coordinate::new(5.0, 6.0),
        ));
        let cache = Arc::new(cache_with(&provider));

        let first = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.resolve(&springfield()).await })
        };
        provider.wait_for_calls(1).await;
        assert_eq!(cache.stats().pending, 1);

        assert_eq!(cache.clear(), 1);

        let second = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.resolve(&springfield()).await })
        };
        provider.wait_for_calls(2).await;
        provider.release(2);

        assert_eq!(first.await.unwrap(), Coordinate::new(5.0, 6.0));
        assert_eq!(second.await.unwrap(), Coordinate::new(5.0, 6.0));
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_lookup_survives_dropped_waiter() {
        let provider = Arc::new(ScriptedProvider::new().gated().found(
            "1 Main St, Springfield, IL, 62701, USA",
            Coordinate::new(7.0, 8.0),
        ));
        let cache = Arc::new(cache_with(&provider));

        let waiter = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.resolve(&springfield()).await })
        };
        provider.wait_for_calls(1).await;
        waiter.abort();

        provider.release(1);
        assert_eq!(cache.resolve(&springfield()).await, Coordinate::new(7.0, 8.0));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_unawaited_lookup_not_counted_pending() {
        let provider = Arc::new(ScriptedProvider::new().gated());
        let cache = Arc::new(cache_with(&provider));

        let waiter = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.resolve(&springfield()).await })
        };
        provider.wait_for_calls(1).await;
        waiter.abort();
        assert_eq!(cache.stats().pending, 1);

        provider.release(1);
        for _ in 0..1000 {
            if cache.stats().pending == 0 {
                break;
            }
            tokio::task::yield_now().await;
        }

        let stats = cache.stats();
        assert_eq!(stats.pending, 0);
        assert_eq!(stats.entries, 1);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_zero_interval_rejected() {
        let provider = Arc::new(ScriptedProvider::new());
        let result = GeocodeCache::with_config(provider, CacheConfig::with_eviction_interval(0));
        assert!(matches!(result, Err(LocatorError::ConfigError(_))));
    }

    #[test]
    fn test_requires_runtime() {
        let provider = Arc::new(ScriptedProvider::new());
        assert!(GeocodeCache::new(provider).is_err());
    }

    #[tokio::test]
    async fn test_stats() {
        let provider = Arc::new(ScriptedProvider::new().found(
            "1 Main St, Springfield, IL, 62701, USA",
            Coordinate::new(1.0, 2.0),
        ));
        let cache = cache_with(&provider);

        cache.resolve(&springfield()).await;
        cache.resolve(&springfield()).await;
        cache.resolve(&Address::new("9 Nowhere", "X", "YY", "00000")).await;

        let stats = cache.stats();
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.pending, 0);
        assert_eq!(stats.provider_calls, 2);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.fallbacks, 1);
        assert_eq!(stats.evictions, 0);
        assert_eq!(stats.eviction_interval_seconds, 3600);
    }
}
