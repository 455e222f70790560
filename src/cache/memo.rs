//! Memo Cache Module
//!
//! Thread-safe memoization facade over [`CacheStore`].

use std::hash::Hash;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::{debug, info, trace};

use crate::cache::store::Lookup;
use crate::cache::{CacheKey, CacheStats, CacheStore, NoStats, StatsRecorder, StatsSnapshot};
use crate::config::CacheConfig;
use crate::error::Result;

// == Memo Cache ==
/// Memoizes deterministic computations keyed by callable type, arguments and
/// result type.
///
/// Lookups share a read lock and run in parallel. Inserts, expiry purges and
/// evictions take the write lock. The computation itself runs with no lock
/// held, so two threads missing the same key may both compute it; the later
/// insert wins.
///
/// # Known limitations
/// - Expiry is lazy: an expired entry keeps being served until any insertion
///   runs housekeeping.
/// - Callable identity is its type. Closures created by the same expression
///   share a slot even if their captured values differ, and so do all
///   `fn` pointers of one signature. Pass distinguishing state as an argument.
/// - A raw 64-bit key collision with a matching result type returns the
///   other input's value. Only differing result types are caught.
///
/// # Example
/// ```
/// use memo_cache::MemoCache;
///
/// let cache = MemoCache::new(16).unwrap();
/// let square = |x: u64| x * x;
///
/// assert_eq!(cache.call(square, 12), 144); // miss, computes
/// assert_eq!(cache.call(square, 12), 144); // hit
/// assert_eq!(cache.hit_count(), 1);
/// assert_eq!(cache.miss_count(), 1);
/// ```
#[derive(Debug)]
pub struct MemoCache<S: StatsRecorder = CacheStats> {
    store: RwLock<CacheStore>,
    stats: S,
}

impl MemoCache<CacheStats> {
    // == Constructor ==
    /// Creates a cache with `max_entries` capacity and atomic counters.
    pub fn new(max_entries: usize) -> Result<Self> {
        Self::with_stats(&CacheConfig::with_max_entries(max_entries), CacheStats::new())
    }
}

impl MemoCache<NoStats> {
    /// Creates a cache with `max_entries` capacity that collects no counters.
    pub fn without_stats(max_entries: usize) -> Result<Self> {
        Self::with_stats(&CacheConfig::with_max_entries(max_entries), NoStats)
    }
}

impl<S: StatsRecorder + Default> MemoCache<S> {
    /// Creates a cache from `config` with a fresh recorder.
    ///
    /// The recorder type decides whether counters are collected;
    /// `config.collect_stats` is only consulted by callers choosing `S`.
    pub fn with_config(config: &CacheConfig) -> Result<Self> {
        Self::with_stats(config, S::default())
    }
}

impl<S: StatsRecorder> MemoCache<S> {
    /// Creates a cache from `config` recording into `stats`.
    ///
    /// Pass an `Arc<CacheStats>` to share counters between caches.
    pub fn with_stats(config: &CacheConfig, stats: S) -> Result<Self> {
        config.validate()?;
        info!(
            "Memo cache initialized: max_entries={}, eviction_fraction={}, max_eviction_batch={}",
            config.max_entries, config.eviction_fraction, config.max_eviction_batch
        );
        Ok(Self {
            store: RwLock::new(CacheStore::new(config)),
            stats,
        })
    }

    // == Call ==
    /// Returns `func(args)`, computing it only on a miss.
    ///
    /// Several arguments are passed as a tuple. The result is cached until
    /// evicted. If `func` panics nothing is cached and no lock is held.
    pub fn call<F, A, R>(&self, func: F, args: A) -> R
    where
        F: FnOnce(A) -> R + 'static,
        A: Hash,
        R: Clone + Send + Sync + 'static,
    {
        self.memoize(None, func, args)
    }

    // == Call With TTL ==
    /// Like [`call`](Self::call), but the cached result expires after `ttl`.
    ///
    /// A `ttl` too large to add to the current instant (such as
    /// `Duration::MAX`) stores the result with no expiry.
    pub fn call_with_ttl<F, A, R>(&self, ttl: Duration, func: F, args: A) -> R
    where
        F: FnOnce(A) -> R + 'static,
        A: Hash,
        R: Clone + Send + Sync + 'static,
    {
        self.memoize(Some(ttl), func, args)
    }

    // == Try Call ==
    /// Memoizes a fallible computation.
    ///
    /// Only `Ok` values are cached. An `Err` is returned to the caller as is
    /// and leaves the cache unchanged.
    pub fn try_call<F, A, T, E>(&self, func: F, args: A) -> std::result::Result<T, E>
    where
        F: FnOnce(A) -> std::result::Result<T, E> + 'static,
        A: Hash,
        T: Clone + Send + Sync + 'static,
    {
        self.try_memoize(None, func, args)
    }

    /// Like [`try_call`](Self::try_call), but the cached value expires after `ttl`.
    ///
    /// An overflowing `ttl` stores the value with no expiry, as in
    /// [`call_with_ttl`](Self::call_with_ttl).
    pub fn try_call_with_ttl<F, A, T, E>(
        &self,
        ttl: Duration,
        func: F,
        args: A,
    ) -> std::result::Result<T, E>
    where
        F: FnOnce(A) -> std::result::Result<T, E> + 'static,
        A: Hash,
        T: Clone + Send + Sync + 'static,
    {
        self.try_memoize(Some(ttl), func, args)
    }

    fn memoize<F, A, R>(&self, ttl: Option<Duration>, func: F, args: A) -> R
    where
        F: FnOnce(A) -> R + 'static,
        A: Hash,
        R: Clone + Send + Sync + 'static,
    {
        let key = CacheKey::derive::<F, A, R>(&args);
        if let Some(value) = self.lookup::<R>(key) {
            return value;
        }

        let value = func(args);
        self.insert(key, value.clone(), ttl);
        value
    }

    fn try_memoize<F, A, T, E>(
        &self,
        ttl: Option<Duration>,
        func: F,
        args: A,
    ) -> std::result::Result<T, E>
    where
        F: FnOnce(A) -> std::result::Result<T, E> + 'static,
        A: Hash,
        T: Clone + Send + Sync + 'static,
    {
        let key = CacheKey::derive::<F, A, T>(&args);
        if let Some(value) = self.lookup::<T>(key) {
            return Ok(value);
        }

        let value = func(args)?;
        self.insert(key, value.clone(), ttl);
        Ok(value)
    }

    /// Probes under the read lock and records the outcome.
    fn lookup<R: Clone + 'static>(&self, key: CacheKey) -> Option<R> {
        let outcome = self.store.read().lookup::<R>(key);
        match outcome {
            Lookup::Hit(value) => {
                self.stats.record_hit();
                trace!("Cache hit: {}", key);
                Some(value)
            }
            Lookup::Miss => {
                self.stats.record_miss();
                trace!("Cache miss: {}", key);
                None
            }
            Lookup::Collision { stored } => {
                self.stats.record_collision();
                self.stats.record_miss();
                debug!(
                    "Type collision on {}: stored {}, requested {}",
                    key,
                    stored,
                    std::any::type_name::<R>()
                );
                None
            }
        }
    }

    /// Stores a freshly computed value under the write lock.
    fn insert<R: Send + Sync + 'static>(&self, key: CacheKey, value: R, ttl: Option<Duration>) {
        let now = Instant::now();
        self.store.write().insert(key, value, ttl, now);
    }

    // == Stats ==
    /// Returns the number of calls answered from the cache.
    pub fn hit_count(&self) -> u64 {
        self.stats.hits()
    }

    /// Returns the number of calls that ran the computation.
    pub fn miss_count(&self) -> u64 {
        self.stats.misses()
    }

    /// Returns the number of misses caused by a result type mismatch.
    pub fn collision_count(&self) -> u64 {
        self.stats.collisions()
    }

    /// Returns hits / (hits + misses), or 0.0 before the first call.
    pub fn hit_rate(&self) -> f64 {
        self.stats.hit_rate()
    }

    /// Returns a copy of all counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    // == Length ==
    /// Returns the number of live entries, including expired ones not yet
    /// purged.
    pub fn len(&self) -> usize {
        self.store.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.read().is_empty()
    }

    /// Returns the configured capacity.
    pub fn max_entries(&self) -> usize {
        self.store.read().max_entries()
    }
}
