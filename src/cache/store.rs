//! Cache Store Module
//!
//! Main cache engine combining type-erased entry storage with recency
//! tracking, lazy TTL expiration and approximate batch eviction.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::cache::eviction::select_victims;
use crate::cache::{CacheEntry, CacheKey, ExpiryIndex, RecencyIndex};
use crate::config::CacheConfig;

// == Lookup Outcome ==
/// Result of probing the store for a typed value.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<R> {
    /// Entry present with the expected type; holds a copy of the value
    Hit(R),
    /// No entry for the key
    Miss,
    /// Entry present but holding a different result type
    Collision {
        /// Type name of the stored result
        stored: &'static str,
    },
}

// == Housekeeping Report ==
/// Entries reclaimed by one housekeeping pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Housekeeping {
    pub expired: usize,
    pub evicted: usize,
}

// == Cache Store ==
/// Single-threaded memo storage.
///
/// Lookups take `&self` and only bump atomic recency markers, so they can
/// share a read lock. Every structural change takes `&mut self`.
#[derive(Debug)]
pub struct CacheStore {
    /// Entry storage, one per key
    entries: HashMap<CacheKey, CacheEntry>,
    /// Dense key list for O(1) removal and eviction snapshots
    recency: RecencyIndex,
    /// Deadlines of entries carrying a TTL
    expiry: ExpiryIndex,
    /// Logical clock stamped on inserts and hits
    epoch: AtomicU64,
    /// Housekeeping evicts once this many entries are live
    max_entries: usize,
    eviction_fraction: f64,
    max_eviction_batch: usize,
}

impl CacheStore {
    // == Constructor ==
    /// Creates an empty store tuned by `config`.
    ///
    /// The config is expected to be validated already.
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: HashMap::new(),
            recency: RecencyIndex::new(),
            expiry: ExpiryIndex::new(),
            epoch: AtomicU64::new(0),
            max_entries: config.max_entries,
            eviction_fraction: config.eviction_fraction,
            max_eviction_batch: config.max_eviction_batch,
        }
    }

    /// Advances the logical clock and returns the new epoch.
    fn next_epoch(&self) -> u64 {
        self.epoch.fetch_add(1, Ordering::Relaxed) + 1
    }

    // == Lookup ==
    /// Probes for a value of type `R` under `key`.
    ///
    /// A hit promotes the entry. A collision leaves the entry untouched for
    /// the following insert to overwrite. Expired entries are still served
    /// until a housekeeping pass removes them.
    pub fn lookup<R: Clone + 'static>(&self, key: CacheKey) -> Lookup<R> {
        let Some(entry) = self.entries.get(&key) else {
            return Lookup::Miss;
        };
        match entry.downcast::<R>() {
            Some(value) => {
                entry.touch(self.next_epoch());
                Lookup::Hit(value.clone())
            }
            None => Lookup::Collision {
                stored: entry.type_name(),
            },
        }
    }

    // == Insert ==
    /// Stores `value` under `key`, replacing any previous entry, then runs
    /// housekeeping.
    ///
    /// # Arguments
    /// * `key` - Derived cache key
    /// * `value` - Computed result
    /// * `ttl` - Optional time-to-live, measured from `now`
    /// * `now` - Current time, also used to purge expired entries
    pub fn insert<R>(&mut self, key: CacheKey, value: R, ttl: Option<Duration>, now: Instant) -> Housekeeping
    where
        R: Send + Sync + 'static,
    {
        self.remove(key);

        let slot = self.recency.push(key);
        let entry = CacheEntry::new(value, now, ttl, self.next_epoch(), slot);
        if let Some(at) = entry.expires_at {
            self.expiry.register(at, key);
        }
        self.entries.insert(key, entry);

        self.housekeeping(now)
    }

    // == Remove ==
    /// Removes the entry for `key` along with its recency slot and deadline.
    ///
    /// Returns whether an entry was present.
    pub fn remove(&mut self, key: CacheKey) -> bool {
        let Some(entry) = self.entries.remove(&key) else {
            return false;
        };
        if let Some(moved) = self.recency.swap_remove(entry.slot) {
            if let Some(moved_entry) = self.entries.get_mut(&moved) {
                moved_entry.slot = entry.slot;
            }
        }
        if let Some(at) = entry.expires_at {
            self.expiry.remove(at, key);
        }
        true
    }

    // == Housekeeping ==
    /// Purges expired entries, then evicts a batch if still at capacity.
    pub fn housekeeping(&mut self, now: Instant) -> Housekeeping {
        let report = Housekeeping {
            expired: self.purge_expired(now),
            evicted: self.evict_if_needed(),
        };
        if report != Housekeeping::default() {
            debug!(
                "Housekeeping: expired {} entries, evicted {}, {} live",
                report.expired,
                report.evicted,
                self.entries.len()
            );
        }
        report
    }

    // == Purge Expired ==
    /// Removes every entry whose deadline is at or before `now`.
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&mut self, now: Instant) -> usize {
        let mut removed = 0;
        while let Some(key) = self.expiry.pop_expired(now) {
            if self.remove(key) {
                removed += 1;
            }
        }
        removed
    }

    // == Evict ==
    /// Evicts the approximately least recently used batch once the store is
    /// at or over capacity.
    ///
    /// Returns the number of entries evicted.
    pub fn evict_if_needed(&mut self) -> usize {
        if self.entries.len() < self.max_entries {
            return 0;
        }

        let candidates: Vec<(u64, CacheKey)> = self
            .recency
            .iter()
            .filter_map(|key| self.entries.get(&key).map(|entry| (entry.last_used(), key)))
            .collect();

        let mut evicted = 0;
        for key in select_victims(candidates, self.eviction_fraction, self.max_eviction_batch) {
            if self.remove(key) {
                evicted += 1;
            }
        }
        evicted
    }

    /// Returns true if an entry exists for `key`, expired or not.
    pub fn contains(&self, key: CacheKey) -> bool {
        self.entries.contains_key(&key)
    }

    // == Length ==
    /// Returns the current number of entries in the store.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the configured capacity.
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Panics unless entries, recency slots and deadlines agree.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        assert_eq!(self.entries.len(), self.recency.len(), "slot count mismatch");
        for (key, entry) in &self.entries {
            assert_eq!(
                self.recency.get(entry.slot),
                Some(*key),
                "entry {} points at a foreign slot",
                key
            );
            if let Some(at) = entry.expires_at {
                assert!(self.expiry.contains(at, *key), "entry {} missing deadline", key);
            }
        }
        let with_ttl = self.entries.values().filter(|e| e.expires_at.is_some()).count();
        assert_eq!(with_ttl, self.expiry.len(), "dangling deadlines");
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn store(max_entries: usize) -> CacheStore {
        CacheStore::new(&CacheConfig::with_max_entries(max_entries))
    }

    fn key(n: u64) -> CacheKey {
        CacheKey::from_raw(n)
    }

    #[test]
    fn test_store_new() {
        let store = store(100);
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
        assert_eq!(store.max_entries(), 100);
    }

    #[test]
    fn test_store_huge_capacity_allocates_lazily() {
        let mut store = store(usize::MAX);
        assert_eq!(store.max_entries(), usize::MAX);

        store.insert(key(1), 1u8, None, Instant::now());
        assert_eq!(store.lookup::<u8>(key(1)), Lookup::Hit(1));
        store.assert_consistent();
    }

    #[test]
    fn test_store_insert_and_lookup() {
        let mut store = store(100);

        store.insert(key(1), 42i32, None, Instant::now());

        assert_eq!(store.lookup::<i32>(key(1)), Lookup::Hit(42));
        assert_eq!(store.len(), 1);
        store.assert_consistent();
    }

    #[test]
    fn test_store_lookup_nonexistent() {
        let store = store(100);
        assert_eq!(store.lookup::<i32>(key(1)), Lookup::Miss);
    }

    #[test]
    fn test_store_overwrite() {
        let mut store = store(100);
        let now = Instant::now();

        store.insert(key(1), "value1".to_string(), None, now);
        store.insert(key(1), "value2".to_string(), None, now);

        assert_eq!(store.lookup::<String>(key(1)), Lookup::Hit("value2".to_string()));
        assert_eq!(store.len(), 1);
        store.assert_consistent();
    }

    #[test]
    fn test_store_type_collision() {
        let mut store = store(100);
        let now = Instant::now();

        store.insert(key(99), 198i32, None, now);

        // Same key, different result type: reported, never reinterpreted
        assert_eq!(
            store.lookup::<f64>(key(99)),
            Lookup::Collision { stored: "i32" }
        );
        // The stale entry stays until overwritten
        assert_eq!(store.lookup::<i32>(key(99)), Lookup::Hit(198));

        store.insert(key(99), 198.0f64, None, now);
        assert_eq!(store.lookup::<f64>(key(99)), Lookup::Hit(198.0));
        assert_eq!(store.lookup::<i32>(key(99)), Lookup::Collision { stored: "f64" });
        assert_eq!(store.len(), 1);
        store.assert_consistent();
    }

    #[test]
    fn test_store_ttl_expiration_is_lazy() {
        let mut store = store(100);
        let now = Instant::now();

        store.insert(key(1), 1u32, Some(Duration::from_millis(100)), now);
        let later = now + Duration::from_millis(150);

        // Still served: nothing has purged it yet
        assert_eq!(store.lookup::<u32>(key(1)), Lookup::Hit(1));

        // An insertion elsewhere runs housekeeping
        let report = store.insert(key(2), 2u32, None, later);
        assert_eq!(report.expired, 1);
        assert_eq!(store.lookup::<u32>(key(1)), Lookup::Miss);
        assert_eq!(store.lookup::<u32>(key(2)), Lookup::Hit(2));
        store.assert_consistent();
    }

    #[test]
    fn test_store_purge_keeps_live_deadlines() {
        let mut store = store(100);
        let now = Instant::now();

        store.insert(key(1), 1u8, Some(Duration::from_millis(100)), now);
        store.insert(key(2), 2u8, Some(Duration::from_secs(10)), now);

        assert_eq!(store.purge_expired(now + Duration::from_millis(150)), 1);
        assert_eq!(store.len(), 1);
        assert!(store.contains(key(2)));
        store.assert_consistent();
    }

    #[test]
    fn test_store_overwrite_replaces_deadline() {
        let mut store = store(100);
        let now = Instant::now();

        store.insert(key(1), 1u8, Some(Duration::from_millis(100)), now);
        store.insert(key(1), 2u8, None, now);
        store.assert_consistent();

        assert_eq!(store.purge_expired(now + Duration::from_secs(1)), 0);
        assert_eq!(store.lookup::<u8>(key(1)), Lookup::Hit(2));
    }

    #[test]
    fn test_store_lru_eviction() {
        let mut store = store(3);
        let now = Instant::now();

        store.insert(key(1), 2i32, None, now);
        store.insert(key(2), 4i32, None, now);

        // Reaching capacity evicts the oldest entry
        let report = store.insert(key(3), 6i32, None, now);
        assert_eq!(report.evicted, 1);

        assert_eq!(store.len(), 2);
        assert_eq!(store.lookup::<i32>(key(1)), Lookup::Miss);
        assert_eq!(store.lookup::<i32>(key(2)), Lookup::Hit(4));
        assert_eq!(store.lookup::<i32>(key(3)), Lookup::Hit(6));
        store.assert_consistent();
    }

    #[test]
    fn test_store_lru_touch_on_hit() {
        let mut store = store(3);
        let now = Instant::now();

        store.insert(key(1), 2i32, None, now);
        store.insert(key(2), 4i32, None, now);

        // Hit key1 to make it most recently used
        assert_eq!(store.lookup::<i32>(key(1)), Lookup::Hit(2));

        store.insert(key(3), 6i32, None, now);

        assert_eq!(store.lookup::<i32>(key(1)), Lookup::Hit(2));
        assert_eq!(store.lookup::<i32>(key(2)), Lookup::Miss);
    }

    #[test]
    fn test_store_expiry_before_eviction() {
        let mut store = store(3);
        let now = Instant::now();

        store.insert(key(2), 4i32, None, now);
        store.insert(key(1), 2i32, Some(Duration::from_millis(100)), now);

        // Purging key1 frees room, so key2 survives
        let report = store.insert(key(3), 6i32, None, now + Duration::from_millis(110));
        assert_eq!(report, Housekeeping { expired: 1, evicted: 0 });
        assert_eq!(store.lookup::<i32>(key(2)), Lookup::Hit(4));
        store.assert_consistent();
    }

    #[test]
    fn test_store_eviction_batch() {
        let config = CacheConfig {
            max_entries: 20,
            eviction_fraction: 0.3,
            max_eviction_batch: 256,
            collect_stats: false,
        };
        let mut store = CacheStore::new(&config);
        let now = Instant::now();

        for n in 0..19 {
            store.insert(key(n), n, None, now);
        }
        assert_eq!(store.len(), 19);

        // 20 live entries, 30% of them go in one pass
        let report = store.insert(key(19), 19u64, None, now);
        assert_eq!(report.evicted, 6);
        assert_eq!(store.len(), 14);
        for n in 0..6 {
            assert!(!store.contains(key(n)), "key {} should be evicted", n);
        }
        for n in 6..20 {
            assert!(store.contains(key(n)), "key {} should survive", n);
        }
        store.assert_consistent();
    }

    #[test]
    fn test_store_eviction_batch_cap() {
        let config = CacheConfig {
            max_entries: 20,
            eviction_fraction: 1.0,
            max_eviction_batch: 2,
            collect_stats: false,
        };
        let mut store = CacheStore::new(&config);
        let now = Instant::now();

        for n in 0..20 {
            store.insert(key(n), n, None, now);
        }
        assert_eq!(store.len(), 18);
        assert!(store.contains(key(19)));
    }

    #[test]
    fn test_store_remove_repairs_slots() {
        let mut store = store(100);
        let now = Instant::now();

        for n in 0..5 {
            store.insert(key(n), n, Some(Duration::from_secs(60)), now);
        }
        assert!(store.remove(key(0)));
        assert!(store.remove(key(2)));
        assert!(!store.remove(key(2)));

        assert_eq!(store.len(), 3);
        store.assert_consistent();
        assert_eq!(store.lookup::<u64>(key(4)), Lookup::Hit(4));
    }
}
