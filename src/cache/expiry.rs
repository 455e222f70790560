//! Expiration Index Module
//!
//! Orders TTL-bearing keys by their expiry instant.

use std::collections::BTreeSet;
use std::time::Instant;

use crate::cache::CacheKey;

// == Expiry Index ==
/// Time-ordered set of `(expires_at, key)` records.
///
/// Nothing here runs on a timer. Records are popped only when the store's
/// housekeeping pass asks for them after an insertion.
#[derive(Debug, Default)]
pub struct ExpiryIndex {
    deadlines: BTreeSet<(Instant, CacheKey)>,
}

impl ExpiryIndex {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            deadlines: BTreeSet::new(),
        }
    }

    // == Register ==
    /// Records that `key` expires at `at`.
    pub fn register(&mut self, at: Instant, key: CacheKey) {
        self.deadlines.insert((at, key));
    }

    // == Remove ==
    /// Drops the record for `key` at `at`. Returns whether it was present.
    pub fn remove(&mut self, at: Instant, key: CacheKey) -> bool {
        self.deadlines.remove(&(at, key))
    }

    // == Pop Expired ==
    /// Pops the earliest record if it is due at `now`.
    ///
    /// Callers loop until None; each call is O(log n).
    pub fn pop_expired(&mut self, now: Instant) -> Option<CacheKey> {
        match self.deadlines.first() {
            Some(&(at, _)) if at <= now => self.deadlines.pop_first().map(|(_, key)| key),
            _ => None,
        }
    }

    /// Returns true if a record for `key` at `at` exists.
    pub fn contains(&self, at: Instant, key: CacheKey) -> bool {
        self.deadlines.contains(&(at, key))
    }

    /// Returns the number of registered deadlines.
    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }
}
