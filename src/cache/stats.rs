//! Cache Statistics Module
//!
//! Hit, miss and type-collision counters, either atomic or compiled away.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;

// == Stats Recorder ==
/// Sink for cache lookup outcomes.
///
/// A collision is always reported together with a miss, so
/// `hits + misses` equals the number of calls made.
pub trait StatsRecorder: Send + Sync {
    fn record_hit(&self);
    fn record_miss(&self);
    fn record_collision(&self);

    fn hits(&self) -> u64;
    fn misses(&self) -> u64;
    fn collisions(&self) -> u64;

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no calls have been made.
    fn hit_rate(&self) -> f64 {
        let hits = self.hits();
        let total = hits + self.misses();
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    /// Captures the current counters.
    fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits(),
            misses: self.misses(),
            collisions: self.collisions(),
            hit_rate: self.hit_rate(),
        }
    }
}

// == No Stats ==
/// Zero-sized recorder for caches that collect nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoStats;

impl StatsRecorder for NoStats {
    #[inline]
    fn record_hit(&self) {}
    #[inline]
    fn record_miss(&self) {}
    #[inline]
    fn record_collision(&self) {}

    fn hits(&self) -> u64 {
        0
    }
    fn misses(&self) -> u64 {
        0
    }
    fn collisions(&self) -> u64 {
        0
    }
}

// == Cache Stats ==
/// Atomic counters, safe to bump under a shared lock or no lock at all.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    collisions: AtomicU64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatsRecorder for CacheStats {
    fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    fn record_collision(&self) {
        self.collisions.fetch_add(1, Ordering::Relaxed);
    }

    fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    fn collisions(&self) -> u64 {
        self.collisions.load(Ordering::Relaxed)
    }
}

/// Shared counters: several caches may record into one recorder.
impl<T: StatsRecorder + ?Sized> StatsRecorder for Arc<T> {
    fn record_hit(&self) {
        (**self).record_hit()
    }
    fn record_miss(&self) {
        (**self).record_miss()
    }
    fn record_collision(&self) {
        (**self).record_collision()
    }
    fn hits(&self) -> u64 {
        (**self).hits()
    }
    fn misses(&self) -> u64 {
        (**self).misses()
    }
    fn collisions(&self) -> u64 {
        (**self).collisions()
    }
}

// == Stats Snapshot ==
/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StatsSnapshot {
    /// Calls answered from the cache
    pub hits: u64,
    /// Calls that ran the computation (collisions included)
    pub misses: u64,
    /// Misses caused by a result type mismatch
    pub collisions: u64,
    /// hits / (hits + misses)
    pub hit_rate: f64,
}
