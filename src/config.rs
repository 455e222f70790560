//! Configuration Module
//!
//! Construction-time settings for a memoization cache, with an environment
//! loader for the demo binary.

use std::env;
use std::str::FromStr;

use crate::error::{CacheError, Result};

/// Default maximum number of live entries
pub const DEFAULT_MAX_ENTRIES: usize = 1000;

/// Default share of the live entries reclaimed by one eviction pass
pub const DEFAULT_EVICTION_FRACTION: f64 = 0.3;

/// Default upper bound on entries evicted by one pass
pub const DEFAULT_MAX_EVICTION_BATCH: usize = 256;

/// Cache configuration parameters.
///
/// Values are fixed once a cache is built from them.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Housekeeping evicts once the entry count reaches this value
    pub max_entries: usize,
    /// Fraction of live entries targeted by one eviction pass
    pub eviction_fraction: f64,
    /// Hard cap on entries evicted by one pass
    pub max_eviction_batch: usize,
    /// Whether hit/miss/collision counters are collected
    pub collect_stats: bool,
}

impl CacheConfig {
    /// Creates a config with the given capacity and default eviction tuning.
    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            max_entries,
            ..Self::default()
        }
    }

    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MEMO_MAX_ENTRIES` - Maximum live entries (default: 1000)
    /// - `MEMO_EVICTION_FRACTION` - Share evicted per pass (default: 0.3)
    /// - `MEMO_MAX_EVICTION_BATCH` - Entries evicted per pass at most (default: 256)
    /// - `MEMO_COLLECT_STATS` - Collect counters, `true`/`false` (default: true)
    pub fn from_env() -> Self {
        Self {
            max_entries: env_or("MEMO_MAX_ENTRIES", DEFAULT_MAX_ENTRIES),
            eviction_fraction: env_or("MEMO_EVICTION_FRACTION", DEFAULT_EVICTION_FRACTION),
            max_eviction_batch: env_or("MEMO_MAX_EVICTION_BATCH", DEFAULT_MAX_EVICTION_BATCH),
            collect_stats: env_or("MEMO_COLLECT_STATS", true),
        }
    }

    /// Checks that the settings describe a usable cache.
    ///
    /// `max_entries` must be at least 2: housekeeping fires at `len >= max`
    /// and always evicts one entry, which would otherwise be the fresh insert.
    pub fn validate(&self) -> Result<()> {
        if self.max_entries < 2 {
            return Err(CacheError::InvalidConfig(format!(
                "max_entries must be at least 2, got {}",
                self.max_entries
            )));
        }
        if !(self.eviction_fraction > 0.0 && self.eviction_fraction <= 1.0) {
            return Err(CacheError::InvalidConfig(format!(
                "eviction_fraction must be in (0, 1], got {}",
                self.eviction_fraction
            )));
        }
        if self.max_eviction_batch == 0 {
            return Err(CacheError::InvalidConfig(
                "max_eviction_batch must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            eviction_fraction: DEFAULT_EVICTION_FRACTION,
            max_eviction_batch: DEFAULT_MAX_EVICTION_BATCH,
            collect_stats: true,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
