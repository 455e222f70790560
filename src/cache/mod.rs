//! Cache Module
//!
//! Provides in-process memoization with lazy TTL expiration and approximate
//! LRU batch eviction.

mod entry;
mod eviction;
mod expiry;
mod key;
mod memo;
mod recency;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use eviction::{batch_size, select_victims};
pub use expiry::ExpiryIndex;
pub use key::{hash_combine, CacheKey};
pub use memo::MemoCache;
pub use recency::RecencyIndex;
pub use stats::{CacheStats, NoStats, StatsRecorder, StatsSnapshot};
pub use store::{CacheStore, Housekeeping, Lookup};
