//! Memo Cache - An in-process memoization cache
//!
//! Returns previously computed results for repeated (callable, arguments)
//! pairs, bounded by an entry count with approximate LRU eviction and an
//! optional per-entry TTL.

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheStats, MemoCache, NoStats, StatsRecorder, StatsSnapshot};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
