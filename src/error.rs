//! Error types for the memoization cache
//!
//! Provides unified error handling using thiserror.
//!
//! Misses and type collisions are recovered internally by recomputing, so the
//! only failure the cache itself reports is a bad configuration. Errors raised
//! by user computations pass through `try_call` in the caller's own type.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the memoization cache.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CacheError {
    /// Configuration rejected at construction time
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

// == Result Type Alias ==
/// Convenience Result type for the memoization cache.
pub type Result<T> = std::result::Result<T, CacheError>;
