//! Cache Entry Module
//!
//! Defines a single type-erased cache entry with expiry and recency metadata.

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

// == Cache Entry ==
/// One memoized result with its type tag and bookkeeping.
pub struct CacheEntry {
    /// The stored result, erased
    value: Box<dyn Any + Send + Sync>,
    /// Identifies the concrete result type
    type_tag: TypeId,
    /// Human readable result type, for logs
    type_name: &'static str,
    /// Absolute expiry, None = cached until evicted
    pub expires_at: Option<Instant>,
    /// Logical epoch of the last insert or hit
    last_used: AtomicU64,
    /// Position of this entry's key in the recency index
    pub slot: usize,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry holding `value`.
    ///
    /// # Arguments
    /// * `value` - The computed result
    /// * `now` - Insertion time, the base for `ttl`
    /// * `ttl` - Optional time-to-live
    /// * `epoch` - Initial recency marker
    /// * `slot` - Position in the recency index
    pub fn new<R>(value: R, now: Instant, ttl: Option<Duration>, epoch: u64, slot: usize) -> Self
    where
        R: Send + Sync + 'static,
    {
        Self {
            value: Box::new(value),
            type_tag: TypeId::of::<R>(),
            type_name: type_name::<R>(),
            expires_at: ttl.and_then(|ttl| now.checked_add(ttl)),
            last_used: AtomicU64::new(epoch),
            slot,
        }
    }

    // == Type Tag ==
    /// Returns true when the stored result is of type `R`.
    pub fn holds<R: 'static>(&self) -> bool {
        self.type_tag == TypeId::of::<R>()
    }

    /// Returns the stored result type's name.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    // == Downcast ==
    /// Borrows the stored result as `R`, or None if the tag does not match.
    pub fn downcast<R: 'static>(&self) -> Option<&R> {
        if !self.holds::<R>() {
            return None;
        }
        self.value.downcast_ref::<R>()
    }

    // == Recency ==
    /// Stamps the entry as used at `epoch`.
    ///
    /// Takes `&self` so hits can promote an entry under a shared lock.
    pub fn touch(&self, epoch: u64) {
        self.last_used.store(epoch, Ordering::Relaxed);
    }

    /// Returns the epoch of the last insert or hit.
    pub fn last_used(&self) -> u64 {
        self.last_used.load(Ordering::Relaxed)
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// An entry counts as expired once `now` reaches its expiry instant.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }
}

impl fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("type_name", &self.type_name)
            .field("expires_at", &self.expires_at)
            .field("last_used", &self.last_used())
            .field("slot", &self.slot)
            .finish_non_exhaustive()
    }
}
