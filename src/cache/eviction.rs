//! Eviction Module
//!
//! Picks an approximate batch of least recently used keys.

use crate::cache::CacheKey;

// == Batch Size ==
/// Number of entries one pass should evict out of `len` live entries.
///
/// `floor(len * fraction)`, raised to at least one and capped by both
/// `max_batch` and `len`.
pub fn batch_size(len: usize, fraction: f64, max_batch: usize) -> usize {
    let target = (len as f64 * fraction) as usize;
    target.max(1).min(max_batch).min(len)
}

// == Select Victims ==
/// Returns the oldest `batch_size(..)` keys out of `(epoch, key)` candidates.
///
/// Runs introselect over the snapshot instead of sorting it, so the victim
/// set is exact but its internal order and the choice among equal epochs are
/// not.
pub fn select_victims(
    mut candidates: Vec<(u64, CacheKey)>,
    fraction: f64,
    max_batch: usize,
) -> Vec<CacheKey> {
    if candidates.is_empty() {
        return Vec::new();
    }
    let count = batch_size(candidates.len(), fraction, max_batch);
    if count < candidates.len() {
        candidates.select_nth_unstable_by_key(count - 1, |&(epoch, _)| epoch);
    }
    candidates.truncate(count);
    candidates.into_iter().map(|(_, key)| key).collect()
}
