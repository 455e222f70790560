//! Recency Index Module
//!
//! Dense list of live keys supporting O(1) insertion and O(1) removal.

use crate::cache::CacheKey;

// == Recency Index ==
/// Tracks every live key in a dense vector.
///
/// Access order is not kept by position: each entry carries its own epoch
/// marker, and eviction snapshots this list together with those markers.
/// A key's position is its slot handle, stored on the entry.
#[derive(Debug, Default)]
pub struct RecencyIndex {
    slots: Vec<CacheKey>,
}

impl RecencyIndex {
    // == Constructor ==
    /// Creates a new empty recency index.
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    // == Push ==
    /// Appends a key and returns its slot.
    pub fn push(&mut self, key: CacheKey) -> usize {
        self.slots.push(key);
        self.slots.len() - 1
    }

    // == Swap Remove ==
    /// Removes the key at `slot` by moving the last key into its place.
    ///
    /// Returns the key that now occupies `slot`, if any; the caller must
    /// point that key's entry at `slot`. Returns None when the removed key was
    /// last or when `slot` is out of range.
    pub fn swap_remove(&mut self, slot: usize) -> Option<CacheKey> {
        if slot >= self.slots.len() {
            return None;
        }
        self.slots.swap_remove(slot);
        self.slots.get(slot).copied()
    }

    /// Returns the key stored at `slot`.
    pub fn get(&self, slot: usize) -> Option<CacheKey> {
        self.slots.get(slot).copied()
    }

    /// Iterates over the live keys in slot order.
    pub fn iter(&self) -> impl Iterator<Item = CacheKey> + '_ {
        self.slots.iter().copied()
    }

    // == Length ==
    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn key(n: u64) -> CacheKey {
        CacheKey::from_raw(n)
    }

    #[test]
    fn test_recency_new() {
        let index = RecencyIndex::new();
        assert!(index.is_empty());
        assert_eq!(index.len(), 0);
    }

    #[test]
    fn test_push_returns_slots_in_order() {
        let mut index = RecencyIndex::new();

        assert_eq!(index.push(key(1)), 0);
        assert_eq!(index.push(key(2)), 1);
        assert_eq!(index.push(key(3)), 2);
        assert_eq!(index.len(), 3);
        assert_eq!(index.get(1), Some(key(2)));
    }

    #[test]
    fn test_swap_remove_middle_moves_last() {
        let mut index = RecencyIndex::new();
        index.push(key(1));
        index.push(key(2));
        index.push(key(3));

        // key3 moves into slot 0 and must be reported for repair
        assert_eq!(index.swap_remove(0), Some(key(3)));
        assert_eq!(index.len(), 2);
        assert_eq!(index.get(0), Some(key(3)));
        assert_eq!(index.get(1), Some(key(2)));
    }

    #[test]
    fn test_swap_remove_last_moves_nothing() {
        let mut index = RecencyIndex::new();
        index.push(key(1));
        index.push(key(2));

        assert_eq!(index.swap_remove(1), None);
        assert_eq!(index.len(), 1);
        assert_eq!(index.get(0), Some(key(1)));
    }

    #[test]
    fn test_swap_remove_out_of_range() {
        let mut index = RecencyIndex::new();
        index.push(key(1));

        assert_eq!(index.swap_remove(5), None);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_iter_visits_all_keys() {
        let mut index = RecencyIndex::new();
        for n in 0..5 {
            index.push(key(n));
        }
        index.swap_remove(2);

        let mut keys: Vec<u64> = index.iter().map(CacheKey::as_u64).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec![0, 1, 3, 4]);
    }
}
