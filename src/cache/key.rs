//! Cache Key Module
//!
//! Derives a fixed-width lookup key from a callable, its arguments and its
//! result type.

use std::any::TypeId;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

/// 64-bit golden ratio, odd so the multiply-free mix still spreads bits
const GOLDEN_RATIO_64: u64 = 0x9e37_79b9_7f4a_7c15;

// == Cache Key ==
/// Hash of (callable type, argument values, result type).
///
/// Not reversible. Two distinct inputs may collide; only a differing result
/// type is caught later, by the entry's type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CacheKey(u64);

impl CacheKey {
    /// Wraps a raw hash value.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw hash value.
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    // == Derive ==
    /// Builds the key for invoking a callable of type `F` on `args` with
    /// result type `R`.
    ///
    /// The callable contributes only its type. Two closures produced by the
    /// same closure expression share a type even when their captured values
    /// differ, so they map to the same key for equal arguments. Every
    /// `fn(T) -> U` pointer of one signature also shares a type.
    pub fn derive<F, A, R>(args: &A) -> Self
    where
        F: 'static,
        A: Hash + ?Sized,
        R: 'static,
    {
        let mut seed = hash_one(&TypeId::of::<F>());
        hash_combine(&mut seed, hash_one(args));
        hash_combine(&mut seed, hash_one(&TypeId::of::<R>()));
        Self(seed)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

// == Hash Combine ==
/// Mixes `value` into `seed` so a change to either flips most output bits.
#[inline]
pub fn hash_combine(seed: &mut u64, value: u64) {
    let mixed = value
        .wrapping_add(GOLDEN_RATIO_64)
        .wrapping_add(seed.rotate_left(6))
        .wrapping_add(seed.rotate_right(2));
    *seed ^= mixed;
}

#[inline]
fn hash_one<T: Hash + ?Sized>(value: &T) -> u64 {
    // DefaultHasher::new uses fixed keys, so hashes are stable for the process
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn double(x: i32) -> i32 {
        x * 2
    }

    fn triple(x: i32) -> i32 {
        x * 3
    }

    fn key_of<F: Fn(i32) -> R + 'static, R: 'static>(_f: &F, arg: i32) -> CacheKey {
        CacheKey::derive::<F, i32, R>(&arg)
    }

    #[test]
    fn test_derive_is_deterministic() {
        let a = CacheKey::derive::<fn(i32) -> i32, i32, i32>(&7);
        let b = CacheKey::derive::<fn(i32) -> i32, i32, i32>(&7);
        assert_eq!(a, b);
    }

    #[test]
    fn test_arguments_change_key() {
        assert_ne!(key_of(&double, 1), key_of(&double, 2));
    }

    #[test]
    fn test_distinct_fn_items_change_key() {
        assert_ne!(key_of(&double, 1), key_of(&triple, 1));
    }

    #[test]
    fn test_result_type_changes_key() {
        let as_int = CacheKey::derive::<u8, i32, i32>(&5);
        let as_float = CacheKey::derive::<u8, i32, f64>(&5);
        assert_ne!(as_int, as_float);
    }

    #[test]
    fn test_tuple_arguments() {
        let a = CacheKey::derive::<u8, (i32, &str), i32>(&(1, "a"));
        let b = CacheKey::derive::<u8, (i32, &str), i32>(&(1, "b"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_combine_spreads_bits() {
        let mut a = 0u64;
        let mut b = 0u64;
        hash_combine(&mut a, 1);
        hash_combine(&mut b, 2);
        assert_ne!(a, b);

        // Combining is order sensitive
        let mut ab = 0u64;
        hash_combine(&mut ab, 10);
        hash_combine(&mut ab, 20);
        let mut ba = 0u64;
        hash_combine(&mut ba, 20);
        hash_combine(&mut ba, 10);
        assert_ne!(ab, ba);
    }

    #[test]
    fn test_display_is_fixed_width_hex() {
        assert_eq!(CacheKey::from_raw(0xab).to_string(), "00000000000000ab");
    }
}
