//! Fx-hashed collection aliases.
//!
//! Graph indices, record caches and resolver lookups are keyed by short
//! path strings. The workspace hashes them with `rustc-hash`.
//!
//! # Examples
//!
//! ```
//! use rl_core::{FxHashMap, FxHashSet, fx_hash_map_with_capacity};
//!
//! let mut index: FxHashMap<&str, usize> = fx_hash_map_with_capacity(2);
//! index.insert("app/main.py", 0);
//! let seen: FxHashSet<usize> = index.values().copied().collect();
//! assert!(seen.contains(&0));
//! ```

/// A `HashMap` using the Fx hash algorithm.
pub type FxHashMap<K, V> = rustc_hash::FxHashMap<K, V>;

/// A `HashSet` using the Fx hash algorithm.
pub type FxHashSet<V> = rustc_hash::FxHashSet<V>;

/// Creates an [`FxHashMap`] able to hold `capacity` entries without
/// reallocating.
#[inline]
#[must_use]
pub fn fx_hash_map_with_capacity<K, V>(capacity: usize) -> FxHashMap<K, V> {
    FxHashMap::with_capacity_and_hasher(capacity, rustc_hash::FxBuildHasher)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_constructors() {
        let map: FxHashMap<String, usize> = fx_hash_map_with_capacity(64);
        assert!(map.capacity() >= 64);
    }
}
