//! Fast, non-cryptographic hashing for name lookups on hot paths.

use std::collections::{HashMap, HashSet};
use std::hash::{BuildHasherDefault, Hash, Hasher};

/// A `HashMap` using a fast, deterministic hasher. Keys at this layer are
/// engine-controlled names, so DoS resistance is not a concern.
pub type FastHashMap<K, V> = HashMap<K, V, BuildHasherDefault<FxHasher>>;

/// A `HashSet` using a fast, deterministic hasher.
pub type FastHashSet<K> = HashSet<K, BuildHasherDefault<FxHasher>>;

/// Hashes `v` into a stable 64-bits value.
pub fn hash64<T: Hash + ?Sized>(v: &T) -> u64 {
    let mut state = FxHasher::default();
    v.hash(&mut state);
    state.finish()
}

const SEED: u64 = 0x51_7c_c1_b7_27_22_0a_95;

/// The hash algorithm used by rustc, byte-at-a-time. Not suitable for
/// untrusted input.
#[derive(Default)]
pub struct FxHasher {
    hash: u64,
}

impl Hasher for FxHasher {
    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.hash = (self.hash.rotate_left(5) ^ u64::from(byte)).wrapping_mul(SEED);
        }
    }

    #[inline]
    fn finish(&self) -> u64 {
        self.hash
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn deterministic() {
        assert_eq!(hash64("fExposure"), hash64("fExposure"));
        assert_ne!(hash64("fExposure"), hash64("fGamma"));
    }

    #[test]
    fn collections() {
        let mut map = FastHashMap::default();
        map.insert("a", 1);
        map.insert("b", 2);
        assert_eq!(map.get("a"), Some(&1));

        let mut set = FastHashSet::default();
        set.insert("a");
        set.insert("a");
        assert_eq!(set.len(), 1);
    }
}
