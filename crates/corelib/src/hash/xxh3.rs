//! XXH3 hasher.

use crate::hash::traits::KeyHasher;
use xxhash_rust::xxh3::xxh3_64;

/// 64-bit XXH3.
#[derive(Clone, Copy, Debug, Default)]
pub struct Xxh3Hasher;

impl KeyHasher for Xxh3Hasher {
    fn hash(&self, key: &[u8]) -> u64 {
        xxh3_64(key)
    }

    fn name(&self) -> &'static str {
        "Xxh3"
    }
}
