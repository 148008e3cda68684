//! FNV-1a, 32-bit.

use crate::hash::traits::KeyHasher;

const FNV_32_OFFSET: u32 = 0x811c_9dc5;
const FNV_32_PRIME: u32 = 0x0100_0193;

/// FNV-1a over 32 bits with the result folded to a non-negative `i32`.
///
/// A negative signed result is replaced by its absolute value, and
/// `i32::MIN` (which has none) becomes `i32::MAX`. The output therefore fits
/// a 31-bit identifier space without masking.
#[derive(Clone, Copy, Debug, Default)]
pub struct Fnv1aHasher;

impl Fnv1aHasher {
    /// The folded 32-bit hash of `data`.
    pub fn hash32(data: &[u8]) -> u32 {
        let mut hash = FNV_32_OFFSET;
        for &byte in data {
            // Bytes are mixed in as sign-extended values.
            hash ^= byte as i8 as i32 as u32;
            hash = hash.wrapping_mul(FNV_32_PRIME);
        }
        let signed = hash as i32;
        if signed == i32::MIN {
            i32::MAX as u32
        } else {
            signed.unsigned_abs()
        }
    }
}

impl KeyHasher for Fnv1aHasher {
    fn hash(&self, key: &[u8]) -> u64 {
        u64::from(Self::hash32(key))
    }

    fn name(&self) -> &'static str {
        "Fnv1a"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_is_offset_basis() {
        // 0x811c9dc5 is negative as an i32.
        let expected = (FNV_32_OFFSET as i32).unsigned_abs();
        assert_eq!(Fnv1aHasher::hash32(b""), expected);
    }

    #[test]
    fn test_known_ascii_vector() {
        // FNV-1a("a") = 0xe40c292c, negative as i32.
        let expected = (0xe40c_292cu32 as i32).unsigned_abs();
        assert_eq!(Fnv1aHasher::hash32(b"a"), expected);
    }

    #[test]
    fn test_never_exceeds_i32_max() {
        for word in ["cat", "dog", "zebra", "", "Node0", "Node1"] {
            assert!(Fnv1aHasher::hash32(word.as_bytes()) <= i32::MAX as u32);
        }
    }
}
