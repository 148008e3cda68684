//! SipHash-1-3 hasher with fixed zero keys.

use crate::hash::traits::KeyHasher;
use siphasher::sip::SipHasher13;
use std::hash::Hasher;

/// SipHash-1-3. Keys are fixed so every process agrees on placement.
#[derive(Clone, Copy, Debug, Default)]
pub struct SipHasher;

impl KeyHasher for SipHasher {
    fn hash(&self, key: &[u8]) -> u64 {
        let mut hasher = SipHasher13::new();
        hasher.write(key);
        hasher.finish()
    }

    fn name(&self) -> &'static str {
        "SipHash13"
    }
}
