//! Core hashing trait definitions.

use std::fmt;
use std::sync::Arc;

use crate::id::{IdSpace, Identifier};

/// Converts key bytes into a raw hash value.
///
/// Hashers are stateless and thread-safe. Every node of a ring must use the
/// same hasher, otherwise nodes disagree on key ownership.
pub trait KeyHasher: Send + Sync + 'static {
    /// Hashes `key`. The result is reduced into the identifier space by
    /// [`IdentifierHash`], so it may use any part of the `u64` range.
    fn hash(&self, key: &[u8]) -> u64;

    /// Returns the name of this hasher.
    fn name(&self) -> &'static str;
}

/// Deterministic mapping from strings to identifiers.
#[derive(Clone)]
pub struct IdentifierHash {
    space: IdSpace,
    hasher: Arc<dyn KeyHasher>,
}

impl IdentifierHash {
    pub fn new(space: IdSpace, hasher: Arc<dyn KeyHasher>) -> Self {
        Self { space, hasher }
    }

    /// Identifier of `key`, always `< 2^m`.
    pub fn hash(&self, key: &str) -> Identifier {
        self.space.wrap(self.hasher.hash(key.as_bytes()))
    }

    pub fn space(&self) -> IdSpace {
        self.space
    }

    pub fn hasher_name(&self) -> &'static str {
        self.hasher.name()
    }
}

impl fmt::Debug for IdentifierHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentifierHash")
            .field("bits", &self.space.bits())
            .field("hasher", &self.hasher.name())
            .finish()
    }
}
