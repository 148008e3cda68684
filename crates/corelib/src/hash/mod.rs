//! Key hashing for placement on the identifier circle.
//!
//! A [`KeyHasher`] turns bytes into a raw 64-bit value; [`IdentifierHash`]
//! binds one to an [`IdSpace`](crate::id::IdSpace) so every key and node
//! address lands in `[0, 2^m)`.

pub mod fnv;
pub mod sip;
pub mod traits;
pub mod xxh3;

pub use fnv::Fnv1aHasher;
pub use sip::SipHasher;
pub use traits::{IdentifierHash, KeyHasher};
pub use xxh3::Xxh3Hasher;
