//! Identifier space for the ring.
//!
//! Identifiers are positions on a circle of `2^m` slots. Every comparison
//! that involves ring order goes through [`IdSpace`], never through plain
//! `<`, because intervals wrap past zero.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, RingError};

/// Largest supported identifier width. Keeps `a + b` inside a `u64`.
pub const MAX_BITS: u32 = 63;

/// A position on the identifier circle.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct Identifier(pub u64);

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Identifier {
    fn from(value: u64) -> Self {
        Identifier(value)
    }
}

/// Modular arithmetic over `[0, 2^bits)`.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct IdSpace {
    bits: u32,
}

impl IdSpace {
    /// Creates a space of `2^bits` identifiers.
    pub fn new(bits: u32) -> Result<Self> {
        if bits == 0 || bits > MAX_BITS {
            return Err(RingError::Config(format!(
                "identifier bits must be in 1..={}, got {}",
                MAX_BITS, bits
            )));
        }
        Ok(Self { bits })
    }

    /// Number of bits, which is also the number of finger slots.
    #[inline]
    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// `2^bits`.
    #[inline]
    pub fn modulus(&self) -> u64 {
        1u64 << self.bits
    }

    #[inline]
    fn mask(&self) -> u64 {
        self.modulus() - 1
    }

    /// Reduces an arbitrary value into the space.
    #[inline]
    pub fn wrap(&self, raw: u64) -> Identifier {
        Identifier(raw & self.mask())
    }

    /// `(a + b) mod 2^bits`.
    #[inline]
    pub fn add(&self, a: Identifier, b: u64) -> Identifier {
        self.wrap(a.0.wrapping_add(b & self.mask()))
    }

    /// `(a - b) mod 2^bits`.
    #[inline]
    pub fn sub(&self, a: Identifier, b: u64) -> Identifier {
        self.wrap(a.0.wrapping_sub(b & self.mask()))
    }

    /// Clockwise distance from `from` to `to`. Zero when they coincide.
    #[inline]
    pub fn distance(&self, from: Identifier, to: Identifier) -> u64 {
        to.0.wrapping_sub(from.0) & self.mask()
    }

    /// Start of finger slot `i` for node `id`: `(id + 2^i) mod 2^bits`.
    #[inline]
    pub fn finger_start(&self, id: Identifier, slot: usize) -> Identifier {
        debug_assert!((slot as u32) < self.bits);
        self.add(id, 1u64 << slot)
    }

    /// `x ∈ (a, b)` walking clockwise. `(a, a)` is every identifier but `a`.
    pub fn in_open(&self, x: Identifier, a: Identifier, b: Identifier) -> bool {
        if a == b {
            return x != a;
        }
        let dx = self.distance(a, x);
        dx != 0 && dx < self.distance(a, b)
    }

    /// `x ∈ (a, b]` walking clockwise. `(a, a]` is the whole ring.
    pub fn in_open_closed(&self, x: Identifier, a: Identifier, b: Identifier) -> bool {
        if a == b {
            return true;
        }
        let dx = self.distance(a, x);
        dx != 0 && dx <= self.distance(a, b)
    }
}
