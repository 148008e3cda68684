//! Core library for the Chord key-value ring.
//!
//! This crate provides the ring engine and everything it needs:
//! - Identifier space and modular interval arithmetic
//! - Key hashing onto the identifier circle
//! - Finger tables and finger-accelerated lookup
//! - The join protocol and key migration
//! - Each node's local dictionary partition
//! - An in-process registry, a bulk loader and a ring report

pub mod config;
pub mod error;
pub mod finger;
pub mod hash;
pub mod id;
pub mod loader;
pub mod node;
pub mod peer;
pub mod registry;
pub mod report;
pub mod ring;
pub mod store;

pub use config::{FingerPropagation, HashAlgorithm, RingConfig};
pub use error::{Result, RingError};
pub use finger::FingerTable;
pub use hash::{IdentifierHash, KeyHasher};
pub use id::{IdSpace, Identifier};
pub use node::NodeRef;
pub use peer::{Connector, Dictionary, JoinOutcome, Peer, NOT_FOUND};
pub use registry::LocalRegistry;
pub use ring::{JoinPhase, RingNode};
