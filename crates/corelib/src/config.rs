//! Ring configuration.
//!
//! All nodes of one ring must agree on `bits` and `hasher`; the other fields
//! are local tuning.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::error::{Result, RingError};
use crate::hash::{Fnv1aHasher, IdentifierHash, KeyHasher, SipHasher, Xxh3Hasher};
use crate::id::IdSpace;

/// Which [`KeyHasher`] places keys and nodes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    #[default]
    Fnv1a,
    Xxh3,
    Sip13,
}

impl HashAlgorithm {
    pub fn build(self) -> Arc<dyn KeyHasher> {
        match self {
            HashAlgorithm::Fnv1a => Arc::new(Fnv1aHasher),
            HashAlgorithm::Xxh3 => Arc::new(Xxh3Hasher),
            HashAlgorithm::Sip13 => Arc::new(SipHasher),
        }
    }
}

/// How far a finger-table notification travels once a node installs the
/// newcomer in one of its slots.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FingerPropagation {
    /// Forward the notification to the predecessor, which forwards it in
    /// turn until a node declines the update.
    #[default]
    Ripple,
    /// Install locally and stop. Other fingers converge only through later
    /// joins; routing stays correct through successor pointers.
    SingleHop,
}

/// Per-node ring settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingConfig {
    /// Identifier width `m`; also the finger table size.
    pub bits: u32,
    pub hasher: HashAlgorithm,
    pub propagation: FingerPropagation,
    /// Upper bound on finger hops for a single lookup before routing gives
    /// up and answers with the node it reached.
    pub max_route_hops: usize,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            bits: 31,
            hasher: HashAlgorithm::Fnv1a,
            propagation: FingerPropagation::Ripple,
            max_route_hops: 512,
        }
    }
}

impl RingConfig {
    /// Small identifier space, handy for examples and tests.
    pub fn with_bits(bits: u32) -> Self {
        Self {
            bits,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        IdSpace::new(self.bits)?;
        if self.max_route_hops == 0 {
            return Err(RingError::Config("max_route_hops must be positive".into()));
        }
        Ok(())
    }

    pub fn space(&self) -> Result<IdSpace> {
        IdSpace::new(self.bits)
    }

    pub fn identifier_hash(&self) -> Result<IdentifierHash> {
        Ok(IdentifierHash::new(self.space()?, self.hasher.build()))
    }

    /// Parses and validates a JSON document. Missing fields take defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: RingConfig =
            serde_json::from_str(text).map_err(|e| RingError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RingConfig::default();
        assert_eq!(config.bits, 31);
        assert_eq!(config.hasher, HashAlgorithm::Fnv1a);
        assert_eq!(config.propagation, FingerPropagation::Ripple);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = RingConfig::from_json(r#"{"bits": 8, "propagation": "single_hop"}"#).unwrap();
        assert_eq!(config.bits, 8);
        assert_eq!(config.propagation, FingerPropagation::SingleHop);
        assert_eq!(config.max_route_hops, 512);
    }

    #[test]
    fn test_invalid_json_rejected() {
        assert!(RingConfig::from_json(r#"{"bits": 0}"#).is_err());
        assert!(RingConfig::from_json(r#"{"max_route_hops": 0}"#).is_err());
        assert!(RingConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_hasher_names() {
        assert_eq!(HashAlgorithm::Fnv1a.build().name(), "Fnv1a");
        assert_eq!(HashAlgorithm::Xxh3.build().name(), "Xxh3");
        assert_eq!(HashAlgorithm::Sip13.build().name(), "SipHash13");
    }
}
