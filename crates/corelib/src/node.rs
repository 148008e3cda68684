//! Node identity on the ring.
//!
//! A [`NodeRef`] is what ring operations pass around: the node's identifier
//! plus the URL a [`Connector`](crate::peer::Connector) dials. It is small,
//! cheap to clone and serializable, so it crosses the wire unchanged.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::hash::IdentifierHash;
use crate::id::Identifier;

/// Dialable identity of a ring participant.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct NodeRef {
    pub id: Identifier,
    /// Network address or registry name.
    pub url: String,
}

impl NodeRef {
    pub fn new(id: impl Into<Identifier>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
        }
    }

    /// Identity whose id is the hash of its own URL.
    pub fn from_url(url: impl Into<String>, hash: &IdentifierHash) -> Self {
        let url = url.into();
        Self {
            id: hash.hash(&url),
            url,
        }
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.url, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RingConfig;

    #[test]
    fn test_id_derived_from_url() {
        let hash = RingConfig::default().identifier_hash().unwrap();
        let a = NodeRef::from_url("127.0.0.1:4000", &hash);
        let b = NodeRef::from_url("127.0.0.1:4000", &hash);
        assert_eq!(a, b);
        assert_eq!(a.id, hash.hash("127.0.0.1:4000"));
    }

    #[test]
    fn test_display() {
        assert_eq!(NodeRef::new(7, "node-7").to_string(), "node-7#7");
    }
}
