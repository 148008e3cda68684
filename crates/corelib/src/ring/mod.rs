//! The ring node: routing, membership and the local partition.
//!
//! A [`RingNode`] owns its successor and predecessor pointers, its finger
//! table and its slice of the dictionary. Other nodes reach it through the
//! [`Peer`](crate::peer::Peer) capability, and it reaches them the same way.

mod join;
mod node;
mod routing;

pub use node::RingNode;

use std::fmt;

/// Progress of a node through the join protocol.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum JoinPhase {
    /// Created, not yet part of any ring. A refused join lands here again.
    Standalone,
    /// Waiting for the bootstrap node's join lock.
    LockRequested,
    /// Building the finger table and splicing into the successor chain.
    FingerInit,
    /// Predecessor and finger holders have been told about this node.
    OthersNotified,
    /// Keys in `(predecessor, self]` have been pulled in.
    KeysMigrated,
    /// Full ring member.
    Active,
}

impl fmt::Display for JoinPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JoinPhase::Standalone => "standalone",
            JoinPhase::LockRequested => "lock-requested",
            JoinPhase::FingerInit => "finger-init",
            JoinPhase::OthersNotified => "others-notified",
            JoinPhase::KeysMigrated => "keys-migrated",
            JoinPhase::Active => "active",
        };
        f.write_str(name)
    }
}
