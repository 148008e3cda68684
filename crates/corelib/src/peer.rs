//! The peer capability: the operation set every ring participant exposes.
//!
//! Routing and join code only ever talks to `Arc<dyn Peer>`. The local
//! [`RingNode`](crate::ring::RingNode) implements it directly; a network
//! handle implements it by forwarding each call. A [`Connector`] resolves a
//! [`NodeRef`] into such a handle, so the engine never needs to know which
//! transport sits underneath.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Result;
use crate::id::Identifier;
use crate::node::NodeRef;

/// Returned by `lookup` when the owning node has no entry for the word.
pub const NOT_FOUND: &str = "Definition not found.";

/// Snapshot of a node's local partition.
pub type Dictionary = HashMap<String, Option<String>>;

/// Result of a join attempt.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinOutcome {
    /// The node is an active member of the ring.
    Joined,
    /// The bootstrap node was already admitting another node. Nothing was
    /// changed; the caller may retry.
    LockContended,
}

/// Operations a ring participant answers, locally or over a transport.
///
/// Every method may fail with a transport error when the peer is remote.
#[async_trait]
pub trait Peer: Send + Sync {
    /// Node whose successor interval `(n, successor]` contains `key`.
    async fn find_predecessor(&self, key: Identifier) -> Result<NodeRef>;

    /// Highest finger strictly between this node and `key`, or this node.
    async fn closest_preceding_finger(&self, key: Identifier) -> Result<NodeRef>;

    async fn successor(&self) -> Result<NodeRef>;

    /// `None` until the node has joined a ring.
    async fn predecessor(&self) -> Result<Option<NodeRef>>;

    async fn set_successor(&self, node: NodeRef) -> Result<()>;

    async fn set_predecessor(&self, node: NodeRef) -> Result<()>;

    /// Owner of `key`.
    async fn find_successor(&self, key: Identifier) -> Result<NodeRef>;

    /// Claims this node's join gate. `false` while another join holds it.
    async fn acquire_join_lock(&self, requester: &str) -> Result<bool>;

    /// Opens the join gate. `false` if it was not held.
    async fn release_join_lock(&self, requester: &str) -> Result<bool>;

    /// Writes into this node's partition without routing.
    async fn store_local(&self, word: String, definition: Option<String>) -> Result<()>;

    /// Routes `word` to its owner, stores it there and returns the owner.
    async fn insert(&self, word: String, definition: Option<String>) -> Result<NodeRef>;

    /// Definition of `word` from its owner, or [`NOT_FOUND`].
    async fn lookup(&self, word: String) -> Result<String>;

    /// Deletes `word` from this node's partition only.
    async fn remove(&self, word: String) -> Result<bool>;

    /// Deletes `word` locally only while it still maps to `definition`.
    /// `false` when the entry is gone or was overwritten.
    async fn remove_if_unchanged(&self, word: String, definition: Option<String>) -> Result<bool>;

    async fn dictionary(&self) -> Result<Dictionary>;

    async fn dictionary_size(&self) -> Result<usize>;

    async fn print_finger_table(&self) -> Result<String>;

    async fn print_dictionary(&self) -> Result<String>;

    async fn id(&self) -> Result<Identifier>;

    async fn url(&self) -> Result<String>;

    /// Splices this node into the ring through `bootstrap`, or starts a new
    /// ring when `bootstrap` is `None`.
    async fn join(&self, bootstrap: Option<NodeRef>) -> Result<JoinOutcome>;

    /// Tells the ring about this node after it has initialized its fingers.
    async fn update_others(&self) -> Result<()>;

    /// Asks this node to consider `node` for finger slot `slot`.
    async fn update_finger_table(&self, node: NodeRef, slot: usize) -> Result<()>;
}

/// Resolves node identities into callable peers.
pub trait Connector: Send + Sync {
    fn connect(&self, node: &NodeRef) -> Result<Arc<dyn Peer>>;
}
