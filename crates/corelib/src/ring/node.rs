//! Node state and the local side of the peer operation set.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, info};

use crate::config::RingConfig;
use crate::error::{Result, RingError};
use crate::finger::FingerTable;
use crate::hash::IdentifierHash;
use crate::id::{IdSpace, Identifier};
use crate::node::NodeRef;
use crate::peer::{Connector, Dictionary, JoinOutcome, Peer, NOT_FOUND};
use crate::ring::JoinPhase;
use crate::store::LocalStore;

/// Neighbour pointers. Each is a plain assignment target: concurrent
/// writers are not ordered against each other.
#[derive(Debug)]
pub(super) struct Pointers {
    pub(super) successor: NodeRef,
    pub(super) predecessor: Option<NodeRef>,
}

/// A participant of the ring.
///
/// Created standalone (successor is itself, no predecessor, empty fingers)
/// and turned into a member by [`Peer::join`]. Nodes are never removed.
pub struct RingNode {
    pub(super) me: NodeRef,
    pub(super) config: RingConfig,
    pub(super) space: IdSpace,
    pub(super) hash: IdentifierHash,
    pub(super) pointers: RwLock<Pointers>,
    pub(super) fingers: FingerTable,
    pub(super) store: LocalStore,
    join_lock: AtomicBool,
    pub(super) phase: Mutex<JoinPhase>,
    connector: Arc<dyn Connector>,
    this: Weak<RingNode>,
}

impl RingNode {
    /// Creates a standalone node with an explicit identity.
    pub fn new(me: NodeRef, config: RingConfig, connector: Arc<dyn Connector>) -> Result<Arc<Self>> {
        config.validate()?;
        let space = config.space()?;
        let hash = config.identifier_hash()?;
        if me.id.0 >= space.modulus() {
            return Err(RingError::Config(format!(
                "node id {} outside identifier space of {} bits",
                me.id,
                space.bits()
            )));
        }

        debug!(node = %me, bits = space.bits(), hasher = hash.hasher_name(), "creating ring node");

        Ok(Arc::new_cyclic(|this| Self {
            pointers: RwLock::new(Pointers {
                successor: me.clone(),
                predecessor: None,
            }),
            fingers: FingerTable::new(me.id, space),
            store: LocalStore::new(),
            join_lock: AtomicBool::new(false),
            phase: Mutex::new(JoinPhase::Standalone),
            me,
            config,
            space,
            hash,
            connector,
            this: this.clone(),
        }))
    }

    /// Creates a standalone node whose id is the hash of `url`.
    pub fn with_url(
        url: impl Into<String>,
        config: RingConfig,
        connector: Arc<dyn Connector>,
    ) -> Result<Arc<Self>> {
        let hash = config.identifier_hash()?;
        Self::new(NodeRef::from_url(url, &hash), config, connector)
    }

    pub fn node_ref(&self) -> &NodeRef {
        &self.me
    }

    pub fn config(&self) -> &RingConfig {
        &self.config
    }

    pub fn space(&self) -> IdSpace {
        self.space
    }

    /// The hash this node uses to place words.
    pub fn key_hash(&self) -> &IdentifierHash {
        &self.hash
    }

    pub fn phase(&self) -> JoinPhase {
        *self.phase.lock()
    }

    pub(super) fn set_phase(&self, phase: JoinPhase) {
        *self.phase.lock() = phase;
        debug!(node = %self.me.id, %phase, "join phase");
    }

    pub fn successor_ref(&self) -> NodeRef {
        self.pointers.read().successor.clone()
    }

    pub fn predecessor_ref(&self) -> Option<NodeRef> {
        self.pointers.read().predecessor.clone()
    }

    pub fn finger_table(&self) -> &FingerTable {
        &self.fingers
    }

    pub fn local_store(&self) -> &LocalStore {
        &self.store
    }

    pub fn is_join_locked(&self) -> bool {
        self.join_lock.load(Ordering::Acquire)
    }

    /// Resolves `node` into a callable peer; this node resolves to itself.
    pub(super) fn peer(&self, node: &NodeRef) -> Result<Arc<dyn Peer>> {
        if *node == self.me {
            if let Some(this) = self.this.upgrade() {
                let this: Arc<dyn Peer> = this;
                return Ok(this);
            }
        }
        self.connector.connect(node)
    }

    /// Successor pointer and finger slot 0 always move together.
    pub(super) fn assign_successor(&self, node: NodeRef) {
        self.pointers.write().successor = node.clone();
        self.fingers.set(0, node);
    }

    pub(super) fn assign_predecessor(&self, node: NodeRef) {
        self.pointers.write().predecessor = Some(node);
    }

    fn local_lookup(&self, word: &str) -> String {
        match self.store.get(word) {
            Some(definition) => {
                debug!(node = %self.me.id, word, "lookup hit");
                definition.unwrap_or_default()
            }
            None => NOT_FOUND.to_string(),
        }
    }
}

#[async_trait]
impl Peer for RingNode {
    async fn find_predecessor(&self, key: Identifier) -> Result<NodeRef> {
        self.route_predecessor(key).await
    }

    async fn closest_preceding_finger(&self, key: Identifier) -> Result<NodeRef> {
        Ok(self.local_closest_preceding_finger(key))
    }

    async fn successor(&self) -> Result<NodeRef> {
        Ok(self.successor_ref())
    }

    async fn predecessor(&self) -> Result<Option<NodeRef>> {
        Ok(self.predecessor_ref())
    }

    async fn set_successor(&self, node: NodeRef) -> Result<()> {
        info!(node = %self.me.id, successor = %node, "successor changed");
        self.assign_successor(node);
        Ok(())
    }

    async fn set_predecessor(&self, node: NodeRef) -> Result<()> {
        info!(node = %self.me.id, predecessor = %node, "predecessor changed");
        self.assign_predecessor(node);
        Ok(())
    }

    async fn find_successor(&self, key: Identifier) -> Result<NodeRef> {
        self.route_successor(key).await
    }

    async fn acquire_join_lock(&self, requester: &str) -> Result<bool> {
        let acquired = self
            .join_lock
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        debug!(node = %self.me.id, requester, acquired, "join lock requested");
        Ok(acquired)
    }

    async fn release_join_lock(&self, requester: &str) -> Result<bool> {
        let released = self
            .join_lock
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        debug!(node = %self.me.id, requester, released, "join lock released");
        Ok(released)
    }

    async fn store_local(&self, word: String, definition: Option<String>) -> Result<()> {
        debug!(node = %self.me.id, word = %word, "stored locally");
        self.store.put(word, definition);
        Ok(())
    }

    async fn insert(&self, word: String, definition: Option<String>) -> Result<NodeRef> {
        let key = self.hash.hash(&word);
        let owner = self.route_successor(key).await?;
        info!(node = %self.me.id, word = %word, %key, owner = %owner, "insert");
        if owner == self.me {
            self.store.put(word, definition);
        } else {
            self.peer(&owner)?.store_local(word, definition).await?;
        }
        Ok(owner)
    }

    async fn lookup(&self, word: String) -> Result<String> {
        let key = self.hash.hash(&word);
        let owner = self.route_successor(key).await?;
        if owner == self.me {
            Ok(self.local_lookup(&word))
        } else {
            debug!(node = %self.me.id, word = %word, owner = %owner, "forwarding lookup");
            self.peer(&owner)?.lookup(word).await
        }
    }

    async fn remove(&self, word: String) -> Result<bool> {
        Ok(self.store.remove(&word))
    }

    async fn remove_if_unchanged(&self, word: String, definition: Option<String>) -> Result<bool> {
        Ok(self.store.remove_if_eq(&word, &definition))
    }

    async fn dictionary(&self) -> Result<Dictionary> {
        Ok(self.store.snapshot())
    }

    async fn dictionary_size(&self) -> Result<usize> {
        Ok(self.store.len())
    }

    async fn print_finger_table(&self) -> Result<String> {
        Ok(self.fingers.render(&self.me.url))
    }

    async fn print_dictionary(&self) -> Result<String> {
        Ok(self.store.render(&self.me.url))
    }

    async fn id(&self) -> Result<Identifier> {
        Ok(self.me.id)
    }

    async fn url(&self) -> Result<String> {
        Ok(self.me.url.clone())
    }

    async fn join(&self, bootstrap: Option<NodeRef>) -> Result<JoinOutcome> {
        self.join_ring(bootstrap).await
    }

    async fn update_others(&self) -> Result<()> {
        self.notify_others().await
    }

    async fn update_finger_table(&self, node: NodeRef, slot: usize) -> Result<()> {
        self.consider_finger(node, slot).await
    }
}
