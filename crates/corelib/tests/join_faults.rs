//! Joins that run into failing or concurrently changing peers.
//!
//! The joining node dials through [`FaultyConnector`], which hands out
//! peers from a [`LocalRegistry`] wrapped in [`FaultyPeer`]. Each fault
//! fires once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use corelib::{
    Connector, Dictionary, Identifier, JoinOutcome, JoinPhase, LocalRegistry, NodeRef, Peer,
    RingConfig, RingError, RingNode,
};
use parking_lot::Mutex;

#[derive(Default)]
struct Faults {
    fail_set_predecessor: AtomicBool,
    /// Routed write issued through a node right before a source is read.
    write_before_snapshot: Mutex<Option<(Arc<RingNode>, String, String)>>,
    /// Local write at the named source right after it was read.
    write_after_snapshot: Mutex<Option<(String, String, String)>>,
}

struct FaultyConnector {
    registry: Arc<LocalRegistry>,
    faults: Arc<Faults>,
}

impl Connector for FaultyConnector {
    fn connect(&self, node: &NodeRef) -> corelib::Result<Arc<dyn Peer>> {
        let inner = self.registry.connect(node)?;
        Ok(Arc::new(FaultyPeer {
            node: node.clone(),
            inner,
            faults: self.faults.clone(),
        }))
    }
}

struct FaultyPeer {
    node: NodeRef,
    inner: Arc<dyn Peer>,
    faults: Arc<Faults>,
}

#[async_trait]
impl Peer for FaultyPeer {
    async fn find_predecessor(&self, key: Identifier) -> corelib::Result<NodeRef> {
        self.inner.find_predecessor(key).await
    }

    async fn closest_preceding_finger(&self, key: Identifier) -> corelib::Result<NodeRef> {
        self.inner.closest_preceding_finger(key).await
    }

    async fn successor(&self) -> corelib::Result<NodeRef> {
        self.inner.successor().await
    }

    async fn predecessor(&self) -> corelib::Result<Option<NodeRef>> {
        self.inner.predecessor().await
    }

    async fn set_successor(&self, node: NodeRef) -> corelib::Result<()> {
        self.inner.set_successor(node).await
    }

    async fn set_predecessor(&self, node: NodeRef) -> corelib::Result<()> {
        if self.faults.fail_set_predecessor.swap(false, Ordering::SeqCst) {
            return Err(RingError::unavailable(&self.node.url, "connection reset"));
        }
        self.inner.set_predecessor(node).await
    }

    async fn find_successor(&self, key: Identifier) -> corelib::Result<NodeRef> {
        self.inner.find_successor(key).await
    }

    async fn acquire_join_lock(&self, requester: &str) -> corelib::Result<bool> {
        self.inner.acquire_join_lock(requester).await
    }

    async fn release_join_lock(&self, requester: &str) -> corelib::Result<bool> {
        self.inner.release_join_lock(requester).await
    }

    async fn store_local(&self, word: String, definition: Option<String>) -> corelib::Result<()> {
        self.inner.store_local(word, definition).await
    }

    async fn insert(&self, word: String, definition: Option<String>) -> corelib::Result<NodeRef> {
        self.inner.insert(word, definition).await
    }

    async fn lookup(&self, word: String) -> corelib::Result<String> {
        self.inner.lookup(word).await
    }

    async fn remove(&self, word: String) -> corelib::Result<bool> {
        self.inner.remove(word).await
    }

    async fn remove_if_unchanged(
        &self,
        word: String,
        definition: Option<String>,
    ) -> corelib::Result<bool> {
        self.inner.remove_if_unchanged(word, definition).await
    }

    async fn dictionary(&self) -> corelib::Result<Dictionary> {
        let before = self.faults.write_before_snapshot.lock().take();
        if let Some((via, word, definition)) = before {
            via.insert(word, Some(definition)).await?;
        }

        let snapshot = self.inner.dictionary().await?;

        let after = {
            let mut pending = self.faults.write_after_snapshot.lock();
            match pending.as_ref() {
                Some((url, _, _)) if *url == self.node.url => pending.take(),
                _ => None,
            }
        };
        if let Some((_, word, definition)) = after {
            self.inner.store_local(word, Some(definition)).await?;
        }
        Ok(snapshot)
    }

    async fn dictionary_size(&self) -> corelib::Result<usize> {
        self.inner.dictionary_size().await
    }

    async fn print_finger_table(&self) -> corelib::Result<String> {
        self.inner.print_finger_table().await
    }

    async fn print_dictionary(&self) -> corelib::Result<String> {
        self.inner.print_dictionary().await
    }

    async fn id(&self) -> corelib::Result<Identifier> {
        self.inner.id().await
    }

    async fn url(&self) -> corelib::Result<String> {
        self.inner.url().await
    }

    async fn join(&self, bootstrap: Option<NodeRef>) -> corelib::Result<JoinOutcome> {
        self.inner.join(bootstrap).await
    }

    async fn update_others(&self) -> corelib::Result<()> {
        self.inner.update_others().await
    }

    async fn update_finger_table(&self, node: NodeRef, slot: usize) -> corelib::Result<()> {
        self.inner.update_finger_table(node, slot).await
    }
}

/// Creates a standalone node that dials through a [`FaultyConnector`] and
/// binds it so the rest of the ring can reach it.
fn spawn_faulty(
    registry: &Arc<LocalRegistry>,
    id: u64,
    config: RingConfig,
) -> (Arc<RingNode>, Arc<Faults>) {
    let faults = Arc::new(Faults::default());
    let connector: Arc<dyn Connector> = Arc::new(FaultyConnector {
        registry: registry.clone(),
        faults: faults.clone(),
    });
    let node = RingNode::new(NodeRef::new(id, format!("node-{}", id)), config, connector).unwrap();
    registry.bind(node.clone()).unwrap();
    (node, faults)
}

/// A word hashing into `(lo, hi]`.
fn word_between(node: &RingNode, lo: u64, hi: u64) -> String {
    (0..10_000)
        .map(|i| format!("word-{}", i))
        .find(|w| {
            let h = node.key_hash().hash(w).0;
            h > lo && h <= hi
        })
        .unwrap()
}

/// Ring of `0` and `2^30`, with the joiner at `2^29` taking over `(0, 2^29]`.
async fn two_node_ring() -> (Arc<LocalRegistry>, Arc<RingNode>, Arc<RingNode>) {
    let registry = LocalRegistry::new();
    let a = registry.spawn(0, "node-a", RingConfig::default()).unwrap();
    let b = registry
        .spawn(1 << 30, "node-b", RingConfig::default())
        .unwrap();
    assert_eq!(a.join(None).await.unwrap(), JoinOutcome::Joined);
    assert_eq!(
        b.join(Some(a.node_ref().clone())).await.unwrap(),
        JoinOutcome::Joined
    );
    (registry, a, b)
}

// ============================================================================
// Writes During Migration
// ============================================================================

#[tokio::test]
async fn test_write_during_migration_is_not_overwritten() {
    let (registry, a, b) = two_node_ring().await;
    let (c, faults) = spawn_faulty(&registry, 1 << 29, RingConfig::default());
    let word = word_between(&c, 0, 1 << 29);

    a.insert(word.clone(), Some("OLD".into())).await.unwrap();
    assert!(b.local_store().contains(&word));

    // Routed while c is already spliced in but before it has read its sources
    *faults.write_before_snapshot.lock() = Some((a.clone(), word.clone(), "NEW".into()));
    let outcome = c.join(Some(a.node_ref().clone())).await.unwrap();
    assert_eq!(outcome, JoinOutcome::Joined);

    assert_eq!(c.local_store().get(&word), Some(Some("NEW".to_string())));
    assert!(!b.local_store().contains(&word));
    for node in [&a, &b, &c] {
        assert_eq!(node.lookup(word.clone()).await.unwrap(), "NEW");
    }
}

#[tokio::test]
async fn test_changed_source_entry_is_not_deleted() {
    let (registry, a, b) = two_node_ring().await;
    let (c, faults) = spawn_faulty(&registry, 1 << 29, RingConfig::default());
    let word = word_between(&c, 0, 1 << 29);
    let untouched = (0..10_000)
        .map(|i| format!("other-{}", i))
        .find(|w| {
            let h = c.key_hash().hash(w).0;
            h > 0 && h <= 1 << 29
        })
        .unwrap();

    a.insert(word.clone(), Some("OLD".into())).await.unwrap();
    a.insert(untouched.clone(), Some("same".into())).await.unwrap();

    *faults.write_after_snapshot.lock() =
        Some((b.node_ref().url.clone(), word.clone(), "NEWER".into()));
    c.join(Some(a.node_ref().clone())).await.unwrap();

    // b changed the entry after c copied it, so b keeps its value
    assert_eq!(b.local_store().get(&word), Some(Some("NEWER".to_string())));
    assert_eq!(c.local_store().get(&word), Some(Some("OLD".to_string())));

    // entries nobody touched still move
    assert!(!b.local_store().contains(&untouched));
    assert_eq!(c.local_store().get(&untouched), Some(Some("same".to_string())));
}

// ============================================================================
// Failed Splice
// ============================================================================

#[tokio::test]
async fn test_failed_splice_releases_lock_and_allows_retry() {
    let registry = LocalRegistry::new();
    let config = RingConfig::with_bits(6);
    let a = registry.spawn(10, "node-10", config.clone()).unwrap();
    a.join(None).await.unwrap();
    let (c, faults) = spawn_faulty(&registry, 40, config);

    faults.fail_set_predecessor.store(true, Ordering::SeqCst);
    let err = c.join(Some(a.node_ref().clone())).await.unwrap_err();
    assert!(err.is_retryable(), "got {err:?}");

    // the bootstrap's lock is open and its pointers never moved
    assert!(!a.is_join_locked());
    assert_eq!(a.successor_ref(), *a.node_ref());
    assert_eq!(a.predecessor_ref(), Some(a.node_ref().clone()));

    // the joiner is back to a clean standalone node
    assert_eq!(c.phase(), JoinPhase::Standalone);
    assert_eq!(c.predecessor_ref(), None);
    assert_eq!(c.successor_ref(), *c.node_ref());
    assert!(!c.finger_table().is_complete());

    let outcome = c.join(Some(a.node_ref().clone())).await.unwrap();
    assert_eq!(outcome, JoinOutcome::Joined);
    assert_eq!(c.phase(), JoinPhase::Active);
    assert!(!a.is_join_locked());
    assert_eq!(a.successor_ref(), *c.node_ref());
    assert_eq!(c.successor_ref(), *a.node_ref());
    assert_eq!(a.predecessor_ref(), Some(c.node_ref().clone()));
    assert_eq!(c.predecessor_ref(), Some(a.node_ref().clone()));

    for key in [0u64, 10, 11, 30, 40, 41, 63] {
        let expected = if key > 10 && key <= 40 { 40 } else { 10 };
        for node in [&a, &c] {
            let owner = node.find_successor(Identifier(key)).await.unwrap();
            assert_eq!(owner.id, Identifier(expected), "key {}", key);
        }
    }
}
