//! Join protocol and key migration.
//!
//! A new node takes the bootstrap node's join lock, builds its finger table
//! through the bootstrap, splices itself between its predecessor and
//! successor, tells the nodes whose fingers should now point at it, and
//! finally pulls in the keys of `(predecessor, self]`.
//!
//! The lock only serializes joins through one bootstrap node. Two nodes
//! joining through different bootstraps can still interleave their pointer
//! writes on a shared neighbour.

use tracing::{debug, info, warn};

use crate::config::FingerPropagation;
use crate::error::{Result, RingError};
use crate::node::NodeRef;
use crate::peer::{JoinOutcome, Peer};
use crate::ring::{JoinPhase, RingNode};

impl RingNode {
    /// A splice failure resets this node to `Standalone` and the join may be
    /// retried. A migration failure is reported after the node is already a
    /// ring member; its phase then stays `OthersNotified`.
    pub(super) async fn join_ring(&self, bootstrap: Option<NodeRef>) -> Result<JoinOutcome> {
        {
            let mut phase = self.phase.lock();
            if *phase != JoinPhase::Standalone {
                return Err(RingError::InvalidState(format!(
                    "node {} cannot join while {}",
                    self.me, *phase
                )));
            }
            *phase = if bootstrap.is_some() {
                JoinPhase::LockRequested
            } else {
                JoinPhase::Active
            };
        }

        let Some(bootstrap) = bootstrap else {
            self.start_ring();
            return Ok(JoinOutcome::Joined);
        };

        if bootstrap == self.me {
            self.set_phase(JoinPhase::Standalone);
            return Err(RingError::InvalidState(format!(
                "node {} cannot bootstrap through itself",
                self.me
            )));
        }

        info!(node = %self.me.id, bootstrap = %bootstrap, "joining ring");

        let gate = match self.peer(&bootstrap) {
            Ok(gate) => gate,
            Err(e) => {
                self.set_phase(JoinPhase::Standalone);
                return Err(e);
            }
        };
        let acquired = match gate.acquire_join_lock(&self.me.url).await {
            Ok(acquired) => acquired,
            Err(e) => {
                self.set_phase(JoinPhase::Standalone);
                return Err(e);
            }
        };
        if !acquired {
            info!(node = %self.me.id, bootstrap = %bootstrap, "join lock busy, join aborted");
            self.set_phase(JoinPhase::Standalone);
            return Ok(JoinOutcome::LockContended);
        }

        // The lock is released on every path out of the splice.
        let spliced = self.splice(gate.as_ref()).await;
        let released = gate.release_join_lock(&self.me.url).await;
        if let Err(e) = spliced {
            warn!(node = %self.me.id, bootstrap = %bootstrap, error = %e, "join failed, back to standalone");
            self.reset_standalone();
            return Err(e);
        }
        if !released? {
            warn!(node = %self.me.id, bootstrap = %bootstrap, "join lock was already open");
        }

        let moved = self.migrate_keys().await?;
        self.set_phase(JoinPhase::KeysMigrated);

        self.set_phase(JoinPhase::Active);
        info!(
            node = %self.me.id,
            successor = %self.successor_ref(),
            moved,
            "joined ring"
        );
        Ok(JoinOutcome::Joined)
    }

    /// Drops the pointers and fingers of a failed splice so the join can be
    /// retried. Neighbours already told about this node keep their pointers
    /// until the retry overwrites them.
    fn reset_standalone(&self) {
        {
            let mut pointers = self.pointers.write();
            pointers.successor = self.me.clone();
            pointers.predecessor = None;
        }
        self.fingers.clear();
        self.set_phase(JoinPhase::Standalone);
    }

    /// First member: every pointer names this node.
    fn start_ring(&self) {
        {
            let mut pointers = self.pointers.write();
            pointers.successor = self.me.clone();
            pointers.predecessor = Some(self.me.clone());
        }
        self.fingers.fill(&self.me);
        info!(node = %self.me.id, url = %self.me.url, "started new ring");
    }

    async fn splice(&self, gate: &dyn Peer) -> Result<()> {
        self.set_phase(JoinPhase::FingerInit);
        self.init_finger_table(gate).await?;
        self.notify_others().await?;
        self.set_phase(JoinPhase::OthersNotified);
        Ok(())
    }

    async fn init_finger_table(&self, gate: &dyn Peer) -> Result<()> {
        let first = gate.find_successor(self.fingers.start(0)).await?;
        self.assign_successor(first.clone());

        let successor = self.peer(&first)?;
        let predecessor = successor
            .predecessor()
            .await?
            .unwrap_or_else(|| first.clone());
        self.assign_predecessor(predecessor.clone());
        successor.set_predecessor(self.me.clone()).await?;

        let mut previous = first;
        for slot in 1..self.fingers.len() {
            let start = self.fingers.start(slot);
            let previous_start = self.fingers.start(slot - 1);
            // The previous owner also owns this start when the start lies
            // on the arc between the previous start and that owner.
            let owner = if self.space.distance(previous_start, start)
                <= self.space.distance(previous_start, previous.id)
            {
                previous.clone()
            } else {
                gate.find_successor(start).await?
            };
            self.fingers.set(slot, owner.clone());
            previous = owner;
        }

        // Nobody routes to this node yet, so starts it owns came back as
        // its successor.
        for slot in 0..self.fingers.len() {
            if self
                .space
                .in_open_closed(self.fingers.start(slot), predecessor.id, self.me.id)
            {
                self.fingers.set(slot, self.me.clone());
            }
        }
        if self.fingers.get(0).as_ref() == Some(&self.me) {
            self.pointers.write().successor = self.me.clone();
        }

        debug!(
            node = %self.me.id,
            successor = %self.successor_ref(),
            predecessor = %predecessor,
            "finger table initialized"
        );
        Ok(())
    }

    /// Closes the successor chain over this node and offers it to every node
    /// that may need it as a finger.
    ///
    /// The candidate for slot `i` is the last node at or before
    /// `id - 2^i`, found by routing to `id - 2^i + 1`. Unlike the plain
    /// `find_predecessor(id - 2^i)` scheme, the predecessor is not skipped:
    /// with the `+ 1` target it is a legitimate holder whose slot may need
    /// this node.
    pub(super) async fn notify_others(&self) -> Result<()> {
        if let Some(predecessor) = self.predecessor_ref().filter(|p| *p != self.me) {
            self.peer(&predecessor)?
                .set_successor(self.me.clone())
                .await?;
        }

        for slot in 0..self.fingers.len() {
            let target = self.space.sub(self.me.id, (1u64 << slot) - 1);
            let holder = self.route_predecessor(target).await?;
            if holder == self.me {
                continue;
            }
            self.peer(&holder)?
                .update_finger_table(self.me.clone(), slot)
                .await?;
        }
        Ok(())
    }

    /// Installs `node` in `slot` when it is closer to the slot start than
    /// the current entry, then passes the offer on to the predecessor.
    ///
    /// With `FingerPropagation::SingleHop` the offer stops here, which leaves
    /// fingers of nodes further back stale until they are corrected by a
    /// later join.
    pub(super) async fn consider_finger(&self, node: NodeRef, slot: usize) -> Result<()> {
        if slot >= self.fingers.len() {
            return Err(RingError::InvalidState(format!(
                "finger slot {} out of range 0..{}",
                slot,
                self.fingers.len()
            )));
        }
        if node == self.me || !self.fingers.offer(slot, &node) {
            return Ok(());
        }
        if slot == 0 {
            self.pointers.write().successor = node.clone();
        }
        debug!(node = %self.me.id, slot, finger = %node, "finger updated");

        if self.config.propagation == FingerPropagation::SingleHop {
            return Ok(());
        }
        match self.predecessor_ref() {
            Some(predecessor) if predecessor != node && predecessor != self.me => {
                self.peer(&predecessor)?
                    .update_finger_table(node, slot)
                    .await
            }
            _ => Ok(()),
        }
    }

    /// Moves every word hashing into `(predecessor, self]` from the
    /// predecessor's and the successor's partitions into this node.
    ///
    /// Runs after the join lock is released, while inserts already route
    /// here. A word that got a local entry in the meantime keeps it, and the
    /// source copy is only deleted if it still holds the snapshotted value.
    /// Words are written here before they are deleted at the source, so a
    /// failure part-way leaves duplicates rather than gaps.
    async fn migrate_keys(&self) -> Result<usize> {
        let Some(predecessor) = self.predecessor_ref() else {
            return Ok(0);
        };
        if predecessor == self.me {
            return Ok(0);
        }

        let mut sources = vec![predecessor.clone()];
        let successor = self.successor_ref();
        if successor != self.me && successor != predecessor {
            sources.push(successor);
        }

        let mut moved = 0usize;
        for source in sources {
            let peer = self.peer(&source)?;
            let entries = peer.dictionary().await?;
            for (word, definition) in entries {
                let key = self.hash.hash(&word);
                if !self.space.in_open_closed(key, predecessor.id, self.me.id) {
                    continue;
                }
                if self.store.put_if_absent(word.clone(), definition.clone()) {
                    moved += 1;
                } else {
                    debug!(node = %self.me.id, word = %word, "newer local entry kept over migrated one");
                }
                if !peer.remove_if_unchanged(word.clone(), definition).await? {
                    debug!(node = %self.me.id, source = %source, word = %word, "source entry changed, left in place");
                }
            }
            debug!(node = %self.me.id, source = %source, moved, "migrated keys");
        }
        Ok(moved)
    }
}
