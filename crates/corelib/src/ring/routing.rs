//! Lookup: walking finger tables to the owner of a key.

use tracing::{debug, warn};

use crate::error::Result;
use crate::id::Identifier;
use crate::node::NodeRef;
use crate::ring::RingNode;

impl RingNode {
    pub(super) fn local_closest_preceding_finger(&self, key: Identifier) -> NodeRef {
        self.fingers
            .closest_preceding(key)
            .unwrap_or_else(|| self.me.clone())
    }

    /// Walks from this node until `key ∈ (current, current.successor]`.
    ///
    /// Each hop asks the current node for its closest preceding finger. A
    /// hop that does not move, or a walk longer than `max_route_hops`, ends
    /// the search at the node reached so far instead of failing.
    pub(super) async fn route_predecessor(&self, key: Identifier) -> Result<NodeRef> {
        let mut current = self.me.clone();
        let mut successor = self.successor_ref();
        let mut hops = 0usize;

        while !self.space.in_open_closed(key, current.id, successor.id) {
            let next = if current == self.me {
                self.local_closest_preceding_finger(key)
            } else {
                self.peer(&current)?.closest_preceding_finger(key).await?
            };

            if next == current {
                warn!(
                    node = %self.me.id,
                    %key,
                    stuck_at = %current,
                    "no closer finger, routing falls back to current node"
                );
                break;
            }

            hops += 1;
            if hops > self.config.max_route_hops {
                warn!(
                    node = %self.me.id,
                    %key,
                    hops,
                    "route hop limit reached, routing falls back to current node"
                );
                break;
            }

            successor = if next == self.me {
                self.successor_ref()
            } else {
                self.peer(&next)?.successor().await?
            };
            current = next;
        }

        debug!(node = %self.me.id, %key, predecessor = %current, hops, "resolved predecessor");
        Ok(current)
    }

    /// Owner of `key`: the successor of its predecessor.
    pub(super) async fn route_successor(&self, key: Identifier) -> Result<NodeRef> {
        let predecessor = self.route_predecessor(key).await?;
        if predecessor == self.me {
            Ok(self.successor_ref())
        } else {
            self.peer(&predecessor)?.successor().await
        }
    }
}
