//! In-process node registry.
//!
//! Binds ring nodes by URL and serves as their [`Connector`], so a whole ring
//! can run inside one process with no transport. Calls go straight to the
//! target node's [`Peer`] implementation.

use dashmap::DashMap;
use std::sync::Arc;

use crate::config::RingConfig;
use crate::error::{Result, RingError};
use crate::node::NodeRef;
use crate::peer::{Connector, Peer};
use crate::ring::RingNode;

#[derive(Default)]
pub struct LocalRegistry {
    nodes: DashMap<String, Arc<RingNode>>,
}

impl LocalRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Creates a standalone node with an explicit id and binds it.
    pub fn spawn(
        self: &Arc<Self>,
        id: u64,
        url: impl Into<String>,
        config: RingConfig,
    ) -> Result<Arc<RingNode>> {
        let connector: Arc<dyn Connector> = self.clone();
        let node = RingNode::new(NodeRef::new(id, url), config, connector)?;
        self.bind(node.clone())?;
        Ok(node)
    }

    /// Creates a standalone node whose id is hashed from `url` and binds it.
    pub fn spawn_with_url(
        self: &Arc<Self>,
        url: impl Into<String>,
        config: RingConfig,
    ) -> Result<Arc<RingNode>> {
        let connector: Arc<dyn Connector> = self.clone();
        let node = RingNode::with_url(url, config, connector)?;
        self.bind(node.clone())?;
        Ok(node)
    }

    /// Binds `node` under its URL. URLs are unique.
    pub fn bind(&self, node: Arc<RingNode>) -> Result<()> {
        let url = node.node_ref().url.clone();
        if self.nodes.contains_key(&url) {
            return Err(RingError::InvalidState(format!("{} is already bound", url)));
        }
        self.nodes.insert(url, node);
        Ok(())
    }

    /// Removes a binding. Later calls to that node fail as unavailable.
    pub fn unbind(&self, url: &str) -> Option<Arc<RingNode>> {
        self.nodes.remove(url).map(|(_, node)| node)
    }

    pub fn get(&self, url: &str) -> Option<Arc<RingNode>> {
        self.nodes.get(url).map(|entry| entry.value().clone())
    }

    /// Identities of every bound node, ordered by id.
    pub fn node_refs(&self) -> Vec<NodeRef> {
        let mut refs: Vec<NodeRef> = self
            .nodes
            .iter()
            .map(|entry| entry.value().node_ref().clone())
            .collect();
        refs.sort_by_key(|node| node.id);
        refs
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Connector for LocalRegistry {
    fn connect(&self, node: &NodeRef) -> Result<Arc<dyn Peer>> {
        match self.nodes.get(&node.url) {
            Some(entry) => {
                let peer: Arc<dyn Peer> = entry.value().clone();
                Ok(peer)
            }
            None => Err(RingError::unavailable(node.url.clone(), "not bound in registry")),
        }
    }
}
