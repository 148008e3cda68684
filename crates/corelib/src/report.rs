//! Read-only ring report.
//!
//! Gathers word counts and finger tables from a list of nodes and renders
//! them as plain text. A node that cannot be reached is recorded as such and
//! does not stop the report.

use std::collections::HashSet;
use std::fmt::Write;
use tracing::warn;

use crate::error::Result;
use crate::node::NodeRef;
use crate::peer::Connector;

/// What the report learned about one node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeStatus {
    Reachable { words: usize, finger_table: String },
    Unavailable { reason: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeEntry {
    pub node: NodeRef,
    pub status: NodeStatus,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RingReport {
    pub entries: Vec<NodeEntry>,
}

impl RingReport {
    /// Queries every node in `nodes`, in order.
    pub async fn collect(nodes: &[NodeRef], connector: &dyn Connector) -> Self {
        let mut entries = Vec::with_capacity(nodes.len());
        for node in nodes {
            let status = match Self::inspect(node, connector).await {
                Ok((words, finger_table)) => NodeStatus::Reachable {
                    words,
                    finger_table,
                },
                Err(e) => {
                    warn!(node = %node, error = %e, "node unavailable for report");
                    NodeStatus::Unavailable {
                        reason: e.to_string(),
                    }
                }
            };
            entries.push(NodeEntry {
                node: node.clone(),
                status,
            });
        }
        Self { entries }
    }

    async fn inspect(node: &NodeRef, connector: &dyn Connector) -> Result<(usize, String)> {
        let peer = connector.connect(node)?;
        let words = peer.dictionary_size().await?;
        let finger_table = peer.print_finger_table().await?;
        Ok((words, finger_table))
    }

    /// Words held by all reachable nodes.
    pub fn total_words(&self) -> usize {
        self.entries
            .iter()
            .map(|entry| match entry.status {
                NodeStatus::Reachable { words, .. } => words,
                NodeStatus::Unavailable { .. } => 0,
            })
            .sum()
    }

    pub fn render(&self) -> String {
        let mut out = String::from("Network Report:\n");
        for entry in &self.entries {
            match &entry.status {
                NodeStatus::Reachable {
                    words,
                    finger_table,
                } => {
                    let _ = writeln!(out, "Node {} has {} words.", entry.node.url, words);
                    let _ = writeln!(out, "{}", finger_table);
                }
                NodeStatus::Unavailable { reason } => {
                    let _ = writeln!(out, "Failed to connect to node {}: {}", entry.node.url, reason);
                }
            }
        }
        out.push_str("Chord Ring Diagram:\n");
        if let Some(first) = self.entries.first() {
            for entry in &self.entries {
                let _ = write!(out, "{} -> ", entry.node.url);
            }
            let _ = writeln!(out, "{}", first.node.url);
        }
        out
    }
}

/// Lists ring members in successor order, starting at `entry`.
///
/// Stops when the walk returns to a node it has seen or after `limit`
/// members. An unreachable member ends the walk with an error.
pub async fn discover_ring(
    entry: &NodeRef,
    connector: &dyn Connector,
    limit: usize,
) -> Result<Vec<NodeRef>> {
    let mut members = vec![entry.clone()];
    let mut seen: HashSet<NodeRef> = members.iter().cloned().collect();
    let mut current = entry.clone();
    while members.len() < limit {
        let next = connector.connect(&current)?.successor().await?;
        if !seen.insert(next.clone()) {
            break;
        }
        members.push(next.clone());
        current = next;
    }
    Ok(members)
}
