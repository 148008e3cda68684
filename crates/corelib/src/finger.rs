//! Per-node finger table.
//!
//! Slot `i` of node `n` holds the node responsible for `(n + 2^i) mod 2^m`.
//! Fingers only accelerate routing: a stale slot costs extra hops but can
//! never change which node owns a key, as long as it names a live node.

use parking_lot::RwLock;
use std::fmt::Write;

use crate::id::{IdSpace, Identifier};
use crate::node::NodeRef;

/// Routing shortcuts of one node.
#[derive(Debug)]
pub struct FingerTable {
    owner: Identifier,
    space: IdSpace,
    slots: RwLock<Vec<Option<NodeRef>>>,
}

impl FingerTable {
    /// Empty table of `space.bits()` slots for node `owner`.
    pub fn new(owner: Identifier, space: IdSpace) -> Self {
        Self {
            owner,
            space,
            slots: RwLock::new(vec![None; space.bits() as usize]),
        }
    }

    pub fn len(&self) -> usize {
        self.space.bits() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First identifier slot `slot` is responsible for.
    #[inline]
    pub fn start(&self, slot: usize) -> Identifier {
        self.space.finger_start(self.owner, slot)
    }

    pub fn get(&self, slot: usize) -> Option<NodeRef> {
        self.slots.read().get(slot).cloned().flatten()
    }

    pub fn set(&self, slot: usize, node: NodeRef) {
        if let Some(entry) = self.slots.write().get_mut(slot) {
            *entry = Some(node);
        }
    }

    /// Empties every slot.
    pub fn clear(&self) {
        let mut slots = self.slots.write();
        for entry in slots.iter_mut() {
            *entry = None;
        }
    }

    /// Points every slot at `node`.
    pub fn fill(&self, node: &NodeRef) {
        let mut slots = self.slots.write();
        for entry in slots.iter_mut() {
            *entry = Some(node.clone());
        }
    }

    pub fn snapshot(&self) -> Vec<Option<NodeRef>> {
        self.slots.read().clone()
    }

    /// True once every slot is populated.
    pub fn is_complete(&self) -> bool {
        self.slots.read().iter().all(Option::is_some)
    }

    /// Highest populated finger lying strictly between the owner and `key`.
    pub fn closest_preceding(&self, key: Identifier) -> Option<NodeRef> {
        let slots = self.slots.read();
        slots
            .iter()
            .rev()
            .flatten()
            .find(|finger| self.space.in_open(finger.id, self.owner, key))
            .cloned()
    }

    /// Installs `node` in `slot` if the slot is empty or `node` sits
    /// clockwise-closer to the slot start than the current entry.
    ///
    /// Check and write happen under one lock, so concurrent offers for the
    /// same slot keep the closest candidate.
    pub fn offer(&self, slot: usize, node: &NodeRef) -> bool {
        let start = self.start(slot);
        let mut slots = self.slots.write();
        let Some(entry) = slots.get_mut(slot) else {
            return false;
        };
        let replace = match entry {
            None => true,
            Some(current) => {
                self.space.distance(start, node.id) < self.space.distance(start, current.id)
            }
        };
        if replace {
            *entry = Some(node.clone());
        }
        replace
    }

    /// Human-readable dump, one line per slot.
    pub fn render(&self, url: &str) -> String {
        let slots = self.slots.read();
        let mut out = String::new();
        let _ = writeln!(out, "Finger Table for {}:", url);
        for (slot, entry) in slots.iter().enumerate() {
            let owner = entry
                .as_ref()
                .map(|n| n.to_string())
                .unwrap_or_else(|| "-".to_string());
            let _ = writeln!(out, "Finger {}: start {} -> {}", slot, self.start(slot), owner);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(owner: u64) -> FingerTable {
        FingerTable::new(Identifier(owner), IdSpace::new(6).unwrap())
    }

    #[test]
    fn test_starts() {
        let t = table(8);
        assert_eq!(t.len(), 6);
        assert_eq!(t.start(0), Identifier(9));
        assert_eq!(t.start(5), Identifier(40));
    }

    #[test]
    fn test_fill_completes() {
        let t = table(8);
        assert!(!t.is_complete());
        t.fill(&NodeRef::new(8, "n8"));
        assert!(t.is_complete());
        assert_eq!(t.get(3), Some(NodeRef::new(8, "n8")));
        t.clear();
        assert_eq!(t.get(3), None);
    }

    #[test]
    fn test_closest_preceding_scans_high_to_low() {
        let t = table(8);
        t.set(0, NodeRef::new(10, "n10"));
        t.set(3, NodeRef::new(20, "n20"));
        t.set(5, NodeRef::new(42, "n42"));
        assert_eq!(t.closest_preceding(Identifier(50)).unwrap().id, Identifier(42));
        assert_eq!(t.closest_preceding(Identifier(30)).unwrap().id, Identifier(20));
        assert_eq!(t.closest_preceding(Identifier(20)).unwrap().id, Identifier(10));
        assert!(t.closest_preceding(Identifier(9)).is_none());
    }

    #[test]
    fn test_offer_keeps_closest() {
        let t = table(8);
        // slot 4 starts at 24
        assert!(t.offer(4, &NodeRef::new(40, "n40")));
        assert!(t.offer(4, &NodeRef::new(30, "n30")));
        assert!(!t.offer(4, &NodeRef::new(35, "n35")));
        // exactly at the start beats everything
        assert!(t.offer(4, &NodeRef::new(24, "n24")));
        assert!(!t.offer(4, &NodeRef::new(24, "n24")));
        assert_eq!(t.get(4).unwrap().id, Identifier(24));
    }

    #[test]
    fn test_render_lists_every_slot() {
        let t = table(8);
        t.fill(&NodeRef::new(8, "n8"));
        let text = t.render("n8");
        assert!(text.starts_with("Finger Table for n8:"));
        assert_eq!(text.lines().count(), 7);
        assert!(text.contains("Finger 5: start 40 -> n8#8"));
    }
}
