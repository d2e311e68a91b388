//! Identity table for nodes that are not yet reachable.

use std::collections::BTreeMap;

use wsdom_dom::{Document, NodeId};
use wsdom_protocols::{NodeRef, StashId};

use super::xpath::{compute_xpath, evaluate_xpath};

/// Maps stash ids to nodes.
///
/// Ids are allocated monotonically. Stashing under an explicit id (replay
/// side, matching the sender's ids) moves the allocator past that id.
#[derive(Debug, Clone, Default)]
pub struct NodeStash {
    entries: BTreeMap<StashId, NodeId>,
    next_id: StashId,
}

impl NodeStash {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `node` under `id`, or under the next free id.
    pub fn stash(&mut self, node: NodeId, id: Option<StashId>) -> NodeRef {
        let id = id.unwrap_or(self.next_id);
        self.entries.insert(id, node);
        self.next_id = self.next_id.max(id.wrapping_add(1));
        NodeRef::stashed(id)
    }

    /// Resolve `node_ref`: stash lookup for stashed refs, structural
    /// evaluation against `doc` for paths.
    pub fn get(&self, doc: &Document, node_ref: &NodeRef) -> Option<NodeId> {
        match node_ref {
            NodeRef::Stashed { id } => self.entries.get(id).copied().filter(|&n| doc.contains(n)),
            NodeRef::XPath { xpath } => evaluate_xpath(doc, xpath),
        }
    }

    /// Release the entry behind a stashed ref. The node itself is untouched.
    pub fn unstash(&mut self, node_ref: &NodeRef) -> Option<NodeId> {
        node_ref.stash_id().and_then(|id| self.entries.remove(&id))
    }

    /// Stash id of `node`, by identity.
    pub fn id_of(&self, node: NodeId) -> Option<StashId> {
        self.entries
            .iter()
            .find(|&(_, &stashed)| stashed == node)
            .map(|(&id, _)| id)
    }

    /// How to name `node` on the wire: its stash id if stashed, otherwise
    /// its path if reachable.
    pub fn find_ref_for(&self, doc: &Document, node: NodeId) -> Option<NodeRef> {
        if let Some(id) = self.id_of(node) {
            return Some(NodeRef::stashed(id));
        }
        compute_xpath(doc, node).map(NodeRef::xpath)
    }

    pub fn contains(&self, id: StashId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop entries whose node `doc` has released.
    pub fn retain_live(&mut self, doc: &Document) {
        self.entries.retain(|_, node| doc.contains(*node));
    }

    /// Drop every entry and restart id allocation.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.next_id = 0;
    }
}
