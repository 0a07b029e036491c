//! Live tree
//!
//! The tree that is actually displayed. The renderer only needs ordered
//! child access, insert/remove, and the mapping from a logical node to the
//! live node standing for it.

use fos_dom::{DomError, DomResult, DomTree, NodeData, NodeId};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt::Write;

/// Mutable view of the displayed tree
pub trait LiveTree {
    /// Live node standing for a logical node. Identity by default.
    fn resolve(&self, node: NodeId) -> NodeId {
        node
    }

    /// Snapshot of a live node's children, in order
    fn child_nodes(&self, parent: NodeId) -> Vec<NodeId>;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Insert `child` before `reference` (append when `None`).
    /// A child that already has a parent is moved.
    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<()>;

    fn remove(&mut self, parent: NodeId, child: NodeId) -> DomResult<()>;
}

/// Mutation counters of a [`MemoryLiveTree`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LiveTreeStats {
    /// `child_nodes` calls
    pub snapshots: usize,
    pub inserts: usize,
    pub removes: usize,
}

impl LiveTreeStats {
    /// Inserts plus removes
    pub fn mutations(&self) -> usize {
        self.inserts + self.removes
    }
}

/// In-memory live tree with DOM move semantics
#[derive(Debug, Default)]
pub struct MemoryLiveTree {
    children: HashMap<NodeId, Vec<NodeId>>,
    parents: HashMap<NodeId, NodeId>,
    stats: Cell<LiveTreeStats>,
    snapshots: RefCell<HashMap<NodeId, usize>>,
}

impl MemoryLiveTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live tree mirroring the logical subtree under `root`
    pub fn mirror(tree: &DomTree, root: NodeId) -> Self {
        let mut live = Self::new();
        live.mirror_subtree(tree, root);
        live
    }

    fn mirror_subtree(&mut self, tree: &DomTree, parent: NodeId) {
        let children = tree.child_ids(parent);
        for &child in &children {
            self.parents.insert(child, parent);
            self.mirror_subtree(tree, child);
        }
        if !children.is_empty() {
            self.children.insert(parent, children);
        }
    }

    pub fn children_of(&self, parent: NodeId) -> &[NodeId] {
        self.children.get(&parent).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn stats(&self) -> LiveTreeStats {
        self.stats.get()
    }

    /// Number of times the children of `node` were snapshotted
    pub fn snapshot_count(&self, node: NodeId) -> usize {
        self.snapshots.borrow().get(&node).copied().unwrap_or(0)
    }

    pub fn reset_stats(&self) {
        self.stats.set(LiveTreeStats::default());
        self.snapshots.borrow_mut().clear();
    }

    /// Indented outline of the live subtree under `root`, labelled from the
    /// logical tree
    pub fn dump(&self, tree: &DomTree, root: NodeId) -> String {
        let mut output = String::new();
        self.dump_node(&mut output, tree, root, 0);
        output
    }

    fn dump_node(&self, output: &mut String, tree: &DomTree, id: NodeId, depth: usize) {
        let label = match tree.get(id).map(|node| &node.data) {
            Some(NodeData::Element(_)) => tree.tag_name(id).unwrap_or_default().to_string(),
            Some(NodeData::Text(text)) => format!("{:?}", text.content),
            Some(NodeData::Comment(_)) => "<!-- -->".to_string(),
            Some(NodeData::Document) => "#document".to_string(),
            Some(NodeData::ShadowRoot(_)) => "#shadow-root".to_string(),
            None => format!("{id} (missing)"),
        };
        let _ = writeln!(output, "{}{}", "  ".repeat(depth), label);
        for &child in self.children_of(id) {
            self.dump_node(output, tree, child, depth + 1);
        }
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, mut node: NodeId) -> bool {
        loop {
            if node == ancestor {
                return true;
            }
            match self.parents.get(&node) {
                Some(&parent) => node = parent,
                None => return false,
            }
        }
    }

    fn detach(&mut self, child: NodeId) {
        if let Some(parent) = self.parents.remove(&child) {
            if let Some(siblings) = self.children.get_mut(&parent) {
                siblings.retain(|&c| c != child);
            }
        }
    }

    fn count(&self, update: impl FnOnce(&mut LiveTreeStats)) {
        let mut stats = self.stats.get();
        update(&mut stats);
        self.stats.set(stats);
    }
}

impl LiveTree for MemoryLiveTree {
    fn child_nodes(&self, parent: NodeId) -> Vec<NodeId> {
        self.count(|stats| stats.snapshots += 1);
        *self.snapshots.borrow_mut().entry(parent).or_default() += 1;
        self.children_of(parent).to_vec()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.parents.get(&node).copied()
    }

    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<()> {
        if self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        if let Some(reference) = reference {
            if self.parents.get(&reference) != Some(&parent) {
                return Err(DomError::NotAChild { parent, child: reference });
            }
        }

        // Inserting a node before itself keeps it in place
        let reference = if reference == Some(child) {
            let siblings = self.children_of(parent);
            let index = siblings.iter().position(|&c| c == child);
            index.and_then(|i| siblings.get(i + 1).copied())
        } else {
            reference
        };

        self.detach(child);
        let siblings = self.children.entry(parent).or_default();
        let index = reference
            .and_then(|r| siblings.iter().position(|&c| c == r))
            .unwrap_or(siblings.len());
        siblings.insert(index, child);
        self.parents.insert(child, parent);
        self.count(|stats| stats.inserts += 1);
        tracing::trace!(%parent, %child, "live insert");
        Ok(())
    }

    fn remove(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        if self.parents.get(&child) != Some(&parent) {
            return Err(DomError::NotAChild { parent, child });
        }
        self.detach(child);
        self.count(|stats| stats.removes += 1);
        tracing::trace!(%parent, %child, "live remove");
        Ok(())
    }
}
