//! Distribution
//!
//! Assigns pool nodes to the insertion points of one shadow root. Matching is
//! greedy and first-fit in document order of the insertion points, stable in
//! pool order, with no backtracking. Nodes nobody takes are dropped from the
//! composed tree.

use crate::{AttributeSet, SelectorCache};
use fos_dom::{DomTree, NodeId, NodeKind};
use std::collections::HashMap;

/// Ordered candidate nodes for one composition pass
#[derive(Debug, Clone, Default)]
pub struct Pool {
    slots: Vec<Option<NodeId>>,
}

impl Pool {
    pub fn new(nodes: impl IntoIterator<Item = NodeId>) -> Self {
        Self {
            slots: nodes.into_iter().map(Some).collect(),
        }
    }

    /// Untaken nodes in pool order
    pub fn remaining(&self) -> Vec<NodeId> {
        self.slots.iter().flatten().copied().collect()
    }

    /// Take every untaken node satisfying `pred`, in pool order
    pub fn take_matching(&mut self, mut pred: impl FnMut(NodeId) -> bool) -> Vec<NodeId> {
        let mut taken = Vec::new();
        for slot in &mut self.slots {
            if let Some(node) = *slot {
                if pred(node) {
                    taken.push(node);
                    *slot = None;
                }
            }
        }
        taken
    }

    /// Number of untaken nodes
    pub fn remaining_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_exhausted(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}

/// Distribution records of every insertion point, plus the older root each
/// bound shadow insertion point renders
#[derive(Debug, Default)]
pub struct Distributions {
    records: HashMap<NodeId, Vec<NodeId>>,
    bindings: HashMap<NodeId, NodeId>,
    /// Host -> insertion points its last composition reached
    scopes: HashMap<NodeId, Vec<NodeId>>,
}

impl Distributions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nodes currently assigned to `point`
    pub fn get(&self, point: NodeId) -> &[NodeId] {
        self.records.get(&point).map(Vec::as_slice).unwrap_or_default()
    }

    /// Older shadow root a shadow insertion point is bound to
    pub fn binding(&self, point: NodeId) -> Option<NodeId> {
        self.bindings.get(&point).copied()
    }

    pub(crate) fn reset(&mut self, point: NodeId) {
        self.records.remove(&point);
        self.bindings.remove(&point);
    }

    pub(crate) fn set(&mut self, point: NodeId, nodes: Vec<NodeId>) {
        if nodes.is_empty() {
            self.records.remove(&point);
        } else {
            self.records.insert(point, nodes);
        }
    }

    pub(crate) fn bind(&mut self, point: NodeId, older_root: NodeId) {
        self.bindings.insert(point, older_root);
    }

    /// Insertion points whose record currently holds `node`
    pub(crate) fn points_holding(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.records
            .iter()
            .filter(move |(_, nodes)| nodes.contains(&node))
            .map(|(&point, _)| point)
    }

    /// Remember the insertion points `host` reaches and drop the records of
    /// those it no longer reaches
    pub(crate) fn set_scope(&mut self, host: NodeId, points: Vec<NodeId>) {
        let stale: Vec<NodeId> = self
            .scopes
            .get(&host)
            .map(|previous| {
                previous
                    .iter()
                    .copied()
                    .filter(|point| !points.contains(point))
                    .collect()
            })
            .unwrap_or_default();
        for point in stale {
            tracing::trace!(%host, %point, "dropped unreachable insertion point");
            self.reset(point);
        }
        self.scopes.insert(host, points);
    }

    pub(crate) fn forget_scope(&mut self, host: NodeId) {
        for point in self.scopes.remove(&host).unwrap_or_default() {
            self.reset(point);
        }
    }

    /// Drop every record whose insertion point fails `keep`
    pub(crate) fn retain(&mut self, mut keep: impl FnMut(NodeId) -> bool) {
        self.records.retain(|&point, _| keep(point));
        self.bindings.retain(|&point, _| keep(point));
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Insertion points of a subtree in pre-order, without descending into
/// insertion points (their descendants are fallback content)
pub(crate) fn insertion_points(tree: &DomTree, root: NodeId) -> Vec<NodeId> {
    let mut points = Vec::new();
    collect_insertion_points(tree, root, &mut points);
    points
}

fn collect_insertion_points(tree: &DomTree, node: NodeId, out: &mut Vec<NodeId>) {
    for (child, _) in tree.children(node) {
        if tree.is_insertion_point(child) {
            out.push(child);
        } else {
            collect_insertion_points(tree, child, out);
        }
    }
}

/// Distributes a pool over the insertion points of one shadow root
pub struct Distributor<'a> {
    tree: &'a DomTree,
    distributions: &'a mut Distributions,
    selectors: &'a mut SelectorCache,
    attributes: &'a mut AttributeSet,
}

impl<'a> Distributor<'a> {
    pub fn new(
        tree: &'a DomTree,
        distributions: &'a mut Distributions,
        selectors: &'a mut SelectorCache,
        attributes: &'a mut AttributeSet,
    ) -> Self {
        Self {
            tree,
            distributions,
            selectors,
            attributes,
        }
    }

    /// Reset and refill the record of every active insertion point in `root`.
    ///
    /// A shadow insertion point only takes nodes when `root` is the oldest
    /// root of its host; otherwise the composer binds it to the older root.
    pub fn distribute(&mut self, root: NodeId, pool: &mut Pool) {
        let tree = self.tree;
        let oldest = tree.older_shadow_root(root).is_none();

        for point in insertion_points(tree, root) {
            self.distributions.reset(point);
            let taken = match tree.kind(point) {
                NodeKind::Content { select } => {
                    let selector = self.selectors.get(select);
                    for name in selector.dependent_attributes() {
                        self.attributes.insert(name);
                    }
                    pool.take_matching(|node| selector.matches(tree, node))
                }
                NodeKind::Shadow if oldest => pool.take_matching(|_| true),
                _ => continue,
            };
            tracing::trace!(%point, count = taken.len(), "distributed");
            self.distributions.set(point, taken);
        }
    }
}
