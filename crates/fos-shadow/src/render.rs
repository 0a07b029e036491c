//! Render tree
//!
//! The composed tree built by one render pass, stored as a flat arena with
//! index links. `sync` reconciles it into the live tree level by level with
//! the minimal splices from [`crate::diff`].

use crate::diff::calculate_splices;
use crate::LiveTree;
use fos_dom::{DomResult, NodeId};
use std::collections::HashSet;

/// Index of a node in a [`RenderTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderIndex(u32);

impl RenderIndex {
    /// The node the tree was created for
    pub const ROOT: RenderIndex = RenderIndex(0);

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// One node of the composed tree
#[derive(Debug, Clone)]
pub struct RenderNode {
    /// Logical node rendered here
    pub node: NodeId,
    /// Subtree already matches the live tree; `sync` does not descend
    pub skip: bool,
    first_child: Option<RenderIndex>,
    last_child: Option<RenderIndex>,
    next_sibling: Option<RenderIndex>,
}

impl RenderNode {
    fn new(node: NodeId) -> Self {
        Self {
            node,
            skip: false,
            first_child: None,
            last_child: None,
            next_sibling: None,
        }
    }
}

/// Arena of render nodes for one pass
#[derive(Debug, Clone)]
pub struct RenderTree {
    nodes: Vec<RenderNode>,
}

impl RenderTree {
    pub fn new(root: NodeId) -> Self {
        Self {
            nodes: vec![RenderNode::new(root)],
        }
    }

    pub fn root(&self) -> RenderIndex {
        RenderIndex::ROOT
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, index: RenderIndex) -> Option<&RenderNode> {
        self.nodes.get(index.index())
    }

    /// Append a render node for `node` under `parent`
    pub fn append(&mut self, parent: RenderIndex, node: NodeId) -> RenderIndex {
        let index = RenderIndex(self.nodes.len() as u32);
        self.nodes.push(RenderNode::new(node));

        let parent_node = &mut self.nodes[parent.index()];
        match parent_node.last_child.replace(index) {
            Some(last) => self.nodes[last.index()].next_sibling = Some(index),
            None => parent_node.first_child = Some(index),
        }
        index
    }

    pub fn set_skip(&mut self, index: RenderIndex, skip: bool) {
        if let Some(node) = self.nodes.get_mut(index.index()) {
            node.skip = skip;
        }
    }

    pub fn children(&self, index: RenderIndex) -> impl Iterator<Item = RenderIndex> + '_ {
        let first = self.nodes.get(index.index()).and_then(|n| n.first_child);
        std::iter::successors(first, |&child| self.nodes[child.index()].next_sibling)
    }

    /// Logical nodes of the children of `index`
    pub fn child_nodes(&self, index: RenderIndex) -> Vec<NodeId> {
        self.children(index).map(|c| self.nodes[c.index()].node).collect()
    }

    /// Bring the live tree in line with this tree, returning the number of
    /// live mutations performed
    pub fn sync<L: LiveTree + ?Sized>(&self, live: &mut L) -> DomResult<usize> {
        let mut added = HashSet::new();
        let mut mutations = 0;
        self.sync_node(self.root(), live, &mut added, &mut mutations)?;
        Ok(mutations)
    }

    fn sync_node<L: LiveTree + ?Sized>(
        &self,
        index: RenderIndex,
        live: &mut L,
        added: &mut HashSet<NodeId>,
        mutations: &mut usize,
    ) -> DomResult<()> {
        let parent = live.resolve(self.nodes[index.index()].node);
        let children: Vec<RenderIndex> = self.children(index).collect();
        let wanted: Vec<NodeId> = children
            .iter()
            .map(|c| live.resolve(self.nodes[c.index()].node))
            .collect();
        let old = live.child_nodes(parent);
        let splices = calculate_splices(&wanted, &old, |want, have| want == have);
        if !splices.is_empty() {
            tracing::trace!(%parent, splices = splices.len(), "applying splices");
        }

        let mut new_index = 0;
        let mut old_index = 0;
        for splice in &splices {
            while new_index < splice.index {
                self.sync_child(children[new_index], live, added, mutations)?;
                new_index += 1;
                old_index += 1;
            }

            for &removed in &splice.removed {
                if !added.contains(&removed) {
                    live.remove(parent, removed)?;
                    *mutations += 1;
                }
            }
            old_index += splice.removed.len();

            // Nodes already moved by this pass no longer mark a position here
            let reference = old[old_index.min(old.len())..]
                .iter()
                .copied()
                .find(|node| !added.contains(node));
            for _ in 0..splice.added_count {
                let child = wanted[new_index];
                live.insert_before(parent, child, reference)?;
                *mutations += 1;
                added.insert(child);
                self.sync_child(children[new_index], live, added, mutations)?;
                new_index += 1;
            }
        }

        for &child in &children[new_index..] {
            self.sync_child(child, live, added, mutations)?;
        }
        Ok(())
    }

    fn sync_child<L: LiveTree + ?Sized>(
        &self,
        index: RenderIndex,
        live: &mut L,
        added: &mut HashSet<NodeId>,
        mutations: &mut usize,
    ) -> DomResult<()> {
        if self.nodes[index.index()].skip {
            return Ok(());
        }
        self.sync_node(index, live, added, mutations)
    }
}
