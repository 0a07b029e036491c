//! Composed document
//!
//! Owns the logical tree, the live tree and the renderer, and keeps them in
//! step: mutations under a rendered host invalidate its engine, mutations
//! anywhere else are applied to the live tree directly.

use crate::scheduler::{FrameScheduler, ManualFrames};
use crate::{Config, LiveTree, MemoryLiveTree, ShadowRenderer, ShadowResult};
use fos_dom::{DomTree, NodeId};
use std::rc::Rc;

/// Logical tree plus its rendering
#[derive(Debug)]
pub struct ComposedDocument<L: LiveTree> {
    tree: DomTree,
    live: L,
    renderer: ShadowRenderer,
}

impl<L: LiveTree> ComposedDocument<L> {
    pub fn new(tree: DomTree, live: L, renderer: ShadowRenderer) -> Self {
        Self {
            tree,
            live,
            renderer,
        }
    }

    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// Logical tree for node creation. Structural changes made through this
    /// reference bypass invalidation.
    pub fn tree_mut(&mut self) -> &mut DomTree {
        &mut self.tree
    }

    pub fn live(&self) -> &L {
        &self.live
    }

    pub fn renderer(&self) -> &ShadowRenderer {
        &self.renderer
    }

    pub fn into_parts(self) -> (DomTree, L, ShadowRenderer) {
        (self.tree, self.live, self.renderer)
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.tree.create_element(tag)
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.tree.create_text(text)
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> ShadowResult<()> {
        self.insert_before(parent, child, None)
    }

    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> ShadowResult<()> {
        let old_parent = self.tree.parent(child);
        self.tree.insert_before(parent, child, reference)?;
        if let Some(old_parent) = old_parent.filter(|&old| old != parent) {
            self.child_removed(old_parent, child)?;
        }
        self.child_inserted(parent, child)
    }

    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> ShadowResult<()> {
        self.tree.remove_child(parent, child)?;
        self.child_removed(parent, child)
    }

    /// Returns true if an engine was invalidated
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> ShadowResult<bool> {
        self.tree.set_attribute(node, name, value)?;
        Ok(self.renderer.attribute_changed(&self.tree, node, name))
    }

    /// Returns true if an engine was invalidated
    pub fn remove_attribute(&mut self, node: NodeId, name: &str) -> ShadowResult<bool> {
        if !self.tree.remove_attribute(node, name)? {
            return Ok(false);
        }
        Ok(self.renderer.attribute_changed(&self.tree, node, name))
    }

    /// Attach a new shadow root; the host is queued for rendering
    pub fn attach_shadow(&mut self, host: NodeId) -> ShadowResult<NodeId> {
        let root = self.tree.attach_shadow(host)?;
        self.renderer.shadow_root_attached(host);
        Ok(root)
    }

    pub fn render(&mut self, host: NodeId) -> ShadowResult<usize> {
        self.renderer.render(&self.tree, &mut self.live, host)
    }

    pub fn flush(&mut self) -> ShadowResult<usize> {
        self.renderer.flush(&self.tree, &mut self.live)
    }

    pub fn invalidate(&mut self, host: NodeId) -> bool {
        self.renderer.invalidate(host)
    }

    pub fn distributed_nodes(&mut self, point: NodeId) -> ShadowResult<Vec<NodeId>> {
        self.renderer.distributed_nodes(&self.tree, &mut self.live, point)
    }

    /// Drop renderer state for a host that is no longer displayed
    pub fn remove_host(&mut self, host: NodeId) -> bool {
        self.renderer.remove_host(&self.tree, host)
    }

    fn child_inserted(&mut self, parent: NodeId, child: NodeId) -> ShadowResult<()> {
        if self.renderer.node_changed(&self.tree, parent) {
            return Ok(());
        }
        let live_parent = self.live.resolve(parent);
        let live_child = self.live.resolve(child);
        let reference = self.live_reference(live_parent, child);
        self.live.insert_before(live_parent, live_child, reference)?;
        Ok(())
    }

    fn child_removed(&mut self, parent: NodeId, child: NodeId) -> ShadowResult<()> {
        if self.renderer.node_changed(&self.tree, parent) {
            return Ok(());
        }
        let live_parent = self.live.resolve(parent);
        let live_child = self.live.resolve(child);
        if self.live.parent(live_child) == Some(live_parent) {
            self.live.remove(live_parent, live_child)?;
        }
        Ok(())
    }

    /// First following logical sibling already present under `live_parent`
    fn live_reference(&self, live_parent: NodeId, child: NodeId) -> Option<NodeId> {
        let mut next = self.tree.next_sibling(child);
        while let Some(sibling) = next {
            let live_sibling = self.live.resolve(sibling);
            if self.live.parent(live_sibling) == Some(live_parent) {
                return Some(live_sibling);
            }
            next = self.tree.next_sibling(sibling);
        }
        None
    }
}

impl ComposedDocument<MemoryLiveTree> {
    /// Document over an in-memory live tree mirroring `tree`
    pub fn in_memory(tree: DomTree, config: Config, frames: Rc<dyn FrameScheduler>) -> Self {
        let live = MemoryLiveTree::mirror(&tree, tree.root());
        Self::new(tree, live, ShadowRenderer::new(config, frames))
    }
}

impl Default for ComposedDocument<MemoryLiveTree> {
    fn default() -> Self {
        Self::in_memory(DomTree::new(), Config::default(), Rc::new(ManualFrames::new()))
    }
}
