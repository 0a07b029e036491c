//! Shadow Renderer
//!
//! Host-keyed table of render engines plus the state shared between them:
//! distribution records, parsed predicates, the render queue, and which
//! engine last rendered each logical node.

use crate::composer::Composer;
use crate::distributor::Distributions;
use crate::render::{RenderIndex, RenderTree};
use crate::scheduler::{FrameScheduler, ManualFrames, Scheduler};
use crate::{AttributeSet, Config, LiveTree, RenderEngine, SelectorCache, ShadowError, ShadowResult};
use fos_dom::{DomTree, NodeId, NodeKind};
use std::collections::HashMap;
use std::rc::Rc;

/// Renders shadow hosts into a live tree
#[derive(Debug)]
pub struct ShadowRenderer {
    config: Config,
    engines: HashMap<NodeId, RenderEngine>,
    distributions: Distributions,
    selectors: SelectorCache,
    /// Logical node -> host whose engine rendered it
    associations: HashMap<NodeId, NodeId>,
    scheduler: Scheduler,
}

impl ShadowRenderer {
    pub fn new(config: Config, frames: Rc<dyn FrameScheduler>) -> Self {
        let scheduler = Scheduler::new(frames, config.prefer_animation_frame);
        Self {
            config,
            engines: HashMap::new(),
            distributions: Distributions::new(),
            selectors: SelectorCache::new(),
            associations: HashMap::new(),
            scheduler,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn engine(&self, host: NodeId) -> Option<&RenderEngine> {
        self.engines.get(&host)
    }

    pub fn engine_count(&self) -> usize {
        self.engines.len()
    }

    pub fn is_dirty(&self, host: NodeId) -> bool {
        self.engines.get(&host).is_some_and(RenderEngine::is_dirty)
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn distributions(&self) -> &Distributions {
        &self.distributions
    }

    /// Host whose engine last rendered `node`
    pub fn owner_of(&self, node: NodeId) -> Option<NodeId> {
        self.associations.get(&node).copied()
    }

    fn ensure_engine(&mut self, host: NodeId) -> &mut RenderEngine {
        self.engines.entry(host).or_insert_with(|| {
            tracing::debug!(%host, "created render engine");
            RenderEngine::new(host)
        })
    }

    // --- Entry points ---

    /// Render `host` now, creating its engine if needed.
    ///
    /// Returns the number of live mutations; a clean engine renders nothing.
    pub fn render<L: LiveTree + ?Sized>(
        &mut self,
        tree: &DomTree,
        live: &mut L,
        host: NodeId,
    ) -> ShadowResult<usize> {
        if !tree.is_host(host) {
            return Err(ShadowError::NotAHost(host));
        }
        self.ensure_engine(host);
        self.render_host(tree, live, host)
    }

    /// Render every queued host in FIFO order, returning how many were
    /// rendered.
    ///
    /// On failure the failing host and every host not yet reached are queued
    /// again (still dirty) before the error is returned.
    pub fn flush<L: LiveTree + ?Sized>(
        &mut self,
        tree: &DomTree,
        live: &mut L,
    ) -> ShadowResult<usize> {
        let pending = self.scheduler.take_pending();
        if pending.is_empty() {
            return Ok(0);
        }
        tracing::debug!(engines = pending.len(), "flushing render queue");

        let mut rendered = 0;
        for (i, &host) in pending.iter().enumerate() {
            if !self.is_dirty(host) {
                continue;
            }
            if let Err(err) = self.render_host(tree, live, host) {
                tracing::warn!(%host, error = %err, "render failed, re-queueing");
                for &retry in &pending[i..] {
                    if self.is_dirty(retry) {
                        self.scheduler.enqueue(retry);
                    }
                }
                return Err(err);
            }
            rendered += 1;
        }

        tracing::debug!(rendered, "flush complete");
        Ok(rendered)
    }

    /// Mark a host's engine dirty and queue it.
    ///
    /// Returns false when `host` has no engine. Nothing is propagated to
    /// other engines.
    pub fn invalidate(&mut self, host: NodeId) -> bool {
        let Some(engine) = self.engines.get_mut(&host) else {
            return false;
        };
        if engine.mark_dirty() {
            tracing::trace!(%host, "invalidated");
            self.scheduler.enqueue(host);
        }
        true
    }

    /// A shadow root was attached to `host`
    pub fn shadow_root_attached(&mut self, host: NodeId) {
        if self.engines.contains_key(&host) {
            self.invalidate(host);
        } else {
            self.ensure_engine(host);
            self.scheduler.enqueue(host);
        }
    }

    /// The child list of `node` changed. Returns true if an engine owns the
    /// rendering of those children and was invalidated.
    pub fn node_changed(&mut self, tree: &DomTree, node: NodeId) -> bool {
        let kind = tree.kind(node);
        let host = match kind {
            NodeKind::Host { .. } => Some(node),
            NodeKind::ShadowRoot { host } => Some(host),
            _ if kind.is_insertion_point() => tree.tree_scope_host(node),
            _ => self
                .associations
                .get(&node)
                .copied()
                .or_else(|| tree.tree_scope_host(node)),
        };
        host.is_some_and(|host| self.invalidate(host))
    }

    /// Attribute `name` of `node` changed
    pub fn attribute_changed(&mut self, tree: &DomTree, node: NodeId, name: &str) -> bool {
        let mut invalidated = false;

        let mut candidates: Vec<NodeId> = [tree.parent(node), self.associations.get(&node).copied()]
            .into_iter()
            .flatten()
            .collect();
        // Nested hosts that pool `node` through an outer insertion point
        candidates.extend(
            self.distributions
                .points_holding(node)
                .filter_map(|point| tree.parent(point))
                .filter(|&parent| tree.is_host(parent)),
        );
        candidates.sort_unstable();
        candidates.dedup();

        for host in candidates {
            let depends = self
                .engines
                .get(&host)
                .is_some_and(|engine| engine.depends_on_attribute(name));
            if depends {
                invalidated |= self.invalidate(host);
            }
        }

        if name.eq_ignore_ascii_case("select") && matches!(tree.kind(node), NodeKind::Content { .. }) {
            if let Some(host) = tree.tree_scope_host(node) {
                invalidated |= self.invalidate(host);
            }
        }
        invalidated
    }

    /// Nodes distributed to an insertion point, after flushing pending work
    pub fn distributed_nodes<L: LiveTree + ?Sized>(
        &mut self,
        tree: &DomTree,
        live: &mut L,
        point: NodeId,
    ) -> ShadowResult<Vec<NodeId>> {
        self.flush(tree, live)?;
        Ok(self.distributions.get(point).to_vec())
    }

    /// Forget everything kept for a host that left the document
    pub fn remove_host(&mut self, tree: &DomTree, host: NodeId) -> bool {
        let removed = self.engines.remove(&host).is_some();
        self.scheduler.remove(host);
        self.associations
            .retain(|&node, &mut owner| owner != host && node != host);
        self.distributions.forget_scope(host);
        self.distributions
            .retain(|point| tree.tree_scope_host(point) != Some(host));
        if removed {
            tracing::debug!(%host, "removed render engine");
        }
        removed
    }

    // --- Render pass ---

    fn render_host<L: LiveTree + ?Sized>(
        &mut self,
        tree: &DomTree,
        live: &mut L,
        host: NodeId,
    ) -> ShadowResult<usize> {
        let mut out = RenderTree::new(host);
        let mut rendered = Vec::new();
        if !self.build(tree, host, &mut out, RenderIndex::ROOT, &mut rendered)? {
            return Ok(0);
        }

        let mutations = out.sync(live)?;
        for host in &rendered {
            if let Some(engine) = self.engines.get_mut(host) {
                engine.mark_clean();
            }
        }
        tracing::debug!(%host, nodes = out.len(), hosts = rendered.len(), mutations, "rendered");
        Ok(mutations)
    }

    /// Compose `host` and append its composed children under `at`.
    /// Returns false without doing anything when the engine is clean.
    fn build(
        &mut self,
        tree: &DomTree,
        host: NodeId,
        out: &mut RenderTree,
        at: RenderIndex,
        rendered: &mut Vec<NodeId>,
    ) -> ShadowResult<bool> {
        if !self.is_dirty(host) {
            return Ok(false);
        }
        let root = tree.shadow_root(host).ok_or(ShadowError::NotAHost(host))?;

        let mut attributes = AttributeSet::new();
        Composer::new(tree, &mut self.distributions, &mut self.selectors)
            .tree_composition(host, &mut attributes)?;
        if let Some(engine) = self.engines.get_mut(&host) {
            *engine.attributes_mut() = attributes;
        }
        self.associations.retain(|_, owner| *owner != host);
        rendered.push(host);

        for (child, _) in tree.children(root) {
            self.render_node(tree, host, child, out, at, rendered)?;
        }
        Ok(true)
    }

    fn render_node(
        &mut self,
        tree: &DomTree,
        owner: NodeId,
        node: NodeId,
        out: &mut RenderTree,
        at: RenderIndex,
        rendered: &mut Vec<NodeId>,
    ) -> ShadowResult<()> {
        let kind = tree.kind(node);
        match kind {
            NodeKind::Host { .. } => {
                let index = out.append(at, node);
                self.associations.insert(node, owner);
                let reprojecting =
                    self.config.rerender_reprojecting_hosts && holds_insertion_point(tree, node);
                let engine = self.ensure_engine(node);
                if reprojecting {
                    engine.mark_dirty();
                }
                let built = self.build(tree, node, out, index, rendered)?;
                out.set_skip(index, !built);
            }
            _ if kind.is_insertion_point() => {
                if let Some(older) = self.distributions.binding(node) {
                    for child in tree.child_ids(older) {
                        self.render_node(tree, owner, child, out, at, rendered)?;
                    }
                    return Ok(());
                }
                let record = self.distributions.get(node).to_vec();
                if record.is_empty() {
                    self.associations.insert(node, owner);
                    for child in tree.child_ids(node) {
                        self.render_node(tree, owner, child, out, at, rendered)?;
                    }
                } else {
                    for distributed in record {
                        self.render_node(tree, owner, distributed, out, at, rendered)?;
                    }
                }
            }
            _ => {
                let index = out.append(at, node);
                self.associations.insert(node, owner);
                for child in tree.child_ids(node) {
                    self.render_node(tree, owner, child, out, index, rendered)?;
                }
            }
        }
        Ok(())
    }
}

/// True if any descendant of `node` is an insertion point
fn holds_insertion_point(tree: &DomTree, node: NodeId) -> bool {
    tree.children(node).any(|(child, _)| {
        tree.is_insertion_point(child) || holds_insertion_point(tree, child)
    })
}

impl Default for ShadowRenderer {
    fn default() -> Self {
        Self::new(Config::default(), Rc::new(ManualFrames::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryLiveTree;

    fn host_with_content(select: Option<&str>) -> (DomTree, NodeId, NodeId) {
        let mut tree = DomTree::new();
        let host = tree.create_element("x-host");
        tree.append_child(tree.root(), host).unwrap();
        let root = tree.attach_shadow(host).unwrap();
        let point = tree.create_element("content");
        if let Some(select) = select {
            tree.set_attribute(point, "select", select).unwrap();
        }
        tree.append_child(root, point).unwrap();
        (tree, host, point)
    }

    #[test]
    fn test_render_rejects_non_hosts() {
        let mut tree = DomTree::new();
        let div = tree.create_element("div");
        let mut live = MemoryLiveTree::mirror(&tree, tree.root());
        let mut renderer = ShadowRenderer::default();
        assert_eq!(
            renderer.render(&tree, &mut live, div),
            Err(ShadowError::NotAHost(div))
        );
        assert!(!renderer.invalidate(div));
    }

    #[test]
    fn test_render_then_clean() {
        let (mut tree, host, _) = host_with_content(None);
        let a = tree.create_element("a");
        tree.append_child(host, a).unwrap();
        let mut live = MemoryLiveTree::mirror(&tree, tree.root());
        let mut renderer = ShadowRenderer::default();

        renderer.render(&tree, &mut live, host).unwrap();
        assert!(!renderer.is_dirty(host));
        assert_eq!(renderer.owner_of(a), Some(host));
        assert_eq!(renderer.render(&tree, &mut live, host).unwrap(), 0);
    }

    #[test]
    fn test_invalidate_enqueues_once() {
        let (tree, host, _) = host_with_content(None);
        let mut live = MemoryLiveTree::mirror(&tree, tree.root());
        let mut renderer = ShadowRenderer::default();
        renderer.render(&tree, &mut live, host).unwrap();

        assert!(renderer.invalidate(host));
        assert!(renderer.invalidate(host));
        assert_eq!(renderer.scheduler().pending(), &[host]);
        assert_eq!(renderer.flush(&tree, &mut live).unwrap(), 1);
        assert!(renderer.scheduler().pending().is_empty());
    }

    #[test]
    fn test_attribute_dependencies() {
        let (mut tree, host, point) = host_with_content(Some(".on"));
        let a = tree.create_element("a");
        tree.append_child(host, a).unwrap();
        let mut live = MemoryLiveTree::mirror(&tree, tree.root());
        let mut renderer = ShadowRenderer::default();
        renderer.render(&tree, &mut live, host).unwrap();
        assert!(live.children_of(host).is_empty());

        assert!(!renderer.attribute_changed(&tree, a, "title"));
        assert!(!renderer.is_dirty(host));

        tree.set_attribute(a, "class", "on").unwrap();
        assert!(renderer.attribute_changed(&tree, a, "class"));
        assert_eq!(renderer.distributed_nodes(&tree, &mut live, point).unwrap(), vec![a]);
        assert_eq!(live.children_of(host), &[a]);
    }

    #[test]
    fn test_select_change_invalidates_scope_host() {
        let (mut tree, host, point) = host_with_content(Some("p"));
        let mut live = MemoryLiveTree::mirror(&tree, tree.root());
        let mut renderer = ShadowRenderer::default();
        renderer.render(&tree, &mut live, host).unwrap();

        tree.set_attribute(point, "select", "a").unwrap();
        assert!(renderer.attribute_changed(&tree, point, "select"));
        assert!(renderer.is_dirty(host));
    }

    #[test]
    fn test_remove_host_purges_state() {
        let (mut tree, host, point) = host_with_content(None);
        let a = tree.create_element("a");
        tree.append_child(host, a).unwrap();
        let mut live = MemoryLiveTree::mirror(&tree, tree.root());
        let mut renderer = ShadowRenderer::default();
        renderer.render(&tree, &mut live, host).unwrap();
        renderer.invalidate(host);

        assert!(renderer.remove_host(&tree, host));
        assert_eq!(renderer.engine_count(), 0);
        assert!(renderer.scheduler().pending().is_empty());
        assert_eq!(renderer.owner_of(a), None);
        assert!(renderer.distributions().get(point).is_empty());
        assert!(!renderer.remove_host(&tree, host));
    }
}
