//! DOM Tree (arena-based allocation)
//!
//! Nodes are never freed: removing a node only unlinks it, so a `NodeId`
//! stays valid for the lifetime of the tree. Shadow roots live in the same
//! arena but are never linked as anyone's child.

use crate::{
    DomError, DomResult, InternedString, Node, NodeData, NodeId, NodeKind, ShadowChain,
    ShadowRoots, StringInterner,
};

/// Interned names the tree consults on every classification
#[derive(Debug, Clone, Copy)]
struct Names {
    content: InternedString,
    shadow: InternedString,
    select: InternedString,
    id: InternedString,
    class: InternedString,
}

/// Arena-based logical DOM tree
#[derive(Debug)]
pub struct DomTree {
    nodes: Vec<Node>,
    interner: StringInterner,
    names: Names,
}

impl DomTree {
    /// Create a tree holding only the document node
    pub fn new() -> Self {
        let mut interner = StringInterner::new();
        let names = Names {
            content: interner.intern("content"),
            shadow: interner.intern("shadow"),
            select: interner.intern("select"),
            id: interner.intern("id"),
            class: interner.intern("class"),
        };
        Self {
            nodes: vec![Node::document()],
            interner,
            names,
        }
    }

    /// Document node
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    fn node(&self, id: NodeId) -> DomResult<&Node> {
        self.get(id).ok_or(DomError::NotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> DomResult<&mut Node> {
        self.nodes.get_mut(id.index()).ok_or(DomError::NotFound(id))
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Number of nodes in the arena (attached or not)
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if tree is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Access the name interner
    pub fn interner(&self) -> &StringInterner {
        &self.interner
    }

    /// Resolve an interned name
    pub fn resolve(&self, name: InternedString) -> &str {
        self.interner.get(name)
    }

    // --- Creation ---

    /// Create a detached element; the tag is lowercased
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let name = self.interner.intern(&tag.to_ascii_lowercase());
        self.push(Node::element(name))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(Node::text(text.to_string()))
    }

    /// Create a detached comment node
    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push(Node::comment(text.to_string()))
    }

    // --- Navigation ---

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.parent.to_option()
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.first_child.to_option()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.last_child.to_option()
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.next_sibling.to_option()
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.prev_sibling.to_option()
    }

    /// Iterate the children of a node in order
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            tree: self,
            next: self.first_child(id),
        }
    }

    /// Snapshot of the child IDs of a node
    pub fn child_ids(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id).map(|(child, _)| child).collect()
    }

    /// Iterate the ancestors of a node, nearest first (excluding the node)
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent(id),
        }
    }

    /// Whether `node` is `ancestor` or one of its descendants
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        node == ancestor || self.ancestors(node).any(|a| a == ancestor)
    }

    /// Local tag name of an element
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        let element = self.get(id)?.as_element()?;
        Some(self.interner.get(element.name))
    }

    // --- Mutation ---

    /// Append `child` as the last child of `parent`
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` before `reference` (or last when `None`).
    /// A child that already has a parent is moved.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<()> {
        let parent_node = self.node(parent)?;
        let child_node = self.node(child)?;
        let hierarchy_error = DomError::HierarchyRequest { parent, child };

        if matches!(parent_node.data, NodeData::Text(_) | NodeData::Comment(_))
            || matches!(child_node.data, NodeData::Document | NodeData::ShadowRoot(_))
            || self.contains(child, parent)
        {
            return Err(hierarchy_error);
        }

        let reference = match reference {
            Some(r) if r == child => child_node.next_sibling.to_option(),
            Some(r) => {
                if self.node(r)?.parent != parent {
                    return Err(DomError::NotAChild { parent, child: r });
                }
                Some(r)
            }
            None => None,
        };

        self.detach(child);
        self.link(parent, child, reference);
        Ok(())
    }

    /// Remove `child` from `parent`
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        if self.node(child)?.parent != parent {
            return Err(DomError::NotAChild { parent, child });
        }
        self.detach(child);
        Ok(())
    }

    fn detach(&mut self, child: NodeId) {
        let (parent, prev, next) = {
            let node = &self.nodes[child.index()];
            (node.parent, node.prev_sibling, node.next_sibling)
        };
        if !parent.is_valid() {
            return;
        }

        if prev.is_valid() {
            self.nodes[prev.index()].next_sibling = next;
        } else {
            self.nodes[parent.index()].first_child = next;
        }
        if next.is_valid() {
            self.nodes[next.index()].prev_sibling = prev;
        } else {
            self.nodes[parent.index()].last_child = prev;
        }

        let node = &mut self.nodes[child.index()];
        node.parent = NodeId::NONE;
        node.prev_sibling = NodeId::NONE;
        node.next_sibling = NodeId::NONE;
    }

    fn link(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        let (prev, next) = match reference {
            Some(r) => (self.nodes[r.index()].prev_sibling, r),
            None => (self.nodes[parent.index()].last_child, NodeId::NONE),
        };

        if prev.is_valid() {
            self.nodes[prev.index()].next_sibling = child;
        } else {
            self.nodes[parent.index()].first_child = child;
        }
        if next.is_valid() {
            self.nodes[next.index()].prev_sibling = child;
        } else {
            self.nodes[parent.index()].last_child = child;
        }

        let node = &mut self.nodes[child.index()];
        node.parent = parent;
        node.prev_sibling = prev;
        node.next_sibling = next;
    }

    // --- Attributes ---

    /// Set an attribute on an element; the name is lowercased
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> DomResult<()> {
        let name = self.interner.intern(&name.to_ascii_lowercase());
        let (is_id, is_class) = (name == self.names.id, name == self.names.class);
        let element = self
            .node_mut(id)?
            .as_element_mut()
            .ok_or(DomError::InvalidNodeType(id))?;
        element.set_attr(name, value.to_string(), is_id, is_class);
        Ok(())
    }

    /// Remove an attribute, returning whether it was present
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> DomResult<bool> {
        let Some(name) = self.interner.lookup(&name.to_ascii_lowercase()) else {
            self.node(id)?;
            return Ok(false);
        };
        let (is_id, is_class) = (name == self.names.id, name == self.names.class);
        let element = self
            .node_mut(id)?
            .as_element_mut()
            .ok_or(DomError::InvalidNodeType(id))?;
        Ok(element.remove_attr(name, is_id, is_class))
    }

    /// Get an attribute value
    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        let name = self.interner.lookup(&name.to_ascii_lowercase())?;
        self.get(id)?.as_element()?.get_attr(name)
    }

    /// Cached `id` attribute
    pub fn element_id(&self, id: NodeId) -> Option<&str> {
        self.get(id)?.as_element()?.id.as_deref()
    }

    /// Whether the element's class list contains `class`
    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.get(id)
            .and_then(Node::as_element)
            .is_some_and(|e| e.has_class(class))
    }

    // --- Shadow roots ---

    /// Attach a new shadow root to `host`, making it the current root.
    /// Previously attached roots stay reachable as older roots.
    pub fn attach_shadow(&mut self, host: NodeId) -> DomResult<NodeId> {
        let chain = self.shadow_element_chain(host)?;
        let root = self.push(Node::shadow_root(host, chain.current()));
        if let Some(element) = self.nodes[host.index()].as_element_mut() {
            element.shadow = chain.push(root);
        }
        tracing::debug!(%host, %root, "attached shadow root");
        Ok(root)
    }

    fn shadow_element_chain(&self, host: NodeId) -> DomResult<ShadowChain> {
        let element = self
            .node(host)?
            .as_element()
            .ok_or(DomError::InvalidNodeType(host))?;
        Ok(element.shadow.clone())
    }

    /// Current shadow root of a host
    pub fn shadow_root(&self, host: NodeId) -> Option<NodeId> {
        self.get(host)?.as_element()?.shadow.current()
    }

    /// Snapshot of the host's shadow chain
    pub fn shadow_chain(&self, host: NodeId) -> ShadowChain {
        self.shadow_element_chain(host).unwrap_or_default()
    }

    /// Shadow roots of a host, newest first
    pub fn shadow_roots(&self, host: NodeId) -> ShadowRoots {
        self.shadow_chain(host).iter()
    }

    /// Root that was current before `root` was attached
    pub fn older_shadow_root(&self, root: NodeId) -> Option<NodeId> {
        self.get(root)?.as_shadow_root()?.older
    }

    /// Host of a shadow root
    pub fn host_of(&self, root: NodeId) -> Option<NodeId> {
        Some(self.get(root)?.as_shadow_root()?.host)
    }

    pub fn is_host(&self, id: NodeId) -> bool {
        self.shadow_root(id).is_some()
    }

    /// Host whose shadow tree contains `id` (a shadow root maps to its own host)
    pub fn tree_scope_host(&self, id: NodeId) -> Option<NodeId> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find_map(|n| self.host_of(n))
    }

    // --- Classification ---

    /// Classify a node for composition
    pub fn kind(&self, id: NodeId) -> NodeKind<'_> {
        let Some(node) = self.get(id) else {
            return NodeKind::Ordinary;
        };
        match &node.data {
            NodeData::ShadowRoot(root) => NodeKind::ShadowRoot { host: root.host },
            NodeData::Element(element) => {
                if let Some(root) = element.shadow.current() {
                    NodeKind::Host { root }
                } else if element.name == self.names.content {
                    NodeKind::Content {
                        select: element.get_attr(self.names.select),
                    }
                } else if element.name == self.names.shadow {
                    NodeKind::Shadow
                } else {
                    NodeKind::Ordinary
                }
            }
            NodeData::Document | NodeData::Text(_) | NodeData::Comment(_) => NodeKind::Ordinary,
        }
    }

    pub fn is_insertion_point(&self, id: NodeId) -> bool {
        self.kind(id).is_insertion_point()
    }

    /// An insertion point not nested inside another insertion point of the
    /// same tree scope. Nested ones are inert fallback content.
    pub fn is_active_insertion_point(&self, id: NodeId) -> bool {
        self.is_insertion_point(id)
            && !self
                .ancestors(id)
                .take_while(|&a| !matches!(self.kind(a), NodeKind::ShadowRoot { .. }))
                .any(|a| self.is_insertion_point(a))
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Child iterator yielding `(id, node)` pairs
#[derive(Debug, Clone)]
pub struct Children<'a> {
    tree: &'a DomTree,
    next: Option<NodeId>,
}

impl<'a> Iterator for Children<'a> {
    type Item = (NodeId, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let node = self.tree.get(id)?;
        self.next = node.next_sibling.to_option();
        Some((id, node))
    }
}

/// Ancestor iterator, nearest first
#[derive(Debug, Clone)]
pub struct Ancestors<'a> {
    tree: &'a DomTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.tree.parent(id);
        Some(id)
    }
}
