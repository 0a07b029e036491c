//! DOM Node - arena entry
//!
//! Uses NodeId links (4 bytes) instead of pointers; `NodeId::NONE` marks a
//! missing parent, child or sibling.

use crate::{InternedString, NodeId, ShadowChain};

/// DOM Node - Core structure
#[derive(Debug)]
pub struct Node {
    /// Parent node (NONE if detached or a shadow root)
    pub parent: NodeId,
    /// First child
    pub first_child: NodeId,
    /// Last child (for O(1) append)
    pub last_child: NodeId,
    /// Previous sibling
    pub prev_sibling: NodeId,
    /// Next sibling
    pub next_sibling: NodeId,
    /// Node-specific data
    pub data: NodeData,
}

impl Node {
    fn with_data(data: NodeData) -> Self {
        Self {
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
            data,
        }
    }

    /// Create a new element node
    pub fn element(name: InternedString) -> Self {
        Self::with_data(NodeData::Element(ElementData::new(name)))
    }

    /// Create a new text node
    pub fn text(content: String) -> Self {
        Self::with_data(NodeData::Text(TextData { content }))
    }

    /// Create a comment node
    pub fn comment(content: String) -> Self {
        Self::with_data(NodeData::Comment(content))
    }

    /// Create a document node
    pub fn document() -> Self {
        Self::with_data(NodeData::Document)
    }

    /// Create a shadow root node for `host`
    pub fn shadow_root(host: NodeId, older: Option<NodeId>) -> Self {
        Self::with_data(NodeData::ShadowRoot(ShadowRootData { host, older }))
    }

    /// Check if this is an element
    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    /// Check if this is text
    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self.data, NodeData::Text(_))
    }

    /// Get element data if this is an element
    #[inline]
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get mutable element data
    #[inline]
    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get text content if this is a text node
    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(t) => Some(&t.content),
            _ => None,
        }
    }

    /// Get shadow root data if this is a shadow root
    #[inline]
    pub fn as_shadow_root(&self) -> Option<&ShadowRootData> {
        match &self.data {
            NodeData::ShadowRoot(root) => Some(root),
            _ => None,
        }
    }
}

/// Node-specific data
#[derive(Debug)]
pub enum NodeData {
    /// Document root
    Document,
    /// Element
    Element(ElementData),
    /// Text content
    Text(TextData),
    /// Comment
    Comment(String),
    /// Shadow root (never a child of another node)
    ShadowRoot(ShadowRootData),
}

/// Element-specific data
#[derive(Debug)]
pub struct ElementData {
    /// Local tag name (lowercase)
    pub name: InternedString,
    /// Attributes in insertion order
    pub attrs: Vec<Attribute>,
    /// Cached id attribute
    pub id: Option<String>,
    /// Cached class list
    pub classes: Vec<String>,
    /// Shadow roots attached to this element, newest first
    pub shadow: ShadowChain,
}

impl ElementData {
    pub fn new(name: InternedString) -> Self {
        Self {
            name,
            attrs: Vec::new(),
            id: None,
            classes: Vec::new(),
            shadow: ShadowChain::empty(),
        }
    }

    /// Get an attribute value
    pub fn get_attr(&self, name: InternedString) -> Option<&str> {
        self.attrs.iter().find(|a| a.name == name).map(|a| a.value.as_str())
    }

    /// Set an attribute. `is_id`/`is_class` keep the caches in sync.
    pub(crate) fn set_attr(&mut self, name: InternedString, value: String, is_id: bool, is_class: bool) {
        if is_id {
            self.id = Some(value.clone());
        }
        if is_class {
            self.classes = value.split_ascii_whitespace().map(str::to_string).collect();
        }
        match self.attrs.iter_mut().find(|a| a.name == name) {
            Some(attr) => attr.value = value,
            None => self.attrs.push(Attribute { name, value }),
        }
    }

    /// Remove an attribute, returning whether it was present
    pub(crate) fn remove_attr(&mut self, name: InternedString, is_id: bool, is_class: bool) -> bool {
        let before = self.attrs.len();
        self.attrs.retain(|a| a.name != name);
        if is_id {
            self.id = None;
        }
        if is_class {
            self.classes.clear();
        }
        self.attrs.len() != before
    }

    /// Check the cached class list
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

/// Text node data
#[derive(Debug)]
pub struct TextData {
    pub content: String,
}

/// Shadow root data
#[derive(Debug, Clone, Copy)]
pub struct ShadowRootData {
    /// Element the root is attached to
    pub host: NodeId,
    /// Root that was current before this one was attached
    pub older: Option<NodeId>,
}

/// Attribute
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: InternedString,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_cache() {
        let mut data = ElementData::new(InternedString(1));
        data.set_attr(InternedString(5), "a  b".to_string(), false, true);
        assert!(data.has_class("a"));
        assert!(data.has_class("b"));
        assert!(!data.has_class("a  b"));

        assert!(data.remove_attr(InternedString(5), false, true));
        assert!(!data.has_class("a"));
        assert!(!data.remove_attr(InternedString(5), false, true));
    }

    #[test]
    fn test_shadow_root_node() {
        let node = Node::shadow_root(NodeId(3), None);
        assert!(!node.is_element());
        assert_eq!(node.as_shadow_root().map(|r| r.host), Some(NodeId(3)));
    }
}
