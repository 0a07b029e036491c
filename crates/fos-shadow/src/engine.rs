//! Render engine state
//!
//! One engine per host. The engine itself only tracks dirtiness and the
//! attribute names its `select` predicates read; the passes that use this
//! state live in [`crate::ShadowRenderer`].
//!
//! Lifecycle: clean → (invalidate) → dirty/queued → (flush) → rendering →
//! (sync succeeded) → clean. A failed sync leaves the engine dirty.

use fos_dom::NodeId;
use std::collections::HashSet;

/// Attribute names whose mutation on a host child can change distribution
#[derive(Debug, Clone, Default)]
pub struct AttributeSet {
    names: HashSet<String>,
}

impl AttributeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str) {
        self.names.insert(name.to_ascii_lowercase());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&name.to_ascii_lowercase())
    }

    pub fn clear(&mut self) {
        self.names.clear();
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// Per-host render state
#[derive(Debug)]
pub struct RenderEngine {
    host: NodeId,
    dirty: bool,
    attributes: AttributeSet,
}

impl RenderEngine {
    /// Engines start dirty: nothing has been rendered for the host yet
    pub fn new(host: NodeId) -> Self {
        Self {
            host,
            dirty: true,
            attributes: AttributeSet::new(),
        }
    }

    pub fn host(&self) -> NodeId {
        self.host
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Attribute dependencies collected by the last composition
    pub fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }

    pub fn depends_on_attribute(&self, name: &str) -> bool {
        self.attributes.contains(name)
    }

    /// Mark dirty, returning true if the engine was clean
    pub(crate) fn mark_dirty(&mut self) -> bool {
        !std::mem::replace(&mut self.dirty, true)
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub(crate) fn attributes_mut(&mut self) -> &mut AttributeSet {
        &mut self.attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirty_transitions() {
        let mut engine = RenderEngine::new(NodeId::ROOT);
        assert!(engine.is_dirty());
        assert!(!engine.mark_dirty());

        engine.mark_clean();
        assert!(engine.mark_dirty());
        assert!(!engine.mark_dirty());
    }

    #[test]
    fn test_attribute_set_is_case_insensitive() {
        let mut set = AttributeSet::new();
        set.insert("Data-X");
        set.insert("class");
        assert!(set.contains("data-x"));
        assert!(set.contains("CLASS"));
        assert_eq!(set.len(), 2);
    }
}
