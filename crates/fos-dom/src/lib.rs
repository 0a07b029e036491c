//! fOS DOM - Logical Document Object Model
//!
//! Arena-based tree of the author-written document, including shadow roots
//! and insertion points. The composed (rendered) tree is produced from this
//! one by `fos-shadow`.

mod interner;
mod kind;
mod node;
mod operations;
mod shadow;
mod tree;

pub use interner::{InternedString, StringInterner};
pub use kind::NodeKind;
pub use node::{Attribute, ElementData, Node, NodeData, ShadowRootData, TextData};
pub use operations::{DomError, DomResult};
pub use shadow::{ShadowChain, ShadowRoots};
pub use tree::{Ancestors, Children, DomTree};

/// Node identifier (index into the tree arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Document node ID
    pub const ROOT: NodeId = NodeId(0);
    /// Sentinel for a missing link
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Check whether this ID points at a node
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    /// Arena index
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Convert a link into an `Option`
    #[inline]
    pub fn to_option(self) -> Option<NodeId> {
        self.is_valid().then_some(self)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_valid() {
            write!(f, "#{}", self.0)
        } else {
            f.write_str("#none")
        }
    }
}
