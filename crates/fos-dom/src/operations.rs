//! DOM Node Operations - error surface
//!
//! appendChild, insertBefore and removeChild report failures through
//! [`DomError`]. The same type is used by live-tree implementations.

use crate::NodeId;

/// Result type for DOM operations
pub type DomResult<T> = Result<T, DomError>;

/// DOM operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// Node not found
    #[error("Node {0} not found")]
    NotFound(NodeId),
    /// Hierarchy error (e.g., inserting an ancestor into its descendant)
    #[error("Hierarchy request error: cannot insert {child} into {parent}")]
    HierarchyRequest { parent: NodeId, child: NodeId },
    /// Node is not a child of the given parent
    #[error("Node {child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },
    /// Operation not valid for this kind of node
    #[error("Invalid node type for {0}")]
    InvalidNodeType(NodeId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = DomError::NotAChild { parent: NodeId(1), child: NodeId(7) };
        assert_eq!(err.to_string(), "Node #7 is not a child of #1");
        assert_eq!(DomError::NotFound(NodeId::NONE).to_string(), "Node #none not found");
    }
}
