//! Renderer errors

use fos_dom::{DomError, NodeId};

/// Result type for composition and rendering
pub type ShadowResult<T> = Result<T, ShadowError>;

/// Errors surfaced by the renderer.
///
/// Malformed `select` predicates are not errors: they never match.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShadowError {
    /// Logical or live tree mutation failed
    #[error(transparent)]
    Dom(#[from] DomError),

    /// Node has no shadow root
    #[error("Node {0} is not a shadow host")]
    NotAHost(NodeId),
}
