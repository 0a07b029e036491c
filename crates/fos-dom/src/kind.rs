//! Node kinds seen by composition
//!
//! Every node falls in exactly one of these classes. Composition and
//! distribution match on the enum exhaustively instead of testing tag names.

use crate::NodeId;

/// Classification of a logical node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind<'a> {
    /// Element with at least one shadow root; `root` is the current one
    Host { root: NodeId },
    /// `<content>` insertion point with its optional `select` predicate
    Content { select: Option<&'a str> },
    /// `<shadow>` insertion point
    Shadow,
    /// Shadow root attached to `host`
    ShadowRoot { host: NodeId },
    /// Anything else (elements, text, comments, the document)
    Ordinary,
}

impl NodeKind<'_> {
    /// Content or shadow insertion point
    #[inline]
    pub fn is_insertion_point(&self) -> bool {
        matches!(self, Self::Content { .. } | Self::Shadow)
    }

    #[inline]
    pub fn is_host(&self) -> bool {
        matches!(self, Self::Host { .. })
    }
}
