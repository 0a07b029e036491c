//! Shadow DOM
//!
//! Successive `attach_shadow` calls on one host form a persistent stack of
//! shadow roots. The stack is an immutable cons list with structural sharing:
//! attaching pushes a new head and never touches older links, so a walk over
//! a cloned chain is unaffected by attachments made during the walk.

use crate::NodeId;
use std::sync::Arc;

#[derive(Debug)]
struct ShadowLink {
    root: NodeId,
    older: ShadowChain,
}

/// Shadow roots of one host, newest (current) first
#[derive(Debug, Clone, Default)]
pub struct ShadowChain(Option<Arc<ShadowLink>>);

impl ShadowChain {
    /// A host with no shadow roots
    pub fn empty() -> Self {
        Self(None)
    }

    /// New chain with `root` as the current root
    pub fn push(&self, root: NodeId) -> Self {
        Self(Some(Arc::new(ShadowLink {
            root,
            older: self.clone(),
        })))
    }

    /// Current (youngest) shadow root
    pub fn current(&self) -> Option<NodeId> {
        self.0.as_ref().map(|link| link.root)
    }

    /// Chain without its current root
    pub fn older(&self) -> ShadowChain {
        self.0.as_ref().map(|link| link.older.clone()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    /// Iterate roots newest first
    pub fn iter(&self) -> ShadowRoots {
        ShadowRoots { next: self.clone() }
    }
}

/// Iterator over a [`ShadowChain`]
#[derive(Debug, Clone)]
pub struct ShadowRoots {
    next: ShadowChain,
}

impl Iterator for ShadowRoots {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let root = self.next.current()?;
        self.next = self.next.older();
        Some(root)
    }
}
