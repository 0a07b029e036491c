//! fOS Shadow - Composition & Incremental Rendering
//!
//! Computes the composed tree of shadow hosts (which logical nodes land at
//! which insertion point, across every shadow root of a host) and updates a
//! live tree to match it with minimal splices.
//!
//! Mutations invalidate the engine of the affected host; dirty hosts are
//! queued and rendered together when the embedder flushes.

mod composer;
mod config;
pub mod diff;
mod distributor;
mod document;
mod engine;
mod error;
mod live;
mod render;
mod renderer;
mod scheduler;
mod selector;

pub use composer::Composer;
pub use config::Config;
pub use diff::{calculate_splices, merge_splice, Splice};
pub use distributor::{Distributions, Distributor, Pool};
pub use document::ComposedDocument;
pub use engine::{AttributeSet, RenderEngine};
pub use error::{ShadowError, ShadowResult};
pub use live::{LiveTree, LiveTreeStats, MemoryLiveTree};
pub use render::{RenderIndex, RenderNode, RenderTree};
pub use renderer::ShadowRenderer;
pub use scheduler::{FrameScheduler, ManualFrames, Scheduler};
pub use selector::{Selector, SelectorCache, SimpleSelector};

pub use fos_dom::{DomTree, NodeId};
