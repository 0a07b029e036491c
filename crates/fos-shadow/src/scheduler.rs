//! Render scheduling
//!
//! Dirty hosts are queued and rendered together at the next frame boundary.
//! The queue arms a single one-shot callback per batch; the embedder calls
//! [`crate::ShadowRenderer::flush`] when it fires.

use fos_dom::NodeId;
use std::cell::Cell;
use std::rc::Rc;

/// One-shot callbacks provided by the embedder
pub trait FrameScheduler {
    /// Request a callback before the next frame. Returns false when frame
    /// callbacks are unavailable.
    fn request_frame(&self) -> bool;

    /// Request a generic deferred callback
    fn defer(&self);
}

/// Frame scheduler that only records requests. The embedder (or a test)
/// decides when to flush.
#[derive(Debug, Default)]
pub struct ManualFrames {
    frames: Cell<usize>,
    deferred: Cell<usize>,
    no_frames: bool,
}

impl ManualFrames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scheduler whose frame requests always fail
    pub fn without_frames() -> Self {
        Self {
            no_frames: true,
            ..Self::default()
        }
    }

    /// Successful frame requests so far
    pub fn frame_requests(&self) -> usize {
        self.frames.get()
    }

    pub fn deferred_requests(&self) -> usize {
        self.deferred.get()
    }

    /// Callbacks armed by either route
    pub fn requests(&self) -> usize {
        self.frames.get() + self.deferred.get()
    }
}

impl FrameScheduler for ManualFrames {
    fn request_frame(&self) -> bool {
        if self.no_frames {
            return false;
        }
        self.frames.set(self.frames.get() + 1);
        true
    }

    fn defer(&self) {
        self.deferred.set(self.deferred.get() + 1);
    }
}

/// Queue of hosts waiting to be rendered
pub struct Scheduler {
    pending: Vec<NodeId>,
    armed: bool,
    frames: Rc<dyn FrameScheduler>,
    prefer_animation_frame: bool,
}

impl Scheduler {
    pub fn new(frames: Rc<dyn FrameScheduler>, prefer_animation_frame: bool) -> Self {
        Self {
            pending: Vec::new(),
            armed: false,
            frames,
            prefer_animation_frame,
        }
    }

    /// Queue a host, arming a callback if none is pending
    pub fn enqueue(&mut self, host: NodeId) {
        if !self.pending.contains(&host) {
            self.pending.push(host);
        }
        if !self.armed {
            self.arm();
        }
    }

    fn arm(&mut self) {
        self.armed = true;
        let framed = self.prefer_animation_frame && self.frames.request_frame();
        if !framed {
            self.frames.defer();
        }
        tracing::trace!(framed, "armed render callback");
    }

    /// Take the queued hosts in FIFO order and disarm
    pub fn take_pending(&mut self) -> Vec<NodeId> {
        self.armed = false;
        std::mem::take(&mut self.pending)
    }

    pub fn remove(&mut self, host: NodeId) {
        self.pending.retain(|&h| h != host);
    }

    pub fn pending(&self) -> &[NodeId] {
        &self.pending
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.pending)
            .field("armed", &self.armed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arms_once_per_batch() {
        let frames = Rc::new(ManualFrames::new());
        let mut scheduler = Scheduler::new(frames.clone(), true);
        scheduler.enqueue(NodeId::ROOT);
        scheduler.enqueue(NodeId::ROOT);
        assert_eq!(scheduler.pending(), &[NodeId::ROOT]);
        assert_eq!(frames.frame_requests(), 1);

        assert_eq!(scheduler.take_pending(), vec![NodeId::ROOT]);
        assert!(!scheduler.is_armed());
        scheduler.enqueue(NodeId::ROOT);
        assert_eq!(frames.frame_requests(), 2);
    }

    #[test]
    fn test_falls_back_to_defer() {
        let frames = Rc::new(ManualFrames::without_frames());
        let mut scheduler = Scheduler::new(frames.clone(), true);
        scheduler.enqueue(NodeId::ROOT);
        assert_eq!(frames.frame_requests(), 0);
        assert_eq!(frames.deferred_requests(), 1);

        let frames = Rc::new(ManualFrames::new());
        let mut scheduler = Scheduler::new(frames.clone(), false);
        scheduler.enqueue(NodeId::ROOT);
        assert_eq!(frames.frame_requests(), 0);
        assert_eq!(frames.deferred_requests(), 1);
    }
}
