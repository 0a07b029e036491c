//! Renderer Configuration

/// Renderer configuration options
#[derive(Debug, Clone)]
pub struct Config {
    /// Ask the host for a frame callback when work is queued; when disabled
    /// (or when frames are unavailable) a generic deferred callback is used.
    pub prefer_animation_frame: bool,

    /// Force a nested host to re-render when its light children contain an
    /// insertion point of the enclosing tree (re-projected content).
    pub rerender_reprojecting_hosts: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prefer_animation_frame: true,
            rerender_reprojecting_hosts: true,
        }
    }
}
