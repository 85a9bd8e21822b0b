use anyhow::Result;

use crate::frame::Frame;

/// Configuration for a frame source.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceConfig {
    /// `stub://<name>` for the synthetic scene, otherwise a local directory of images.
    pub uri: String,
    /// Frame width for synthetic frames.
    pub width: u32,
    /// Frame height for synthetic frames.
    pub height: u32,
    /// Capture rate the session paces itself to.
    pub target_fps: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            uri: "stub://camera".to_string(),
            width: 640,
            height: 480,
            target_fps: 15,
        }
    }
}

/// Statistics for a frame source.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceStats {
    pub frames_captured: u64,
    pub capture_errors: u64,
    pub uri: String,
}

/// Producer of camera frames.
///
/// Frames carry increasing sequence numbers starting at 1.
pub trait FrameSource: Send {
    fn name(&self) -> &'static str;

    /// Open the device. Called on every session start, so it must be repeatable.
    fn connect(&mut self) -> Result<()>;

    /// Capture the next frame.
    fn next_frame(&mut self) -> Result<Frame>;

    fn is_healthy(&self) -> bool {
        true
    }

    fn stats(&self) -> SourceStats;
}

/// Receiver of captured frames, invoked on the capture thread.
pub trait FrameSink: Send {
    fn on_frame(&mut self, frame: Frame);
}
