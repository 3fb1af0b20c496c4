//! Frame sources.
//!
//! A session is driven by exactly one source:
//! - `ImageSource`: a single still image, yielded once (single-shot mode)
//! - `CameraSource`: a live camera feed (continuous mode); real capture via
//!   V4L2 behind the `camera-v4l2` feature, synthetic `stub://` fallback
//!
//! Sources signal end-of-stream by returning `Ok(None)` from `next_frame`;
//! errors are reserved for device and acquisition failures, which are fatal
//! to the session. Sources pace themselves to their target frame rate, so
//! the session loop does not sleep.

mod camera;
mod image;

pub use camera::{CameraConfig, CameraSource, CameraStats};
pub use image::{ImageConfig, ImageSource};

use anyhow::Result;

use crate::frame::Frame;

/// A sequence of frames driving one session.
pub trait FrameSource: Send {
    /// Acquire the underlying resource (open the device, decode the file).
    fn connect(&mut self) -> Result<()>;

    /// Produce the next frame, or `Ok(None)` once the stream is exhausted.
    fn next_frame(&mut self) -> Result<Option<Frame>>;

    /// False once the source has seen an unrecovered capture error.
    fn is_healthy(&self) -> bool;

    /// Frame statistics for health logging.
    fn stats(&self) -> SourceStats;
}

/// Statistics common to all sources.
#[derive(Clone, Debug)]
pub struct SourceStats {
    pub frames_captured: u64,
    /// Human-readable origin (file path or device node).
    pub origin: String,
}
