//! Still-image frame source.
//!
//! `ImageSource` decodes one local image file and yields it exactly once,
//! then reports end-of-stream. This is the single-shot session mode: with a
//! fresh announcement state, the cooldown logic degenerates to "announce if
//! anything was detected".
//!
//! A `stub://` path produces a synthetic frame for tests.

use anyhow::{anyhow, Context, Result};

use super::{FrameSource, SourceStats};
use crate::frame::Frame;

/// Configuration for a still-image source.
#[derive(Clone, Debug, Default)]
pub struct ImageConfig {
    /// Local image path (PNG or JPEG), or `stub://` for a synthetic frame.
    pub path: String,
}

/// Still-image frame source.
pub struct ImageSource {
    config: ImageConfig,
    pending: Option<Frame>,
    yielded: u64,
}

impl ImageSource {
    pub fn new(config: ImageConfig) -> Result<Self> {
        if config.path.trim().is_empty() {
            return Err(anyhow!("image source requires a file path"));
        }
        if config.path.contains("://") && !config.path.starts_with("stub://") {
            return Err(anyhow!("image source only supports local paths"));
        }
        Ok(Self {
            config,
            pending: None,
            yielded: 0,
        })
    }
}

impl FrameSource for ImageSource {
    fn connect(&mut self) -> Result<()> {
        let frame = if self.config.path.starts_with("stub://") {
            synthetic_frame()
        } else {
            decode_file(&self.config.path)?
        };
        log::info!(
            "ImageSource: decoded {} ({}x{})",
            self.config.path,
            frame.width,
            frame.height
        );
        self.pending = Some(frame);
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let frame = self.pending.take();
        if frame.is_some() {
            self.yielded += 1;
        }
        Ok(frame)
    }

    fn is_healthy(&self) -> bool {
        true
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.yielded,
            origin: self.config.path.clone(),
        }
    }
}

fn decode_file(path: &str) -> Result<Frame> {
    let decoded = image::open(path)
        .with_context(|| format!("failed to decode image {}", path))?
        .to_rgb8();
    let (width, height) = decoded.dimensions();
    Frame::new(decoded.into_raw(), width, height)
}

fn synthetic_frame() -> Frame {
    let (width, height) = (64u32, 48u32);
    let mut data = vec![0u8; (width * height * 3) as usize];
    for (i, byte) in data.iter_mut().enumerate() {
        *byte = (i % 256) as u8;
    }
    Frame {
        data,
        width,
        height,
    }
}
