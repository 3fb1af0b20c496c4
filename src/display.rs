//! Display sinks for annotated frames.
//!
//! The presentation shell is whatever sits on the other side of
//! `DisplaySink`; the session just hands over each annotated frame. Speech
//! is a side effect of the session, never part of this interface.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

use crate::frame::AnnotatedFrame;

/// Receives each annotated frame the session produces.
pub trait DisplaySink: Send {
    fn present(&mut self, annotated: &AnnotatedFrame) -> Result<()>;
}

/// Discards frames. Used when no display output is wanted.
pub struct NullDisplay;

impl DisplaySink for NullDisplay {
    fn present(&mut self, _annotated: &AnnotatedFrame) -> Result<()> {
        Ok(())
    }
}

/// Logs per-frame detection summaries instead of rendering pixels.
pub struct LogDisplay {
    frames: u64,
}

impl LogDisplay {
    pub fn new() -> Self {
        Self { frames: 0 }
    }
}

impl Default for LogDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplaySink for LogDisplay {
    fn present(&mut self, annotated: &AnnotatedFrame) -> Result<()> {
        self.frames += 1;
        if annotated.batch.is_empty() {
            log::debug!("frame #{}: no detections", self.frames);
        } else {
            let labels: Vec<&str> = annotated
                .batch
                .detections
                .iter()
                .map(|d| d.label.as_str())
                .collect();
            log::debug!(
                "frame #{}: {} detection(s): {}",
                self.frames,
                annotated.batch.len(),
                labels.join(", ")
            );
        }
        Ok(())
    }
}

/// Saves the most recent annotated frame as a PNG.
///
/// For single-shot runs this is the "show the result" output; for
/// continuous runs it keeps overwriting the same path with the latest frame.
pub struct ImageFileDisplay {
    path: PathBuf,
}

impl ImageFileDisplay {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl DisplaySink for ImageFileDisplay {
    fn present(&mut self, annotated: &AnnotatedFrame) -> Result<()> {
        let frame = &annotated.frame;
        let buffer = image::RgbImage::from_raw(frame.width, frame.height, frame.data.clone())
            .ok_or_else(|| anyhow!("annotated frame buffer does not match its dimensions"))?;
        buffer
            .save(&self.path)
            .with_context(|| format!("failed to save annotated frame to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::DetectionBatch;
    use crate::frame::Frame;

    fn annotated() -> AnnotatedFrame {
        let frame = Frame::new(vec![0u8; 4 * 4 * 3], 4, 4).unwrap();
        frame.annotate(DetectionBatch::default())
    }

    #[test]
    fn null_display_accepts_frames() {
        assert!(NullDisplay.present(&annotated()).is_ok());
    }

    #[test]
    fn image_file_display_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("annotated.png");
        let mut display = ImageFileDisplay::new(path.clone());

        display.present(&annotated()).unwrap();
        assert!(path.is_file());
    }
}
