//! Decoded raster frames and display annotation.
//!
//! `Frame` is the unit handed from a source to the detector: an RGB8 pixel
//! buffer with width/height metadata. `AnnotatedFrame` couples a rendered
//! copy (bounding boxes drawn in) with the batch that produced it, which is
//! what display sinks receive.

use anyhow::{anyhow, Result};

use crate::detect::DetectionBatch;

/// RGB color used for bounding-box outlines.
const BOX_COLOR: [u8; 3] = [232, 72, 36];
/// Outline thickness in pixels.
const BOX_THICKNESS: u32 = 2;

/// One decoded RGB8 frame.
#[derive(Clone, Debug)]
pub struct Frame {
    /// Interleaved RGB bytes, row-major, `width * height * 3` long.
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
        if data.len() != expected {
            return Err(anyhow!(
                "frame buffer is {} bytes, expected {} for {}x{} RGB8",
                data.len(),
                expected,
                width,
                height
            ));
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Render this frame with the batch's bounding boxes drawn in.
    pub fn annotate(self, batch: DetectionBatch) -> AnnotatedFrame {
        let mut frame = self;
        for detection in &batch.detections {
            let bounds = &detection.bounds;
            let x = scale(bounds.x, frame.width);
            let y = scale(bounds.y, frame.height);
            let w = scale(bounds.w, frame.width).max(1);
            let h = scale(bounds.h, frame.height).max(1);
            frame.draw_rect(x, y, w, h);
        }
        AnnotatedFrame { frame, batch }
    }

    /// Draw a rectangle outline, clamped to the frame.
    fn draw_rect(&mut self, x: u32, y: u32, w: u32, h: u32) {
        let x1 = x.min(self.width.saturating_sub(1));
        let y1 = y.min(self.height.saturating_sub(1));
        let x2 = x.saturating_add(w).min(self.width.saturating_sub(1));
        let y2 = y.saturating_add(h).min(self.height.saturating_sub(1));

        for t in 0..BOX_THICKNESS {
            for px in x1..=x2 {
                self.put_pixel(px, y1.saturating_add(t).min(y2));
                self.put_pixel(px, y2.saturating_sub(t).max(y1));
            }
            for py in y1..=y2 {
                self.put_pixel(x1.saturating_add(t).min(x2), py);
                self.put_pixel(x2.saturating_sub(t).max(x1), py);
            }
        }
    }

    fn put_pixel(&mut self, x: u32, y: u32) {
        let idx = ((y * self.width + x) * 3) as usize;
        if idx + 2 < self.data.len() {
            self.data[idx..idx + 3].copy_from_slice(&BOX_COLOR);
        }
    }
}

fn scale(normalized: f32, extent: u32) -> u32 {
    (normalized.clamp(0.0, 1.0) * extent as f32) as u32
}

/// A rendered frame together with the detections drawn onto it.
#[derive(Clone, Debug)]
pub struct AnnotatedFrame {
    pub frame: Frame,
    pub batch: DetectionBatch,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{BoundingBox, Detection};

    fn black_frame(width: u32, height: u32) -> Frame {
        Frame::new(vec![0u8; (width * height * 3) as usize], width, height).unwrap()
    }

    fn detection(x: f32, y: f32, w: f32, h: f32) -> Detection {
        Detection {
            label: "dog".to_string(),
            confidence: 0.9,
            bounds: BoundingBox { x, y, w, h },
        }
    }

    #[test]
    fn rejects_mismatched_buffer() {
        assert!(Frame::new(vec![0u8; 10], 4, 4).is_err());
    }

    #[test]
    fn annotation_preserves_dimensions() {
        let frame = black_frame(16, 16);
        let annotated =
            frame.annotate(DetectionBatch::new(vec![detection(0.25, 0.25, 0.5, 0.5)]));
        assert_eq!(annotated.frame.width, 16);
        assert_eq!(annotated.frame.height, 16);
        assert_eq!(annotated.frame.data.len(), 16 * 16 * 3);
    }

    #[test]
    fn annotation_colors_the_outline() {
        let frame = black_frame(16, 16);
        let annotated =
            frame.annotate(DetectionBatch::new(vec![detection(0.25, 0.25, 0.5, 0.5)]));
        let painted = annotated
            .frame
            .data
            .chunks_exact(3)
            .filter(|px| px == &BOX_COLOR)
            .count();
        assert!(painted > 0, "outline pixels should be painted");
    }

    #[test]
    fn out_of_range_bounds_are_clamped() {
        let frame = black_frame(8, 8);
        // Must not panic or write out of bounds.
        let annotated = frame.annotate(DetectionBatch::new(vec![detection(0.9, 0.9, 4.0, 4.0)]));
        assert_eq!(annotated.frame.data.len(), 8 * 8 * 3);
    }

    #[test]
    fn empty_batch_leaves_pixels_untouched() {
        let frame = black_frame(8, 8);
        let annotated = frame.annotate(DetectionBatch::default());
        assert!(annotated.frame.data.iter().all(|byte| *byte == 0));
    }
}
