#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::{BoundingBox, Detection, DetectionBatch};

const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.25;
const IOU_THRESHOLD: f32 = 0.45;

type RunnableOnnxModel = SimplePlan<TypedFact, Box<dyn TypedOp>, TypedModel>;

/// Tract-based backend for ONNX object detection.
///
/// Loads a local model file and runs inference on RGB frames. Expects the
/// single-output row layout `[cx, cy, w, h, objectness, class scores...]`
/// with coordinates in model-input pixels. The label vocabulary comes from
/// a JSON array file supplied next to the model.
pub struct TractBackend {
    model: RunnableOnnxModel,
    labels: Vec<String>,
    width: u32,
    height: u32,
    confidence_threshold: f32,
}

impl TractBackend {
    /// Load an ONNX model and its label vocabulary from disk.
    pub fn new<P: AsRef<Path>, L: AsRef<Path>>(
        model_path: P,
        labels_path: L,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let model_path = model_path.as_ref();
        let labels_path = labels_path.as_ref();

        let raw = std::fs::read_to_string(labels_path)
            .with_context(|| format!("failed to read labels file {}", labels_path.display()))?;
        let labels: Vec<String> = serde_json::from_str(&raw)
            .with_context(|| format!("invalid labels file {}", labels_path.display()))?;
        if labels.is_empty() {
            return Err(anyhow!("labels file {} is empty", labels_path.display()));
        }

        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(1, 3, height as usize, width as usize),
                ),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self {
            model,
            labels,
            width,
            height,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        })
    }

    /// Override the default confidence threshold.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    fn build_input(&self, pixels: &[u8], width: u32, height: u32) -> Result<Tensor> {
        if width != self.width || height != self.height {
            return Err(anyhow!(
                "frame size {}x{} does not match model input {}x{}",
                width,
                height,
                self.width,
                self.height
            ));
        }

        let expected_len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;

        if pixels.len() != expected_len {
            return Err(anyhow!(
                "expected {} RGB bytes, received {}",
                expected_len,
                pixels.len()
            ));
        }

        let width = width as usize;
        let input = tract_ndarray::Array4::from_shape_fn(
            (1, 3, height as usize, width),
            |(_, channel, y, x)| {
                let idx = (y * width + x) * 3 + channel;
                pixels[idx] as f32 / 255.0
            },
        );

        Ok(input.into_tensor())
    }

    fn decode_output(&self, outputs: TVec<TValue>) -> Result<Vec<Detection>> {
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let view = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?;

        let shape = view.shape();
        let row_len = *shape
            .last()
            .ok_or_else(|| anyhow!("model output has no dimensions"))?;
        if row_len < 6 {
            return Err(anyhow!(
                "model output rows too short ({} values, need at least 6)",
                row_len
            ));
        }
        let class_count = row_len - 5;

        let flat: Vec<f32> = view.iter().cloned().collect();
        let mut detections = Vec::new();

        for row in flat.chunks_exact(row_len) {
            let objectness = row[4];
            let (class_idx, class_score) = row[5..]
                .iter()
                .enumerate()
                .fold((0usize, f32::NEG_INFINITY), |best, (idx, score)| {
                    if *score > best.1 {
                        (idx, *score)
                    } else {
                        best
                    }
                });
            let confidence = objectness * class_score;
            if !confidence.is_finite() || confidence < self.confidence_threshold {
                continue;
            }
            if class_idx >= class_count || class_idx >= self.labels.len() {
                continue;
            }

            let (cx, cy, w, h) = (row[0], row[1], row[2], row[3]);
            let bounds = BoundingBox {
                x: ((cx - w / 2.0) / self.width as f32).clamp(0.0, 1.0),
                y: ((cy - h / 2.0) / self.height as f32).clamp(0.0, 1.0),
                w: (w / self.width as f32).clamp(0.0, 1.0),
                h: (h / self.height as f32).clamp(0.0, 1.0),
            };

            detections.push(Detection {
                label: self.labels[class_idx].clone(),
                confidence,
                bounds,
            });
        }

        Ok(non_max_suppress(detections))
    }
}

impl DetectorBackend for TractBackend {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<DetectionBatch> {
        let input = self.build_input(pixels, width, height)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        let detections = self.decode_output(outputs)?;
        Ok(DetectionBatch::new(detections))
    }
}

/// Greedy per-class non-maximum suppression.
///
/// Without this, one object yields a stack of near-identical boxes and
/// inflates its occurrence count.
fn non_max_suppress(mut detections: Vec<Detection>) -> Vec<Detection> {
    detections.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut kept: Vec<Detection> = Vec::new();
    for candidate in detections {
        let overlaps = kept.iter().any(|existing| {
            existing.label == candidate.label
                && iou(&existing.bounds, &candidate.bounds) > IOU_THRESHOLD
        });
        if !overlaps {
            kept.push(candidate);
        }
    }
    kept
}

fn iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let x1 = a.x.max(b.x);
    let y1 = a.y.max(b.y);
    let x2 = (a.x + a.w).min(b.x + b.w);
    let y2 = (a.y + a.h).min(b.y + b.h);

    let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let union = a.w * a.h + b.w * b.h - intersection;
    if union <= 0.0 {
        0.0
    } else {
        intersection / union
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed(label: &str, confidence: f32, x: f32, y: f32) -> Detection {
        Detection {
            label: label.to_string(),
            confidence,
            bounds: BoundingBox {
                x,
                y,
                w: 0.2,
                h: 0.2,
            },
        }
    }

    #[test]
    fn nms_drops_overlapping_duplicates_of_the_same_class() {
        let kept = non_max_suppress(vec![
            boxed("dog", 0.9, 0.10, 0.10),
            boxed("dog", 0.6, 0.11, 0.10),
            boxed("dog", 0.8, 0.70, 0.70),
        ]);
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|d| d.label == "dog"));
    }

    #[test]
    fn nms_keeps_overlapping_boxes_of_different_classes() {
        let kept = non_max_suppress(vec![
            boxed("dog", 0.9, 0.10, 0.10),
            boxed("cat", 0.8, 0.11, 0.10),
        ]);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn iou_of_disjoint_boxes_is_zero() {
        let a = BoundingBox {
            x: 0.0,
            y: 0.0,
            w: 0.1,
            h: 0.1,
        };
        let b = BoundingBox {
            x: 0.5,
            y: 0.5,
            w: 0.1,
            h: 0.1,
        };
        assert_eq!(iou(&a, &b), 0.0);
    }
}
