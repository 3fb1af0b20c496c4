use anyhow::Result;
use sha2::{Digest, Sha256};

use crate::detect::backend::DetectorBackend;
use crate::detect::result::{BoundingBox, Detection, DetectionBatch};

/// Labels the stub can emit, in vocabulary order.
const STUB_LABELS: [&str; 4] = ["cat", "chair", "dog", "person"];

/// Stub backend for testing and `stub://` sources.
///
/// Derives detections from a pixel checksum, so identical frames always
/// yield identical batches and synthetic sources produce a varied but
/// reproducible label stream. Roughly one frame in seven comes back empty
/// to exercise the silent path.
pub struct StubBackend {
    labels: Vec<String>,
}

impl StubBackend {
    pub fn new() -> Self {
        Self {
            labels: STUB_LABELS.iter().map(|label| label.to_string()).collect(),
        }
    }
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectorBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn detect(&mut self, pixels: &[u8], _width: u32, _height: u32) -> Result<DetectionBatch> {
        let checksum: [u8; 32] = Sha256::digest(pixels).into();
        let selector = checksum[0];

        if selector % 7 == 0 {
            return Ok(DetectionBatch::default());
        }

        let label = self.labels[selector as usize % self.labels.len()].clone();
        let count = 1 + selector as usize % 2;
        let detections = (0..count)
            .map(|i| Detection {
                label: label.clone(),
                confidence: 0.60 + f32::from(checksum[1 + i] % 40) / 100.0,
                bounds: BoundingBox {
                    x: f32::from(checksum[3 + i]) / 255.0 * 0.5,
                    y: f32::from(checksum[5 + i]) / 255.0 * 0.5,
                    w: 0.25,
                    h: 0.25,
                },
            })
            .collect();

        Ok(DetectionBatch::new(detections))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_frames_yield_identical_batches() {
        let mut backend = StubBackend::new();
        let a = backend.detect(b"frame pixels", 4, 1).unwrap();
        let b = backend.detect(b"frame pixels", 4, 1).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn emitted_labels_come_from_the_vocabulary() {
        let mut backend = StubBackend::new();
        for seed in 0u8..32 {
            let pixels = vec![seed; 48];
            let batch = backend.detect(&pixels, 4, 4).unwrap();
            for detection in &batch.detections {
                assert!(backend.labels.contains(&detection.label));
                assert!((0.0..=1.0).contains(&detection.confidence));
            }
        }
    }

    #[test]
    fn some_frames_are_empty() {
        let mut backend = StubBackend::new();
        let empty = (0u8..64).any(|seed| {
            let pixels = vec![seed; 48];
            backend.detect(&pixels, 4, 4).unwrap().is_empty()
        });
        assert!(empty, "checksum cadence should produce empty batches");
    }
}
