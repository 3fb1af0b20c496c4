/// One classified object instance found in a frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    /// Class label from the backend's fixed vocabulary.
    pub label: String,
    /// Confidence in 0..=1.
    pub confidence: f32,
    /// Bounding box (normalized 0..1 coordinates).
    pub bounds: BoundingBox,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

/// All detections produced for one frame.
///
/// Order carries no meaning; consumers only need membership and counts.
/// An empty batch is the normal "nothing found" outcome, not an error.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DetectionBatch {
    pub detections: Vec<Detection>,
}

impl DetectionBatch {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self { detections }
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    pub fn len(&self) -> usize {
        self.detections.len()
    }
}

impl From<Vec<Detection>> for DetectionBatch {
    fn from(detections: Vec<Detection>) -> Self {
        Self { detections }
    }
}
