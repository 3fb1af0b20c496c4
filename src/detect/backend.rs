use anyhow::Result;

use crate::detect::result::DetectionBatch;

/// Detector backend trait.
///
/// Inference internals are opaque to the rest of the crate: a backend takes
/// a decoded RGB frame and returns classified bounding boxes. Backends must
/// return an empty batch for "no objects found" rather than an error; errors
/// are reserved for malformed frames and model failures.
pub trait DetectorBackend: Send {
    /// Backend identifier used for registry lookup and logging.
    fn name(&self) -> &'static str;

    /// The closed label vocabulary this backend can produce.
    ///
    /// Every `Detection::label` the backend emits comes from this list.
    fn labels(&self) -> &[String];

    /// Run detection on one RGB8 frame.
    ///
    /// Implementations must treat the pixel slice as read-only and
    /// ephemeral; nothing may be retained across calls.
    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<DetectionBatch>;

    /// Optional warm-up hook (model load, first-inference priming).
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
