use anyhow::Result;

/// Speech synthesis backend.
///
/// `speak` blocks until the utterance has been fully rendered to the audio
/// device. Implementations must be safe to call repeatedly with the same
/// text and must not spawn their own concurrency; serialization is the
/// dispatcher's job.
pub trait SpeechSink: Send {
    /// Backend identifier for configuration and logging.
    fn name(&self) -> &'static str;

    /// Speak the text, blocking until audible output completes.
    fn speak(&mut self, text: &str) -> Result<()>;
}
