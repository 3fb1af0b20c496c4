//! Speech output.
//!
//! Speech synthesis is an opaque capability behind the `SpeechSink` trait:
//! given text, produce audible speech, blocking until playback completes.
//! `SpeechDispatcher` runs the sink on a dedicated worker thread with a
//! single-slot hand-off, so at most one utterance is ever in flight and the
//! detection loop stays responsive while speech plays.
//!
//! Sink failures are recovered locally (logged, session continues); they
//! must never take down a live detection run.

mod backends;
mod dispatch;
mod sink;

pub use backends::CommandSpeech;
#[cfg(feature = "speech-rodio")]
pub use backends::ClipSpeech;
pub use backends::StubSpeech;
pub use dispatch::SpeechDispatcher;
pub use sink::SpeechSink;
