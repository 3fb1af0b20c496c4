#[cfg(feature = "speech-rodio")]
mod clips;
mod command;
mod stub;

#[cfg(feature = "speech-rodio")]
pub use clips::ClipSpeech;
pub use command::CommandSpeech;
pub use stub::StubSpeech;
