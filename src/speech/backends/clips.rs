#![cfg(feature = "speech-rodio")]

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

use crate::speech::sink::SpeechSink;

/// Sink that plays a pre-recorded clip per label.
///
/// Looks up `<clip_dir>/<text>.wav` and plays it through the default audio
/// device. `sleep_until_end` is what makes `speak` block for the duration
/// of the utterance. A missing clip is a speech failure, recovered by the
/// dispatcher like any other.
pub struct ClipSpeech {
    clip_dir: PathBuf,
}

impl ClipSpeech {
    pub fn new(clip_dir: PathBuf) -> Result<Self> {
        if !clip_dir.is_dir() {
            return Err(anyhow!(
                "speech clip directory {} does not exist",
                clip_dir.display()
            ));
        }
        Ok(Self { clip_dir })
    }
}

impl SpeechSink for ClipSpeech {
    fn name(&self) -> &'static str {
        "clips"
    }

    fn speak(&mut self, text: &str) -> Result<()> {
        let path = self.clip_dir.join(format!("{text}.wav"));
        let file = File::open(&path)
            .with_context(|| format!("no speech clip at {}", path.display()))?;

        let stream_handle = rodio::OutputStreamBuilder::open_default_stream()
            .context("failed to open audio output stream")?;
        let sink = rodio::Sink::connect_new(stream_handle.mixer());
        let source = rodio::Decoder::new(BufReader::new(file))
            .with_context(|| format!("failed to decode speech clip {}", path.display()))?;
        sink.append(source);
        sink.sleep_until_end();
        Ok(())
    }
}
