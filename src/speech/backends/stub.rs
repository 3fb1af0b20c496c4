use std::sync::{Arc, Mutex};

use anyhow::Result;

use crate::speech::sink::SpeechSink;

/// Recording sink for tests and hardware-free runs.
///
/// Keeps a transcript of everything "spoken". The transcript handle can be
/// cloned out before the sink moves into the dispatcher's worker thread.
pub struct StubSpeech {
    transcript: Arc<Mutex<Vec<String>>>,
}

impl StubSpeech {
    pub fn new() -> Self {
        Self {
            transcript: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Shared handle to the utterances spoken so far.
    pub fn transcript(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.transcript)
    }
}

impl Default for StubSpeech {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechSink for StubSpeech {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn speak(&mut self, text: &str) -> Result<()> {
        self.transcript
            .lock()
            .map_err(|_| anyhow::anyhow!("speech transcript lock poisoned"))?
            .push(text.to_string());
        Ok(())
    }
}
