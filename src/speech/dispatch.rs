use std::sync::mpsc;
use std::thread;

use anyhow::{anyhow, Context, Result};

use crate::speech::sink::SpeechSink;

/// Single-slot speech dispatcher.
///
/// Owns a worker thread that runs the sink. Hand-off goes through a
/// rendezvous channel (`sync_channel(0)`): a send only completes when the
/// worker is back in `recv`, i.e. the previous utterance has finished. That
/// makes "at most one utterance in flight" structural rather than a
/// convention: dispatching a new announcement blocks until the prior one is
/// done, while frames that produce no announcement are never delayed.
///
/// Sink failures are logged and the worker keeps serving; a broken speech
/// engine must not end a detection session.
pub struct SpeechDispatcher {
    tx: Option<mpsc::SyncSender<String>>,
    worker: Option<thread::JoinHandle<()>>,
}

impl SpeechDispatcher {
    /// Spawn the worker thread around a sink.
    pub fn spawn(mut sink: Box<dyn SpeechSink>) -> Result<Self> {
        let (tx, rx) = mpsc::sync_channel::<String>(0);
        let worker = thread::Builder::new()
            .name("speech".to_string())
            .spawn(move || {
                while let Ok(text) = rx.recv() {
                    if let Err(err) = sink.speak(&text) {
                        log::warn!("speech failed for {:?}: {:#}", text, err);
                    }
                }
            })
            .context("failed to spawn speech worker")?;

        Ok(Self {
            tx: Some(tx),
            worker: Some(worker),
        })
    }

    /// Hand an utterance to the worker.
    ///
    /// Blocks while a previous utterance is still being spoken. Returns an
    /// error only if the worker thread is gone.
    pub fn announce(&self, text: &str) -> Result<()> {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| anyhow!("speech dispatcher closed"))?;
        tx.send(text.to_string())
            .map_err(|_| anyhow!("speech worker exited"))
    }
}

impl Drop for SpeechDispatcher {
    fn drop(&mut self) {
        // Closing the channel lets the worker finish the current utterance
        // and exit; joining ensures it has before the process moves on.
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
