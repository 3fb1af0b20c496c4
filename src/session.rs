//! Session driver.
//!
//! A `Session` owns everything one detection run needs: the frame source,
//! the detector, the announcement policy and its state, the speech
//! dispatcher, and the display sink. Nothing is process-global; two
//! sessions never share state.
//!
//! One loop serves both modes. A still image is a source that yields a
//! single frame and then reports end-of-stream; a camera yields frames
//! until cancelled or the device fails. Detection and display run in the
//! same sequential step per frame, so detection latency throttles the
//! effective frame rate. That coupling is intentional.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};

use crate::detect::DetectorBackend;
use crate::display::DisplaySink;
use crate::policy::{AnnouncementPolicy, AnnouncementState};
use crate::source::FrameSource;
use crate::speech::SpeechDispatcher;

const HEALTH_LOG_INTERVAL: Duration = Duration::from_secs(5);

/// Lifecycle of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
    /// Ended cleanly: cancellation or end-of-stream.
    Stopped,
    /// Ended on an unrecoverable source failure. Terminal.
    Errored,
}

/// What a completed session did.
#[derive(Clone, Debug, Default)]
pub struct SessionSummary {
    pub frames: u64,
    pub announcements: u64,
    /// Frames dropped because detection failed on them.
    pub skipped_frames: u64,
    pub last_announcement: Option<String>,
}

/// One detection run: a frame source, a detector, and the announcement loop.
pub struct Session {
    source: Box<dyn FrameSource>,
    detector: Arc<Mutex<dyn DetectorBackend>>,
    policy: AnnouncementPolicy,
    state: AnnouncementState,
    dispatcher: SpeechDispatcher,
    display: Box<dyn DisplaySink>,
    cancel: Arc<AtomicBool>,
    session_state: SessionState,
}

impl Session {
    pub fn new(
        source: Box<dyn FrameSource>,
        detector: Arc<Mutex<dyn DetectorBackend>>,
        policy: AnnouncementPolicy,
        dispatcher: SpeechDispatcher,
        display: Box<dyn DisplaySink>,
        cancel: Arc<AtomicBool>,
    ) -> Self {
        Self {
            source,
            detector,
            policy,
            state: AnnouncementState::new(),
            dispatcher,
            display,
            cancel,
            session_state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.session_state
    }

    /// Run the session to completion.
    ///
    /// Returns a summary on clean termination (cancellation or
    /// end-of-stream). A source failure leaves the session `Errored` and
    /// propagates; the caller surfaces it.
    pub fn run(&mut self) -> Result<SessionSummary> {
        self.session_state = SessionState::Running;
        if let Err(err) = self.source.connect() {
            self.session_state = SessionState::Errored;
            return Err(err.context("frame source unavailable"));
        }

        let mut summary = SessionSummary::default();
        let mut last_health_log = Instant::now();

        loop {
            // Cancellation is observed between frames, never mid-detection.
            if self.cancel.load(Ordering::Relaxed) {
                log::info!("session cancelled after {} frame(s)", summary.frames);
                break;
            }

            let frame = match self.source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    log::info!("end of stream after {} frame(s)", summary.frames);
                    break;
                }
                Err(err) => {
                    self.session_state = SessionState::Errored;
                    return Err(err.context("frame acquisition failed"));
                }
            };
            summary.frames += 1;

            let batch = {
                let mut detector = self
                    .detector
                    .lock()
                    .map_err(|_| anyhow!("detector lock poisoned"))?;
                match detector.detect(&frame.data, frame.width, frame.height) {
                    Ok(batch) => batch,
                    Err(err) => {
                        // One bad frame must not end a live session.
                        log::warn!(
                            "detection failed on frame {}, skipping: {:#}",
                            summary.frames,
                            err
                        );
                        summary.skipped_frames += 1;
                        continue;
                    }
                }
            };

            let (announce, next_state) = self.policy.decide(&batch, &self.state, Instant::now());
            if let Some(text) = announce {
                log::info!("detected: {}", text);
                match self.dispatcher.announce(&text) {
                    Ok(()) => {
                        self.state = next_state;
                        summary.announcements += 1;
                        summary.last_announcement = Some(text);
                    }
                    Err(err) => {
                        // Speech trouble is never fatal to the loop; leave
                        // the state untouched so the next frame retries.
                        log::warn!("speech dispatch failed: {:#}", err);
                    }
                }
            }

            let annotated = frame.annotate(batch);
            if let Err(err) = self.display.present(&annotated) {
                log::warn!("display failed: {:#}", err);
            }

            if last_health_log.elapsed() >= HEALTH_LOG_INTERVAL {
                let stats = self.source.stats();
                log::info!(
                    "source health={} frames={} origin={}",
                    self.source.is_healthy(),
                    stats.frames_captured,
                    stats.origin
                );
                last_health_log = Instant::now();
            }
        }

        self.session_state = SessionState::Stopped;
        Ok(summary)
    }
}
