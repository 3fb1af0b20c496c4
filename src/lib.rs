//! voicewatch
//!
//! This crate turns object-detection results into spoken announcements: a
//! still image or a live camera feed runs through a detector, and the
//! dominant detected class is announced aloud, de-duplicated and
//! rate-limited.
//!
//! # Architecture
//!
//! The decision core is the announcement policy; everything around it is
//! replaceable plumbing behind traits:
//!
//! - `policy`: dominant-class selection, dedup, and cooldown (the core)
//! - `detect`: detector backends behind `DetectorBackend` (stub, ONNX)
//! - `source`: frame sources behind `FrameSource` (still image, camera)
//! - `speech`: speech sinks behind `SpeechSink`, serialized by
//!   `SpeechDispatcher` so at most one utterance is ever in flight
//! - `session`: the per-run driver owning all of the above; no globals
//! - `display`: annotated-frame sinks for the presentation shell
//! - `config`: JSON config file + environment overrides

pub mod config;
pub mod detect;
pub mod display;
pub mod frame;
pub mod policy;
pub mod session;
pub mod source;
pub mod speech;
pub mod ui;

pub use detect::{BackendRegistry, BoundingBox, Detection, DetectionBatch, DetectorBackend};
pub use display::{DisplaySink, ImageFileDisplay, LogDisplay, NullDisplay};
pub use frame::{AnnotatedFrame, Frame};
pub use policy::{dominant_class, AnnouncementPolicy, AnnouncementState, DEFAULT_COOLDOWN};
pub use session::{Session, SessionState, SessionSummary};
pub use source::{
    CameraConfig, CameraSource, FrameSource, ImageConfig, ImageSource, SourceStats,
};
pub use speech::{CommandSpeech, SpeechDispatcher, SpeechSink, StubSpeech};

#[cfg(feature = "backend-tract")]
pub use detect::TractBackend;
#[cfg(feature = "speech-rodio")]
pub use speech::ClipSpeech;
