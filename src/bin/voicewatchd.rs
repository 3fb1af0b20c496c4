//! voicewatchd - continuous detection-to-speech daemon
//!
//! This daemon:
//! 1. Opens the configured camera (V4L2 device or stub://)
//! 2. Runs the configured detector on each frame
//! 3. Announces the dominant detected class, de-duplicated and rate-limited
//! 4. Hands annotated frames to the display sink
//! 5. Stops cleanly on Ctrl-C, observed between frames

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};

use voicewatch::config::VoicewatchConfig;
use voicewatch::detect::{BackendRegistry, DetectorBackend};
use voicewatch::speech::SpeechSink;
use voicewatch::{
    AnnouncementPolicy, CameraConfig, CameraSource, CommandSpeech, LogDisplay, Session,
    SpeechDispatcher, StubSpeech,
};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = VoicewatchConfig::load()?;

    let cancel = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&cancel);
    ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::SeqCst);
    })
    .context("failed to set Ctrl-C handler")?;

    let registry = build_registry(&cfg)?;
    let detector = registry.select(&cfg.detector.backend)?;
    detector
        .lock()
        .map_err(|_| anyhow!("detector lock poisoned"))?
        .warm_up()?;

    let sink = build_speech_sink(&cfg)?;
    log::info!(
        "voicewatchd running. camera={} detector={} speech={} cooldown={}s",
        cfg.camera.device,
        cfg.detector.backend,
        sink.name(),
        cfg.speech.cooldown.as_secs()
    );
    let dispatcher = SpeechDispatcher::spawn(sink)?;

    let source = CameraSource::new(CameraConfig {
        device: cfg.camera.device.clone(),
        target_fps: cfg.camera.target_fps,
        width: cfg.camera.width,
        height: cfg.camera.height,
    })?;

    let mut session = Session::new(
        Box::new(source),
        detector,
        AnnouncementPolicy::new(cfg.speech.cooldown),
        dispatcher,
        Box::new(LogDisplay::new()),
        cancel,
    );

    let summary = session.run()?;
    log::info!(
        "session finished: {} frame(s), {} announcement(s), {} skipped",
        summary.frames,
        summary.announcements,
        summary.skipped_frames
    );
    Ok(())
}

fn build_registry(cfg: &VoicewatchConfig) -> Result<BackendRegistry> {
    let mut registry = BackendRegistry::new();
    registry.register(voicewatch::detect::StubBackend::new());

    #[cfg(not(feature = "backend-tract"))]
    if cfg.detector.backend == "tract" {
        return Err(anyhow!(
            "the tract detector requires the backend-tract feature"
        ));
    }

    #[cfg(feature = "backend-tract")]
    if cfg.detector.backend == "tract" {
        let model_path = cfg
            .detector
            .model_path
            .as_ref()
            .ok_or_else(|| anyhow!("tract detector requires model_path"))?;
        let labels_path = cfg
            .detector
            .labels_path
            .as_ref()
            .ok_or_else(|| anyhow!("tract detector requires labels_path"))?;
        registry.register(
            voicewatch::TractBackend::new(
                model_path,
                labels_path,
                cfg.detector.input_width,
                cfg.detector.input_height,
            )?
            .with_threshold(cfg.detector.confidence_threshold),
        );
    }

    Ok(registry)
}

fn build_speech_sink(cfg: &VoicewatchConfig) -> Result<Box<dyn SpeechSink>> {
    match cfg.speech.backend.as_str() {
        "stub" => Ok(Box::new(StubSpeech::new())),
        "command" => Ok(Box::new(CommandSpeech::new(&cfg.speech.command)?)),
        "clips" => {
            #[cfg(feature = "speech-rodio")]
            {
                let clip_dir = cfg
                    .speech
                    .clip_dir
                    .clone()
                    .ok_or_else(|| anyhow!("clips speech backend requires clip_dir"))?;
                Ok(Box::new(voicewatch::ClipSpeech::new(clip_dir)?))
            }
            #[cfg(not(feature = "speech-rodio"))]
            {
                Err(anyhow!(
                    "the clips speech backend requires the speech-rodio feature"
                ))
            }
        }
        other => Err(anyhow!("unknown speech backend '{}'", other)),
    }
}
