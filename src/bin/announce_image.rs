//! announce_image - single-shot detection with a spoken result
//!
//! Decodes one image, runs the detector once, announces the dominant class
//! if anything was found, and optionally saves the annotated frame.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::Parser;

use voicewatch::detect::BackendRegistry;
use voicewatch::speech::SpeechSink;
use voicewatch::ui::Ui;
use voicewatch::{
    AnnouncementPolicy, CommandSpeech, ImageConfig, ImageFileDisplay, ImageSource, NullDisplay,
    Session, SpeechDispatcher, StubSpeech, DEFAULT_COOLDOWN,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Image file to run detection on (PNG or JPEG).
    image: String,
    /// Detector backend (stub or tract).
    #[arg(long, default_value = "stub")]
    detector: String,
    /// ONNX model path (tract backend).
    #[cfg(feature = "backend-tract")]
    #[arg(long)]
    model: Option<PathBuf>,
    /// Labels JSON path (tract backend).
    #[cfg(feature = "backend-tract")]
    #[arg(long)]
    labels: Option<PathBuf>,
    /// Model input width (tract backend).
    #[cfg(feature = "backend-tract")]
    #[arg(long, default_value_t = 640)]
    input_width: u32,
    /// Model input height (tract backend).
    #[cfg(feature = "backend-tract")]
    #[arg(long, default_value_t = 480)]
    input_height: u32,
    /// Speech backend (stub, command, or clips).
    #[arg(long, default_value = "stub")]
    speech: String,
    /// Synthesizer command for the command backend, comma separated
    /// (e.g. "espeak-ng,-s,150").
    #[arg(long, env = "VOICEWATCH_SPEECH_COMMAND")]
    speech_command: Option<String>,
    /// Clip directory for the clips backend.
    #[cfg(feature = "speech-rodio")]
    #[arg(long)]
    clip_dir: Option<PathBuf>,
    /// Save the annotated frame to this path.
    #[arg(long)]
    out: Option<PathBuf>,
    /// Plain progress output (no spinner).
    #[arg(long)]
    plain: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();
    let ui = Ui::new(std::io::stderr().is_terminal(), args.plain);

    let detector = {
        let _stage = ui.stage("load detector");
        let registry = build_registry(&args)?;
        registry.select(&args.detector)?
    };

    let dispatcher = {
        let _stage = ui.stage("prepare speech");
        SpeechDispatcher::spawn(build_speech_sink(&args)?)?
    };

    let summary = {
        let _stage = ui.stage("detect and announce");
        let source = ImageSource::new(ImageConfig {
            path: args.image.clone(),
        })?;
        let display: Box<dyn voicewatch::DisplaySink> = match &args.out {
            Some(path) => Box::new(ImageFileDisplay::new(path.clone())),
            None => Box::new(NullDisplay),
        };
        let mut session = Session::new(
            Box::new(source),
            detector,
            AnnouncementPolicy::new(DEFAULT_COOLDOWN),
            dispatcher,
            display,
            Arc::new(AtomicBool::new(false)),
        );
        session.run()?
    };

    println!("announce_image summary:");
    println!("  image: {}", args.image);
    match &summary.last_announcement {
        Some(label) => println!("  announced: {}", label),
        None => println!("  announced: nothing detected"),
    }
    if let Some(out) = &args.out {
        println!("  annotated output: {}", out.display());
    }
    Ok(())
}

fn build_registry(args: &Args) -> Result<BackendRegistry> {
    let mut registry = BackendRegistry::new();
    registry.register(voicewatch::detect::StubBackend::new());

    if args.detector == "tract" {
        #[cfg(feature = "backend-tract")]
        {
            let model = args
                .model
                .as_ref()
                .ok_or_else(|| anyhow!("--detector tract requires --model"))?;
            let labels = args
                .labels
                .as_ref()
                .ok_or_else(|| anyhow!("--detector tract requires --labels"))?;
            registry.register(voicewatch::TractBackend::new(
                model,
                labels,
                args.input_width,
                args.input_height,
            )?);
        }
        #[cfg(not(feature = "backend-tract"))]
        return Err(anyhow!(
            "the tract detector requires the backend-tract feature"
        ));
    }

    Ok(registry)
}

fn build_speech_sink(args: &Args) -> Result<Box<dyn SpeechSink>> {
    match args.speech.as_str() {
        "stub" => Ok(Box::new(StubSpeech::new())),
        "command" => {
            let command = args
                .speech_command
                .as_ref()
                .ok_or_else(|| anyhow!("--speech command requires --speech-command"))?;
            let argv: Vec<String> = command
                .split(',')
                .map(|part| part.trim().to_string())
                .filter(|part| !part.is_empty())
                .collect();
            Ok(Box::new(CommandSpeech::new(&argv)?))
        }
        "clips" => {
            #[cfg(feature = "speech-rodio")]
            {
                let clip_dir = args
                    .clip_dir
                    .clone()
                    .ok_or_else(|| anyhow!("--speech clips requires --clip-dir"))?;
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
