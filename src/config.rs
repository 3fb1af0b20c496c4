use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_DETECTOR_BACKEND: &str = "stub";
const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.25;
const DEFAULT_INPUT_WIDTH: u32 = 640;
const DEFAULT_INPUT_HEIGHT: u32 = 480;
const DEFAULT_CAMERA_DEVICE: &str = "stub://camera0";
const DEFAULT_CAMERA_FPS: u32 = 10;
const DEFAULT_SPEECH_BACKEND: &str = "stub";
const DEFAULT_COOLDOWN_SECS: u64 = 3;

#[derive(Debug, Deserialize, Default)]
struct VoicewatchConfigFile {
    detector: Option<DetectorConfigFile>,
    camera: Option<CameraConfigFile>,
    speech: Option<SpeechConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectorConfigFile {
    backend: Option<String>,
    model_path: Option<PathBuf>,
    labels_path: Option<PathBuf>,
    confidence_threshold: Option<f32>,
    input_width: Option<u32>,
    input_height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct CameraConfigFile {
    device: Option<String>,
    target_fps: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct SpeechConfigFile {
    backend: Option<String>,
    command: Option<Vec<String>>,
    clip_dir: Option<PathBuf>,
    cooldown_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct VoicewatchConfig {
    pub detector: DetectorSettings,
    pub camera: CameraSettings,
    pub speech: SpeechSettings,
}

#[derive(Debug, Clone)]
pub struct DetectorSettings {
    pub backend: String,
    pub model_path: Option<PathBuf>,
    pub labels_path: Option<PathBuf>,
    pub confidence_threshold: f32,
    pub input_width: u32,
    pub input_height: u32,
}

#[derive(Debug, Clone)]
pub struct CameraSettings {
    pub device: String,
    pub target_fps: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub struct SpeechSettings {
    pub backend: String,
    pub command: Vec<String>,
    pub clip_dir: Option<PathBuf>,
    pub cooldown: Duration,
}

impl VoicewatchConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("VOICEWATCH_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: VoicewatchConfigFile) -> Self {
        let detector = DetectorSettings {
            backend: file
                .detector
                .as_ref()
                .and_then(|d| d.backend.clone())
                .unwrap_or_else(|| DEFAULT_DETECTOR_BACKEND.to_string()),
            model_path: file.detector.as_ref().and_then(|d| d.model_path.clone()),
            labels_path: file.detector.as_ref().and_then(|d| d.labels_path.clone()),
            confidence_threshold: file
                .detector
                .as_ref()
                .and_then(|d| d.confidence_threshold)
                .unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD),
            input_width: file
                .detector
                .as_ref()
                .and_then(|d| d.input_width)
                .unwrap_or(DEFAULT_INPUT_WIDTH),
            input_height: file
                .detector
                .as_ref()
                .and_then(|d| d.input_height)
                .unwrap_or(DEFAULT_INPUT_HEIGHT),
        };
        let camera = CameraSettings {
            device: file
                .camera
                .as_ref()
                .and_then(|c| c.device.clone())
                .unwrap_or_else(|| DEFAULT_CAMERA_DEVICE.to_string()),
            target_fps: file
                .camera
                .as_ref()
                .and_then(|c| c.target_fps)
                .unwrap_or(DEFAULT_CAMERA_FPS),
            width: file
                .camera
                .as_ref()
                .and_then(|c| c.width)
                .unwrap_or(DEFAULT_INPUT_WIDTH),
            height: file
                .camera
                .as_ref()
                .and_then(|c| c.height)
                .unwrap_or(DEFAULT_INPUT_HEIGHT),
        };
        let speech = SpeechSettings {
            backend: file
                .speech
                .as_ref()
                .and_then(|s| s.backend.clone())
                .unwrap_or_else(|| DEFAULT_SPEECH_BACKEND.to_string()),
            command: file
                .speech
                .as_ref()
                .and_then(|s| s.command.clone())
                .unwrap_or_default(),
            clip_dir: file.speech.as_ref().and_then(|s| s.clip_dir.clone()),
            cooldown: Duration::from_secs(
                file.speech
                    .and_then(|s| s.cooldown_secs)
                    .unwrap_or(DEFAULT_COOLDOWN_SECS),
            ),
        };
        Self {
            detector,
            camera,
            speech,
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(backend) = std::env::var("VOICEWATCH_DETECTOR_BACKEND") {
            if !backend.trim().is_empty() {
                self.detector.backend = backend;
            }
        }
        if let Ok(device) = std::env::var("VOICEWATCH_CAMERA_DEVICE") {
            if !device.trim().is_empty() {
                self.camera.device = device;
            }
        }
        if let Ok(backend) = std::env::var("VOICEWATCH_SPEECH_BACKEND") {
            if !backend.trim().is_empty() {
                self.speech.backend = backend;
            }
        }
        if let Ok(command) = std::env::var("VOICEWATCH_SPEECH_COMMAND") {
            let parsed = split_csv(&command);
            if !parsed.is_empty() {
                self.speech.command = parsed;
            }
        }
        if let Ok(cooldown) = std::env::var("VOICEWATCH_COOLDOWN_SECS") {
            let seconds: u64 = cooldown.parse().map_err(|_| {
                anyhow!("VOICEWATCH_COOLDOWN_SECS must be an integer number of seconds")
            })?;
            self.speech.cooldown = Duration::from_secs(seconds);
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.camera.target_fps == 0 {
            return Err(anyhow!("camera target_fps must be >= 1"));
        }
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(anyhow!("camera dimensions must be non-zero"));
        }
        if !(0.0..=1.0).contains(&self.detector.confidence_threshold) {
            return Err(anyhow!("detector confidence_threshold must be in 0..=1"));
        }
        if self.detector.backend == "tract"
            && (self.detector.model_path.is_none() || self.detector.labels_path.is_none())
        {
            return Err(anyhow!(
                "the tract detector requires model_path and labels_path"
            ));
        }
        match self.speech.backend.as_str() {
            "stub" => {}
            "command" => {
                if self.speech.command.is_empty() {
                    return Err(anyhow!("the command speech backend requires a command"));
                }
            }
            "clips" => {
                if self.speech.clip_dir.is_none() {
                    return Err(anyhow!("the clips speech backend requires clip_dir"));
                }
            }
            other => {
                return Err(anyhow!(
                    "unknown speech backend '{}' (expected stub, command, or clips)",
                    other
                ));
            }
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<VoicewatchConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .map(|entry| entry.to_string())
        .collect()
}
