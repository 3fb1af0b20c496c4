use std::sync::Mutex;
use std::time::Duration;

use tempfile::NamedTempFile;

use voicewatch::config::VoicewatchConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "VOICEWATCH_CONFIG",
        "VOICEWATCH_DETECTOR_BACKEND",
        "VOICEWATCH_CAMERA_DEVICE",
        "VOICEWATCH_SPEECH_BACKEND",
        "VOICEWATCH_SPEECH_COMMAND",
        "VOICEWATCH_COOLDOWN_SECS",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "detector": {
            "backend": "stub",
            "confidence_threshold": 0.4,
            "input_width": 320,
            "input_height": 240
        },
        "camera": {
            "device": "/dev/video1",
            "target_fps": 15,
            "width": 800,
            "height": 600
        },
        "speech": {
            "backend": "command",
            "command": ["espeak-ng", "-s", "150"],
            "cooldown_secs": 5
        }
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("VOICEWATCH_CONFIG", file.path());
    std::env::set_var("VOICEWATCH_CAMERA_DEVICE", "stub://override");
    std::env::set_var("VOICEWATCH_COOLDOWN_SECS", "7");

    let cfg = VoicewatchConfig::load().expect("load config");

    assert_eq!(cfg.detector.backend, "stub");
    assert_eq!(cfg.detector.confidence_threshold, 0.4);
    assert_eq!(cfg.detector.input_width, 320);
    assert_eq!(cfg.detector.input_height, 240);
    assert_eq!(cfg.camera.device, "stub://override");
    assert_eq!(cfg.camera.target_fps, 15);
    assert_eq!(cfg.camera.width, 800);
    assert_eq!(cfg.camera.height, 600);
    assert_eq!(cfg.speech.backend, "command");
    assert_eq!(cfg.speech.command, vec!["espeak-ng", "-s", "150"]);
    assert_eq!(cfg.speech.cooldown, Duration::from_secs(7));

    clear_env();
}

#[test]
fn defaults_apply_without_a_config_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = VoicewatchConfig::load().expect("load config");

    assert_eq!(cfg.detector.backend, "stub");
    assert_eq!(cfg.camera.device, "stub://camera0");
    assert_eq!(cfg.camera.target_fps, 10);
    assert_eq!(cfg.speech.backend, "stub");
    assert_eq!(cfg.speech.cooldown, Duration::from_secs(3));

    clear_env();
}

#[test]
fn rejects_command_speech_without_a_command() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("VOICEWATCH_SPEECH_BACKEND", "command");

    let err = VoicewatchConfig::load().unwrap_err();
    assert!(err.to_string().contains("command"));

    clear_env();
}

#[test]
fn rejects_unknown_speech_backend() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("VOICEWATCH_SPEECH_BACKEND", "festival");

    let err = VoicewatchConfig::load().unwrap_err();
    assert!(err.to_string().contains("festival"));

    clear_env();
}

#[test]
fn rejects_zero_fps() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{ "camera": { "target_fps": 0 } }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");
    std::env::set_var("VOICEWATCH_CONFIG", file.path());

    assert!(VoicewatchConfig::load().is_err());

    clear_env();
}

#[test]
fn rejects_non_numeric_cooldown() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("VOICEWATCH_COOLDOWN_SECS", "soon");

    assert!(VoicewatchConfig::load().is_err());

    clear_env();
}
