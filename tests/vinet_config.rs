use std::sync::Mutex;
use std::time::Duration;

use tempfile::NamedTempFile;

use vinet::config::{DepthBackendKind, DetectorBackendKind, SpeechEngineKind, VinetConfig};

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "VINET_CONFIG",
        "VINET_SOURCE",
        "VINET_MODELS_DIR",
        "VINET_DETECTOR",
        "VINET_DEPTH",
        "VINET_SPEECH_ENGINE",
        "VINET_INTERVAL_MS",
        "VINET_TOP_K",
        "VINET_CALIBRATION",
        "VINET_VOICE",
        "VINET_SPEECH_RATE",
        "VINET_SPEECH_COMMAND",
    ] {
        std::env::remove_var(key);
    }
}

fn write_config(suffix: &str, contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("temp config");
    std::io::Write::write_all(&mut file, contents.as_bytes()).expect("write config");
    file
}

#[test]
fn loads_toml_config_with_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = write_config(
        ".toml",
        r#"
        models_dir = "/opt/vinet/models"

        [source]
        uri = "/var/lib/vinet/frames"
        width = 1280
        height = 720
        target_fps = 30

        [detector]
        backend = "tract"
        confidence_threshold = 0.4

        [depth]
        backend = "tract"
        input_size = 256
        calibration = 64.0

        [fusion]
        interval_ms = 1500
        top_k = 2

        [speech]
        voice = "en-GB"
        rate = 0.6
        "#,
    );

    std::env::set_var("VINET_CONFIG", file.path());
    std::env::set_var("VINET_TOP_K", "4");
    std::env::set_var("VINET_CALIBRATION", "72.5");
    std::env::set_var("VINET_SPEECH_COMMAND", "say -v {voice}");

    let cfg = VinetConfig::load().expect("load config");

    assert_eq!(cfg.models_dir.to_str(), Some("/opt/vinet/models"));
    assert_eq!(cfg.source.uri, "/var/lib/vinet/frames");
    assert_eq!((cfg.source.width, cfg.source.height), (1280, 720));
    assert_eq!(cfg.source.target_fps, 30);
    assert_eq!(cfg.detector.backend, DetectorBackendKind::Tract);
    assert_eq!(cfg.detector.confidence_threshold, 0.4);
    assert_eq!(cfg.detector.iou_threshold, 0.45);
    assert_eq!(cfg.depth.backend, DepthBackendKind::Tract);
    assert_eq!(cfg.depth.input_size, 256);
    assert_eq!(cfg.depth.calibration, 72.5);
    assert_eq!(cfg.fusion.interval, Duration::from_millis(1500));
    assert_eq!(cfg.fusion.top_k, 4);
    assert_eq!(cfg.speech.voice.locale, "en-GB");
    assert_eq!(cfg.speech.voice.rate, 0.6);
    assert_eq!(cfg.speech.engine, SpeechEngineKind::Command);
    assert_eq!(cfg.speech.command, "say -v {voice}");

    clear_env();
}

#[test]
fn loads_json_config() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = write_config(
        ".json",
        r#"{ "source": { "uri": "stub://porch" }, "fusion": { "interval_ms": 500 } }"#,
    );
    std::env::set_var("VINET_CONFIG", file.path());

    std::env::set_var("VINET_DETECTOR", "tract");
    let cfg = VinetConfig::load().expect("load config");
    assert_eq!(cfg.detector.backend, DetectorBackendKind::Tract);
    assert_eq!(cfg.source.uri, "stub://porch");
    assert_eq!(cfg.fusion.interval, Duration::from_millis(500));
    assert_eq!(cfg.fusion.top_k, 3);

    clear_env();
}

#[test]
fn defaults_without_config_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = VinetConfig::load().expect("load config");
    assert_eq!(cfg.source.uri, "stub://camera");
    assert_eq!(cfg.fusion.interval, Duration::from_secs(2));
    assert_eq!(cfg.depth.backend, DepthBackendKind::Luminance);
    assert_eq!(cfg.speech.engine, SpeechEngineKind::Log);

    clear_env();
}

#[test]
fn rejects_invalid_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("VINET_INTERVAL_MS", "soon");
    assert!(VinetConfig::load().is_err());
    clear_env();

    std::env::set_var("VINET_INTERVAL_MS", "0");
    assert!(VinetConfig::load().is_err());
    clear_env();

    std::env::set_var("VINET_TOP_K", "11");
    assert!(VinetConfig::load().is_err());
    clear_env();

    std::env::set_var("VINET_CALIBRATION", "-3");
    assert!(VinetConfig::load().is_err());
    clear_env();

    std::env::set_var("VINET_SPEECH_RATE", "0");
    assert!(VinetConfig::load().is_err());
    clear_env();

    std::env::set_var("VINET_DEPTH", "lidar");
    assert!(VinetConfig::load().is_err());
    clear_env();
}

#[test]
fn rejects_malformed_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = write_config(".toml", "[fusion]\ntop_k = \"three\"\n");
    std::env::set_var("VINET_CONFIG", file.path());
    let err = VinetConfig::load().unwrap_err();
    assert!(err.to_string().contains("invalid config file"));

    clear_env();
}
