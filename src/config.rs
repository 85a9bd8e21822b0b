use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::depth::DEFAULT_CALIBRATION;
use crate::fusion::{DEFAULT_INTERVAL_MS, DEFAULT_TOP_K};
use crate::ingest::SourceConfig;
use crate::speech::VoiceSettings;

const DEFAULT_MODELS_DIR: &str = "models";
const DEFAULT_DEPTH_INPUT: u32 = 224;
const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.25;
const DEFAULT_IOU_THRESHOLD: f32 = 0.45;
const DEFAULT_SPEECH_COMMAND: &str = "espeak-ng -v {voice} -s {wpm}";
const MAX_TOP_K: usize = 10;

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct VinetConfigFile {
    models_dir: Option<PathBuf>,
    source: Option<SourceConfigFile>,
    detector: Option<DetectorConfigFile>,
    depth: Option<DepthConfigFile>,
    fusion: Option<FusionConfigFile>,
    speech: Option<SpeechConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct SourceConfigFile {
    uri: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    target_fps: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct DetectorConfigFile {
    backend: Option<DetectorBackendKind>,
    confidence_threshold: Option<f32>,
    iou_threshold: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct DepthConfigFile {
    backend: Option<DepthBackendKind>,
    input_size: Option<u32>,
    calibration: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct FusionConfigFile {
    interval_ms: Option<u64>,
    top_k: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct SpeechConfigFile {
    engine: Option<SpeechEngineKind>,
    voice: Option<String>,
    rate: Option<f32>,
    command: Option<String>,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DetectorBackendKind {
    /// Fixed demo scene; no model files required.
    Scripted,
    /// ONNX model through tract (feature `backend-tract`).
    Tract,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DepthBackendKind {
    /// Brightness as a stand-in for inverse depth; no model files required.
    Luminance,
    /// ONNX model through tract (feature `backend-tract`).
    Tract,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SpeechEngineKind {
    Log,
    Command,
}

impl FromStr for DetectorBackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "scripted" => Ok(Self::Scripted),
            "tract" => Ok(Self::Tract),
            other => Err(anyhow!("unknown detector backend '{}'", other)),
        }
    }
}

impl FromStr for DepthBackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "luminance" => Ok(Self::Luminance),
            "tract" => Ok(Self::Tract),
            other => Err(anyhow!("unknown depth backend '{}'", other)),
        }
    }
}

impl FromStr for SpeechEngineKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "log" => Ok(Self::Log),
            "command" => Ok(Self::Command),
            other => Err(anyhow!("unknown speech engine '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct VinetConfig {
    pub models_dir: PathBuf,
    pub source: SourceConfig,
    pub detector: DetectorSettings,
    pub depth: DepthSettings,
    pub fusion: FusionSettings,
    pub speech: SpeechSettings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetectorSettings {
    pub backend: DetectorBackendKind,
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DepthSettings {
    pub backend: DepthBackendKind,
    pub input_size: u32,
    /// `C` in `distance_cm = C / mean_inverse_depth`. Empirical; tune per camera.
    pub calibration: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FusionSettings {
    pub interval: Duration,
    pub top_k: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpeechSettings {
    pub engine: SpeechEngineKind,
    pub voice: VoiceSettings,
    /// Command template for the `command` engine.
    pub command: String,
}

impl Default for VinetConfig {
    fn default() -> Self {
        Self::from_file(VinetConfigFile::default())
    }
}

impl VinetConfig {
    /// Defaults, then the file at `$VINET_CONFIG` if set, then `VINET_*` overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("VINET_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) if !path.trim().is_empty() => Some(read_config_file(Path::new(path))?),
            _ => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from an explicit file, still honouring environment overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut cfg = Self::from_file(read_config_file(path)?);
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: VinetConfigFile) -> Self {
        let source_file = file.source.unwrap_or_default();
        let defaults = SourceConfig::default();
        let source = SourceConfig {
            uri: source_file.uri.unwrap_or(defaults.uri),
            width: source_file.width.unwrap_or(defaults.width),
            height: source_file.height.unwrap_or(defaults.height),
            target_fps: source_file.target_fps.unwrap_or(defaults.target_fps),
        };

        let detector_file = file.detector.unwrap_or_default();
        let detector = DetectorSettings {
            backend: detector_file
                .backend
                .unwrap_or(DetectorBackendKind::Scripted),
            confidence_threshold: detector_file
                .confidence_threshold
                .unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD),
            iou_threshold: detector_file.iou_threshold.unwrap_or(DEFAULT_IOU_THRESHOLD),
        };

        let depth_file = file.depth.unwrap_or_default();
        let depth = DepthSettings {
            backend: depth_file.backend.unwrap_or(DepthBackendKind::Luminance),
            input_size: depth_file.input_size.unwrap_or(DEFAULT_DEPTH_INPUT),
            calibration: depth_file.calibration.unwrap_or(DEFAULT_CALIBRATION),
        };

        let fusion_file = file.fusion.unwrap_or_default();
        let fusion = FusionSettings {
            interval: Duration::from_millis(
                fusion_file.interval_ms.unwrap_or(DEFAULT_INTERVAL_MS),
            ),
            top_k: fusion_file.top_k.unwrap_or(DEFAULT_TOP_K),
        };

        let speech_file = file.speech.unwrap_or_default();
        let voice_defaults = VoiceSettings::default();
        let speech = SpeechSettings {
            engine: speech_file.engine.unwrap_or(SpeechEngineKind::Log),
            voice: VoiceSettings {
                locale: speech_file.voice.unwrap_or(voice_defaults.locale),
                rate: speech_file.rate.unwrap_or(voice_defaults.rate),
            },
            command: speech_file
                .command
                .unwrap_or_else(|| DEFAULT_SPEECH_COMMAND.to_string()),
        };

        Self {
            models_dir: file
                .models_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MODELS_DIR)),
            source,
            detector,
            depth,
            fusion,
            speech,
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(uri) = env_value("VINET_SOURCE") {
            self.source.uri = uri;
        }
        if let Some(dir) = env_value("VINET_MODELS_DIR") {
            self.models_dir = PathBuf::from(dir);
        }
        if let Some(backend) = env_value("VINET_DETECTOR") {
            self.detector.backend = backend.parse()?;
        }
        if let Some(backend) = env_value("VINET_DEPTH") {
            self.depth.backend = backend.parse()?;
        }
        if let Some(interval) = env_value("VINET_INTERVAL_MS") {
            let ms: u64 = interval.parse().map_err(|_| {
                anyhow!("VINET_INTERVAL_MS must be an integer number of milliseconds")
            })?;
            self.fusion.interval = Duration::from_millis(ms);
        }
        if let Some(top_k) = env_value("VINET_TOP_K") {
            self.fusion.top_k = top_k
                .parse()
                .map_err(|_| anyhow!("VINET_TOP_K must be a positive integer"))?;
        }
        if let Some(calibration) = env_value("VINET_CALIBRATION") {
            self.depth.calibration = calibration
                .parse()
                .map_err(|_| anyhow!("VINET_CALIBRATION must be a number"))?;
        }
        if let Some(voice) = env_value("VINET_VOICE") {
            self.speech.voice.locale = voice;
        }
        if let Some(rate) = env_value("VINET_SPEECH_RATE") {
            self.speech.voice.rate = rate
                .parse()
                .map_err(|_| anyhow!("VINET_SPEECH_RATE must be a number"))?;
        }
        if let Some(engine) = env_value("VINET_SPEECH_ENGINE") {
            self.speech.engine = engine.parse()?;
        }
        if let Some(command) = env_value("VINET_SPEECH_COMMAND") {
            self.speech.command = command;
            self.speech.engine = SpeechEngineKind::Command;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.fusion.interval.is_zero() {
            return Err(anyhow!("fusion interval must be greater than zero"));
        }
        if self.fusion.top_k == 0 || self.fusion.top_k > MAX_TOP_K {
            return Err(anyhow!("top_k must be between 1 and {}", MAX_TOP_K));
        }
        if !(self.depth.calibration.is_finite() && self.depth.calibration > 0.0) {
            return Err(anyhow!("depth calibration must be a positive number"));
        }
        if self.depth.input_size == 0 {
            return Err(anyhow!("depth input size must be greater than zero"));
        }
        let rate = self.speech.voice.rate;
        if !(rate > 0.0 && rate <= 1.0) {
            return Err(anyhow!("speech rate must be in (0, 1]"));
        }
        if self.speech.voice.locale.trim().is_empty() {
            return Err(anyhow!("speech voice must not be empty"));
        }
        if self.source.uri.trim().is_empty() {
            return Err(anyhow!("source uri must not be empty"));
        }
        if self.source.target_fps == 0 {
            return Err(anyhow!("source target_fps must be greater than zero"));
        }
        if self.source.width == 0 || self.source.height == 0 {
            return Err(anyhow!("source dimensions must be non-zero"));
        }
        for (name, value) in [
            ("confidence_threshold", self.detector.confidence_threshold),
            ("iou_threshold", self.detector.iou_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(anyhow!("detector {} must be in [0, 1]", name));
            }
        }
        Ok(())
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

fn read_config_file(path: &Path) -> Result<VinetConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let cfg = if is_json {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        toml::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = VinetConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.fusion.interval, Duration::from_secs(2));
        assert_eq!(cfg.fusion.top_k, 3);
        assert_eq!(cfg.depth.calibration, DEFAULT_CALIBRATION);
        assert_eq!(cfg.detector.backend, DetectorBackendKind::Scripted);
        assert_eq!(cfg.speech.voice.locale, "en-US");
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut cfg = VinetConfig::default();
        cfg.fusion.top_k = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = VinetConfig::default();
        cfg.depth.calibration = f64::NAN;
        assert!(cfg.validate().is_err());

        let mut cfg = VinetConfig::default();
        cfg.speech.voice.rate = 1.5;
        assert!(cfg.validate().is_err());

        let mut cfg = VinetConfig::default();
        cfg.fusion.interval = Duration::ZERO;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let file: VinetConfigFile = toml::from_str(
            r#"
            [depth]
            backend = "tract"
            calibration = 55.0
            "#,
        )
        .unwrap();
        let cfg = VinetConfig::from_file(file);
        assert_eq!(cfg.depth.backend, DepthBackendKind::Tract);
        assert_eq!(cfg.depth.calibration, 55.0);
        assert_eq!(cfg.depth.input_size, DEFAULT_DEPTH_INPUT);
        assert_eq!(cfg.source.uri, "stub://camera");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let parsed: std::result::Result<VinetConfigFile, _> = toml::from_str("colour = \"red\"");
        assert!(parsed.is_err());
    }
}
