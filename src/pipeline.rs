//! Pipeline assembly.
//!
//! Builds every component from a `VinetConfig`, then wires the three execution
//! contexts together:
//!
//! ```text
//! capture thread ──FusionController──▶ fusion worker ──SpeechSender──▶ speech worker
//!        ▲                                  │ (scoped depth threads)
//!        └──── PauseController (start/stop) ┘
//! ```

use anyhow::Result;
use serde::Serialize;
use std::sync::mpsc;
use std::sync::Arc;

use crate::config::{DepthBackendKind, DetectorBackendKind, SpeechEngineKind, VinetConfig};
use crate::depth::{DepthBackend, DepthEstimator, LuminanceBackend};
use crate::detect::{DetectorBackend, ObjectDetector, ScriptedBackend};
use crate::error::InitError;
use crate::fusion::{
    FusionController, FusionHandle, FusionStats, FusionWorker, RateGate, CYCLE_QUEUE_DEPTH,
};
use crate::ingest::{open_source, CameraSession, FrameSource, SourceStats};
use crate::pause::{GestureSignal, PauseController, PauseFlag, PauseState};
use crate::speech::{CommandEngine, LogEngine, SpeechEngine, SpeechHandle, SpeechStats, SpeechWorker};

#[cfg(feature = "backend-tract")]
use crate::depth::TractDepthBackend;
#[cfg(feature = "backend-tract")]
use crate::detect::TractBackend;
#[cfg(feature = "backend-tract")]
use crate::model::{read_labels, ModelResource, DEPTH_MODEL, DETECTION_LABELS, DETECTION_MODEL};

/// Square input side of the tract detection model.
#[cfg(feature = "backend-tract")]
const DETECTOR_INPUT: u32 = 640;

/// Replaceable pieces of a pipeline. `from_config` builds the configured ones; tests
/// and the demo substitute their own.
pub struct Components {
    pub source: Box<dyn FrameSource>,
    pub detector: ObjectDetector,
    pub estimator: DepthEstimator,
    pub engine: Box<dyn SpeechEngine>,
}

impl Components {
    pub fn from_config(config: &VinetConfig) -> Result<Self, InitError> {
        let source = open_source(&config.source).map_err(InitError::Config)?;
        let detector = ObjectDetector::new(detector_backend(config)?);
        let estimator = DepthEstimator::new(depth_backend(config)?)
            .with_calibration(config.depth.calibration);
        let engine: Box<dyn SpeechEngine> = match config.speech.engine {
            SpeechEngineKind::Log => Box::new(LogEngine::new()),
            SpeechEngineKind::Command => Box::new(
                CommandEngine::from_template(&config.speech.command).map_err(InitError::Config)?,
            ),
        };
        Ok(Self {
            source,
            detector,
            estimator,
            engine,
        })
    }
}

fn detector_backend(config: &VinetConfig) -> Result<Box<dyn DetectorBackend>, InitError> {
    let backend: Box<dyn DetectorBackend> = match config.detector.backend {
        DetectorBackendKind::Scripted => Box::new(ScriptedBackend::demo()),
        #[cfg(feature = "backend-tract")]
        DetectorBackendKind::Tract => {
            let model = ModelResource::locate(&config.models_dir, DETECTION_MODEL)?;
            let labels = read_labels(&ModelResource::locate(&config.models_dir, DETECTION_LABELS)?)?;
            let backend = TractBackend::new(&model.path, labels, DETECTOR_INPUT, DETECTOR_INPUT)
                .map_err(|e| model.load_error(e))?
                .with_thresholds(
                    config.detector.confidence_threshold,
                    config.detector.iou_threshold,
                );
            Box::new(backend)
        }
        #[cfg(not(feature = "backend-tract"))]
        DetectorBackendKind::Tract => {
            return Err(InitError::BackendUnavailable("tract".to_string()))
        }
    };
    backend.warm_up().map_err(|e| InitError::Startup {
        component: "detector",
        source: e,
    })?;
    Ok(backend)
}

fn depth_backend(config: &VinetConfig) -> Result<Box<dyn DepthBackend>, InitError> {
    match config.depth.backend {
        DepthBackendKind::Luminance => Ok(Box::new(LuminanceBackend::new(config.depth.input_size))),
        #[cfg(feature = "backend-tract")]
        DepthBackendKind::Tract => {
            let model = ModelResource::locate(&config.models_dir, DEPTH_MODEL)?;
            let backend = TractDepthBackend::new(&model.path, config.depth.input_size)
                .map_err(|e| model.load_error(e))?;
            Ok(Box::new(backend))
        }
        #[cfg(not(feature = "backend-tract"))]
        DepthBackendKind::Tract => Err(InitError::BackendUnavailable("tract".to_string())),
    }
}

/// Point-in-time counters, logged as JSON by the daemon.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PipelineStats {
    pub paused: bool,
    pub frames_captured: u64,
    pub frames_seen: u64,
    pub frames_gated: u64,
    pub cycles_accepted: u64,
    pub cycles_dropped: u64,
    pub results_reported: u64,
    pub results_discarded: u64,
    pub utterances_spoken: u64,
    pub utterances_superseded: u64,
}

pub struct Pipeline {
    control: PauseController<CameraSession>,
    fusion: Option<FusionHandle>,
    speech: Option<SpeechHandle>,
    fusion_stats: Arc<FusionStats>,
    speech_stats: Arc<SpeechStats>,
}

impl Pipeline {
    /// Build the configured pipeline. Nothing is captured until `start`.
    pub fn build(config: &VinetConfig) -> Result<Self, InitError> {
        config.validate().map_err(InitError::Config)?;
        let components = Components::from_config(config)?;
        Self::assemble(config, components)
    }

    pub fn assemble(config: &VinetConfig, components: Components) -> Result<Self, InitError> {
        let Components {
            source,
            detector,
            estimator,
            engine,
        } = components;

        let speech = SpeechWorker::spawn(engine, config.speech.voice.clone()).map_err(|e| {
            InitError::Startup {
                component: "speech worker",
                source: e,
            }
        })?;
        let speech_stats = speech.stats();

        let paused = PauseFlag::new();
        let fusion_stats = Arc::new(FusionStats::default());
        let (cycles_tx, cycles_rx) = mpsc::sync_channel(CYCLE_QUEUE_DEPTH);
        let worker = FusionWorker::new(
            detector,
            estimator,
            config.fusion.top_k,
            paused.clone(),
            speech.sender(),
        );
        let fusion = worker
            .spawn(cycles_rx, fusion_stats.clone())
            .map_err(|e| InitError::Startup {
                component: "fusion worker",
                source: e,
            })?;

        let controller = FusionController::new(
            RateGate::new(config.fusion.interval),
            paused.clone(),
            cycles_tx,
            fusion_stats.clone(),
        );
        let camera = CameraSession::new(source, Box::new(controller), config.source.target_fps);

        Ok(Self {
            control: PauseController::new(camera, paused),
            fusion: Some(fusion),
            speech: Some(speech),
            fusion_stats,
            speech_stats,
        })
    }

    /// Start capturing. Guidance is spoken from the first accepted cycle on.
    pub fn start(&mut self) -> Result<()> {
        self.control.capture_mut().start()
    }

    pub fn handle_gesture(&mut self, signal: GestureSignal) -> Result<bool> {
        self.control.handle(signal)
    }

    pub fn pause_state(&self) -> PauseState {
        self.control.state()
    }

    pub fn stats(&self) -> PipelineStats {
        let fusion = &self.fusion_stats;
        PipelineStats {
            paused: self.control.flag().is_paused(),
            frames_captured: self
                .control
                .capture()
                .source_stats()
                .map(|s: SourceStats| s.frames_captured)
                .unwrap_or(0),
            frames_seen: fusion.frames_seen(),
            frames_gated: fusion.frames_gated(),
            cycles_accepted: fusion.cycles_accepted(),
            cycles_dropped: fusion.cycles_dropped(),
            results_reported: fusion.results_reported(),
            results_discarded: fusion.results_discarded(),
            utterances_spoken: self.speech_stats.spoken(),
            utterances_superseded: self.speech_stats.superseded(),
        }
    }

    /// Stop capture first, then drain the workers in pipeline order.
    pub fn shutdown(mut self) -> Result<()> {
        self.control.capture_mut().stop()?;
        if let Some(fusion) = self.fusion.take() {
            fusion.stop()?;
        }
        if let Some(speech) = self.speech.take() {
            speech.stop()?;
        }
        log::info!("pipeline stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_builds_without_models() {
        let mut config = VinetConfig::default();
        config.source.width = 32;
        config.source.height = 24;
        let pipeline = Pipeline::build(&config).unwrap();
        assert_eq!(pipeline.pause_state(), PauseState::Running);
        assert_eq!(pipeline.stats(), PipelineStats::default());
        pipeline.shutdown().unwrap();
    }

    #[cfg(not(feature = "backend-tract"))]
    #[test]
    fn tract_backends_need_the_feature() {
        let mut config = VinetConfig::default();
        config.depth.backend = DepthBackendKind::Tract;
        assert!(matches!(
            Pipeline::build(&config),
            Err(InitError::BackendUnavailable(_))
        ));
    }

    #[cfg(feature = "backend-tract")]
    #[test]
    fn missing_models_are_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = VinetConfig::default();
        config.models_dir = dir.path().to_path_buf();
        config.detector.backend = DetectorBackendKind::Tract;
        assert!(matches!(
            Pipeline::build(&config),
            Err(InitError::ModelNotFound { .. })
        ));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = VinetConfig::default();
        config.fusion.top_k = 0;
        assert!(matches!(Pipeline::build(&config), Err(InitError::Config(_))));
    }
}
