//! Vinet: spoken proximity guidance from a single camera.
//!
//! A camera frame is checked against a pause flag and a fixed-interval rate gate. If it
//! passes, objects are detected, the most confident few get a distance from monocular
//! depth estimation, and the result is spoken as one sentence, e.g.
//! "A chair is 85.3 centimetres to the left."
//!
//! # Architecture
//!
//! Three execution contexts, connected by channels:
//!
//! 1. **Capture**: `ingest::CameraSession` pulls frames and hands them to
//!    `fusion::FusionController`, which never blocks.
//! 2. **Inference**: `fusion::FusionWorker` runs detection and the per-object depth
//!    estimates (concurrently), then forwards a `FusedResult`.
//! 3. **Speech**: `speech::SpeechWorker` owns the Idle/Speaking scheduler. Guidance
//!    never overlaps and never queues; only the newest pending sentence survives.
//!
//! # Module Structure
//!
//! - `frame`: frames and the normalized/raster rectangle conversions
//! - `ingest`: frame sources and the camera session
//! - `detect`: object detection backends and `ObjectDetector`
//! - `depth`: depth backends, central-patch reduction and calibration
//! - `fusion`: rate gate, top-K selection and the inference worker
//! - `speech`: sentence building, scheduler and audio engines
//! - `pause`: gesture-driven pause/resume
//! - `config`, `model`, `error`, `pipeline`: assembly and startup

pub mod config;
pub mod depth;
pub mod detect;
pub mod error;
pub mod frame;
pub mod fusion;
pub mod ingest;
pub mod model;
pub mod pause;
pub mod pipeline;
pub mod speech;

pub use config::VinetConfig;
pub use depth::{DepthEstimator, Distance};
pub use detect::{Detection, ObjectDetector};
pub use error::InitError;
pub use frame::{Frame, NormalizedRect, PixelFormat, RegionRect};
pub use fusion::{Finding, FusedResult};
pub use pause::{GestureSignal, PauseState};
pub use pipeline::{Components, Pipeline, PipelineStats};
