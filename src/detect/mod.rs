//! Object detection.
//!
//! `ObjectDetector` runs a `DetectorBackend` over whole frames and absorbs inference
//! failures into an empty result. Backends are loaded once and are read-only afterwards.

mod backend;
mod backends;
mod detector;
mod result;

pub use backend::DetectorBackend;
pub use backends::{Scripted, ScriptedBackend};
#[cfg(feature = "backend-tract")]
pub use backends::TractBackend;
pub use detector::ObjectDetector;
pub use result::{Detection, UNKNOWN_LABEL};
