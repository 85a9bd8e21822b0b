//! Monocular depth estimation.
//!
//! Pipeline per detection: clip the box to the frame, crop and stretch the region to
//! the model's square input, run the depth model, average the central 50%×50% of the
//! inverse-depth map, and calibrate to centimetres.
//!
//! The calibration is an empirical fit (`distance = C / mean_inverse_depth`), not a
//! physical model derived from camera intrinsics. Treat results as guidance only.

mod backend;
mod backends;
mod estimator;
mod tensor;

pub use backend::DepthBackend;
pub use backends::{LuminanceBackend, UniformBackend};
#[cfg(feature = "backend-tract")]
pub use backends::TractDepthBackend;
pub use estimator::{calibrate, DepthEstimator, Distance, DEFAULT_CALIBRATION};
pub use tensor::DepthTensor;
