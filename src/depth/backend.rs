use anyhow::Result;
use image::RgbImage;

use crate::depth::tensor::DepthTensor;

/// Depth model backend.
///
/// Implementations are read-only after construction and may be called concurrently.
pub trait DepthBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Side of the square model input, in pixels.
    fn input_size(&self) -> u32;

    /// Run the model on an `input_size()`×`input_size()` RGB region and return the
    /// inverse-depth map (rank 2 to 4, trailing dimensions height × width).
    fn infer(&self, input: &RgbImage) -> Result<DepthTensor>;
}
