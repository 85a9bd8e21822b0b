use anyhow::Result;
use image::RgbImage;

use crate::detect::result::Detection;

/// Detector backend trait.
///
/// Implementations hold a loaded model and must be safe to call from any thread.
/// They receive the full frame already stretched to `input_size()` (aspect ratio is
/// not preserved) and return boxes normalized to that input, origin bottom-left.
pub trait DetectorBackend: Send + Sync {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Model input resolution as (width, height).
    fn input_size(&self) -> (u32, u32);

    /// Run detection on a stretched RGB input.
    ///
    /// The image is borrowed for the call only and must not be retained.
    fn detect(&self, input: &RgbImage) -> Result<Vec<Detection>>;

    /// Optional warm-up hook.
    fn warm_up(&self) -> Result<()> {
        Ok(())
    }
}
