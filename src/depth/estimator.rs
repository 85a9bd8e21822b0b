use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::depth::backend::DepthBackend;
use crate::frame::{Frame, NormalizedRect, RegionRect};

/// Default calibration constant `C` in `distance_cm = C / mean_inverse_depth`.
pub const DEFAULT_CALIBRATION: f64 = 100.0;

/// Estimated distance to an object, in centimetres. Always positive and finite.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Distance(f64);

impl Distance {
    /// Accepts only positive, finite values.
    pub fn from_centimetres(cm: f64) -> Option<Self> {
        (cm.is_finite() && cm > 0.0).then_some(Self(cm))
    }

    pub fn centimetres(self) -> f64 {
        self.0
    }
}

/// Convert a mean inverse depth to a distance with calibration constant `c`.
///
/// A zero, negative or non-finite mean has no meaningful distance and yields `None`.
pub fn calibrate(mean_inverse_depth: f32, c: f64) -> Option<Distance> {
    let m = mean_inverse_depth as f64;
    if !(m.is_finite() && m > 0.0) {
        return None;
    }
    Distance::from_centimetres(c / m)
}

/// Estimates the distance of a detected object from one frame.
pub struct DepthEstimator {
    backend: Box<dyn DepthBackend>,
    calibration: f64,
}

impl DepthEstimator {
    pub fn new(backend: Box<dyn DepthBackend>) -> Self {
        Self {
            backend,
            calibration: DEFAULT_CALIBRATION,
        }
    }

    /// Override the calibration constant.
    pub fn with_calibration(mut self, calibration: f64) -> Self {
        self.calibration = calibration;
        self
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Estimate the distance to the object inside `bbox`.
    ///
    /// Returns `None` when the box misses the frame, inference fails, or the
    /// reduced inverse depth cannot be calibrated.
    pub fn estimate_distance(&self, frame: &Frame, bbox: &NormalizedRect) -> Option<Distance> {
        let region = bbox.to_region(frame.width, frame.height)?;
        let input = self.region_input(frame, &region)?;
        let tensor = match self.backend.infer(&input) {
            Ok(tensor) => tensor,
            Err(e) => {
                log::warn!("{} depth inference failed: {:#}", self.backend.name(), e);
                return None;
            }
        };
        let mean = tensor.central_patch_mean()?;
        let distance = calibrate(mean, self.calibration);
        if distance.is_none() {
            log::debug!("discarding uncalibratable inverse depth {}", mean);
        }
        distance
    }

    /// Crop `region` out of the frame and stretch it to the model's square input.
    fn region_input(&self, frame: &Frame, region: &RegionRect) -> Option<RgbImage> {
        let (x, y, w, h) = region.pixel_bounds(frame.width, frame.height)?;
        let crop = frame.crop_rgb(x, y, w, h);
        let side = self.backend.input_size();
        if (w, h) == (side, side) {
            return Some(crop);
        }
        Some(imageops::resize(&crop, side, side, FilterType::Triangle))
    }
}
