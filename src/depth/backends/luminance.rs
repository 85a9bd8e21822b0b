use anyhow::Result;
use image::RgbImage;

use crate::depth::backend::DepthBackend;
use crate::depth::tensor::DepthTensor;

/// Synthetic depth backend: brighter pixels are treated as closer.
///
/// Emits a `[1, S, S]` inverse-depth map in `[0.2, 1.2]`. Used with synthetic sources
/// and on builds without a model runtime.
pub struct LuminanceBackend {
    input_size: u32,
}

impl LuminanceBackend {
    pub fn new(input_size: u32) -> Self {
        Self { input_size }
    }
}

impl DepthBackend for LuminanceBackend {
    fn name(&self) -> &'static str {
        "luminance"
    }

    fn input_size(&self) -> u32 {
        self.input_size
    }

    fn infer(&self, input: &RgbImage) -> Result<DepthTensor> {
        let (w, h) = input.dimensions();
        let data = input
            .pixels()
            .map(|p| {
                let luma = 0.299 * p[0] as f32 + 0.587 * p[1] as f32 + 0.114 * p[2] as f32;
                0.2 + luma / 255.0
            })
            .collect();
        DepthTensor::contiguous(vec![1, h as usize, w as usize], data)
    }
}

/// Depth backend that reports the same inverse depth everywhere.
pub struct UniformBackend {
    input_size: u32,
    inverse_depth: f32,
}

impl UniformBackend {
    pub fn new(input_size: u32, inverse_depth: f32) -> Self {
        Self {
            input_size,
            inverse_depth,
        }
    }
}

impl DepthBackend for UniformBackend {
    fn name(&self) -> &'static str {
        "uniform"
    }

    fn input_size(&self) -> u32 {
        self.input_size
    }

    fn infer(&self, input: &RgbImage) -> Result<DepthTensor> {
        let (w, h) = input.dimensions();
        DepthTensor::contiguous(
            vec![h as usize, w as usize],
            vec![self.inverse_depth; (w * h) as usize],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn brighter_regions_read_as_closer() {
        let backend = LuminanceBackend::new(8);
        let dark = RgbImage::from_pixel(8, 8, Rgb([10, 10, 10]));
        let bright = RgbImage::from_pixel(8, 8, Rgb([240, 240, 240]));

        let dark_mean = backend.infer(&dark).unwrap().central_patch_mean().unwrap();
        let bright_mean = backend.infer(&bright).unwrap().central_patch_mean().unwrap();
        assert!(bright_mean > dark_mean);
        assert!(dark_mean >= 0.2);
    }
}
