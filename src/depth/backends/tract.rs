#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::RgbImage;
use tract_onnx::prelude::*;

use crate::depth::backend::DepthBackend;
use crate::depth::tensor::DepthTensor;

/// Tract-based monocular depth backend (FastDepth-style, square RGB input).
///
/// Reads the first model output as the inverse-depth map.
pub struct TractDepthBackend {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>>,
    input_size: u32,
}

impl TractDepthBackend {
    pub fn new<P: AsRef<Path>>(model_path: P, input_size: u32) -> Result<Self> {
        let model_path = model_path.as_ref();
        let side = input_size as usize;
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, side, side)),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;
        log::info!(
            "depth model {} ready ({}x{} input)",
            model_path.display(),
            input_size,
            input_size
        );
        Ok(Self { model, input_size })
    }
}

impl DepthBackend for TractDepthBackend {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn input_size(&self) -> u32 {
        self.input_size
    }

    fn infer(&self, input: &RgbImage) -> Result<DepthTensor> {
        let side = self.input_size as usize;
        if input.dimensions() != (self.input_size, self.input_size) {
            return Err(anyhow!(
                "region size {}x{} does not match model input {}x{}",
                input.width(),
                input.height(),
                side,
                side
            ));
        }
        let tensor = tract_ndarray::Array4::from_shape_fn((1, 3, side, side), |(_, c, y, x)| {
            input.get_pixel(x as u32, y as u32)[c] as f32 / 255.0
        })
        .into_tensor();

        let outputs = self
            .model
            .run(tvec!(tensor.into()))
            .context("depth inference failed")?;
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("depth model produced no outputs"))?;
        let shape = output.shape().to_vec();
        let data = output
            .as_slice::<f32>()
            .context("depth output tensor was not f32")?
            .to_vec();
        DepthTensor::contiguous(shape, data)
    }
}
