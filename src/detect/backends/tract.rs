#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::RgbImage;
use tract_onnx::prelude::*;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::{Detection, UNKNOWN_LABEL};
use crate::frame::NormalizedRect;

const MAX_DETECTIONS: usize = 20;

/// Tract-based YOLOv8 detector.
///
/// Expects an ONNX model with input `[1, 3, H, W]` (RGB, 0..1) and output
/// `[1, 4 + C, N]` where each column is `cx, cy, w, h, score_0 .. score_C` in input pixels.
pub struct TractBackend {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>>,
    labels: Vec<String>,
    width: u32,
    height: u32,
    confidence_threshold: f32,
    iou_threshold: f32,
}

impl TractBackend {
    /// Load an ONNX model from disk and prepare it for inference.
    pub fn new<P: AsRef<Path>>(
        model_path: P,
        labels: Vec<String>,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let model_path = model_path.as_ref();
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(1, 3, height as usize, width as usize),
                ),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self {
            model,
            labels,
            width,
            height,
            confidence_threshold: 0.25,
            iou_threshold: 0.45,
        })
    }

    /// Override the default confidence and NMS IoU thresholds.
    pub fn with_thresholds(mut self, confidence: f32, iou: f32) -> Self {
        self.confidence_threshold = confidence;
        self.iou_threshold = iou;
        self
    }

    fn build_input(&self, input: &RgbImage) -> Result<Tensor> {
        if input.dimensions() != (self.width, self.height) {
            return Err(anyhow!(
                "input size {}x{} does not match model input {}x{}",
                input.width(),
                input.height(),
                self.width,
                self.height
            ));
        }
        let tensor = tract_ndarray::Array4::from_shape_fn(
            (1, 3, self.height as usize, self.width as usize),
            |(_, channel, y, x)| input.get_pixel(x as u32, y as u32)[channel] as f32 / 255.0,
        );
        Ok(tensor.into_tensor())
    }

    fn decode(&self, outputs: TVec<TValue>) -> Result<Vec<Detection>> {
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let view = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?
            .into_dimensionality::<tract_ndarray::Ix3>()
            .context("expected a [1, 4 + C, N] output")?;

        let rows = view.shape()[1];
        let proposals = view.shape()[2];
        if rows <= 4 {
            return Err(anyhow!("output has no class scores ({} rows)", rows));
        }
        let sx = self.width as f32;
        let sy = self.height as f32;

        let mut candidates: Vec<(usize, Detection)> = Vec::new();
        for i in 0..proposals {
            let (class, score) = (4..rows)
                .map(|r| (r - 4, view[[0, r, i]]))
                .fold((0, f32::NEG_INFINITY), |best, cur| {
                    if cur.1 > best.1 {
                        cur
                    } else {
                        best
                    }
                });
            if !score.is_finite() || score < self.confidence_threshold {
                continue;
            }
            let cx = view[[0, 0, i]];
            let cy = view[[0, 1, i]];
            let w = view[[0, 2, i]];
            let h = view[[0, 3, i]];

            let left = ((cx - w / 2.0) / sx).clamp(0.0, 1.0);
            let right = ((cx + w / 2.0) / sx).clamp(0.0, 1.0);
            let top = ((cy - h / 2.0) / sy).clamp(0.0, 1.0);
            let bottom = ((cy + h / 2.0) / sy).clamp(0.0, 1.0);
            // Raster top-left origin to normalized bottom-left origin.
            let bbox = NormalizedRect::new(left, 1.0 - bottom, right - left, bottom - top);

            let label = self
                .labels
                .get(class)
                .cloned()
                .unwrap_or_else(|| UNKNOWN_LABEL.to_string());
            candidates.push((class, Detection::new(label, score, bbox)));
        }

        Ok(non_max_suppression(candidates, self.iou_threshold))
    }
}

impl DetectorBackend for TractBackend {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn input_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn detect(&self, input: &RgbImage) -> Result<Vec<Detection>> {
        let tensor = self.build_input(input)?;
        let outputs = self
            .model
            .run(tvec!(tensor.into()))
            .context("ONNX inference failed")?;
        self.decode(outputs)
    }

    fn warm_up(&self) -> Result<()> {
        let blank = RgbImage::new(self.width, self.height);
        self.detect(&blank).map(|_| ())
    }
}

/// Class-wise greedy NMS, highest score first.
fn non_max_suppression(mut candidates: Vec<(usize, Detection)>, iou_threshold: f32) -> Vec<Detection> {
    candidates.sort_by(|a, b| b.1.confidence.total_cmp(&a.1.confidence));
    let mut kept: Vec<(usize, Detection)> = Vec::new();
    for (class, det) in candidates {
        let suppressed = kept
            .iter()
            .any(|(k_class, k)| *k_class == class && iou(&k.bbox, &det.bbox) > iou_threshold);
        if !suppressed {
            kept.push((class, det));
            if kept.len() == MAX_DETECTIONS {
                break;
            }
        }
    }
    kept.into_iter().map(|(_, det)| det).collect()
}

fn iou(a: &NormalizedRect, b: &NormalizedRect) -> f32 {
    let ix = (a.x + a.w).min(b.x + b.w) - a.x.max(b.x);
    let iy = (a.y + a.h).min(b.y + b.h) - a.y.max(b.y);
    if ix <= 0.0 || iy <= 0.0 {
        return 0.0;
    }
    let inter = ix * iy;
    let union = a.w * a.h + b.w * b.h - inter;
    if union <= 0.0 {
        0.0
    } else {
        inter / union
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nms_keeps_best_of_overlapping_same_class() {
        let a = Detection::new("chair", 0.9, NormalizedRect::new(0.1, 0.1, 0.3, 0.3));
        let b = Detection::new("chair", 0.7, NormalizedRect::new(0.12, 0.1, 0.3, 0.3));
        let c = Detection::new("cup", 0.6, NormalizedRect::new(0.12, 0.1, 0.3, 0.3));

        let kept = non_max_suppression(vec![(0, b), (0, a.clone()), (2, c.clone())], 0.45);
        assert_eq!(kept, vec![a, c]);
    }
}
