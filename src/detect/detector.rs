use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::{Detection, UNKNOWN_LABEL};
use crate::frame::Frame;

/// Runs the detection model against whole frames.
///
/// Inference errors are logged and reported as "no detections": an empty result is a
/// normal per-cycle outcome, never a fatal one.
pub struct ObjectDetector {
    backend: Box<dyn DetectorBackend>,
}

impl ObjectDetector {
    pub fn new(backend: Box<dyn DetectorBackend>) -> Self {
        Self { backend }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Detect objects in `frame`.
    pub fn detect(&self, frame: &Frame) -> Vec<Detection> {
        let input = stretch_to_input(frame, self.backend.input_size());
        match self.backend.detect(&input) {
            Ok(detections) => detections.into_iter().filter_map(sanitize).collect(),
            Err(e) => {
                log::warn!("{} detection failed: {:#}", self.backend.name(), e);
                Vec::new()
            }
        }
    }
}

/// Scale the whole frame to the model input, ignoring aspect ratio.
fn stretch_to_input(frame: &Frame, (width, height): (u32, u32)) -> RgbImage {
    let rgb = frame.to_rgb_image();
    if rgb.dimensions() == (width, height) {
        return rgb;
    }
    imageops::resize(&rgb, width, height, FilterType::Triangle)
}

fn sanitize(mut detection: Detection) -> Option<Detection> {
    if !detection.confidence.is_finite() || !detection.bbox.is_finite() {
        return None;
    }
    detection.confidence = detection.confidence.clamp(0.0, 1.0);
    if detection.label.trim().is_empty() {
        detection.label = UNKNOWN_LABEL.to_string();
    }
    Some(detection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::backends::{Scripted, ScriptedBackend};
    use crate::frame::{NormalizedRect, PixelFormat};

    fn frame() -> Frame {
        Frame::new(vec![128; 64 * 48 * 3], 64, 48, PixelFormat::Rgb8).unwrap()
    }

    #[test]
    fn inference_failure_yields_empty_result() {
        let detector = ObjectDetector::new(Box::new(ScriptedBackend::new(vec![
            Scripted::Failure("model crashed".into()),
        ])));
        assert!(detector.detect(&frame()).is_empty());
    }

    #[test]
    fn detections_are_sanitized() {
        let bbox = NormalizedRect::new(0.1, 0.1, 0.2, 0.2);
        let detector = ObjectDetector::new(Box::new(ScriptedBackend::repeating(vec![
            Detection::new("", 1.4, bbox),
            Detection::new("cup", f32::NAN, bbox),
            Detection::new("door", 0.5, bbox),
        ])));

        let detections = detector.detect(&frame());
        assert_eq!(detections.len(), 2);
        assert_eq!(detections[0].label, UNKNOWN_LABEL);
        assert_eq!(detections[0].confidence, 1.0);
        assert_eq!(detections[1].label, "door");
    }

    #[test]
    fn non_finite_boxes_are_dropped() {
        let detector = ObjectDetector::new(Box::new(ScriptedBackend::repeating(vec![
            Detection::new("ghost", 0.9, NormalizedRect::new(f32::NAN, 0.4, 0.2, 0.2)),
            Detection::new("chair", 0.8, NormalizedRect::new(0.1, 0.4, 0.2, f32::INFINITY)),
            Detection::new("door", 0.7, NormalizedRect::new(0.6, 0.2, 0.3, 0.5)),
        ])));

        let detections = detector.detect(&frame());
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].label, "door");
    }

    #[test]
    fn stretch_ignores_aspect_ratio() {
        let resized = stretch_to_input(&frame(), (20, 20));
        assert_eq!(resized.dimensions(), (20, 20));
    }
}
