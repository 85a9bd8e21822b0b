use crate::depth::{DepthEstimator, Distance};
use crate::detect::{Detection, ObjectDetector};
use crate::frame::Frame;
use crate::fusion::{Finding, FusedResult};

/// Keep the `k` most confident detections, most confident first.
///
/// Ties keep their detector order. NaN confidences sort last.
pub fn select_top_k(mut detections: Vec<Detection>, k: usize) -> Vec<Detection> {
    detections.sort_by(|a, b| match (a.confidence.is_nan(), b.confidence.is_nan()) {
        (false, false) => b.confidence.total_cmp(&a.confidence),
        (a_nan, b_nan) => a_nan.cmp(&b_nan),
    });
    detections.truncate(k);
    detections
}

/// Run one fusion cycle on `frame`.
///
/// Detections without a usable distance are dropped. Returns `None` when nothing
/// survives, so no empty sentence ever reaches the speech context.
pub fn run_cycle(
    detector: &ObjectDetector,
    estimator: &DepthEstimator,
    top_k: usize,
    frame: &Frame,
) -> Option<FusedResult> {
    let detections = detector.detect(frame);
    if detections.is_empty() {
        log::debug!("frame {}: no detections", frame.sequence);
        return None;
    }
    let selected = select_top_k(detections, top_k);
    let distances = estimate_all(estimator, frame, &selected);

    let findings: Vec<Finding> = selected
        .into_iter()
        .zip(distances)
        .filter_map(|(detection, distance)| match distance {
            Some(distance) => Some(Finding {
                detection,
                distance,
            }),
            None => {
                log::debug!(
                    "frame {}: no distance for {} ({:.2})",
                    frame.sequence,
                    detection.label,
                    detection.confidence
                );
                None
            }
        })
        .collect();

    if findings.is_empty() {
        return None;
    }
    Some(FusedResult::new(frame.sequence, findings))
}

/// Estimate every distance concurrently, returning them in input order.
fn estimate_all(
    estimator: &DepthEstimator,
    frame: &Frame,
    detections: &[Detection],
) -> Vec<Option<Distance>> {
    if detections.len() <= 1 {
        return detections
            .iter()
            .map(|d| estimator.estimate_distance(frame, &d.bbox))
            .collect();
    }

    std::thread::scope(|scope| {
        let tasks: Vec<_> = detections
            .iter()
            .map(|d| {
                std::thread::Builder::new()
                    .name("vinet-depth".into())
                    .spawn_scoped(scope, move || estimator.estimate_distance(frame, &d.bbox))
                    .map_err(|e| (d, e))
            })
            .collect();

        tasks
            .into_iter()
            .map(|task| match task {
                Ok(handle) => handle.join().unwrap_or_else(|_| {
                    log::warn!("depth estimation thread panicked");
                    None
                }),
                Err((d, e)) => {
                    log::warn!("could not spawn depth task, estimating inline: {}", e);
                    estimator.estimate_distance(frame, &d.bbox)
                }
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::depth::UniformBackend;
    use crate::detect::{Scripted, ScriptedBackend};
    use crate::frame::{NormalizedRect, PixelFormat};

    fn det(label: &str, confidence: f32) -> Detection {
        Detection::new(label, confidence, NormalizedRect::new(0.4, 0.4, 0.2, 0.2))
    }

    fn frame() -> Frame {
        Frame::new(vec![0; 64 * 48], 64, 48, PixelFormat::Gray8)
            .unwrap()
            .with_sequence(7)
    }

    fn labels(detections: &[Detection]) -> Vec<&str> {
        detections.iter().map(|d| d.label.as_str()).collect()
    }

    #[test]
    fn top_k_orders_by_confidence() {
        let picked = select_top_k(
            vec![
                det("a", 0.3),
                det("b", 0.9),
                det("c", f32::NAN),
                det("d", 0.5),
                det("e", 0.7),
            ],
            3,
        );
        assert_eq!(labels(&picked), vec!["b", "e", "d"]);
    }

    #[test]
    fn top_k_handles_short_lists() {
        assert!(select_top_k(vec![], 3).is_empty());
        let picked = select_top_k(vec![det("a", 0.3), det("b", 0.3)], 3);
        assert_eq!(labels(&picked), vec!["a", "b"]);
    }

    #[test]
    fn cycle_pairs_detections_with_distances() {
        let detector = ObjectDetector::new(Box::new(ScriptedBackend::repeating(vec![
            det("cup", 0.4),
            det("chair", 0.9),
            det("door", 0.2),
            Detection::new("lamp", 0.6, NormalizedRect::new(0.7, 0.1, 0.2, 0.3)),
        ])));
        let estimator =
            DepthEstimator::new(Box::new(UniformBackend::new(8, 0.5))).with_calibration(50.0);

        let result = run_cycle(&detector, &estimator, 3, &frame()).unwrap();
        assert_eq!(result.frame_sequence, 7);
        let picked: Vec<_> = result
            .findings
            .iter()
            .map(|f| (f.detection.label.as_str(), f.distance.centimetres()))
            .collect();
        assert_eq!(picked, vec![("chair", 100.0), ("lamp", 100.0), ("cup", 100.0)]);
    }

    #[test]
    fn boxes_outside_frame_are_dropped() {
        let detector = ObjectDetector::new(Box::new(ScriptedBackend::repeating(vec![
            Detection::new("ghost", 0.9, NormalizedRect::new(2.0, 2.0, 0.1, 0.1)),
            Detection::new("smear", 0.8, NormalizedRect::new(f32::NAN, 0.4, 0.2, 0.2)),
            det("cup", 0.4),
        ])));
        let estimator = DepthEstimator::new(Box::new(UniformBackend::new(8, 1.0)));
        let result = run_cycle(&detector, &estimator, 3, &frame()).unwrap();
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].detection.label, "cup");
    }

    #[test]
    fn nothing_usable_yields_none() {
        let estimator = DepthEstimator::new(Box::new(UniformBackend::new(8, 1.0)));
        let empty = ObjectDetector::new(Box::new(ScriptedBackend::repeating(vec![])));
        assert!(run_cycle(&empty, &estimator, 3, &frame()).is_none());

        let failing = ObjectDetector::new(Box::new(ScriptedBackend::new(vec![Scripted::Failure(
            "model crashed".into(),
        )])));
        assert!(run_cycle(&failing, &estimator, 3, &frame()).is_none());

        let zero = DepthEstimator::new(Box::new(UniformBackend::new(8, 0.0)));
        let detector = ObjectDetector::new(Box::new(ScriptedBackend::repeating(vec![det("cup", 0.4)])));
        assert!(run_cycle(&detector, &zero, 3, &frame()).is_none());
    }
}
