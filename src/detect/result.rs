use crate::frame::NormalizedRect;

/// Label used when a model output carries no class label.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// One labeled, confidence-scored box.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub label: String,
    /// Confidence in [0, 1].
    pub confidence: f32,
    /// Normalized bounding box, origin bottom-left.
    pub bbox: NormalizedRect,
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f32, bbox: NormalizedRect) -> Self {
        Self {
            label: label.into(),
            confidence,
            bbox,
        }
    }
}
