use anyhow::{anyhow, Result};
use image::RgbImage;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::detect::backend::DetectorBackend;
use crate::detect::result::Detection;
use crate::frame::NormalizedRect;

/// One scripted response.
#[derive(Clone, Debug)]
pub enum Scripted {
    Detections(Vec<Detection>),
    Failure(String),
}

/// Deterministic backend that replays scripted responses in order, wrapping around.
///
/// Used by the demo binary and by tests. Pixels are ignored.
pub struct ScriptedBackend {
    script: Vec<Scripted>,
    calls: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new(script: Vec<Scripted>) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
        }
    }

    /// Always return the same detections.
    pub fn repeating(detections: Vec<Detection>) -> Self {
        Self::new(vec![Scripted::Detections(detections)])
    }

    /// A small rotating indoor scene for demos and the default daemon config.
    pub fn demo() -> Self {
        let rect = NormalizedRect::new;
        Self::new(vec![
            Scripted::Detections(vec![
                Detection::new("chair", 0.91, rect(0.08, 0.30, 0.20, 0.35)),
                Detection::new("table", 0.74, rect(0.40, 0.20, 0.25, 0.30)),
            ]),
            Scripted::Detections(vec![Detection::new("person", 0.88, rect(0.42, 0.15, 0.18, 0.70))]),
            Scripted::Detections(Vec::new()),
            Scripted::Detections(vec![
                Detection::new("door", 0.67, rect(0.72, 0.05, 0.22, 0.85)),
                Detection::new("cup", 0.52, rect(0.45, 0.40, 0.06, 0.08)),
                Detection::new("bottle", 0.33, rect(0.20, 0.45, 0.04, 0.10)),
                Detection::new("plant", 0.21, rect(0.02, 0.10, 0.10, 0.30)),
            ]),
        ])
    }

    /// Number of `detect` calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DetectorBackend for ScriptedBackend {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn input_size(&self) -> (u32, u32) {
        (32, 32)
    }

    fn detect(&self, _input: &RgbImage) -> Result<Vec<Detection>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.script.is_empty() {
            return Ok(Vec::new());
        }
        match &self.script[call % self.script.len()] {
            Scripted::Detections(detections) => Ok(detections.clone()),
            Scripted::Failure(reason) => Err(anyhow!("scripted failure: {}", reason)),
        }
    }
}
