//! Fusion and throttling.
//!
//! `FusionController` sits on the capture context: it gates frames by pause state and a
//! fixed minimum interval, then hands accepted frames to `FusionWorker`. The worker runs
//! detection, picks the top-K detections, estimates their distances concurrently and
//! forwards the assembled `FusedResult` to the speech context.

mod controller;
mod cycle;
mod gate;
mod worker;

pub use controller::{Admission, FusionController, FusionStats};
pub use cycle::{run_cycle, select_top_k};
pub use gate::RateGate;
pub use worker::{FusionHandle, FusionWorker, CYCLE_QUEUE_DEPTH};

use crate::depth::Distance;
use crate::detect::Detection;

/// Default minimum interval between accepted cycles.
pub const DEFAULT_INTERVAL_MS: u64 = 2000;
/// Default number of detections paired with a distance per cycle.
pub const DEFAULT_TOP_K: usize = 3;

/// One detection paired with its estimated distance.
#[derive(Clone, Debug, PartialEq)]
pub struct Finding {
    pub detection: Detection,
    pub distance: Distance,
}

/// Findings from one accepted cycle, in descending detection confidence.
#[derive(Clone, Debug, PartialEq)]
pub struct FusedResult {
    /// Sequence number of the source frame.
    pub frame_sequence: u64,
    pub findings: Vec<Finding>,
}

impl FusedResult {
    pub fn new(frame_sequence: u64, findings: Vec<Finding>) -> Self {
        Self {
            frame_sequence,
            findings,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }
}
