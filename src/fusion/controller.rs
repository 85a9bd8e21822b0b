use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{SyncSender, TrySendError};
use std::sync::Arc;
use std::time::Instant;

use crate::frame::Frame;
use crate::fusion::gate::RateGate;
use crate::ingest::FrameSink;
use crate::pause::PauseFlag;

/// Counters shared by the fusion controller and worker.
#[derive(Debug, Default)]
pub struct FusionStats {
    pub(crate) frames_seen: AtomicU64,
    pub(crate) frames_gated: AtomicU64,
    pub(crate) cycles_accepted: AtomicU64,
    pub(crate) cycles_dropped: AtomicU64,
    pub(crate) results_reported: AtomicU64,
    pub(crate) results_discarded: AtomicU64,
}

impl FusionStats {
    pub fn frames_seen(&self) -> u64 {
        self.frames_seen.load(Ordering::Relaxed)
    }

    /// Frames rejected by the pause flag or the rate gate.
    pub fn frames_gated(&self) -> u64 {
        self.frames_gated.load(Ordering::Relaxed)
    }

    pub fn cycles_accepted(&self) -> u64 {
        self.cycles_accepted.load(Ordering::Relaxed)
    }

    /// Accepted frames dropped because the worker was still busy.
    pub fn cycles_dropped(&self) -> u64 {
        self.cycles_dropped.load(Ordering::Relaxed)
    }

    pub fn results_reported(&self) -> u64 {
        self.results_reported.load(Ordering::Relaxed)
    }

    /// Results completed after a pause and never spoken.
    pub fn results_discarded(&self) -> u64 {
        self.results_discarded.load(Ordering::Relaxed)
    }
}

/// What the controller did with a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    Accepted,
    Paused,
    RateLimited,
    /// Passed the gate but the worker queue was full.
    Busy,
}

/// Capture-side gate in front of the fusion worker.
///
/// Runs on the capture thread. Never blocks: a frame either starts a cycle or is
/// dropped on the spot.
pub struct FusionController {
    gate: RateGate,
    paused: PauseFlag,
    cycles: SyncSender<Frame>,
    stats: Arc<FusionStats>,
}

impl FusionController {
    pub fn new(
        gate: RateGate,
        paused: PauseFlag,
        cycles: SyncSender<Frame>,
        stats: Arc<FusionStats>,
    ) -> Self {
        Self {
            gate,
            paused,
            cycles,
            stats,
        }
    }

    pub fn admit(&mut self, frame: Frame, now: Instant) -> Admission {
        self.stats.frames_seen.fetch_add(1, Ordering::Relaxed);
        if self.paused.is_paused() {
            self.stats.frames_gated.fetch_add(1, Ordering::Relaxed);
            return Admission::Paused;
        }
        if !self.gate.try_accept(now) {
            self.stats.frames_gated.fetch_add(1, Ordering::Relaxed);
            return Admission::RateLimited;
        }
        let sequence = frame.sequence;
        match self.cycles.try_send(frame) {
            Ok(()) => {
                self.stats.cycles_accepted.fetch_add(1, Ordering::Relaxed);
                log::debug!("frame {}: fusion cycle started", sequence);
                Admission::Accepted
            }
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                self.stats.cycles_dropped.fetch_add(1, Ordering::Relaxed);
                log::debug!("frame {}: fusion worker busy, cycle dropped", sequence);
                Admission::Busy
            }
        }
    }
}

impl FrameSink for FusionController {
    fn on_frame(&mut self, frame: Frame) {
        self.admit(frame, Instant::now());
    }
}
