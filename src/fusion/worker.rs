use anyhow::{anyhow, Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::depth::DepthEstimator;
use crate::detect::ObjectDetector;
use crate::frame::Frame;
use crate::fusion::controller::FusionStats;
use crate::fusion::cycle::run_cycle;
use crate::fusion::FusedResult;
use crate::pause::PauseFlag;
use crate::speech::SpeechSender;

/// Frames waiting behind the running cycle. Anything beyond this is dropped.
pub const CYCLE_QUEUE_DEPTH: usize = 1;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Runs fusion cycles off the capture thread and forwards results to speech.
pub struct FusionWorker {
    detector: ObjectDetector,
    estimator: DepthEstimator,
    top_k: usize,
    paused: PauseFlag,
    speech: SpeechSender,
}

impl FusionWorker {
    pub fn new(
        detector: ObjectDetector,
        estimator: DepthEstimator,
        top_k: usize,
        paused: PauseFlag,
        speech: SpeechSender,
    ) -> Self {
        Self {
            detector,
            estimator,
            top_k,
            paused,
            speech,
        }
    }

    /// Run one cycle and report the result unless guidance was paused meanwhile.
    pub fn process(&self, frame: &Frame, stats: &FusionStats) -> Option<FusedResult> {
        let result = run_cycle(&self.detector, &self.estimator, self.top_k, frame)?;
        if self.paused.is_paused() {
            stats.results_discarded.fetch_add(1, Ordering::Relaxed);
            log::debug!("frame {}: paused, result discarded", frame.sequence);
            return None;
        }
        match self.speech.report(result.clone()) {
            Ok(()) => {
                stats.results_reported.fetch_add(1, Ordering::Relaxed);
                Some(result)
            }
            Err(err) => {
                log::warn!("dropping fused result: {}", err);
                None
            }
        }
    }

    pub fn spawn(self, cycles: Receiver<Frame>, stats: Arc<FusionStats>) -> Result<FusionHandle> {
        log::info!(
            "fusion worker started (detector={}, depth={}, top_k={})",
            self.detector.backend_name(),
            self.estimator.backend_name(),
            self.top_k
        );
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_thread = shutdown.clone();
        let join = std::thread::Builder::new()
            .name("vinet-fusion".into())
            .spawn(move || {
                while !shutdown_thread.load(Ordering::SeqCst) {
                    match cycles.recv_timeout(POLL_INTERVAL) {
                        Ok(frame) => {
                            self.process(&frame, &stats);
                        }
                        Err(RecvTimeoutError::Timeout) => continue,
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                log::debug!("fusion worker exiting");
            })
            .context("failed to spawn fusion worker")?;
        Ok(FusionHandle {
            shutdown,
            join: Some(join),
        })
    }
}

#[derive(Debug)]
pub struct FusionHandle {
    shutdown: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl FusionHandle {
    /// Stop after the running cycle, if any, completes.
    pub fn stop(mut self) -> Result<()> {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(join) = self.join.take() {
            join.join()
                .map_err(|_| anyhow!("fusion worker thread panicked"))?;
        }
        Ok(())
    }
}
