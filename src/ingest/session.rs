use anyhow::{anyhow, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::ingest::source::{FrameSink, FrameSource, SourceStats};
use crate::pause::CaptureControl;

/// Back-off after a failed capture.
const CAPTURE_RETRY: Duration = Duration::from_millis(200);

/// Capture loop delivering frames from a source to a sink at the source's target rate.
///
/// The session can be stopped and started again; the source is reconnected on each
/// start. Frames are delivered on a dedicated capture thread and the sink must return
/// quickly.
pub struct CameraSession {
    source: Arc<Mutex<Box<dyn FrameSource>>>,
    sink: Arc<Mutex<Box<dyn FrameSink>>>,
    frame_interval: Duration,
    running: Option<Capture>,
}

struct Capture {
    shutdown: Arc<AtomicBool>,
    join: JoinHandle<()>,
}

impl CameraSession {
    pub fn new(source: Box<dyn FrameSource>, sink: Box<dyn FrameSink>, target_fps: u32) -> Self {
        Self {
            source: Arc::new(Mutex::new(source)),
            sink: Arc::new(Mutex::new(sink)),
            frame_interval: Duration::from_secs_f64(1.0 / target_fps.max(1) as f64),
            running: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    pub fn source_stats(&self) -> Option<SourceStats> {
        self.source.lock().ok().map(|source| source.stats())
    }

    pub fn start(&mut self) -> Result<()> {
        if self.running.is_some() {
            return Ok(());
        }
        let name = {
            let mut source = self
                .source
                .lock()
                .map_err(|_| anyhow!("frame source lock poisoned"))?;
            source.connect()?;
            source.name()
        };

        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_thread = shutdown.clone();
        let source = self.source.clone();
        let sink = self.sink.clone();
        let frame_interval = self.frame_interval;
        let join = std::thread::Builder::new()
            .name("vinet-capture".into())
            .spawn(move || {
                if let Err(err) = run_capture(source, sink, frame_interval, shutdown_thread) {
                    log::error!("capture loop stopped: {}", err);
                }
            })?;
        log::info!("camera session started ({} source)", name);
        self.running = Some(Capture { shutdown, join });
        Ok(())
    }

    /// Stop capturing and wait for the capture thread. No frame is delivered after
    /// this returns.
    pub fn stop(&mut self) -> Result<()> {
        let Some(capture) = self.running.take() else {
            return Ok(());
        };
        capture.shutdown.store(true, Ordering::SeqCst);
        capture
            .join
            .join()
            .map_err(|_| anyhow!("capture thread panicked"))?;
        log::info!("camera session stopped");
        Ok(())
    }
}

impl CaptureControl for CameraSession {
    fn start(&mut self) -> Result<()> {
        CameraSession::start(self)
    }

    fn stop(&mut self) -> Result<()> {
        CameraSession::stop(self)
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        if let Err(err) = CameraSession::stop(self) {
            log::warn!("camera session did not stop cleanly: {}", err);
        }
    }
}

fn run_capture(
    source: Arc<Mutex<Box<dyn FrameSource>>>,
    sink: Arc<Mutex<Box<dyn FrameSink>>>,
    frame_interval: Duration,
    shutdown: Arc<AtomicBool>,
) -> Result<()> {
    while !shutdown.load(Ordering::SeqCst) {
        let started = Instant::now();
        let next = source
            .lock()
            .map_err(|_| anyhow!("frame source lock poisoned"))?
            .next_frame();
        match next {
            Ok(frame) => {
                sink.lock()
                    .map_err(|_| anyhow!("frame sink lock poisoned"))?
                    .on_frame(frame);
                if let Some(rest) = frame_interval.checked_sub(started.elapsed()) {
                    std::thread::sleep(rest);
                }
            }
            Err(err) => {
                log::warn!("frame capture failed: {}", err);
                std::thread::sleep(CAPTURE_RETRY);
            }
        }
    }
    Ok(())
}
