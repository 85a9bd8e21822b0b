//! Pause/resume control.
//!
//! A pause gesture stops the camera session and raises the shared `PauseFlag`; resume
//! restarts capture and lowers it. Requests that match the current state are no-ops.

use anyhow::{anyhow, Result};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared pause indicator, read by the fusion controller and worker.
#[derive(Clone, Debug, Default)]
pub struct PauseFlag(Arc<AtomicBool>);

impl PauseFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_paused(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub(crate) fn set(&self, paused: bool) {
        self.0.store(paused, Ordering::SeqCst);
    }
}

/// Something that can be stopped and restarted, normally a camera session.
pub trait CaptureControl {
    fn start(&mut self) -> Result<()>;
    fn stop(&mut self) -> Result<()>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PauseState {
    Running,
    Paused,
}

/// Gesture-originated control signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureSignal {
    PauseRequested,
    ResumeRequested,
}

impl FromStr for GestureSignal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pause" | "p" | "double-tap" => Ok(Self::PauseRequested),
            "resume" | "r" | "tap" => Ok(Self::ResumeRequested),
            other => Err(anyhow!("unknown gesture '{}'", other)),
        }
    }
}

pub struct PauseController<C: CaptureControl> {
    state: PauseState,
    flag: PauseFlag,
    capture: C,
}

impl<C: CaptureControl> PauseController<C> {
    /// Starts in `Running`; the caller is responsible for having started `capture`.
    pub fn new(capture: C, flag: PauseFlag) -> Self {
        Self {
            state: PauseState::Running,
            flag,
            capture,
        }
    }

    pub fn state(&self) -> PauseState {
        self.state
    }

    pub fn flag(&self) -> &PauseFlag {
        &self.flag
    }

    pub fn capture(&self) -> &C {
        &self.capture
    }

    pub fn capture_mut(&mut self) -> &mut C {
        &mut self.capture
    }

    /// Returns whether the state changed.
    pub fn handle(&mut self, signal: GestureSignal) -> Result<bool> {
        match signal {
            GestureSignal::PauseRequested => self.pause_requested(),
            GestureSignal::ResumeRequested => self.resume_requested(),
        }
    }

    pub fn pause_requested(&mut self) -> Result<bool> {
        if self.state == PauseState::Paused {
            return Ok(false);
        }
        // Raise the flag first so in-flight cycles are discarded.
        self.flag.set(true);
        self.state = PauseState::Paused;
        self.capture.stop()?;
        log::info!("guidance paused");
        Ok(true)
    }

    pub fn resume_requested(&mut self) -> Result<bool> {
        if self.state == PauseState::Running {
            return Ok(false);
        }
        self.capture.start()?;
        self.flag.set(false);
        self.state = PauseState::Running;
        log::info!("guidance resumed");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeCapture {
        running: bool,
        starts: usize,
        stops: usize,
        fail_start: bool,
    }

    impl CaptureControl for FakeCapture {
        fn start(&mut self) -> Result<()> {
            if self.fail_start {
                return Err(anyhow!("camera unplugged"));
            }
            self.running = true;
            self.starts += 1;
            Ok(())
        }

        fn stop(&mut self) -> Result<()> {
            self.running = false;
            self.stops += 1;
            Ok(())
        }
    }

    fn controller() -> PauseController<FakeCapture> {
        let capture = FakeCapture {
            running: true,
            ..FakeCapture::default()
        };
        PauseController::new(capture, PauseFlag::new())
    }

    #[test]
    fn pause_then_resume() {
        let mut c = controller();
        assert!(c.pause_requested().unwrap());
        assert_eq!(c.state(), PauseState::Paused);
        assert!(c.flag().is_paused());
        assert!(!c.capture().running);

        assert!(c.resume_requested().unwrap());
        assert_eq!(c.state(), PauseState::Running);
        assert!(!c.flag().is_paused());
        assert!(c.capture().running);
    }

    #[test]
    fn repeated_requests_are_noops() {
        let mut c = controller();
        assert!(!c.resume_requested().unwrap());
        assert!(c.pause_requested().unwrap());
        assert!(!c.pause_requested().unwrap());
        assert_eq!(c.capture().stops, 1);
        assert!(c.resume_requested().unwrap());
        assert!(!c.resume_requested().unwrap());
        assert_eq!(c.capture().starts, 1);
    }

    #[test]
    fn failed_resume_stays_paused() {
        let mut c = controller();
        c.pause_requested().unwrap();
        c.capture_mut().fail_start = true;
        assert!(c.resume_requested().is_err());
        assert_eq!(c.state(), PauseState::Paused);
        assert!(c.flag().is_paused());
    }

    #[test]
    fn gestures_parse() {
        assert_eq!("pause".parse::<GestureSignal>().unwrap(), GestureSignal::PauseRequested);
        assert_eq!(" R\n".parse::<GestureSignal>().unwrap(), GestureSignal::ResumeRequested);
        assert_eq!("double-tap".parse::<GestureSignal>().unwrap(), GestureSignal::PauseRequested);
        assert!("wave".parse::<GestureSignal>().is_err());

        let mut c = controller();
        assert!(c.handle(GestureSignal::PauseRequested).unwrap());
        assert!(c.handle(GestureSignal::ResumeRequested).unwrap());
    }
}
