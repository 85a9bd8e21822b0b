use std::time::{Duration, Instant};

/// Minimum-interval admission check.
///
/// `last_run` is recorded at acceptance, before any work is dispatched, so a burst of
/// frames cannot start overlapping cycles.
#[derive(Clone, Debug)]
pub struct RateGate {
    interval: Duration,
    last_run: Option<Instant>,
}

impl RateGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_run: None,
        }
    }

    pub fn last_run(&self) -> Option<Instant> {
        self.last_run
    }

    /// Accept if at least `interval` has passed since the last accepted cycle.
    pub fn try_accept(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_run {
            if now.saturating_duration_since(last) < self.interval {
                return false;
            }
        }
        self.last_run = Some(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_frame_is_accepted() {
        let mut gate = RateGate::new(Duration::from_secs(2));
        assert!(gate.try_accept(Instant::now()));
    }

    #[test]
    fn frames_inside_interval_are_rejected() {
        let t0 = Instant::now();
        let mut gate = RateGate::new(Duration::from_secs(2));
        assert!(gate.try_accept(t0));
        assert!(!gate.try_accept(t0 + Duration::from_millis(500)));
        assert!(!gate.try_accept(t0 + Duration::from_millis(1999)));
        assert!(gate.try_accept(t0 + Duration::from_secs(2)));
        assert_eq!(gate.last_run(), Some(t0 + Duration::from_secs(2)));
    }

    #[test]
    fn rejection_does_not_move_the_clock() {
        let t0 = Instant::now();
        let mut gate = RateGate::new(Duration::from_secs(2));
        assert!(gate.try_accept(t0));
        for ms in (100..2000).step_by(100) {
            assert!(!gate.try_accept(t0 + Duration::from_millis(ms)));
        }
        assert_eq!(gate.last_run(), Some(t0));
    }

    #[test]
    fn accepted_cycles_in_half_open_window_stay_under_bound() {
        // Frames every 30ms for 10s; pseudo-random jitter from a fixed LCG.
        let t0 = Instant::now();
        let interval = Duration::from_secs(2);
        let mut gate = RateGate::new(interval);
        let mut accepted = Vec::new();
        let mut seed: u64 = 0x9e3779b97f4a7c15;
        let mut t = 0u64;
        while t < 10_000 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            t += 20 + (seed >> 60);
            let now = t0 + Duration::from_millis(t);
            if gate.try_accept(now) {
                accepted.push(now);
            }
        }
        for pair in accepted.windows(2) {
            assert!(pair[1] - pair[0] >= interval);
        }
        // Window [first, first + T) for several T, including ones ending between cycles.
        let first = accepted[0];
        for window_ms in [1u64, 1999, 2000, 2001, 5000, 6500, 8000] {
            let window = Duration::from_millis(window_ms);
            let in_window = accepted
                .iter()
                .filter(|&&at| at - first < window)
                .count();
            let bound = (window.as_secs_f64() / interval.as_secs_f64()).ceil() as usize;
            assert!(in_window <= bound, "{} cycles in {:?}", in_window, window);
        }
        assert!(accepted.len() >= 4);
    }
}
