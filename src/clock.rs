//! Time primitives for mini-games.
//!
//! Nothing here reads a wall clock: owners feed elapsed milliseconds (or one
//! frame at a time) and get back how many times a task fired. That keeps every
//! variant deterministic under test and lets teardown cancel work by flipping a
//! flag instead of chasing browser timer handles.

/// Periodic timer (the `setInterval` of this crate).
#[derive(Clone, Debug)]
pub struct Interval {
    period_ms: f64,
    carry_ms: f64,
    running: bool,
}

impl Interval {
    /// A running interval.
    pub fn new(period_ms: f64) -> Self {
        Self {
            period_ms,
            carry_ms: 0.0,
            running: true,
        }
    }

    /// An interval that does nothing until `start()`.
    pub fn stopped(period_ms: f64) -> Self {
        Self {
            running: false,
            ..Self::new(period_ms)
        }
    }

    pub fn start(&mut self) {
        self.running = true;
        self.carry_ms = 0.0;
    }

    pub fn cancel(&mut self) {
        self.running = false;
        self.carry_ms = 0.0;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Advance by `dt_ms`; returns the number of whole periods that elapsed.
    pub fn advance(&mut self, dt_ms: f64) -> u32 {
        if !self.running || self.period_ms <= 0.0 || dt_ms <= 0.0 {
            return 0;
        }
        self.carry_ms += dt_ms;
        let fired = (self.carry_ms / self.period_ms).floor();
        self.carry_ms -= fired * self.period_ms;
        fired as u32
    }
}

/// One-shot delay (the `setTimeout` of this crate).
#[derive(Clone, Debug, Default)]
pub struct Timeout {
    remaining_ms: Option<f64>,
}

impl Timeout {
    /// Arm (or re-arm) the timeout.
    pub fn arm(&mut self, delay_ms: f64) {
        self.remaining_ms = Some(delay_ms.max(0.0));
    }

    pub fn cancel(&mut self) {
        self.remaining_ms = None;
    }

    pub fn is_pending(&self) -> bool {
        self.remaining_ms.is_some()
    }

    /// Returns true exactly once, on the advance that crosses the deadline.
    pub fn advance(&mut self, dt_ms: f64) -> bool {
        match self.remaining_ms {
            Some(left) if left - dt_ms <= 0.0 => {
                self.remaining_ms = None;
                true
            }
            Some(left) => {
                self.remaining_ms = Some(left - dt_ms);
                false
            }
            None => false,
        }
    }
}

/// Self-rescheduling per-frame task with a frame counter.
#[derive(Clone, Debug)]
pub struct FrameLoop {
    frame: u64,
    running: bool,
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self {
            frame: 0,
            running: true,
        }
    }
}

impl FrameLoop {
    /// Run one frame; returns the new frame number, or `None` once cancelled.
    pub fn tick(&mut self) -> Option<u64> {
        if !self.running {
            return None;
        }
        self.frame += 1;
        Some(self.frame)
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Restart counting from frame 0.
    pub fn rewind(&mut self) {
        self.frame = 0;
        self.running = true;
    }

    pub fn cancel(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_counts_whole_periods() {
        let mut iv = Interval::new(50.0);
        assert_eq!(iv.advance(20.0), 0);
        assert_eq!(iv.advance(40.0), 1);
        assert_eq!(iv.advance(160.0), 3);
    }

    #[test]
    fn test_cancelled_interval_never_fires() {
        let mut iv = Interval::new(16.0);
        iv.cancel();
        assert_eq!(iv.advance(1_000.0), 0);
        iv.start();
        assert_eq!(iv.advance(32.0), 2);
    }

    #[test]
    fn test_timeout_fires_once() {
        let mut t = Timeout::default();
        assert!(!t.advance(10.0));
        t.arm(100.0);
        assert!(!t.advance(60.0));
        assert!(t.advance(40.0));
        assert!(!t.advance(1_000.0));
        assert!(!t.is_pending());
    }

    #[test]
    fn test_frame_loop_stops_after_cancel() {
        let mut fl = FrameLoop::default();
        assert_eq!(fl.tick(), Some(1));
        fl.cancel();
        assert_eq!(fl.tick(), None);
        assert_eq!(fl.frame(), 1);
        fl.rewind();
        assert_eq!(fl.tick(), Some(1));
    }
}
