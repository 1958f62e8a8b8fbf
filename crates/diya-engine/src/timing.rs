//! Frame pacing.
//!
//! The simulation runs on the virtual host clock. In realtime mode the
//! runner also sleeps out each frame's budget so the show plays at wall
//! speed; otherwise frames run back to back.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Wall-clock pacing for the frame loop.
#[derive(Debug)]
pub struct FramePacer {
    /// Time budget per frame
    frame_budget: Duration,
    /// Start of the current frame
    frame_start: Instant,
    /// Whether to sleep out the budget
    realtime: bool,
    /// Recent frame times in seconds
    frame_times: VecDeque<f32>,
    /// Maximum samples for averaging
    max_samples: usize,
}

impl Default for FramePacer {
    fn default() -> Self {
        Self::new(60)
    }
}

impl FramePacer {
    /// Create a pacer for `refresh_hz` frames per second.
    #[must_use]
    pub fn new(refresh_hz: u32) -> Self {
        Self {
            frame_budget: Duration::from_secs_f64(1.0 / f64::from(refresh_hz.max(1))),
            frame_start: Instant::now(),
            realtime: false,
            frame_times: VecDeque::with_capacity(120),
            max_samples: 120,
        }
    }

    /// Enable or disable sleeping to wall-clock time.
    #[must_use]
    pub fn with_realtime(mut self, realtime: bool) -> Self {
        self.realtime = realtime;
        self
    }

    /// Time budget per frame.
    #[must_use]
    pub fn frame_budget(&self) -> Duration {
        self.frame_budget
    }

    /// Mark the start of a frame.
    pub fn begin_frame(&mut self) {
        self.frame_start = Instant::now();
    }

    /// Record the frame's work time and sleep for the rest of the budget
    /// when realtime.
    pub fn end_frame(&mut self) {
        let elapsed = self.frame_start.elapsed();
        self.frame_times.push_back(elapsed.as_secs_f32());
        if self.frame_times.len() > self.max_samples {
            self.frame_times.pop_front();
        }

        if self.realtime && elapsed < self.frame_budget {
            std::thread::sleep(self.frame_budget - elapsed);
        }
    }

    /// Average work time per frame in milliseconds.
    #[must_use]
    pub fn average_frame_time_ms(&self) -> f32 {
        if self.frame_times.is_empty() {
            return 0.0;
        }
        (self.frame_times.iter().sum::<f32>() / self.frame_times.len() as f32) * 1000.0
    }
}
