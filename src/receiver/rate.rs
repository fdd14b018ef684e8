//! # Frame Rate Tracker
//!
//! Rolling accepted-frames-per-second estimate over one second windows.

use std::time::{Duration, Instant};

/// Length of one measurement window
pub const RATE_WINDOW: Duration = Duration::from_secs(1);

/// Counts accepted frames and turns them into an FPS figure once per window
#[derive(Debug, Clone)]
pub struct RateTracker {
    last_reset: Instant,
    count: u32,
    fps: f64,
}

impl RateTracker {
    /// Starts the first window at `now`
    pub fn new(now: Instant) -> Self {
        Self {
            last_reset: now,
            count: 0,
            fps: 0.0,
        }
    }

    /// Records one accepted frame
    ///
    /// # Returns
    ///
    /// * `Some(fps)` - when this frame closed a window and a new figure was computed
    /// * `None` - while the current window is still open
    pub fn record_frame(&mut self, now: Instant) -> Option<f64> {
        self.count += 1;
        self.close_window(now)
    }

    /// Closes the current window if it has run its length, without counting a frame
    ///
    /// Keeps the figure falling toward zero while no frames arrive.
    ///
    /// # Returns
    ///
    /// * `Some(fps)` - when a window closed
    /// * `None` - while the current window is still open
    pub fn tick(&mut self, now: Instant) -> Option<f64> {
        self.close_window(now)
    }

    fn close_window(&mut self, now: Instant) -> Option<f64> {
        let elapsed = now.saturating_duration_since(self.last_reset);
        if elapsed < RATE_WINDOW {
            return None;
        }

        self.fps = f64::from(self.count) / elapsed.as_secs_f64();
        self.count = 0;
        self.last_reset = now;
        Some(self.fps)
    }

    /// Last computed frames per second (0.0 until the first window closes)
    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Frames counted in the currently open window
    pub fn pending(&self) -> u32 {
        self.count
    }
}
