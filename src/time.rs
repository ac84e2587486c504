//! Frame clock for the tick loop.
//!
//! Tracks elapsed time, per-frame delta, frame count and a smoothed FPS
//! reading for display. The physics itself is tick-based and never reads the
//! clock.
//!
//! # Example
//!
//! ```
//! use particle_life::time::Time;
//!
//! let mut time = Time::new();
//! time.update();
//! assert_eq!(time.frame(), 1);
//! ```

use std::time::{Duration, Instant};

/// Weight kept from the previous FPS reading on each update.
const FPS_SMOOTHING: f32 = 0.8;

/// Frame timing for the simulation loop.
#[derive(Debug)]
pub struct Time {
    /// When the timer was created.
    start: Instant,
    /// When the last frame occurred.
    last_frame: Instant,
    /// Time since last frame in seconds.
    delta_secs: f32,
    /// Total frames since start.
    frame_count: u64,
    /// Exponentially smoothed, rounded FPS.
    fps: f32,
    /// Whether time is paused.
    paused: bool,
    /// Time spent paused.
    pause_elapsed: Duration,
}

impl Time {
    /// Create a new time tracker starting from now.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_frame: now,
            delta_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            paused: false,
            pause_elapsed: Duration::ZERO,
        }
    }

    /// Update timing values. Call once per frame; returns the delta in seconds.
    pub fn update(&mut self) -> f32 {
        self.update_at(Instant::now())
    }

    fn update_at(&mut self, now: Instant) -> f32 {
        if self.paused {
            self.delta_secs = 0.0;
            return 0.0;
        }

        let delta = now.saturating_duration_since(self.last_frame);
        self.delta_secs = delta.as_secs_f32();
        self.last_frame = now;
        self.frame_count += 1;

        if self.delta_secs > 0.0 {
            let instant_fps = 1.0 / self.delta_secs;
            self.fps = (self.fps * FPS_SMOOTHING + instant_fps * (1.0 - FPS_SMOOTHING)).round();
        }

        self.delta_secs
    }

    /// Total unpaused time since start.
    pub fn elapsed(&self) -> Duration {
        self.last_frame
            .saturating_duration_since(self.start)
            .saturating_sub(self.pause_elapsed)
    }

    /// Time since last frame in seconds.
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    /// Total frames since start.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Smoothed frames per second.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Pause time progression; `update` returns 0 until resumed.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume time progression after pausing.
    pub fn resume(&mut self) {
        if self.paused {
            let now = Instant::now();
            self.pause_elapsed += now.saturating_duration_since(self.last_frame);
            self.last_frame = now;
            self.paused = false;
        }
    }

    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
    }

    /// Reset the timer to its initial state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}
