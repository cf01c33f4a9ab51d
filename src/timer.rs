use std::time::{Duration, Instant};

/// Wall-clock stopwatch sampled once per frame.
#[derive(Debug)]
pub struct FrameTimer {
    last: Instant,
}

impl FrameTimer {
    pub fn new() -> Self {
        Self { last: Instant::now() }
    }

    /// Seconds since the last reset. With `reset` the stopwatch restarts now.
    pub fn elapsed(&mut self, reset: bool) -> f64 {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last).as_secs_f64();
        if reset {
            self.last = now;
        }
        elapsed
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

pub const VIDEO_FPS: f64 = 24.0;

/// Decides which frames of a video capture get written.
#[derive(Debug)]
pub struct CaptureCadence {
    interval: f64,
    accumulated: f64,
}

impl CaptureCadence {
    pub fn new(fps: f64) -> Self {
        Self {
            interval: 1.0 / fps,
            accumulated: 0.0,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(self.interval)
    }

    /// Adds `dt` seconds; returns true when a frame is due. The accumulator
    /// starts over after every written frame, so slow frames are not caught up.
    pub fn tick(&mut self, dt: f64) -> bool {
        self.accumulated += dt;
        if self.accumulated >= self.interval {
            self.accumulated = 0.0;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.accumulated = 0.0;
    }
}

impl Default for CaptureCadence {
    fn default() -> Self {
        Self::new(VIDEO_FPS)
    }
}
