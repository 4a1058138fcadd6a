//! Time sources threaded into per-frame animation.

use std::time::Instant;

/// Seconds elapsed since some fixed origin.
pub trait TimeSource {
    fn seconds(&self) -> f32;
}

/// Monotonic wall clock starting at construction.
#[derive(Clone, Copy, Debug)]
pub struct WallClock {
    start: Instant,
}

impl WallClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for WallClock {
    fn seconds(&self) -> f32 {
        self.start.elapsed().as_secs_f32()
    }
}

/// Clock that only moves when told to.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ManualClock {
    seconds: f32,
}

impl ManualClock {
    pub fn at(seconds: f32) -> Self {
        Self { seconds }
    }

    pub fn set(&mut self, seconds: f32) {
        self.seconds = seconds;
    }

    pub fn advance(&mut self, dt: f32) {
        self.seconds += dt;
    }
}

impl TimeSource for ManualClock {
    fn seconds(&self) -> f32 {
        self.seconds
    }
}
