//! Time management for the simulation loop.

use std::time::{Duration, Instant};

/// Manages frame timing and fixed-step accumulation.
///
/// Frames are fed either from the wall clock ([`Time::update`]) or from a
/// caller-supplied delta ([`Time::advance`]) when running headless.
#[derive(Debug)]
pub struct Time {
    /// Time of the last wall-clock frame.
    last_frame: Instant,
    /// Duration of the last frame.
    delta: Duration,
    /// Total elapsed time since start.
    elapsed: Duration,
    /// Frame count since start.
    frame_count: u64,
    /// Fixed simulation timestep (default 60 Hz).
    fixed_timestep: Duration,
    /// Accumulated time for fixed updates.
    accumulator: Duration,
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

impl Time {
    /// Create a new time manager.
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            frame_count: 0,
            fixed_timestep: Duration::from_secs_f64(1.0 / 60.0),
            accumulator: Duration::ZERO,
        }
    }

    /// Update timing from the wall clock at the start of a new frame.
    pub fn update(&mut self) {
        let now = Instant::now();
        let delta = now - self.last_frame;
        self.last_frame = now;
        self.advance(delta);
    }

    /// Advance by an explicit delta (headless stepping, tests).
    pub fn advance(&mut self, delta: Duration) {
        self.delta = delta;
        self.elapsed += delta;
        self.frame_count += 1;
        self.accumulator += delta;
    }

    /// Get the delta time in seconds.
    pub fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Get total elapsed time in seconds.
    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    /// Get the current frame count.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Get the fixed timestep.
    pub fn fixed_timestep(&self) -> Duration {
        self.fixed_timestep
    }

    /// Get the fixed timestep in seconds.
    pub fn fixed_timestep_seconds(&self) -> f32 {
        self.fixed_timestep.as_secs_f32()
    }

    /// Check if a fixed update should run and consume the time.
    pub fn should_fixed_update(&mut self) -> bool {
        if self.accumulator >= self.fixed_timestep {
            self.accumulator -= self.fixed_timestep;
            true
        } else {
            false
        }
    }

    /// Set the fixed timestep rate in Hz.
    pub fn set_fixed_rate(&mut self, hz: f64) {
        self.fixed_timestep = Duration::from_secs_f64(1.0 / hz.max(1.0));
    }
}
