//! Time management for the simulation loop.

use std::time::Duration;

/// Maximum frame delta fed into the accumulator. Longer stalls (debugger,
/// suspended terminal) are clamped so the simulation does not spiral.
const MAX_FRAME_DELTA: Duration = Duration::from_millis(250);

/// Manages frame timing and the fixed-step accumulator.
#[derive(Debug)]
pub struct FrameClock {
    /// Total simulated time handed out as fixed steps.
    elapsed: Duration,
    /// Frame count since start.
    frame_count: u64,
    /// Fixed timestep for the simulation (default 60 Hz).
    fixed_timestep: Duration,
    /// Accumulated time not yet consumed by fixed updates.
    accumulator: Duration,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    /// Create a new clock ticking at 60 Hz.
    pub fn new() -> Self {
        Self::with_rate(60.0)
    }

    /// Create a clock with the given fixed rate in Hz.
    pub fn with_rate(hz: f64) -> Self {
        Self {
            elapsed: Duration::ZERO,
            frame_count: 0,
            fixed_timestep: Duration::from_secs_f64(1.0 / hz),
            accumulator: Duration::ZERO,
        }
    }

    /// Feed a frame delta. Headless runs pass the fixed step instead of
    /// reading the wall clock.
    pub fn advance(&mut self, delta: Duration) {
        self.frame_count += 1;
        self.accumulator += delta.min(MAX_FRAME_DELTA);
    }

    /// Get total simulated time in seconds.
    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    /// Get the current frame count.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Get the fixed timestep in seconds.
    pub fn fixed_timestep_seconds(&self) -> f32 {
        self.fixed_timestep.as_secs_f32()
    }

    /// Check if a fixed update should run and consume the time.
    pub fn should_fixed_update(&mut self) -> bool {
        if self.accumulator >= self.fixed_timestep {
            self.accumulator -= self.fixed_timestep;
            self.elapsed += self.fixed_timestep;
            true
        } else {
            false
        }
    }

    /// Fraction of a fixed step left in the accumulator, for interpolation.
    pub fn alpha(&self) -> f32 {
        self.accumulator.as_secs_f32() / self.fixed_timestep.as_secs_f32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_yields_whole_fixed_steps() {
        let mut clock = FrameClock::with_rate(50.0);
        clock.advance(Duration::from_millis(45));
        let mut steps = 0;
        while clock.should_fixed_update() {
            steps += 1;
        }
        assert_eq!(steps, 2);
        assert!((clock.alpha() - 0.25).abs() < 1e-3);
    }

    #[test]
    fn long_stalls_are_clamped() {
        let mut clock = FrameClock::with_rate(10.0);
        clock.advance(Duration::from_secs(5));
        let mut steps = 0;
        while clock.should_fixed_update() {
            steps += 1;
        }
        assert_eq!(steps, 2);
        assert_eq!(clock.frame_count(), 1);
    }

    #[test]
    fn default_runs_at_sixty_hertz() {
        let mut clock = FrameClock::default();
        assert!((clock.fixed_timestep_seconds() - 1.0 / 60.0).abs() < 1e-6);
        clock.advance(Duration::from_millis(100));
        while clock.should_fixed_update() {}
        assert!((clock.elapsed_seconds() - 0.1).abs() < 1e-2);
    }
}
