//! Frame timing.
//!
//! The host drives the game with display-frame timestamps in milliseconds.
//! [`FrameClock`] turns them into a clamped delta in seconds; [`SimClock`]
//! accumulates simulated time, which stands still while the game is paused
//! or docked.

use bevy_ecs::prelude::*;

/// Converts frame timestamps into clamped deltas.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Option<f64>,
    max_dt: f32,
}

impl FrameClock {
    pub fn new(max_dt: f32) -> Self {
        Self { last: None, max_dt }
    }

    /// Seconds since the previous timestamp, clamped to `[0, max_dt]`.
    /// The first call after construction or [`reset`](Self::reset) yields 0.
    pub fn delta(&mut self, timestamp_ms: f64) -> f32 {
        let dt = match self.last {
            Some(last) => ((timestamp_ms - last) / 1000.0) as f32,
            None => 0.0,
        };
        self.last = Some(timestamp_ms);
        if dt.is_finite() {
            dt.clamp(0.0, self.max_dt)
        } else {
            0.0
        }
    }

    pub fn reset(&mut self) {
        self.last = None;
    }

    pub fn max_dt(&self) -> f32 {
        self.max_dt
    }
}

/// Simulated time, advanced only by ticks that actually simulate.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct SimClock {
    /// Seconds of simulated time.
    pub elapsed: f64,
    pub tick: u64,
}

impl SimClock {
    pub fn advance(&mut self, dt: f32) {
        self.elapsed += dt as f64;
        self.tick += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_first_frame_has_zero_delta() {
        let mut clock = FrameClock::new(0.1);
        assert_eq!(clock.delta(12_345.0), 0.0);
        assert_relative_eq!(clock.delta(12_361.0), 0.016, epsilon = 1e-6);
    }

    #[rstest]
    #[case(5_000.0, 0.1)]
    #[case(-50.0, 0.0)]
    #[case(f64::NAN, 0.0)]
    fn test_delta_is_clamped(#[case] step_ms: f64, #[case] expected: f32) {
        let mut clock = FrameClock::new(0.1);
        clock.delta(1_000.0);
        assert_eq!(clock.delta(1_000.0 + step_ms), expected);
    }

    #[test]
    fn test_reset_forgets_last_timestamp() {
        let mut clock = FrameClock::new(0.1);
        clock.delta(0.0);
        clock.reset();
        assert_eq!(clock.delta(90_000.0), 0.0);
    }
}
