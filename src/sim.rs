//! Simulation state and clock.
//!
//! Motion is purely kinematic: each body's display angle is derived from
//! elapsed wall-clock time every frame, never integrated. The state struct
//! is owned by the renderer and borrowed by the input path; there are no
//! globals.

use crate::planets::{Planet, PLANET_COUNT};
use glam::DVec3;
use std::time::Instant;

/// Monotonic clock, anchored once at startup. Never reset, never paused.
pub struct SimClock {
    start: Instant,
}

impl SimClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Elapsed milliseconds since program start.
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Mutable per-body simulation parameters.
///
/// Both arrays are indexed by the registration order of `Planet::all()`.
/// User input always mutates every body at once; values are cumulative,
/// unbounded, and unvalidated. A period may reach zero or go negative.
pub struct SimState {
    periods: [f64; PLANET_COUNT],
    velocity_offsets: [f64; PLANET_COUNT],
}

impl SimState {
    pub fn new() -> Self {
        let mut periods = [0.0; PLANET_COUNT];
        for (i, planet) in Planet::all().iter().enumerate() {
            periods[i] = planet.base_period();
        }

        Self {
            periods,
            velocity_offsets: [0.0; PLANET_COUNT],
        }
    }

    /// Add `delta` degrees of angular drift to every body.
    pub fn nudge_velocity(&mut self, delta: f64) {
        for v in &mut self.velocity_offsets {
            *v += delta;
        }
    }

    /// Add `delta` years to every body's current period. Unclamped.
    pub fn nudge_period(&mut self, delta: f64) {
        for p in &mut self.periods {
            *p += delta;
        }
    }

    /// Current period of `body` in simulated years.
    pub fn period(&self, body: usize) -> f64 {
        self.periods[body]
    }

    /// Current angular drift of `body` in degrees.
    pub fn velocity_offset(&self, body: usize) -> f64 {
        self.velocity_offsets[body]
    }

    /// Uniform shift applied to all periods so far, in years.
    pub fn period_delta(&self) -> f64 {
        self.period(0) - Planet::all()[0].base_period()
    }

    /// Uniform angular drift applied to all bodies so far, in degrees.
    pub fn velocity_delta(&self) -> f64 {
        self.velocity_offset(0)
    }

    /// Display angle of `body` in degrees at `elapsed_ms` since start.
    ///
    /// Angular speed is inversely proportional to the current period, plus
    /// the additive drift. A zero period yields a non-finite angle; the
    /// body then renders as nothing for those frames.
    pub fn display_angle_deg(&self, body: usize, elapsed_ms: f64) -> f64 {
        360.0 * elapsed_ms / (self.periods[body] * 1000.0) + self.velocity_offsets[body]
    }

    /// Heliocentric position of `body` in the orbital plane (z = 0).
    pub fn body_position(&self, body: usize, elapsed_ms: f64) -> DVec3 {
        let angle = self.display_angle_deg(body, elapsed_ms).to_radians();
        let distance = Planet::all()[body].distance();
        DVec3::new(distance * angle.cos(), distance * angle.sin(), 0.0)
    }
}

impl Default for SimState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EARTH: usize = 2;

    #[test]
    fn test_initial_periods_match_templates() {
        let sim = SimState::new();
        for (i, planet) in Planet::all().iter().enumerate() {
            assert_eq!(sim.period(i), planet.base_period());
            assert_eq!(sim.velocity_offset(i), 0.0);
        }
    }

    #[test]
    fn test_angle_law() {
        let sim = SimState::new();

        // Earth: period 1.0 year. A quarter period of elapsed time is 90°.
        let angle = sim.display_angle_deg(EARTH, 250.0);
        assert!((angle - 90.0).abs() < 1e-9);

        // One full period wraps to 360°, i.e. 0° mod 360.
        let angle = sim.display_angle_deg(EARTH, 1000.0);
        assert!((angle.rem_euclid(360.0)).abs() < 1e-9);
    }

    #[test]
    fn test_earth_starts_at_positive_x() {
        let sim = SimState::new();
        let pos = sim.body_position(EARTH, 0.0);

        assert!((pos.x - 10.0).abs() < 1e-9);
        assert!(pos.y.abs() < 1e-9);
        assert_eq!(pos.z, 0.0);
    }

    #[test]
    fn test_velocity_nudge_is_uniform() {
        let mut sim = SimState::new();
        sim.nudge_velocity(1.0);

        for i in 0..PLANET_COUNT {
            assert_eq!(sim.velocity_offset(i), 1.0);
        }

        sim.nudge_velocity(-1.0);
        sim.nudge_velocity(-1.0);

        for i in 0..PLANET_COUNT {
            assert_eq!(sim.velocity_offset(i), -1.0);
        }
    }

    #[test]
    fn test_period_nudges_feed_the_angle_law() {
        let mut sim = SimState::new();
        sim.nudge_period(0.1);
        sim.nudge_period(0.1);
        sim.nudge_period(0.1);

        assert!((sim.period(EARTH) - 1.3).abs() < 1e-9);

        // One full 1.3-year period of elapsed time wraps back to 0°.
        let angle = sim.display_angle_deg(EARTH, 1300.0);
        assert!(angle.rem_euclid(360.0).abs() < 1e-9);
    }

    #[test]
    fn test_velocity_offset_shifts_angle() {
        let mut sim = SimState::new();
        sim.nudge_velocity(45.0);

        let angle = sim.display_angle_deg(EARTH, 0.0);
        assert!((angle - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_period_is_accepted() {
        let mut sim = SimState::new();

        // Drive Earth's period to exactly zero; nothing may panic.
        sim.nudge_period(-1.0);
        assert_eq!(sim.period(EARTH), 0.0);

        let angle = sim.display_angle_deg(EARTH, 500.0);
        assert!(!angle.is_finite());

        // Position degenerates to non-finite too, still without panicking.
        let pos = sim.body_position(EARTH, 500.0);
        assert!(!pos.x.is_finite() || pos.x.is_nan());

        // Negative periods reverse direction but stay finite.
        sim.nudge_period(-0.1);
        let angle = sim.display_angle_deg(EARTH, 500.0);
        assert!(angle.is_finite());
        let pos = sim.body_position(EARTH, 500.0);
        assert!(pos.x.is_finite() && pos.y.is_finite());
    }

    #[test]
    fn test_uniform_deltas_reported() {
        let mut sim = SimState::new();
        sim.nudge_period(0.1);
        sim.nudge_velocity(1.0);
        sim.nudge_velocity(1.0);

        assert!((sim.period_delta() - 0.1).abs() < 1e-9);
        assert!((sim.velocity_delta() - 2.0).abs() < 1e-9);
    }
}
