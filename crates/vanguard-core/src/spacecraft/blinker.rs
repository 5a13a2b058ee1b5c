//! Navigation light timing.

use glam::Vec3;

use crate::class::BlinkerSpec;

/// A blinking navigation light. Lit during the first half of each period.
#[derive(Debug, Clone, PartialEq)]
pub struct Blinker {
    position: Vec3,
    period: f32,
    initial_time: f32,
    time: f32,
}

impl Blinker {
    /// Creates a blinker starting `initial_time` seconds into its cycle.
    #[must_use]
    pub fn new(spec: &BlinkerSpec, initial_time: f32) -> Self {
        let mut blinker = Self {
            position: spec.position,
            period: spec.period,
            initial_time,
            time: 0.0,
        };
        blinker.reset();
        blinker
    }

    /// Ship-local position.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Position within the cycle, in `[0, 1)`.
    #[must_use]
    pub fn phase(&self) -> f32 {
        if self.period > 0.0 {
            self.time / self.period
        } else {
            0.0
        }
    }

    /// Returns true while the light is on.
    #[must_use]
    pub fn is_lit(&self) -> bool {
        self.phase() < 0.5
    }

    /// Advances the cycle.
    pub fn simulate(&mut self, dt: f32) {
        if self.period > 0.0 {
            self.time = (self.time + dt).rem_euclid(self.period);
        }
    }

    /// Returns to the initial phase.
    pub fn reset(&mut self) {
        self.time = if self.period > 0.0 {
            self.initial_time.rem_euclid(self.period)
        } else {
            0.0
        };
    }
}
