//! Regenerating shield absorbing damage before armor and hull.

use std::sync::Arc;

use crate::class::ShieldClass;

/// An equipped shield.
#[derive(Debug, Clone)]
pub struct Shield {
    class: Arc<ShieldClass>,
    capacity: f64,
    time_since_hit: f32,
    recharging: bool,
}

impl Shield {
    /// Installs a fully charged shield of `class`.
    #[must_use]
    pub fn new(class: Arc<ShieldClass>) -> Self {
        let capacity = class.capacity;
        Self {
            class,
            capacity,
            time_since_hit: 0.0,
            recharging: false,
        }
    }

    /// Shield class.
    #[must_use]
    pub fn class(&self) -> &Arc<ShieldClass> {
        &self.class
    }

    /// Current capacity.
    #[must_use]
    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Current capacity over maximum, in `[0, 1]`.
    #[must_use]
    pub fn integrity(&self) -> f64 {
        if self.class.capacity > 0.0 {
            self.capacity / self.class.capacity
        } else {
            0.0
        }
    }

    /// Sets the capacity from an integrity ratio.
    pub fn set_integrity(&mut self, integrity: f64) {
        self.capacity = integrity.clamp(0.0, 1.0) * self.class.capacity;
    }

    /// Returns true while regenerating.
    #[must_use]
    pub fn is_recharging(&self) -> bool {
        self.recharging
    }

    /// Absorbs up to the current capacity and returns the damage passed on.
    ///
    /// Every hit restarts the recharge delay.
    pub fn absorb(&mut self, amount: f64) -> f64 {
        let amount = amount.max(0.0);
        let absorbed = amount.min(self.capacity);
        self.capacity -= absorbed;
        self.time_since_hit = 0.0;
        self.recharging = false;
        amount - absorbed
    }

    /// Starts regenerating immediately, skipping the delay.
    pub fn start_recharge(&mut self) {
        self.recharging = true;
    }

    /// Advances the recharge delay and regenerates.
    ///
    /// Speculative simulations leave the capacity alone; it arrives from the
    /// host instead.
    pub fn simulate(&mut self, dt: f32, speculative: bool) {
        self.time_since_hit += dt;
        if !self.recharging && self.time_since_hit >= self.class.recharge_delay {
            self.recharging = true;
        }
        if self.recharging && !speculative {
            self.capacity = (self.capacity + self.class.recharge_rate * f64::from(dt))
                .min(self.class.capacity);
            if self.capacity >= self.class.capacity {
                self.recharging = false;
            }
        }
    }

    /// Score contribution.
    #[must_use]
    pub fn score_value(&self) -> f64 {
        self.class.score_value
    }
}
