//! Per-spacecraft mission statistics.

use serde::{Deserialize, Serialize};

/// Mission performance counters of one spacecraft.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionStats {
    /// Enemies destroyed
    pub kills: u32,
    /// Accumulated score
    pub score: f64,
    /// Damage dealt to hostiles by all means
    pub damage_dealt: f64,
    /// Share of `damage_dealt` dealt by missiles
    pub missile_damage_dealt: f64,
    /// Projectiles fired
    pub shots_fired: u32,
    /// Projectile hits on hostiles
    pub hits_on_enemies: u32,
    /// Missiles launched
    pub missiles_launched: u32,
    /// Missile hits on hostiles
    pub missile_hits_on_enemies: u32,
}

impl MissionStats {
    /// Fraction of projectiles that hit a hostile.
    #[must_use]
    pub fn hit_ratio(&self) -> f64 {
        if self.shots_fired == 0 {
            0.0
        } else {
            f64::from(self.hits_on_enemies) / f64::from(self.shots_fired)
        }
    }

    /// Fraction of missiles that hit a hostile.
    #[must_use]
    pub fn missile_hit_ratio(&self) -> f64 {
        if self.missiles_launched == 0 {
            0.0
        } else {
            f64::from(self.missile_hits_on_enemies) / f64::from(self.missiles_launched)
        }
    }

    /// Clears every counter.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
