//! Outbox of side effects produced by a spacecraft.
//!
//! The core never talks to a renderer, audio mixer or projectile system.
//! Instead every spacecraft collects what it produced during a step in an
//! [`Outbox`], and the owning engine drains it with
//! [`Spacecraft::take_effects`](crate::spacecraft::Spacecraft::take_effects),
//! [`take_projectiles`](crate::spacecraft::Spacecraft::take_projectiles) and
//! [`take_missiles`](crate::spacecraft::Spacecraft::take_missiles).

use glam::{Mat3, Vec3};
use serde::{Deserialize, Serialize};

use crate::spacecraft::SpacecraftId;

/// Audio cue requested by a spacecraft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundCue {
    /// A weapon of the named class fired.
    WeaponFire(String),
    /// A missile of the named class was launched.
    MissileLaunch(String),
    /// Ambient sources attached to the spacecraft (engine hum) must stop.
    StopAmbient,
}

/// Visual or audio effect requested by a spacecraft.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Spawn an explosion matching the spacecraft's motion.
    Explosion {
        /// Explosion class name from the spacecraft class
        class: String,
        /// World-space position
        position: Vec3,
        /// World-space orientation
        orientation: Mat3,
        /// World-space velocity
        velocity: Vec3,
    },
    /// Attach a damage indicator (smoke, fire) to the hull.
    DamageIndicator {
        /// Hull integrity threshold (percent) that was crossed
        threshold: f64,
        /// World-space position on the hull
        position: Vec3,
        /// Position relative to the spacecraft, in its local frame
        local_position: Vec3,
    },
    /// Remove every damage indicator attached to the spacecraft.
    ClearDamageIndicators,
    /// Play a sound at a position.
    Sound {
        /// What to play
        cue: SoundCue,
        /// World-space source position
        position: Vec3,
    },
}

/// A projectile emitted by a weapon barrel.
#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    /// Weapon class that fired it
    pub weapon_class: String,
    /// Spacecraft that fired it
    pub source: Option<SpacecraftId>,
    /// World-space spawn position
    pub origin: Vec3,
    /// Unit direction of travel
    pub direction: Vec3,
    /// World-space velocity including the shooter's velocity
    pub velocity: Vec3,
    /// Damage dealt on impact
    pub damage: f64,
    /// Seconds until the projectile expires
    pub lifespan: f32,
}

/// A missile launched from a launcher.
#[derive(Debug, Clone, PartialEq)]
pub struct Missile {
    /// Missile class name
    pub class: String,
    /// Spacecraft that launched it
    pub source: Option<SpacecraftId>,
    /// Target locked at launch, if any
    pub target: Option<SpacecraftId>,
    /// World-space spawn position
    pub position: Vec3,
    /// World-space orientation
    pub orientation: Mat3,
    /// World-space velocity including the launcher's velocity
    pub velocity: Vec3,
    /// Damage dealt on impact
    pub damage: f64,
    /// Whether the missile steers towards its target
    pub homing: bool,
}

/// Per-spacecraft buffer of produced effects, projectiles and missiles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outbox {
    effects: Vec<Effect>,
    projectiles: Vec<Projectile>,
    missiles: Vec<Missile>,
}

impl Outbox {
    /// Creates an empty outbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an effect.
    pub fn push_effect(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    /// Queues a projectile.
    pub fn push_projectile(&mut self, projectile: Projectile) {
        self.projectiles.push(projectile);
    }

    /// Queues a missile.
    pub fn push_missile(&mut self, missile: Missile) {
        self.missiles.push(missile);
    }

    /// Pending effects, oldest first.
    #[must_use]
    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    /// Pending projectiles, oldest first.
    #[must_use]
    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    /// Pending missiles, oldest first.
    #[must_use]
    pub fn missiles(&self) -> &[Missile] {
        &self.missiles
    }

    /// Drains pending effects.
    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    /// Drains pending projectiles.
    pub fn take_projectiles(&mut self) -> Vec<Projectile> {
        std::mem::take(&mut self.projectiles)
    }

    /// Drains pending missiles.
    pub fn take_missiles(&mut self) -> Vec<Missile> {
        std::mem::take(&mut self.missiles)
    }

    /// Returns true if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty() && self.projectiles.is_empty() && self.missiles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_drains_in_order() {
        let mut outbox = Outbox::new();
        outbox.push_effect(Effect::ClearDamageIndicators);
        outbox.push_effect(Effect::Sound {
            cue: SoundCue::StopAmbient,
            position: Vec3::ZERO,
        });
        assert_eq!(outbox.effects().len(), 2);

        let effects = outbox.take_effects();
        assert_eq!(effects[0], Effect::ClearDamageIndicators);
        assert!(matches!(
            effects[1],
            Effect::Sound {
                cue: SoundCue::StopAmbient,
                ..
            }
        ));
        assert!(outbox.is_empty());
        assert!(outbox.take_effects().is_empty());
    }
}
