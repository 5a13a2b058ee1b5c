//! Projectile weapons: fixed forward guns and rotating turrets.

use std::sync::Arc;

use glam::{Quat, Vec3};

use crate::class::{WeaponClass, WeaponSlot};
use crate::effect::{Effect, Outbox, Projectile, SoundCue};
use crate::physics::Frame;
use crate::spacecraft::SpacecraftId;

/// An equipped weapon.
///
/// Fixed weapons always fire along the ship's forward axis. Turrets keep
/// their own aim direction (ship-local) and rotate it towards an aim point
/// at the turret's rotation speed.
#[derive(Debug, Clone)]
pub struct Weapon {
    class: Arc<WeaponClass>,
    slot_index: usize,
    slot: WeaponSlot,
    cooldown_left: f32,
    /// Ship-local unit aim direction
    aim: Vec3,
    aimed: bool,
}

impl Weapon {
    /// Mounts a weapon of `class` into a slot.
    #[must_use]
    pub fn new(class: Arc<WeaponClass>, slot_index: usize, slot: WeaponSlot) -> Self {
        Self {
            class,
            slot_index,
            slot,
            cooldown_left: 0.0,
            aim: Vec3::Y,
            aimed: false,
        }
    }

    /// Weapon class.
    #[must_use]
    pub fn class(&self) -> &Arc<WeaponClass> {
        &self.class
    }

    /// Index of the slot the weapon is mounted in.
    #[must_use]
    pub fn slot_index(&self) -> usize {
        self.slot_index
    }

    /// Returns true for weapons without a turret.
    #[must_use]
    pub fn is_fixed(&self) -> bool {
        self.class.turret.is_none()
    }

    /// Returns true once the cooldown has elapsed.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.cooldown_left <= 0.0
    }

    /// Returns true if the last aim update ended within the fire threshold.
    #[must_use]
    pub fn is_aimed(&self) -> bool {
        self.aimed
    }

    /// Ship-local aim direction.
    #[must_use]
    pub fn aim_direction(&self) -> Vec3 {
        self.aim
    }

    /// Advances the cooldown.
    pub fn simulate(&mut self, dt: f32) {
        self.cooldown_left = (self.cooldown_left - dt).max(0.0);
    }

    /// Turns the weapon towards a world-space aim point.
    ///
    /// Turrets rotate only while the remaining angle exceeds
    /// `turn_threshold`, by at most their rotation speed times `dt`. A weapon
    /// counts as aimed once the remaining angle is within `fire_threshold`.
    pub fn aim_towards(
        &mut self,
        aim_point: Vec3,
        frame: &Frame,
        turn_threshold: f32,
        fire_threshold: f32,
        dt: f32,
    ) {
        let local = frame.orientation.transpose() * (aim_point - frame.to_world(self.slot.position));
        let desired = local.normalize_or_zero();
        if desired == Vec3::ZERO {
            return;
        }

        if let Some(turret) = &self.class.turret {
            let angle = self.aim.angle_between(desired);
            if angle > turn_threshold {
                let step = (turret.rotation_speed * dt).min(angle);
                let (axis, _) = Quat::from_rotation_arc(self.aim, desired).to_axis_angle();
                self.aim = (Quat::from_axis_angle(axis, step) * self.aim).normalize();
            }
        }
        self.aimed = self.aim.angle_between(desired) <= fire_threshold;
    }

    /// Fires the weapon if it is ready.
    ///
    /// With `only_if_aimed_or_fixed`, turrets that are not aimed hold fire.
    /// Emits one projectile per barrel and returns how many were emitted.
    pub fn fire(
        &mut self,
        frame: &Frame,
        source: Option<SpacecraftId>,
        only_if_aimed_or_fixed: bool,
        outbox: &mut Outbox,
    ) -> u32 {
        if !self.is_ready() {
            return 0;
        }
        if only_if_aimed_or_fixed && !self.is_fixed() && !self.aimed {
            return 0;
        }

        let direction = frame.orientation * self.aim;
        let origin = frame.to_world(self.slot.position);
        let velocity = frame.velocity + direction * self.class.projectile_speed;
        for _ in 0..self.class.barrels {
            outbox.push_projectile(Projectile {
                weapon_class: self.class.name.clone(),
                source,
                origin,
                direction,
                velocity,
                damage: self.class.damage,
                lifespan: self.class.projectile_lifespan,
            });
        }
        outbox.push_effect(Effect::Sound {
            cue: SoundCue::WeaponFire(self.class.name.clone()),
            position: origin,
        });
        self.cooldown_left = self.class.cooldown;
        self.class.barrels
    }

    /// Maximum reach of a projectile fired while moving at `speed`.
    #[must_use]
    pub fn range(&self, speed: f32) -> f32 {
        (self.class.projectile_speed + speed) * self.class.projectile_lifespan
    }

    /// Sustained damage per second against `armor`.
    #[must_use]
    pub fn firepower(&self, armor: f64) -> f64 {
        let per_shot = (self.class.damage - armor).max(0.0) * f64::from(self.class.barrels);
        if self.class.cooldown > 0.0 {
            per_shot / f64::from(self.class.cooldown)
        } else {
            per_shot
        }
    }

    /// Score contribution.
    #[must_use]
    pub fn score_value(&self) -> f64 {
        self.class.score_value
    }
}
