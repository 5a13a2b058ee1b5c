//! Missile launchers with salvo support.

use std::sync::Arc;

use crate::class::{MissileClass, MissileLauncherSlot};
use crate::effect::{Effect, Missile, Outbox, SoundCue};
use crate::physics::Frame;

/// An equipped missile launcher.
///
/// In salvo mode a single launch command queues `salvo_size - 1` follow-up
/// launches. Queued launches are fired by the owner as salvo steps once the
/// (shorter) salvo cooldown elapses. Missiles reserved by a queued salvo do
/// not count as "left to launch".
#[derive(Debug, Clone)]
pub struct MissileLauncher {
    class: Arc<MissileClass>,
    slot_index: usize,
    slot: MissileLauncherSlot,
    count: u32,
    cooldown_left: f32,
    salvo_mode: bool,
    salvo_left: u32,
}

impl MissileLauncher {
    /// Mounts a launcher of `class` holding `count` missiles (capped by the slot capacity).
    #[must_use]
    pub fn new(
        class: Arc<MissileClass>,
        slot_index: usize,
        slot: MissileLauncherSlot,
        count: u32,
    ) -> Self {
        let count = count.min(slot.capacity);
        Self {
            class,
            slot_index,
            slot,
            count,
            cooldown_left: 0.0,
            salvo_mode: false,
            salvo_left: 0,
        }
    }

    /// Missile class.
    #[must_use]
    pub fn missile_class(&self) -> &Arc<MissileClass> {
        &self.class
    }

    /// Index of the slot the launcher is mounted in.
    #[must_use]
    pub fn slot_index(&self) -> usize {
        self.slot_index
    }

    /// Missiles still loaded, including those reserved by a salvo.
    #[must_use]
    pub fn missile_count(&self) -> u32 {
        self.count
    }

    /// Maximum missile count.
    #[must_use]
    pub fn capacity(&self) -> u32 {
        self.slot.capacity
    }

    /// Salvo launches still queued.
    #[must_use]
    pub fn salvo_left(&self) -> u32 {
        self.salvo_left
    }

    /// Returns true if missiles remain that are not reserved by a salvo.
    #[must_use]
    pub fn has_missiles_left_to_launch(&self) -> bool {
        self.count > self.salvo_left
    }

    /// Returns true if the launcher fires salvos.
    #[must_use]
    pub fn is_in_salvo_mode(&self) -> bool {
        self.salvo_mode
    }

    /// Enables or disables salvo mode. Only meaningful for salvo sizes above one.
    pub fn set_salvo_mode(&mut self, salvo_mode: bool) {
        self.salvo_mode = salvo_mode && self.class.salvo_size > 1;
    }

    /// Remaining cooldown (s).
    #[must_use]
    pub fn cooldown(&self) -> f32 {
        self.cooldown_left
    }

    /// Raises the remaining cooldown to at least `cooldown`.
    pub fn set_minimum_cooldown(&mut self, cooldown: f32) {
        self.cooldown_left = self.cooldown_left.max(cooldown);
    }

    /// Returns true once the cooldown has elapsed.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.cooldown_left <= 0.0
    }

    /// Returns true if a queued salvo launch can fire now.
    #[must_use]
    pub fn has_pending_salvo_step(&self) -> bool {
        self.salvo_left > 0 && self.is_ready()
    }

    /// Advances the cooldown.
    pub fn simulate(&mut self, dt: f32) {
        self.cooldown_left = (self.cooldown_left - dt).max(0.0);
    }

    /// Launches one missile.
    ///
    /// A regular launch is refused while a salvo is queued; a salvo step is
    /// refused when none is queued. Returns the launched missile with no
    /// source or target set.
    pub fn launch(&mut self, frame: &Frame, is_salvo_step: bool, outbox: &mut Outbox) -> Option<Missile> {
        if self.count == 0 || !self.is_ready() {
            return None;
        }
        if is_salvo_step != (self.salvo_left > 0) {
            return None;
        }

        self.count -= 1;
        if is_salvo_step {
            self.salvo_left -= 1;
        } else if self.salvo_mode {
            self.salvo_left = (self.class.salvo_size.saturating_sub(1)).min(self.count);
        }
        self.cooldown_left = if self.salvo_left > 0 {
            self.class.salvo_cooldown
        } else {
            self.class.cooldown
        };

        let position = frame.to_world(self.slot.position);
        outbox.push_effect(Effect::Sound {
            cue: SoundCue::MissileLaunch(self.class.name.clone()),
            position,
        });
        Some(Missile {
            class: self.class.name.clone(),
            source: None,
            target: None,
            position,
            orientation: frame.orientation,
            velocity: frame.velocity + frame.forward() * self.class.launch_speed,
            damage: self.class.damage,
            homing: self.class.homing,
        })
    }

    /// Score contribution: per-missile score times capacity.
    #[must_use]
    pub fn score_value(&self) -> f64 {
        self.class.score_value * f64::from(self.slot.capacity)
    }
}
