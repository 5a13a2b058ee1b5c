//! Missile launching and active launcher selection.
//!
//! After a launch empties the active launcher (or reserves its last
//! missiles for a salvo) the spacecraft picks the next launcher:
//!
//! 1. The next launcher, in slot order after the current one, of the same
//!    missile class with missiles left. Salvo mode carries over.
//! 2. If the current launcher is completely empty: the next launcher of any
//!    class with missiles left. Switching classes costs the missile change
//!    cooldown, resets salvo mode to the configured default and raises
//!    `MissileChanged`.
//! 3. If nothing qualifies, an empty launcher is deselected. A launcher
//!    still working through a salvo stays selected.

use tracing::debug;

use super::Spacecraft;
use crate::config::SimulationContext;
use crate::effect::Missile;
use crate::equipment::MissileLauncher;
use crate::event::{EventData, EventId};
use crate::physics::Frame;

/// Indices after `current`, wrapping around, ending with `current` itself.
fn cyclic_from(current: Option<usize>, len: usize) -> impl Iterator<Item = usize> {
    let start = current.map_or(0, |c| c + 1);
    (0..len).map(move |offset| (start + offset) % len)
}

impl Spacecraft {
    /// Launches a missile from the active launcher.
    ///
    /// Homing missiles that need a lock only launch once the lock is
    /// complete. Returns true if a missile left the launcher.
    pub fn launch_missile(&mut self, ctx: &SimulationContext) -> bool {
        if self.reject_destroyed("launch_missile") || !self.can_fire() {
            return false;
        }
        let Some(index) = self.active_missile_launcher else {
            return false;
        };
        let lock_ratio = self.targeting.missile_lock_ratio();
        let frame = Frame::of(self.body.as_ref());
        let Some(launcher) = self.missile_launchers.get_mut(index) else {
            return false;
        };
        let class = launcher.missile_class();
        if class.homing && class.lock_time > 0.0 && lock_ratio < 1.0 {
            return false;
        }
        let Some(missile) = launcher.launch(&frame, false, &mut self.outbox) else {
            return false;
        };
        let exhausted = !launcher.has_missiles_left_to_launch();
        self.emit_missile(missile);
        if exhausted {
            self.select_next_missile_launcher(ctx);
        }
        true
    }

    fn emit_missile(&mut self, mut missile: Missile) {
        missile.source = self.handle;
        missile.target = self.targeting.target();
        self.outbox.push_missile(missile);
        self.stats.missiles_launched += 1;
    }

    /// Switches to the next launcher carrying a different missile class.
    ///
    /// Returns false if no such launcher has missiles left.
    pub fn change_missile(&mut self, ctx: &SimulationContext) -> bool {
        if self.reject_destroyed("change_missile") {
            return false;
        }
        let current_class = self
            .active_launcher()
            .map(|l| l.missile_class().name.clone());
        let next = cyclic_from(self.active_missile_launcher, self.missile_launchers.len())
            .find(|&i| {
                let launcher = &self.missile_launchers[i];
                launcher.has_missiles_left_to_launch()
                    && current_class.as_deref() != Some(launcher.missile_class().name.as_str())
            });
        match next {
            Some(index) => {
                self.switch_missile_class(index, ctx);
                true
            }
            None => false,
        }
    }

    /// Flips salvo mode of the active launcher and returns the new mode.
    pub fn toggle_salvo(&mut self) -> bool {
        let Some(launcher) = self
            .active_missile_launcher
            .and_then(|i| self.missile_launchers.get_mut(i))
        else {
            return false;
        };
        launcher.set_salvo_mode(!launcher.is_in_salvo_mode());
        launcher.is_in_salvo_mode()
    }

    fn switch_missile_class(&mut self, index: usize, ctx: &SimulationContext) {
        let launcher = &mut self.missile_launchers[index];
        launcher.set_minimum_cooldown(ctx.config.missile_change_cooldown);
        launcher.set_salvo_mode(ctx.config.default_salvo_mode);
        debug!(spacecraft = %self.id, launcher = index, missile = %launcher.missile_class().name, "missile changed");
        self.active_missile_launcher = Some(index);
        self.handle_event(
            EventId::MissileChanged,
            &EventData::MissileChanged {
                launcher: Some(index),
            },
        );
    }

    /// Runs the launcher selection automaton from the active launcher.
    pub(crate) fn select_next_missile_launcher(&mut self, ctx: &SimulationContext) {
        let Some(current) = self.active_missile_launcher else {
            return;
        };
        let Some(active) = self.missile_launchers.get(current) else {
            self.active_missile_launcher = None;
            return;
        };
        let class = active.missile_class().name.clone();
        let salvo_mode = active.is_in_salvo_mode();
        let empty = active.missile_count() == 0;
        let len = self.missile_launchers.len();

        let same_class = cyclic_from(Some(current), len).find(|&i| {
            let launcher = &self.missile_launchers[i];
            i != current
                && launcher.missile_class().name == class
                && launcher.has_missiles_left_to_launch()
        });
        if let Some(index) = same_class {
            self.missile_launchers[index].set_salvo_mode(salvo_mode);
            self.active_missile_launcher = Some(index);
            return;
        }

        if !empty {
            return;
        }
        let any = cyclic_from(Some(current), len)
            .find(|&i| self.missile_launchers[i].has_missiles_left_to_launch());
        match any {
            Some(index) => self.switch_missile_class(index, ctx),
            None => self.active_missile_launcher = None,
        }
    }

    /// Ticks launcher cooldowns, fires queued salvo steps and keeps the
    /// active launcher selection current.
    pub(super) fn simulate_launchers(&mut self, dt: f32, ctx: &SimulationContext, frame: &Frame) {
        let can_fire = self.can_fire();
        let mut launched = Vec::new();
        for launcher in &mut self.missile_launchers {
            launcher.simulate(dt);
            if can_fire && launcher.has_pending_salvo_step() {
                launched.extend(launcher.launch(frame, true, &mut self.outbox));
            }
        }
        for missile in launched {
            self.emit_missile(missile);
        }

        if self
            .active_launcher()
            .is_some_and(|l| !l.has_missiles_left_to_launch())
        {
            self.select_next_missile_launcher(ctx);
        }
    }

    /// Number of missiles left across all launchers.
    #[must_use]
    pub fn missiles_left(&self) -> u32 {
        self.missile_launchers
            .iter()
            .map(MissileLauncher::missile_count)
            .sum()
    }
}
