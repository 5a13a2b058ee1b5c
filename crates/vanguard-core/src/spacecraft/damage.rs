//! Damage resolution and score attribution.
//!
//! A hit is resolved in three phases so that no spacecraft ever needs a
//! reference to another one:
//!
//! 1. [`Spacecraft::take_hit`] on the target: shield, armor, hitpoints,
//!    damage indicators and the target's own hit event.
//! 2. [`Spacecraft::credit_hit`] on the attacker: statistics, score, kill
//!    credit and the attacker's hit events.
//! 3. [`Spacecraft::finish_hit`] on the target: speculative hits revert
//!    hitpoints to their value before the hit.
//!
//! [`Arena::damage`](crate::arena::Arena::damage) runs all three.

use glam::Vec3;
use tracing::{debug, trace};

use super::{Spacecraft, SpacecraftId, TeamId};
use crate::config::SimulationContext;
use crate::effect::Effect;
use crate::event::{EventData, EventId};

/// An incoming hit.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    /// Raw damage before shield and armor
    pub amount: f64,
    /// World-space hit position as reported by the hit test
    pub position: Vec3,
    /// Direction of travel of the projectile or impact
    pub direction: Vec3,
    /// Spacecraft credited for the hit
    pub by: Option<SpacecraftId>,
    /// Whether a missile caused the hit
    pub by_missile: bool,
    /// Distance the hit test started behind the projectile. Non-zero offsets
    /// mean `position` may lie off the hull.
    pub offset: f32,
    /// Whether the hit is a collision rather than a weapon hit
    pub is_collision: bool,
}

impl Hit {
    /// Creates a weapon hit with no attacker.
    #[must_use]
    pub fn new(amount: f64, position: Vec3, direction: Vec3) -> Self {
        Self {
            amount,
            position,
            direction,
            by: None,
            by_missile: false,
            offset: 0.0,
            is_collision: false,
        }
    }

    /// Credits the hit to `attacker`.
    #[must_use]
    pub fn by(mut self, attacker: SpacecraftId) -> Self {
        self.by = Some(attacker);
        self
    }

    /// Marks the hit as a missile hit.
    #[must_use]
    pub fn missile(mut self) -> Self {
        self.by_missile = true;
        self
    }

    /// Marks the hit as a collision.
    #[must_use]
    pub fn collision(mut self) -> Self {
        self.is_collision = true;
        self
    }

    /// Sets the hit test offset.
    #[must_use]
    pub fn with_offset(mut self, offset: f32) -> Self {
        self.offset = offset;
        self
    }
}

/// Outcome of [`Spacecraft::take_hit`], carried to the attacker and back.
#[derive(Debug, Clone, PartialEq)]
pub struct HitReport {
    /// Spacecraft that was hit
    pub target: Option<SpacecraftId>,
    /// Hitpoints before the hit
    pub previous_hitpoints: f64,
    /// Damage that reached the hull, capped at the hitpoints available
    pub damage: f64,
    /// True if this hit took the target from alive to zero hitpoints
    pub killed: bool,
    /// Score value of the target at the time of the hit
    pub target_score_value: f64,
    /// Maximum hitpoints of the target
    pub target_max_hitpoints: f64,
    /// Team of the target
    pub target_team: Option<TeamId>,
    /// Spacecraft credited for the hit
    pub by: Option<SpacecraftId>,
    /// Whether a missile caused the hit
    pub by_missile: bool,
    /// Whether the hit is a collision
    pub is_collision: bool,
    /// Whether permanent effects must be reverted
    pub speculative: bool,
    /// Whether the target had hitpoints left before the hit
    pub live_hit: bool,
}

impl Spacecraft {
    /// Applies a hit to this spacecraft and raises `BeingHit` or `Collided`.
    ///
    /// Returns `None` for destroyed spacecraft. The caller must pass the
    /// report to the attacker's [`credit_hit`](Self::credit_hit) and then
    /// back to [`finish_hit`](Self::finish_hit).
    pub fn take_hit(&mut self, hit: &Hit, ctx: &SimulationContext) -> Option<HitReport> {
        if self.reject_destroyed("take_hit") {
            return None;
        }
        let previous_hitpoints = self.hitpoints;
        let live_hit = previous_hitpoints > 0.0;

        let mut amount = hit.amount.max(0.0);
        if let Some(shield) = &mut self.shield {
            amount = shield.absorb(amount);
        }
        amount = (amount - self.armor).max(0.0);

        self.hitpoints -= amount;
        let mut damage = amount;
        let mut killed = false;
        if self.hitpoints <= 0.0 {
            damage += self.hitpoints;
            self.hitpoints = 0.0;
            killed = live_hit;
            if killed {
                debug!(spacecraft = %self.id, by = ?hit.by, "fatal hit");
            }
        } else {
            self.spawn_damage_indicators(previous_hitpoints, hit, ctx);
        }

        let report = HitReport {
            target: self.handle,
            previous_hitpoints,
            damage,
            killed,
            target_score_value: self.score_value,
            target_max_hitpoints: self.max_hitpoints,
            target_team: self.team.clone(),
            by: hit.by,
            by_missile: hit.by_missile,
            is_collision: hit.is_collision,
            speculative: ctx.is_speculative(),
            live_hit,
        };

        let event = if hit.is_collision {
            EventId::Collided
        } else {
            EventId::BeingHit
        };
        self.handle_event(
            event,
            &EventData::Hit {
                damage,
                position: hit.position,
                direction: hit.direction,
                by: hit.by,
                by_missile: hit.by_missile,
            },
        );
        Some(report)
    }

    /// Credits this spacecraft for a hit it dealt.
    ///
    /// Statistics and score change only for authoritative hits on hostile
    /// spacecraft that still had hitpoints. `TargetHit` (when the hit
    /// spacecraft is the current target) and `AnySpacecraftHit` are raised
    /// for every weapon hit, collisions excluded.
    pub fn credit_hit(&mut self, report: &HitReport, ctx: &SimulationContext) {
        if self.destroyed {
            return;
        }
        if !report.speculative
            && report.live_hit
            && self.is_hostile_to_team(report.target_team.as_ref())
        {
            self.credit_score(report, ctx.config.kill_score_fraction);
        }

        if report.is_collision {
            return;
        }
        let data = EventData::HitDealt {
            target: report.target,
            damage: report.damage,
            by_missile: report.by_missile,
        };
        if report.target.is_some() && self.target() == report.target {
            self.handle_event(EventId::TargetHit, &data);
        }
        self.handle_event(EventId::AnySpacecraftHit, &data);
    }

    fn credit_score(&mut self, report: &HitReport, kill_score_fraction: f64) {
        self.stats.damage_dealt += report.damage;
        if report.by_missile {
            self.stats.missile_damage_dealt += report.damage;
        }
        if report.target_max_hitpoints > 0.0 {
            self.stats.score += (1.0 - kill_score_fraction) * report.damage
                / report.target_max_hitpoints
                * report.target_score_value;
        }
        if !report.is_collision {
            if report.by_missile {
                self.stats.missile_hits_on_enemies += 1;
            } else {
                self.stats.hits_on_enemies += 1;
            }
        }
        if report.killed {
            self.stats.score += kill_score_fraction * report.target_score_value;
            self.stats.kills += 1;
            debug!(spacecraft = %self.id, victim = ?report.target, kills = self.stats.kills, "kill credited");
            self.handle_event(
                EventId::GainKill,
                &EventData::Kill {
                    victim: report.target,
                },
            );
        }
    }

    /// Ends a hit: speculative hits get their hitpoints back.
    pub fn finish_hit(&mut self, report: &HitReport) {
        if report.speculative && !self.destroyed {
            trace!(spacecraft = %self.id, "reverting speculative hit");
            self.hitpoints = report.previous_hitpoints;
        }
    }

    /// Applies a hit with no attacker credit: [`take_hit`](Self::take_hit)
    /// followed by [`finish_hit`](Self::finish_hit).
    pub fn damage(&mut self, hit: &Hit, ctx: &SimulationContext) -> Option<HitReport> {
        let report = self.take_hit(hit, ctx)?;
        self.finish_hit(&report);
        Some(report)
    }

    fn spawn_damage_indicators(&mut self, previous_hitpoints: f64, hit: &Hit, ctx: &SimulationContext) {
        let Some(class) = self.class.clone() else {
            return;
        };
        if self.max_hitpoints <= 0.0 {
            return;
        }
        let before = previous_hitpoints / self.max_hitpoints * 100.0;
        let after = self.hitpoints / self.max_hitpoints * 100.0;

        for &threshold in &class.damage_indicator_thresholds {
            if before > threshold && threshold >= after {
                let position = self.damage_indicator_position(hit, ctx);
                let local_position =
                    self.body.orientation().transpose() * (position - self.body.position());
                self.damage_indicators.push(threshold);
                self.outbox.push_effect(Effect::DamageIndicator {
                    threshold,
                    position,
                    local_position,
                });
            }
        }
    }

    /// Point on the hull to attach a damage indicator to.
    fn damage_indicator_position(&self, hit: &Hit, ctx: &SimulationContext) -> Vec3 {
        let raw = hit.position;
        if hit.offset <= 0.0 {
            return raw;
        }
        let direction = hit.direction.normalize_or_zero();
        if direction != Vec3::ZERO {
            let start = raw - direction * hit.offset;
            if let Some(on_hull) = self.body.hit_test(start, direction, 2.0 * hit.offset) {
                return on_hull;
            }
        }

        let to_center = self.body.center() - raw;
        self.body
            .hit_test(raw, to_center, to_center.length())
            .filter(|p| p.distance_squared(raw) >= ctx.config.damage_indicator_min_distance_squared)
            .unwrap_or(raw)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;
    use std::sync::Arc;

    use super::*;
    use crate::class::{ShieldClass, SpacecraftClass};
    use crate::config::GameplayConfig;
    use crate::tests::helpers::{fighter_class, standalone_fighter};

    fn flat_shield(capacity: f64) -> Arc<ShieldClass> {
        Arc::new(ShieldClass {
            name: "buckler".into(),
            capacity,
            recharge_delay: 5.0,
            recharge_rate: 1.0,
            score_value: 0.0,
        })
    }

    fn armored(armor: f64) -> Spacecraft {
        let mut class = SpacecraftClass::clone(&fighter_class());
        class.armor = armor;
        Spacecraft::from_class(Arc::new(class))
    }

    #[test]
    fn shield_then_armor_then_hull() {
        let ctx = SimulationContext::default();
        let mut ship = armored(5.0);
        ship.equip_shield(flat_shield(10.0));

        let report = ship
            .damage(&Hit::new(30.0, Vec3::ZERO, Vec3::Y), &ctx)
            .unwrap();
        assert_eq!(report.damage, 15.0);
        assert_eq!(ship.hitpoints(), 85.0);
        assert_eq!(ship.shield_integrity(), 0.0);
    }

    #[test]
    fn armor_never_heals() {
        let ctx = SimulationContext::default();
        let mut ship = armored(50.0);
        let report = ship
            .damage(&Hit::new(10.0, Vec3::ZERO, Vec3::Y), &ctx)
            .unwrap();
        assert_eq!(report.damage, 0.0);
        assert_eq!(ship.hitpoints(), 100.0);
    }

    #[test]
    fn overkill_is_capped_and_clamped() {
        let ctx = SimulationContext::default();
        let mut ship = standalone_fighter();
        ship.set_hull_integrity(0.1);

        let report = ship
            .damage(&Hit::new(15.0, Vec3::ZERO, Vec3::Y), &ctx)
            .unwrap();
        assert!((report.damage - 10.0).abs() < 1e-9);
        assert!(report.killed);
        assert_eq!(ship.hitpoints(), 0.0);

        // A dead hull can be hit again but it is not another kill
        let again = ship
            .damage(&Hit::new(15.0, Vec3::ZERO, Vec3::Y), &ctx)
            .unwrap();
        assert!(!again.killed);
        assert!(!again.live_hit);
        assert_eq!(again.damage, 0.0);
    }

    #[test]
    fn speculative_hit_reverts_but_handlers_see_the_hit() {
        let ctx = SimulationContext::guest(GameplayConfig::default());
        let mut ship = standalone_fighter();
        let seen = Rc::new(Cell::new(0.0));
        let sink = Rc::clone(&seen);
        ship.add_event_handler(EventId::BeingHit, move |owner, _| {
            sink.set(owner.hitpoints());
            true
        });

        ship.damage(&Hit::new(50.0, Vec3::ZERO, Vec3::Y), &ctx);
        assert_eq!(seen.get(), 50.0);
        assert_eq!(ship.hitpoints(), 100.0);
    }

    #[test]
    fn collisions_raise_collided() {
        let ctx = SimulationContext::default();
        let mut ship = standalone_fighter();
        let collided = Rc::new(Cell::new(false));
        let sink = Rc::clone(&collided);
        ship.add_event_handler(EventId::Collided, move |_, _| {
            sink.set(true);
            true
        });
        ship.damage(&Hit::new(5.0, Vec3::ZERO, Vec3::Y).collision(), &ctx);
        assert!(collided.get());
    }

    #[test]
    fn crossing_thresholds_spawns_indicators_once() {
        let ctx = SimulationContext::default();
        let mut ship = standalone_fighter();
        // Thresholds at 75 and 50 percent
        ship.damage(&Hit::new(30.0, Vec3::new(0.0, 10.0, 0.0), -Vec3::Y), &ctx);
        ship.damage(&Hit::new(10.0, Vec3::new(0.0, 10.0, 0.0), -Vec3::Y), &ctx);
        ship.damage(&Hit::new(15.0, Vec3::new(0.0, 10.0, 0.0), -Vec3::Y), &ctx);

        let thresholds: Vec<f64> = ship
            .take_effects()
            .into_iter()
            .filter_map(|e| match e {
                Effect::DamageIndicator { threshold, .. } => Some(threshold),
                _ => None,
            })
            .collect();
        assert_eq!(thresholds, vec![75.0, 50.0]);
    }

    #[test]
    fn offset_hits_are_moved_onto_the_hull() {
        let ctx = SimulationContext::default();
        let mut ship = standalone_fighter();
        // Recorded 20 m past the nose along the projectile path; hull ends at y = 10
        let hit = Hit::new(30.0, Vec3::new(0.0, -10.0, 0.0), -Vec3::Y).with_offset(25.0);
        ship.damage(&hit, &ctx);

        let position = ship.take_effects().into_iter().find_map(|e| match e {
            Effect::DamageIndicator { position, .. } => Some(position),
            _ => None,
        });
        let position = position.unwrap();
        assert!(position.distance(Vec3::new(0.0, 10.0, 0.0)) < 1e-3);
    }
}
