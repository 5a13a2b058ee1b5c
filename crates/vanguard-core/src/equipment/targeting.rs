//! Target tracking, lead computation and missile lock.

use glam::Vec3;

use crate::physics::Frame;
use crate::spacecraft::SpacecraftId;

/// Snapshot of a target resolved by the arena for one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetView {
    /// Target id
    pub id: SpacecraftId,
    /// World-space position
    pub position: Vec3,
    /// World-space velocity
    pub velocity: Vec3,
    /// False once the target is dead or away
    pub alive: bool,
}

/// Missile lock requirements of the active launcher.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LockParameters {
    /// Seconds in range needed for a full lock
    pub lock_time: f32,
    /// Maximum lock distance (m)
    pub locking_range: f32,
}

/// Tracks the current target of a spacecraft.
///
/// The target is held by id. Each step the arena resolves it into a
/// [`TargetView`]; a missing or dead view drops the target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetingComputer {
    target: Option<SpacecraftId>,
    view: Option<TargetView>,
    own: Option<Frame>,
    projectile_speed: Option<f32>,
    lock: Option<LockParameters>,
    time_in_lock: f32,
}

impl TargetingComputer {
    /// Creates a computer with no target.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current target.
    #[must_use]
    pub fn target(&self) -> Option<SpacecraftId> {
        self.target
    }

    /// Last resolved view of the target.
    #[must_use]
    pub fn target_view(&self) -> Option<TargetView> {
        self.view
    }

    /// Changes the target. Any lock in progress is lost.
    pub fn set_target(&mut self, target: Option<SpacecraftId>) {
        if self.target != target {
            self.target = target;
            self.view = None;
            self.time_in_lock = 0.0;
        }
    }

    /// Updates tracking. Returns the dropped target if it was lost.
    ///
    /// # Arguments
    ///
    /// * `dt` - Step length in seconds
    /// * `own` - Frame of the owning spacecraft
    /// * `view` - The target as resolved this step, if it still exists
    /// * `projectile_speed` - Projectile speed of the first weapon, used for leading
    /// * `lock` - Lock requirements of the active launcher
    pub fn simulate(
        &mut self,
        dt: f32,
        own: &Frame,
        view: Option<TargetView>,
        projectile_speed: Option<f32>,
        lock: Option<LockParameters>,
    ) -> Option<SpacecraftId> {
        self.own = Some(*own);
        self.projectile_speed = projectile_speed;
        if self.lock != lock {
            self.time_in_lock = 0.0;
        }
        self.lock = lock;

        let target = self.target?;
        match view {
            Some(view) if view.id == target && view.alive => {
                self.view = Some(view);
            }
            _ => {
                self.set_target(None);
                return Some(target);
            }
        }

        if self.is_in_locking_range() {
            self.time_in_lock += dt;
        } else {
            self.time_in_lock = 0.0;
        }
        None
    }

    /// Returns true if a lock can currently be acquired.
    #[must_use]
    pub fn is_in_locking_range(&self) -> bool {
        match (self.view, self.own, self.lock) {
            (Some(view), Some(own), Some(lock)) => {
                view.position.distance(own.position) <= lock.locking_range
            }
            _ => false,
        }
    }

    /// Lock progress in `[0, 1]`. Launchers needing no lock report 1.
    #[must_use]
    pub fn missile_lock_ratio(&self) -> f32 {
        match self.lock {
            Some(lock) if lock.lock_time > 0.0 => (self.time_in_lock / lock.lock_time).min(1.0),
            Some(_) if self.is_in_locking_range() => 1.0,
            _ => 0.0,
        }
    }

    /// World-space point to aim at so a projectile meets the target.
    ///
    /// Falls back to the target position when no intercept exists.
    #[must_use]
    pub fn target_hit_position(&self) -> Option<Vec3> {
        let view = self.view?;
        let Some(own) = self.own else {
            return Some(view.position);
        };
        let Some(speed) = self.projectile_speed.filter(|s| *s > 0.0) else {
            return Some(view.position);
        };
        let relative_position = view.position - own.position;
        let relative_velocity = view.velocity - own.velocity;
        Some(match intercept_time(relative_position, relative_velocity, speed) {
            Some(t) => view.position + relative_velocity * t,
            None => view.position,
        })
    }
}

/// Smallest positive `t` with `|p + v t| = s t`.
fn intercept_time(p: Vec3, v: Vec3, s: f32) -> Option<f32> {
    let a = v.length_squared() - s * s;
    let b = 2.0 * p.dot(v);
    let c = p.length_squared();
    if a.abs() < f32::EPSILON {
        let t = -c / b;
        return (b < 0.0 && t > 0.0).then_some(t);
    }
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }
    let root = discriminant.sqrt();
    let t1 = (-b - root) / (2.0 * a);
    let t2 = (-b + root) / (2.0 * a);
    [t1, t2]
        .into_iter()
        .filter(|t| *t > 0.0)
        .min_by(f32::total_cmp)
}
