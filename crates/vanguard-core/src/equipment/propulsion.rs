//! Thrusters turning burn levels into forces on the body.

use std::sync::Arc;

use glam::Vec3;

use crate::class::PropulsionClass;
use crate::physics::PhysicalBody;

/// Per-axis thruster burn levels in the ship's local frame.
///
/// `linear` is (strafe, forward, lift); `angular` is (pitch, roll, yaw),
/// i.e. rotation about local X, Y and Z.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ThrusterBurn {
    /// Linear burn levels
    pub linear: Vec3,
    /// Turning burn levels
    pub angular: Vec3,
}

/// Equipped propulsion.
#[derive(Debug, Clone)]
pub struct Propulsion {
    class: Arc<PropulsionClass>,
    burn: ThrusterBurn,
}

impl Propulsion {
    /// Installs propulsion of `class`.
    #[must_use]
    pub fn new(class: Arc<PropulsionClass>) -> Self {
        Self {
            class,
            burn: ThrusterBurn::default(),
        }
    }

    /// Propulsion class.
    #[must_use]
    pub fn class(&self) -> &Arc<PropulsionClass> {
        &self.class
    }

    /// Linear burn level cap.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn max_move_burn_level(&self) -> f32 {
        self.class.max_move_burn_level.max(1) as f32
    }

    /// Turning burn level cap.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn max_turn_burn_level(&self) -> f32 {
        self.class.max_turn_burn_level.max(1) as f32
    }

    /// Current burn levels.
    #[must_use]
    pub fn burn(&self) -> ThrusterBurn {
        self.burn
    }

    /// Sets burn levels, clamped to the caps.
    pub fn set_burn(&mut self, linear: Vec3, angular: Vec3) {
        let max_move = self.max_move_burn_level();
        let max_turn = self.max_turn_burn_level();
        self.burn = ThrusterBurn {
            linear: linear.clamp(Vec3::splat(-max_move), Vec3::splat(max_move)),
            angular: angular.clamp(Vec3::splat(-max_turn), Vec3::splat(max_turn)),
        };
    }

    /// Shuts every thruster off.
    pub fn reset_thruster_burn(&mut self) {
        self.burn = ThrusterBurn::default();
    }

    /// World-space force and torque produced by the current burn.
    #[must_use]
    pub fn forces(&self, body: &dyn PhysicalBody) -> (Vec3, Vec3) {
        let orientation = body.orientation();
        let force = self.burn.linear / self.max_move_burn_level() * self.class.thrust;
        let torque = self.burn.angular / self.max_turn_burn_level() * self.class.angular_thrust;
        (orientation * force, orientation * torque)
    }

    /// Pushes the burn into the body for `dt` seconds unless `suppressed`.
    pub fn simulate(&self, dt: f32, body: &mut dyn PhysicalBody, suppressed: bool) {
        if suppressed || self.burn == ThrusterBurn::default() {
            return;
        }
        let (force, torque) = self.forces(body);
        body.add_force(force, dt);
        body.add_torque(torque, dt);
    }

    /// Score contribution.
    #[must_use]
    pub fn score_value(&self) -> f64 {
        self.class.score_value
    }
}
