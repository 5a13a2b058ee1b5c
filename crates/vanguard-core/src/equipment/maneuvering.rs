//! Flight computer translating movement intent into thruster burn.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::propulsion::Propulsion;
use crate::physics::PhysicalBody;

/// Desired local-frame velocities.
///
/// Linear targets are in m/s, turning targets in rad/s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ManeuveringTargets {
    /// Forward speed (local +Y)
    pub speed: f32,
    /// Sideways speed (local +X is right)
    pub strafe: f32,
    /// Vertical speed (local +Z is up)
    pub lift: f32,
    /// Turn rate about local Z (positive turns left)
    pub yaw: f32,
    /// Turn rate about local X (positive pitches up)
    pub pitch: f32,
    /// Turn rate about local Y (positive rolls right)
    pub roll: f32,
}

/// Holds maneuvering targets and drives the propulsion towards them.
#[derive(Debug, Clone, PartialEq)]
pub struct ManeuveringComputer {
    targets: ManeuveringTargets,
    max_speed: f32,
    max_turn_rate: f32,
}

fn intensity(value: Option<f32>) -> f32 {
    value.unwrap_or(1.0).clamp(0.0, 1.0)
}

impl ManeuveringComputer {
    /// Creates a computer with the given speed and turn rate limits.
    #[must_use]
    pub fn new(max_speed: f32, max_turn_rate: f32) -> Self {
        Self {
            targets: ManeuveringTargets::default(),
            max_speed,
            max_turn_rate,
        }
    }

    /// Current targets.
    #[must_use]
    pub fn targets(&self) -> ManeuveringTargets {
        self.targets
    }

    /// Replaces every target (used when applying network records).
    pub fn set_targets(&mut self, targets: ManeuveringTargets) {
        self.targets = targets;
    }

    /// Speed reached at full forward intent.
    #[must_use]
    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }

    /// Turn rate reached at full turning intent.
    #[must_use]
    pub fn max_turn_rate(&self) -> f32 {
        self.max_turn_rate
    }

    /// Accelerate forward; `None` means full intensity.
    pub fn forward(&mut self, value: Option<f32>) {
        self.targets.speed = self.max_speed * intensity(value);
    }

    /// Accelerate backward.
    pub fn reverse(&mut self, value: Option<f32>) {
        self.targets.speed = -self.max_speed * intensity(value);
    }

    /// Strafe left.
    pub fn strafe_left(&mut self, value: Option<f32>) {
        self.targets.strafe = -self.max_speed * intensity(value);
    }

    /// Strafe right.
    pub fn strafe_right(&mut self, value: Option<f32>) {
        self.targets.strafe = self.max_speed * intensity(value);
    }

    /// Lift up.
    pub fn raise(&mut self, value: Option<f32>) {
        self.targets.lift = self.max_speed * intensity(value);
    }

    /// Lift down.
    pub fn lower(&mut self, value: Option<f32>) {
        self.targets.lift = -self.max_speed * intensity(value);
    }

    /// Turn left.
    pub fn yaw_left(&mut self, value: Option<f32>) {
        self.targets.yaw = self.max_turn_rate * intensity(value);
    }

    /// Turn right.
    pub fn yaw_right(&mut self, value: Option<f32>) {
        self.targets.yaw = -self.max_turn_rate * intensity(value);
    }

    /// Nose up.
    pub fn pitch_up(&mut self, value: Option<f32>) {
        self.targets.pitch = self.max_turn_rate * intensity(value);
    }

    /// Nose down.
    pub fn pitch_down(&mut self, value: Option<f32>) {
        self.targets.pitch = -self.max_turn_rate * intensity(value);
    }

    /// Roll left.
    pub fn roll_left(&mut self, value: Option<f32>) {
        self.targets.roll = -self.max_turn_rate * intensity(value);
    }

    /// Roll right.
    pub fn roll_right(&mut self, value: Option<f32>) {
        self.targets.roll = self.max_turn_rate * intensity(value);
    }

    /// Zeroes every target.
    pub fn stop(&mut self) {
        self.targets = ManeuveringTargets::default();
    }

    /// Sets the propulsion burn that best closes the gap between the
    /// body's current local velocities and the targets within `dt`.
    pub fn update(&self, dt: f32, body: &dyn PhysicalBody, propulsion: &mut Propulsion) {
        if dt <= 0.0 {
            return;
        }
        let inverse = body.orientation().transpose();
        let local_velocity = inverse * body.velocity();
        let local_turning = inverse * body.angular_velocity();

        let desired_velocity = Vec3::new(self.targets.strafe, self.targets.speed, self.targets.lift);
        let desired_turning = Vec3::new(self.targets.pitch, self.targets.roll, self.targets.yaw);

        let mass = body.mass();
        let class = propulsion.class();
        // Velocity change one tick of full burn can produce
        let linear_step = class.thrust / mass * dt;
        let angular_step = class.angular_thrust / mass * dt;

        let linear = burn_fraction(desired_velocity - local_velocity, linear_step)
            * propulsion.max_move_burn_level();
        let angular = burn_fraction(desired_turning - local_turning, angular_step)
            * propulsion.max_turn_burn_level();
        propulsion.set_burn(linear, angular);
    }
}

fn burn_fraction(delta: Vec3, full_burn_step: f32) -> Vec3 {
    if full_burn_step <= 0.0 {
        return Vec3::ZERO;
    }
    (delta / full_burn_step).clamp(Vec3::NEG_ONE, Vec3::ONE)
}
