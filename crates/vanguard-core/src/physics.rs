//! Physical body abstraction and the reference rigid body integrator.
//!
//! The spacecraft never integrates motion itself. It owns a boxed
//! [`PhysicalBody`] and pushes forces and torques into it; the body does the
//! integration. [`RigidBody`] is the in-crate implementation used by tests,
//! benches and engines that do not bring their own physics.
//!
//! # Conventions
//!
//! Orientation is a rotation matrix whose columns are the local axes in world
//! space: `x_axis` points right, `y_axis` forward and `z_axis` up. Angular
//! velocity is a world-space scaled axis (radians per second).
//!
//! # Fixed Timestep
//!
//! Drivers are expected to step the simulation with [`FIXED_DT`]. Nothing in
//! the crate depends on the value, but determinism tests assume it.

use std::fmt;

use glam::{Mat3, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Fixed timestep for simulation steps (1/60 second = ~16.67ms).
pub const FIXED_DT: f32 = 1.0 / 60.0;

/// Interface to the physics object a spacecraft is attached to.
///
/// Forces and torques are world-space and accumulate until the next
/// [`simulate`](PhysicalBody::simulate) call.
pub trait PhysicalBody: fmt::Debug {
    /// World-space position of the body origin.
    fn position(&self) -> Vec3;
    /// Moves the body origin.
    fn set_position(&mut self, position: Vec3);
    /// World-space orientation (columns: right, forward, up).
    fn orientation(&self) -> Mat3;
    /// Replaces the orientation.
    fn set_orientation(&mut self, orientation: Mat3);
    /// World-space linear velocity.
    fn velocity(&self) -> Vec3;
    /// Replaces the linear velocity.
    fn set_velocity(&mut self, velocity: Vec3);
    /// World-space angular velocity as a scaled axis.
    fn angular_velocity(&self) -> Vec3;
    /// Replaces the angular velocity.
    fn set_angular_velocity(&mut self, angular_velocity: Vec3);
    /// Mass of the body (kg).
    fn mass(&self) -> f32;
    /// Queues a world-space force acting for `duration` seconds.
    fn add_force(&mut self, force: Vec3, duration: f32);
    /// Queues a world-space torque acting for `duration` seconds.
    fn add_torque(&mut self, torque: Vec3, duration: f32);
    /// Integrates the body over `dt` seconds.
    fn simulate(&mut self, dt: f32);
    /// Clears velocities and any queued forces.
    fn reset(&mut self);
    /// Casts a ray against the hull.
    ///
    /// Returns the first surface point within `max_distance` of `origin`
    /// along `direction`, or `None` on a miss.
    fn hit_test(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<Vec3>;
    /// World-space center of the hull.
    fn center(&self) -> Vec3 {
        self.position()
    }
}

/// Pose and velocity of a body at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// World-space position
    pub position: Vec3,
    /// World-space orientation (columns: right, forward, up)
    pub orientation: Mat3,
    /// World-space linear velocity
    pub velocity: Vec3,
}

impl Frame {
    /// Captures the current frame of a body.
    #[must_use]
    pub fn of(body: &dyn PhysicalBody) -> Self {
        Self {
            position: body.position(),
            orientation: body.orientation(),
            velocity: body.velocity(),
        }
    }

    /// Forward direction (local +Y) in world space.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.orientation.y_axis
    }

    /// Transforms a ship-local point into world space.
    #[must_use]
    pub fn to_world(&self, local: Vec3) -> Vec3 {
        self.position + self.orientation * local
    }
}

/// Reference rigid body with an oriented box hull.
///
/// Integration is semi-implicit Euler: queued impulses update velocities,
/// linear drag is applied, then velocities update the pose. The moment of
/// inertia is approximated by the mass.
///
/// # Example
///
/// ```
/// use glam::Vec3;
/// use vanguard_core::physics::{PhysicalBody, RigidBody, FIXED_DT};
///
/// let mut body = RigidBody::new(1000.0, Vec3::new(5.0, 10.0, 2.0));
/// body.add_force(Vec3::new(0.0, 60_000.0, 0.0), FIXED_DT);
/// body.simulate(FIXED_DT);
///
/// assert!(body.velocity().y > 0.0);
/// assert!(body.position().y > 0.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RigidBody {
    position: Vec3,
    orientation: Mat3,
    velocity: Vec3,
    angular_velocity: Vec3,
    mass: f32,
    /// Fraction of velocity lost per second
    drag: f32,
    /// Half size of the hull box along the local axes
    half_extents: Vec3,
    /// Accumulated linear impulse (force * duration)
    pending_impulse: Vec3,
    /// Accumulated angular impulse (torque * duration)
    pending_angular_impulse: Vec3,
}

impl RigidBody {
    /// Creates a body at rest at the origin with identity orientation.
    ///
    /// # Arguments
    ///
    /// * `mass` - Mass in kg; non-positive values are clamped to 1
    /// * `half_extents` - Half size of the hull box along the local axes
    #[must_use]
    pub fn new(mass: f32, half_extents: Vec3) -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Mat3::IDENTITY,
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            mass: if mass > 0.0 { mass } else { 1.0 },
            drag: 0.0,
            half_extents: half_extents.abs(),
            pending_impulse: Vec3::ZERO,
            pending_angular_impulse: Vec3::ZERO,
        }
    }

    /// Sets the linear drag coefficient (fraction of velocity lost per second).
    #[must_use]
    pub fn with_drag(mut self, drag: f32) -> Self {
        self.drag = drag.max(0.0);
        self
    }

    /// Places the body.
    #[must_use]
    pub fn with_pose(mut self, position: Vec3, orientation: Mat3) -> Self {
        self.position = position;
        self.orientation = orientation;
        self
    }

    /// Half size of the hull box.
    #[must_use]
    pub fn half_extents(&self) -> Vec3 {
        self.half_extents
    }
}

impl PhysicalBody for RigidBody {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    fn orientation(&self) -> Mat3 {
        self.orientation
    }

    fn set_orientation(&mut self, orientation: Mat3) {
        self.orientation = orientation;
    }

    fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    fn angular_velocity(&self) -> Vec3 {
        self.angular_velocity
    }

    fn set_angular_velocity(&mut self, angular_velocity: Vec3) {
        self.angular_velocity = angular_velocity;
    }

    fn mass(&self) -> f32 {
        self.mass
    }

    fn add_force(&mut self, force: Vec3, duration: f32) {
        self.pending_impulse += force * duration;
    }

    fn add_torque(&mut self, torque: Vec3, duration: f32) {
        self.pending_angular_impulse += torque * duration;
    }

    fn simulate(&mut self, dt: f32) {
        self.velocity += self.pending_impulse / self.mass;
        self.angular_velocity += self.pending_angular_impulse / self.mass;
        self.pending_impulse = Vec3::ZERO;
        self.pending_angular_impulse = Vec3::ZERO;

        if self.drag > 0.0 {
            self.velocity *= (1.0 - self.drag * dt).max(0.0);
        }

        self.position += self.velocity * dt;

        if self.angular_velocity != Vec3::ZERO {
            let rotation = Quat::from_scaled_axis(self.angular_velocity * dt);
            // Renormalize through a quaternion so rounding never shears the basis
            let current = Quat::from_mat3(&self.orientation);
            self.orientation = Mat3::from_quat((rotation * current).normalize());
        }
    }

    fn reset(&mut self) {
        self.velocity = Vec3::ZERO;
        self.angular_velocity = Vec3::ZERO;
        self.pending_impulse = Vec3::ZERO;
        self.pending_angular_impulse = Vec3::ZERO;
    }

    fn hit_test(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<Vec3> {
        let direction = direction.normalize_or_zero();
        if direction == Vec3::ZERO || max_distance < 0.0 {
            return None;
        }

        // Slab test in the hull's local frame
        let inverse = self.orientation.transpose();
        let local_origin = inverse * (origin - self.position);
        let local_direction = inverse * direction;

        let mut t_near = f32::NEG_INFINITY;
        let mut t_far = f32::INFINITY;
        for axis in 0..3 {
            let o = local_origin[axis];
            let d = local_direction[axis];
            let h = self.half_extents[axis];
            if d.abs() < f32::EPSILON {
                if o.abs() > h {
                    return None;
                }
                continue;
            }
            let t1 = (-h - o) / d;
            let t2 = (h - o) / d;
            t_near = t_near.max(t1.min(t2));
            t_far = t_far.min(t1.max(t2));
            if t_near > t_far {
                return None;
            }
        }

        // Starting inside the hull reports the exit point
        let t = if t_near >= 0.0 { t_near } else { t_far };
        if t < 0.0 || t > max_distance {
            return None;
        }
        Some(origin + direction * t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        a.distance(b) < 1e-3
    }

    #[test]
    fn fixed_dt_is_60hz() {
        assert!((FIXED_DT - 1.0 / 60.0).abs() < f32::EPSILON);
    }

    #[test]
    fn force_changes_velocity_by_impulse_over_mass() {
        let mut body = RigidBody::new(10.0, Vec3::ONE);
        body.add_force(Vec3::new(100.0, 0.0, 0.0), 0.5);
        body.simulate(1.0);
        assert!(approx(body.velocity(), Vec3::new(5.0, 0.0, 0.0)));
        assert!(approx(body.position(), Vec3::new(5.0, 0.0, 0.0)));

        // Impulses are consumed
        body.simulate(1.0);
        assert!(approx(body.velocity(), Vec3::new(5.0, 0.0, 0.0)));
    }

    #[test]
    fn drag_slows_the_body() {
        let mut body = RigidBody::new(1.0, Vec3::ONE).with_drag(0.5);
        body.set_velocity(Vec3::new(0.0, 10.0, 0.0));
        body.simulate(1.0);
        assert!(approx(body.velocity(), Vec3::new(0.0, 5.0, 0.0)));
    }

    #[test]
    fn angular_velocity_rotates_orientation() {
        let mut body = RigidBody::new(1.0, Vec3::ONE);
        body.set_angular_velocity(Vec3::new(0.0, 0.0, std::f32::consts::FRAC_PI_2));
        body.simulate(1.0);
        // A quarter turn about +Z turns forward (+Y) into -X
        assert!(approx(body.orientation().y_axis, Vec3::new(-1.0, 0.0, 0.0)));
    }

    #[test]
    fn reset_clears_motion() {
        let mut body = RigidBody::new(1.0, Vec3::ONE);
        body.set_velocity(Vec3::ONE);
        body.set_angular_velocity(Vec3::ONE);
        body.add_force(Vec3::ONE, 1.0);
        body.reset();
        body.simulate(1.0);
        assert_eq!(body.velocity(), Vec3::ZERO);
        assert_eq!(body.angular_velocity(), Vec3::ZERO);
        assert_eq!(body.position(), Vec3::ZERO);
    }

    #[test]
    fn hit_test_finds_near_face() {
        let body = RigidBody::new(1.0, Vec3::new(2.0, 4.0, 1.0));
        let hit = body.hit_test(Vec3::new(0.0, -20.0, 0.0), Vec3::Y, 100.0);
        assert!(approx(hit.unwrap(), Vec3::new(0.0, -4.0, 0.0)));
    }

    #[test]
    fn hit_test_respects_range_and_misses() {
        let body = RigidBody::new(1.0, Vec3::ONE);
        assert!(body.hit_test(Vec3::new(0.0, -20.0, 0.0), Vec3::Y, 5.0).is_none());
        assert!(body.hit_test(Vec3::new(5.0, -20.0, 0.0), Vec3::Y, 100.0).is_none());
        assert!(body.hit_test(Vec3::new(0.0, -20.0, 0.0), Vec3::ZERO, 100.0).is_none());
    }

    #[test]
    fn hit_test_from_inside_reports_exit() {
        let body = RigidBody::new(1.0, Vec3::ONE);
        let hit = body.hit_test(Vec3::ZERO, Vec3::X, 10.0);
        assert!(approx(hit.unwrap(), Vec3::new(1.0, 0.0, 0.0)));
    }

    #[test]
    fn hit_test_follows_orientation() {
        // Rotated a quarter turn: the long local Y axis now lies along world -X
        let orientation = Mat3::from_rotation_z(std::f32::consts::FRAC_PI_2);
        let body = RigidBody::new(1.0, Vec3::new(1.0, 4.0, 1.0))
            .with_pose(Vec3::new(10.0, 0.0, 0.0), orientation);
        let hit = body.hit_test(Vec3::new(-10.0, 0.0, 0.0), Vec3::X, 100.0);
        assert!(approx(hit.unwrap(), Vec3::new(6.0, 0.0, 0.0)));
    }

    #[test]
    fn frame_helpers() {
        let body = RigidBody::new(1.0, Vec3::ONE)
            .with_pose(Vec3::new(1.0, 2.0, 3.0), Mat3::IDENTITY);
        let frame = Frame::of(&body);
        assert_eq!(frame.forward(), Vec3::Y);
        assert!(approx(frame.to_world(Vec3::X), Vec3::new(2.0, 2.0, 3.0)));
    }
}
