//! Fixed-layout multiplayer records.
//!
//! The host is authoritative: once per network tick it sends a host record
//! for every spacecraft, and guests overwrite their local state with it.
//! Guests send a short guest record carrying only their own controls.
//!
//! # Host record (30 values)
//!
//! | Index   | Content                                        |
//! |---------|------------------------------------------------|
//! | 0..3    | position                                       |
//! | 3..6    | forward axis                                   |
//! | 6..9    | up axis                                        |
//! | 9       | hull integrity                                 |
//! | 10      | shield integrity                               |
//! | 11      | fired since the last record (1 or 0)           |
//! | 12..15  | velocity                                       |
//! | 15..24  | one second of rotation, as matrix columns      |
//! | 24..30  | maneuvering targets                            |
//!
//! The targets are written as speed, strafe, lift, yaw, pitch, roll, but
//! read back with yaw and pitch exchanged (index 27 feeds pitch, 28 feeds
//! yaw). Deployed peers depend on this pairing, so both directions keep it.
//!
//! # Guest record (8 values)
//!
//! | Index | Content                                       |
//! |-------|-----------------------------------------------|
//! | 0     | spacecraft index                              |
//! | 1..7  | speed, strafe, lift, yaw, pitch, roll targets |
//! | 7     | fired since the last record (1 or 0)          |

use glam::{Mat3, Quat, Vec3};
use tracing::trace;

use crate::equipment::ManeuveringTargets;
use crate::error::SyncError;
use crate::spacecraft::{Spacecraft, StatusFlags};

/// Number of values in a host record.
pub const HOST_RECORD_LEN: usize = 30;

/// Number of values in a guest record.
pub const GUEST_RECORD_LEN: usize = 8;

const FIRED_THRESHOLD: f32 = 0.5;

fn vec3_at(data: &[f32], at: usize) -> Vec3 {
    Vec3::new(data[at], data[at + 1], data[at + 2])
}

fn write_vec3(buffer: &mut [f32], at: usize, value: Vec3) {
    buffer[at..at + 3].copy_from_slice(&value.to_array());
}

fn record<'a>(data: &'a [f32], offset: usize, len: usize) -> Result<&'a [f32], SyncError> {
    data.get(offset..offset + len)
        .ok_or(SyncError::BufferTooShort {
            needed: offset + len,
            got: data.len(),
        })
}

fn flag_value(set: bool) -> f32 {
    if set {
        1.0
    } else {
        0.0
    }
}

impl Spacecraft {
    /// Encodes the host record. Clears the host "fired" flag.
    #[allow(clippy::cast_possible_truncation)]
    pub fn get_multi_host_data(&mut self) -> &[f32; HOST_RECORD_LEN] {
        let fired = self.take_flag(StatusFlags::HOST_FIRED);
        let orientation = self.body().orientation();
        let spin = Mat3::from_quat(Quat::from_scaled_axis(self.body().angular_velocity()));
        let targets = self.maneuvering().targets();
        let position = self.position();
        let velocity = self.velocity();
        let hull = self.hull_integrity() as f32;
        let shield = self.shield_integrity() as f32;

        let buffer = &mut self.multi_host_buffer;
        write_vec3(buffer, 0, position);
        write_vec3(buffer, 3, orientation.y_axis);
        write_vec3(buffer, 6, orientation.z_axis);
        buffer[9] = hull;
        buffer[10] = shield;
        buffer[11] = flag_value(fired);
        write_vec3(buffer, 12, velocity);
        buffer[15..24].copy_from_slice(&spin.to_cols_array());
        buffer[24] = targets.speed;
        buffer[25] = targets.strafe;
        buffer[26] = targets.lift;
        buffer[27] = targets.yaw;
        buffer[28] = targets.pitch;
        buffer[29] = targets.roll;
        &self.multi_host_buffer
    }

    /// Applies a host record starting at `offset` in `data`.
    ///
    /// A set "fired" value latches a fire request for the next step.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::BufferTooShort`] if `data` ends before the record.
    pub fn apply_multi_host_data(&mut self, data: &[f32], offset: usize) -> Result<(), SyncError> {
        let data = record(data, offset, HOST_RECORD_LEN)?;
        if self.is_destroyed() {
            trace!(spacecraft = %self.id(), "skipping host record for destroyed spacecraft");
            return Ok(());
        }

        let forward = vec3_at(data, 3);
        let up = vec3_at(data, 6);
        let orientation = Mat3::from_cols(forward.cross(up), forward, up);
        let spin = Mat3::from_cols_slice(&data[15..24]);

        let body = self.body_mut();
        body.set_position(vec3_at(data, 0));
        body.set_orientation(orientation);
        body.set_velocity(vec3_at(data, 12));
        let rotation = Quat::from_mat3(&spin);
        // Shortest arc, so the recovered rate stays below half a turn per second
        let rotation = if rotation.w < 0.0 { -rotation } else { rotation };
        body.set_angular_velocity(rotation.to_scaled_axis());

        self.set_hull_integrity(f64::from(data[9]));
        self.set_shield_integrity(f64::from(data[10]));
        self.maneuvering_mut().set_targets(ManeuveringTargets {
            speed: data[24],
            strafe: data[25],
            lift: data[26],
            pitch: data[27],
            yaw: data[28],
            roll: data[29],
        });
        if data[11] > FIRED_THRESHOLD {
            self.request_fire(false);
        }
        Ok(())
    }

    /// Encodes the guest record. Clears the guest "fired" flag.
    pub fn get_multi_guest_data(&mut self) -> &[f32; GUEST_RECORD_LEN] {
        let fired = self.take_flag(StatusFlags::GUEST_FIRED);
        #[allow(clippy::cast_precision_loss)]
        let index = self.handle().map_or(0.0, |h| h.raw() as f32);
        let targets = self.maneuvering().targets();

        let buffer = &mut self.multi_guest_buffer;
        buffer[0] = index;
        buffer[1] = targets.speed;
        buffer[2] = targets.strafe;
        buffer[3] = targets.lift;
        buffer[4] = targets.yaw;
        buffer[5] = targets.pitch;
        buffer[6] = targets.roll;
        buffer[7] = flag_value(fired);
        &self.multi_guest_buffer
    }

    /// Applies the controls of a guest record. The index is not checked.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::BufferTooShort`] if `data` is shorter than a record.
    pub fn apply_multi_guest_data(&mut self, data: &[f32]) -> Result<(), SyncError> {
        let data = record(data, 0, GUEST_RECORD_LEN)?;
        if self.is_destroyed() {
            return Ok(());
        }
        self.maneuvering_mut().set_targets(ManeuveringTargets {
            speed: data[1],
            strafe: data[2],
            lift: data[3],
            yaw: data[4],
            pitch: data[5],
            roll: data[6],
        });
        if data[7] > FIRED_THRESHOLD {
            self.request_fire(false);
        }
        Ok(())
    }
}
