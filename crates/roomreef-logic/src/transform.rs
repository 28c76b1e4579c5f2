//! Rigid transforms in the column-major 4x4 layout plane poses arrive in.
//!
//! Rotation-plus-translation only, so the inverse is a cheap transpose.
//! Each boundary stores one forward and one inverse pose computed at scan
//! time; nothing re-derives rotations from angles per frame.

use serde::{Deserialize, Serialize};

/// Column-major 4x4 rigid transform.
///
/// Columns 0-2 are the rotated basis vectors, column 3 is the translation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub m: [f32; 16],
}

impl Pose {
    pub const IDENTITY: Self = Self {
        m: [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ],
    };

    pub fn from_cols(m: [f32; 16]) -> Self {
        Self { m }
    }

    /// Translation combined with a right-handed rotation about +Y.
    pub fn from_translation_rotation_y(x: f32, y: f32, z: f32, yaw: f32) -> Self {
        let (s, c) = yaw.sin_cos();
        Self {
            m: [
                c, 0.0, -s, 0.0, //
                0.0, 1.0, 0.0, 0.0, //
                s, 0.0, c, 0.0, //
                x, y, z, 1.0,
            ],
        }
    }

    pub fn from_translation(x: f32, y: f32, z: f32) -> Self {
        Self::from_translation_rotation_y(x, y, z, 0.0)
    }

    pub fn translation(&self) -> (f32, f32, f32) {
        (self.m[12], self.m[13], self.m[14])
    }

    /// Yaw angle of the rotation part, in radians.
    pub fn rotation_y(&self) -> f32 {
        self.m[8].atan2(self.m[10])
    }

    /// Apply rotation and translation to a point.
    pub fn transform_point(&self, x: f32, y: f32, z: f32) -> (f32, f32, f32) {
        let m = &self.m;
        (
            m[0] * x + m[4] * y + m[8] * z + m[12],
            m[1] * x + m[5] * y + m[9] * z + m[13],
            m[2] * x + m[6] * y + m[10] * z + m[14],
        )
    }

    /// Apply the rotation part only, for directions and velocities.
    pub fn rotate_vector(&self, x: f32, y: f32, z: f32) -> (f32, f32, f32) {
        let m = &self.m;
        (
            m[0] * x + m[4] * y + m[8] * z,
            m[1] * x + m[5] * y + m[9] * z,
            m[2] * x + m[6] * y + m[10] * z,
        )
    }

    /// Inverse of a rigid transform: transposed rotation, back-rotated
    /// negated translation. Not valid for scaled or sheared matrices.
    pub fn inverse_rigid(&self) -> Self {
        let m = &self.m;
        let (tx, ty, tz) = (m[12], m[13], m[14]);
        Self {
            m: [
                m[0], m[4], m[8], 0.0, //
                m[1], m[5], m[9], 0.0, //
                m[2], m[6], m[10], 0.0, //
                -(m[0] * tx + m[1] * ty + m[2] * tz),
                -(m[4] * tx + m[5] * ty + m[6] * tz),
                -(m[8] * tx + m[9] * ty + m[10] * tz),
                1.0,
            ],
        }
    }

    /// The same pose shifted by an offset expressed in its own local frame.
    pub fn translate_local(&self, x: f32, y: f32, z: f32) -> Self {
        let (dx, dy, dz) = self.rotate_vector(x, y, z);
        let mut m = self.m;
        m[12] += dx;
        m[13] += dy;
        m[14] += dz;
        Self { m }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}
