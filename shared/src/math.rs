//! Math types for Zeffyr
//!
//! Positions and scales are plain `glam` double-precision vectors, rotations
//! are `glam` quaternions. The only derived value the pipeline serializes is
//! the flattened 3x4 affine [`Transform`].

use serde::{Deserialize, Serialize};

/// Position, scale or box half-extents.
pub type Vector3 = glam::DVec3;

/// Rotation as (x, y, z, w). Never normalized by [`Transform::form`].
pub type Quaternion = glam::DQuat;

/// Number of fractional digits kept when a transform is written as text.
pub const TRANSFORM_PRECISION: u32 = 4;

/// 3x4 affine transform (row-major storage)
///
/// Memory layout (12 doubles):
/// - `[0..3]`: basis row 0, scaled by `scl.x`
/// - `[3..6]`: basis row 1, scaled by `scl.y`
/// - `[6..9]`: basis row 2, scaled by `scl.z`
/// - `[9..12]`: translation (unscaled, unrotated)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub matrix: [f64; 12],
}

impl Transform {
    /// Identity transform (no translation, rotation or scale)
    pub const IDENTITY: Self = Self {
        matrix: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0],
    };

    /// Identity transform (no translation, rotation or scale)
    pub const fn identity() -> Self {
        Self::IDENTITY
    }

    /// Place an object at `pos`, oriented by `rot`, scaled per-axis by `scl`.
    ///
    /// `rot` must be a unit quaternion; a non-unit quaternion silently
    /// produces a skewed basis.
    pub fn form(pos: Vector3, rot: Quaternion, scl: Vector3) -> Self {
        let xx = rot.x * rot.x;
        let xy = rot.x * rot.y;
        let xz = rot.x * rot.z;
        let yy = rot.y * rot.y;
        let yz = rot.y * rot.z;
        let zz = rot.z * rot.z;

        let wx = rot.w * rot.x;
        let wy = rot.w * rot.y;
        let wz = rot.w * rot.z;

        Self {
            matrix: [
                scl.x * (1.0 - 2.0 * (yy + zz)),
                scl.x * (2.0 * (xy - wz)),
                scl.x * (2.0 * (xz + wy)),
                scl.y * (2.0 * (xy + wz)),
                scl.y * (1.0 - 2.0 * (xx + zz)),
                scl.y * (2.0 * (yz - wx)),
                scl.z * (2.0 * (xz - wy)),
                scl.z * (2.0 * (yz + wx)),
                scl.z * (1.0 - 2.0 * (xx + yy)),
                pos.x,
                pos.y,
                pos.z,
            ],
        }
    }

    /// Translation only (identity rotation, unit scale)
    pub fn from_translation(pos: Vector3) -> Self {
        Self::form(pos, Quaternion::IDENTITY, Vector3::ONE)
    }

    /// Position and rotation with unit scale
    pub fn from_translation_rotation(pos: Vector3, rot: Quaternion) -> Self {
        Self::form(pos, rot, Vector3::ONE)
    }

    /// Translation components (elements 9..12)
    pub fn translation(&self) -> Vector3 {
        Vector3::new(self.matrix[9], self.matrix[10], self.matrix[11])
    }

    /// Flat array (row-major)
    pub fn to_array(&self) -> [f64; 12] {
        self.matrix
    }

    /// Copy with every element rounded to `digits` fractional digits.
    ///
    /// Only for the text serialization boundary; keep the unrounded value for
    /// any further math.
    pub fn rounded(&self, digits: u32) -> [f64; 12] {
        self.matrix.map(|m| round_to(m, digits))
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Round to `digits` fractional digits, folding `-0.0` into `0.0`.
pub fn round_to(value: f64, digits: u32) -> f64 {
    let factor = 10f64.powi(digits as i32);
    let rounded = (value * factor).round() / factor;
    if rounded == 0.0 { 0.0 } else { rounded }
}
