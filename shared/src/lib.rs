//! Shared types for the Zeffyr asset pipeline.
//!
//! Pure building blocks used by every conversion tool:
//!
//! - [`math`] - Vector/quaternion aliases and the 3x4 [`Transform`] builder
//! - [`cell`] - Grid map cell packing (position + tile id + rotation)
//! - [`face`] - Cardinal face orientations of the legacy level format
//! - [`literal`] - Restrictive parsing of boolean/tuple attribute text
//! - [`error`] - Error taxonomy for the above

pub mod cell;
pub mod error;
pub mod face;
pub mod literal;
pub mod math;

pub use cell::{DecodedCell, GridCell, ROTATION_CODES, rotation_code, rotation_index};
pub use error::{CellError, LiteralError};
pub use face::{FaceOrientation, UnknownFace};
pub use literal::{parse_bool, parse_tuple};
pub use math::{Quaternion, Transform, Vector3};
