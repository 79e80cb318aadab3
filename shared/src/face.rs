//! Cardinal face orientations of the legacy level format.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::math::{Quaternion, Vector3};

const HALF_SQRT_2: f64 = 0.7071068;

/// One of the six faces of a trile / map node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaceOrientation {
    Left,
    Down,
    Back,
    Right,
    Top,
    Front,
}

impl FaceOrientation {
    pub const ALL: [Self; 6] = [
        Self::Left,
        Self::Down,
        Self::Back,
        Self::Right,
        Self::Top,
        Self::Front,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Left => "Left",
            Self::Down => "Down",
            Self::Back => "Back",
            Self::Right => "Right",
            Self::Top => "Top",
            Self::Front => "Front",
        }
    }

    /// Rotation that turns a volume to face this side.
    ///
    /// Only the four side faces have one; `Top` and `Down` return `None`.
    pub fn quaternion(self) -> Option<Quaternion> {
        match self {
            Self::Back => Some(Quaternion::from_xyzw(0.0, 1.0, 0.0, 0.0)),
            Self::Left => Some(Quaternion::from_xyzw(0.0, -HALF_SQRT_2, 0.0, HALF_SQRT_2)),
            Self::Front => Some(Quaternion::from_xyzw(0.0, 0.0, 0.0, 1.0)),
            Self::Right => Some(Quaternion::from_xyzw(0.0, HALF_SQRT_2, 0.0, HALF_SQRT_2)),
            Self::Top | Self::Down => None,
        }
    }

    /// Unit axis pointing out of this face
    pub fn axis(self) -> Vector3 {
        match self {
            Self::Left => Vector3::NEG_X,
            Self::Down => Vector3::NEG_Y,
            Self::Back => Vector3::NEG_Z,
            Self::Right => Vector3::X,
            Self::Top => Vector3::Y,
            Self::Front => Vector3::Z,
        }
    }

    /// Offset of `distance` whole units out of this face.
    ///
    /// The distance is truncated to an integer.
    pub fn offset(self, distance: f64) -> Vector3 {
        self.axis() * distance.trunc()
    }
}

impl fmt::Display for FaceOrientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unrecognised face name
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("unknown face orientation {0:?}")]
pub struct UnknownFace(pub String);

impl FromStr for FaceOrientation {
    type Err = UnknownFace;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|face| face.name() == s)
            .ok_or_else(|| UnknownFace(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Transform;

    #[test]
    fn test_parse() {
        assert_eq!("Back".parse::<FaceOrientation>(), Ok(FaceOrientation::Back));
        assert_eq!(" Top\n".parse::<FaceOrientation>(), Ok(FaceOrientation::Top));
        assert!("Sideways".parse::<FaceOrientation>().is_err());
        for face in FaceOrientation::ALL {
            assert_eq!(face.to_string().parse::<FaceOrientation>(), Ok(face));
        }
    }

    #[test]
    fn test_side_quaternions() {
        let front = FaceOrientation::Front.quaternion().unwrap();
        assert_eq!(Transform::from_translation_rotation(Vector3::ZERO, front), Transform::IDENTITY);

        let back = Transform::from_translation_rotation(Vector3::ZERO, FaceOrientation::Back.quaternion().unwrap());
        assert_eq!(back.rounded(4), [-1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, -1.0, 0.0, 0.0, 0.0]);

        let right = Transform::from_translation_rotation(Vector3::ZERO, FaceOrientation::Right.quaternion().unwrap());
        assert_eq!(right.rounded(4), [0.0, 0.0, 1.0, 0.0, 1.0, 0.0, -1.0, 0.0, 0.0, 0.0, 0.0, 0.0]);

        assert!(FaceOrientation::Top.quaternion().is_none());
        assert!(FaceOrientation::Down.quaternion().is_none());
    }

    #[test]
    fn test_offsets() {
        assert_eq!(FaceOrientation::Left.offset(8.0), Vector3::new(-8.0, 0.0, 0.0));
        assert_eq!(FaceOrientation::Top.offset(4.0), Vector3::new(0.0, 4.0, 0.0));
        assert_eq!(FaceOrientation::Front.offset(12.9), Vector3::new(0.0, 0.0, 12.0));
    }
}
