//! Grid map cell packing
//!
//! The destination grid storage keeps every placed tile as three 32-bit
//! integers:
//!
//! ```text
//! i1: [x: i16 LE][y: i16 LE]
//! i2: [z: i16 LE][0x0000   ]
//! i3: [id: u16 LE][rotation code: u16 LE]
//! ```
//!
//! Positions are truncated toward zero before packing. Rotation indices are
//! the legacy face order (Back, Left, Front, Right) and are stored as the
//! destination format's orientation codes.

use serde::{Deserialize, Serialize};

use crate::error::CellError;
use crate::math::Vector3;

/// Orientation codes indexed by legacy rotation index.
///
/// Back=0 -> 10, Left=1 -> 22, Front=2 -> 0, Right=3 -> 16.
pub const ROTATION_CODES: [u16; 4] = [10, 22, 0, 16];

/// Map a legacy rotation index to the stored orientation code.
#[inline]
pub fn rotation_code(index: u32) -> Result<u16, CellError> {
    ROTATION_CODES
        .get(index as usize)
        .copied()
        .ok_or(CellError::Domain(index))
}

/// Map a stored orientation code back to the legacy rotation index.
#[inline]
pub fn rotation_index(code: u16) -> Result<u8, CellError> {
    ROTATION_CODES
        .iter()
        .position(|&c| c == code)
        .map(|i| i as u8)
        .ok_or(CellError::Domain(code as u32))
}

/// One packed grid map cell
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridCell {
    pub i1: u32,
    pub i2: u32,
    pub i3: u32,
}

/// Unpacked contents of a [`GridCell`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodedCell {
    pub x: i16,
    pub y: i16,
    pub z: i16,
    pub id: u16,
    /// Legacy rotation index (0..4)
    pub rot: u8,
}

impl GridCell {
    /// Pack a grid position, tile id and legacy rotation index.
    pub fn encode(pos: Vector3, id: u32, rot: u32) -> Result<Self, CellError> {
        let code = rotation_code(rot)?;
        let x = coordinate("x", pos.x)?;
        let y = coordinate("y", pos.y)?;
        let z = coordinate("z", pos.z)?;
        let id = u16::try_from(id).map_err(|_| CellError::Range {
            field: "id",
            value: id as f64,
            width: "u16",
        })?;

        let mut position = [0u8; 6];
        position[0..2].copy_from_slice(&x.to_le_bytes());
        position[2..4].copy_from_slice(&y.to_le_bytes());
        position[4..6].copy_from_slice(&z.to_le_bytes());

        let mut item = [0u8; 4];
        item[0..2].copy_from_slice(&id.to_le_bytes());
        item[2..4].copy_from_slice(&code.to_le_bytes());

        Ok(Self {
            i1: u32::from_le_bytes([position[0], position[1], position[2], position[3]]),
            i2: u16::from_le_bytes([position[4], position[5]]) as u32,
            i3: u32::from_le_bytes(item),
        })
    }

    /// Recover position, tile id and rotation index.
    pub fn decode(&self) -> Result<DecodedCell, CellError> {
        let [x0, x1, y0, y1] = self.i1.to_le_bytes();
        let [z0, z1, ..] = self.i2.to_le_bytes();
        let [id0, id1, r0, r1] = self.i3.to_le_bytes();

        Ok(DecodedCell {
            x: i16::from_le_bytes([x0, x1]),
            y: i16::from_le_bytes([y0, y1]),
            z: i16::from_le_bytes([z0, z1]),
            id: u16::from_le_bytes([id0, id1]),
            rot: rotation_index(u16::from_le_bytes([r0, r1]))?,
        })
    }

    #[inline]
    pub fn to_array(&self) -> [u32; 3] {
        [self.i1, self.i2, self.i3]
    }
}

/// Concatenate cells in traversal order into the dense integer array.
pub fn flatten(cells: &[GridCell]) -> Vec<u32> {
    cells.iter().flat_map(GridCell::to_array).collect()
}

fn coordinate(field: &'static str, value: f64) -> Result<i16, CellError> {
    let truncated = value.trunc();
    if truncated.is_nan() || truncated < i16::MIN as f64 || truncated > i16::MAX as f64 {
        return Err(CellError::Range {
            field,
            value,
            width: "i16",
        });
    }
    Ok(truncated as i16)
}
