//! GridMap nodes for placed triles

use anyhow::{Context, Result};

use zeffyr_shared::{GridCell, Transform, Vector3, cell};

use super::TrileInstance;
use crate::formats::tscn::{Node, Value};

/// GridMap origin, so cells line up with trile centres
pub const GRID_OFFSET: Vector3 = Vector3::splat(0.5);

/// Case-insensitive name filter for triles that never go into a grid map
#[derive(Debug, Clone)]
pub struct SkipPatterns {
    patterns: Vec<String>,
}

impl SkipPatterns {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        Self {
            patterns: patterns.iter().map(|p| p.as_ref().to_lowercase()).collect(),
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.patterns.iter().any(|p| name.contains(p.as_str()))
    }
}

/// Encode every kept trile, in input order
pub fn encode_cells(triles: &[TrileInstance], skip: &SkipPatterns) -> Result<Vec<GridCell>> {
    triles
        .iter()
        .filter(|trile| !skip.matches(&trile.name))
        .map(|trile| {
            GridCell::encode(trile.position, trile.index as u32, trile.orientation).with_context(
                || format!("Trile '{}' at {} can't be placed", trile.name, trile.position),
            )
        })
        .collect()
}

/// Build a GridMap node over `triles` using the MeshLibrary `mesh_library`
pub fn build_gridmap(
    name: &str,
    triles: &[TrileInstance],
    mesh_library: u32,
    skip: &SkipPatterns,
) -> Result<Node> {
    let cells = encode_cells(triles, skip)?;
    tracing::debug!("GridMap '{}': {}/{} cells", name, cells.len(), triles.len());

    Ok(Node::new(name, "GridMap")
        .with("transform", &Transform::from_translation(GRID_OFFSET))
        .with("mesh_library", Value::ExtResource(mesh_library))
        .with("cell_size", Vector3::ONE)
        .with("cell_center_x", false)
        .with("cell_center_y", false)
        .with("cell_center_z", false)
        .with("collision_layer", 0i64)
        .with("collision_mask", 0i64)
        .with(
            "data",
            Value::dict([("cells", Value::int_array(&cell::flatten(&cells)))]),
        ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trile(name: &str, index: usize, orientation: u32, position: Vector3) -> TrileInstance {
        TrileInstance {
            trile_id: index.to_string(),
            index,
            name: name.to_string(),
            orientation,
            position,
        }
    }

    #[test]
    fn test_skip_patterns() {
        let skip = SkipPatterns::new(&["key", "Cube"]);
        assert!(skip.matches("Key Gate"));
        assert!(skip.matches("anti-cube"));
        assert!(!skip.matches("Stone"));
    }

    #[test]
    fn test_cells_in_order() {
        let triles = [
            trile("Stone", 2, 3, Vector3::new(-1.0, 0.0, 2.0)),
            trile("Key Gate", 1, 0, Vector3::ZERO),
            trile("Grass", 0, 1, Vector3::new(1.0, 2.0, 3.0)),
        ];
        let cells = encode_cells(&triles, &SkipPatterns::new(&["key"])).unwrap();
        assert_eq!(
            cell::flatten(&cells),
            vec![0x0000_FFFF, 2, 0x0010_0002, 0x0002_0001, 3, 0x0016_0000]
        );
    }

    #[test]
    fn test_out_of_range_trile() {
        let triles = [trile("Far", 0, 0, Vector3::new(40000.0, 0.0, 0.0))];
        let err = encode_cells(&triles, &SkipPatterns::new::<&str>(&[])).unwrap_err();
        assert!(format!("{:#}", err).contains("Far"));
    }

    #[test]
    fn test_gridmap_node() {
        let triles = [trile("Stone", 2, 2, Vector3::new(1.0, 2.0, 3.0))];
        let node = build_gridmap("Triles", &triles, 4, &SkipPatterns::new::<&str>(&[])).unwrap();
        assert_eq!(
            node.prop("transform").unwrap().to_string(),
            "Transform( 1, 0, 0, 0, 1, 0, 0, 0, 1, 0.5, 0.5, 0.5 )"
        );
        assert_eq!(node.prop("mesh_library"), Some(&Value::ExtResource(4)));
        assert_eq!(
            node.prop("data").unwrap().to_string(),
            "{\n\"cells\": PoolIntArray( 131073, 3, 2 )\n}"
        );
    }
}
