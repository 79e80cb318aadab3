//! Trileset preview scene (trileset.xml -> .tscn)
//!
//! Lays every trile of a set out on a 10-wide grid as a MeshInstance carrying
//! its per-face collision layers, so the set can be inspected and its
//! collision data reused by the runtime `Trile` script.

use anyhow::{Context, Result, bail};
use std::path::Path;

use zeffyr_shared::{Transform, Vector3};

use super::{TrileInfo, parse_trile_infos};
use crate::formats::tscn::{Document, DocumentBuilder, Node, Value};
use crate::naming::{UniqueNames, capitalize};

/// Surface types, by `SurfaceType` index
pub const SURFACE_TYPES: [&str; 5] = ["None", "Grass", "Metal", "Stone", "Wood"];

/// Collision mask written on every trile
const COLLISION_MASK: i64 = 24;

/// Clears the TopOnly, AllSides and background layer bits
const IMMATERIAL_MASK: i64 = 0xFFFF8;

const GRID_STEP: f64 = 2.0;
const GRID_MAX_X: f64 = 18.0;

const TRILE_SCRIPT: &str = "res://src/Components/Trile.cs";
const DEV_TEXTURES: [&str; 4] = [
    "res://assets/Trilesets/Dev/top_only.png",
    "res://assets/Trilesets/Dev/all_sides.png",
    "res://assets/Trilesets/Dev/background.png",
    "res://assets/Trilesets/Dev/none.png",
];

/// Physics layer bits for a face collision or actor type
pub fn collision_layer(kind: &str) -> i64 {
    match kind {
        "Immaterial" => 0,
        "AllSides" => 1,
        "TopOnly" | "TopNoStraightLedge" => 2,
        "None" => 4,
        "Ladder" => 32,
        "Vine" => 64,
        "Bouncer" => 128,
        _ => 16,
    }
}

/// Per-face layers (back, front, left, right) after actor and immaterial rules
pub fn face_layers(trile: &TrileInfo) -> [i64; 4] {
    let mut layers = [0i64; 4];
    for (layer, face) in layers.iter_mut().zip(&trile.faces) {
        *layer = collision_layer(face);
    }

    if trile.actor != "None" {
        let actor = collision_layer(&trile.actor);
        for layer in &mut layers {
            *layer += actor;
        }
    }

    if trile.immaterial {
        for layer in &mut layers {
            *layer &= IMMATERIAL_MASK;
        }
    }

    layers
}

/// Most frequent face collision type; ties go to the one seen first
pub fn most_common(faces: &[String]) -> Option<&str> {
    let mut best: Option<(&str, usize)> = None;
    for face in faces {
        let count = faces.iter().filter(|f| *f == face).count();
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((face, count));
        }
    }
    best.map(|(face, _)| face)
}

/// Index into the dev texture list for a placeholder cube
fn placeholder_texture(collision: &str) -> usize {
    match collision {
        "TopOnly" | "TopNoStraightLedge" => 0,
        "AllSides" => 1,
        "None" => 2,
        _ => 3,
    }
}

/// Build the preview scene for a trileset
pub fn build_preview(set_name: &str, triles: &[TrileInfo]) -> Result<Document> {
    let name = capitalize(set_name);
    let mut builder = DocumentBuilder::new();

    let script = builder.add_ext_resource(TRILE_SCRIPT, "Script");
    let textures = DEV_TEXTURES.map(|path| builder.add_ext_resource(path, "Texture"));

    let mut names = UniqueNames::new(triles.iter().map(|t| t.name.as_str()));
    let mut root = Node::new(name.as_str(), "Spatial");
    let mut offset = Vector3::ZERO;

    for trile in triles {
        let surface = SURFACE_TYPES
            .iter()
            .position(|s| *s == trile.surface)
            .with_context(|| format!("Trile '{}' has unknown surface type '{}'", trile.name, trile.surface))?;
        let layers = face_layers(trile);

        let mesh = if trile.geometry {
            let path = format!("res://assets/Trilesets/{}/{}.mesh", name, trile.name);
            Value::ExtResource(builder.add_ext_resource(&path, "ArrayMesh"))
        } else {
            let Some(common) = most_common(&trile.faces) else {
                bail!("Trile '{}' has no faces", trile.name);
            };
            let texture = textures[placeholder_texture(common)];
            let material = builder.add_sub_resource(
                "SpatialMaterial",
                vec![
                    ("flags_transparent".into(), Value::Bool(true)),
                    ("albedo_color".into(), Value::color(&[1.0, 1.0, 1.0, 0.9])),
                    ("albedo_texture".into(), Value::ExtResource(texture)),
                    ("uv1_scale".into(), Value::vector3(Vector3::new(3.0, 2.0, 1.0))),
                ],
            );
            let cube = builder.add_sub_resource(
                "CubeMesh",
                vec![
                    ("material".into(), Value::SubResource(material)),
                    ("size".into(), Value::vector3(trile.size)),
                ],
            );
            Value::SubResource(cube)
        };

        tracing::debug!(
            "[Trile] {} -> {:010b}",
            trile.name,
            layers.iter().fold(0, |acc, l| acc | l)
        );

        root.add_child(
            Node::new(names.next(&trile.name), "MeshInstance")
                .with("transform", &Transform::from_translation(offset))
                .with("mesh", mesh)
                .with("material/0", Value::Null)
                .with("script", Value::ExtResource(script))
                .with("BackFace", layers[0])
                .with("FrontFace", layers[1])
                .with("LeftFace", layers[2])
                .with("RightFace", layers[3])
                .with("CollisionMask", COLLISION_MASK)
                .with("SurfaceType", surface as i64)
                .with("Size", trile.size)
                .with("CollisionOnly", !trile.geometry),
        );

        offset.x += GRID_STEP;
        if offset.x > GRID_MAX_X {
            offset.x = 0.0;
            offset.z -= GRID_STEP;
        }
    }

    Ok(builder.into_scene(root))
}

/// Convert a trileset XML file into its preview scene
pub fn convert_trileset(input: &Path, output: &Path) -> Result<()> {
    let text = crate::xml::read_text(input)?;
    let (set_name, triles) =
        parse_trile_infos(&text).with_context(|| format!("In trileset {:?}", input))?;

    let scene = build_preview(&set_name, &triles)?;
    crate::formats::write_document(output, &scene)?;

    tracing::info!("Exported trileset '{}': {} triles", set_name, triles.len());
    Ok(())
}
