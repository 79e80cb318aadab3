//! NPC sprite frames (one SpriteFrames .tres per character folder)

use anyhow::{Context, Result};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

use super::{Animation, file_stem, find_animation_files};
use crate::formats::tscn::{Document, DocumentBuilder, Value};

/// Texture flags for pixel art atlas slices (no filtering, no mipmaps)
const ATLAS_FLAGS: i64 = 16;

/// Animation XMLs of one character folder
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteGroup {
    pub dir: PathBuf,
    pub files: Vec<PathBuf>,
}

impl SpriteGroup {
    /// Folder name, used for the resource and texture paths
    pub fn name(&self) -> Result<&str> {
        self.dir
            .file_name()
            .and_then(|s| s.to_str())
            .with_context(|| format!("Invalid folder name: {:?}", self.dir))
    }
}

/// Group animation files by the folder that holds them
pub fn group_by_folder(files: Vec<PathBuf>) -> Vec<SpriteGroup> {
    let mut groups: Vec<SpriteGroup> = Vec::new();
    for file in files {
        let dir = file.parent().map(Path::to_path_buf).unwrap_or_default();
        match groups.iter_mut().find(|g| g.dir == dir) {
            Some(group) => group.files.push(file),
            None => groups.push(SpriteGroup {
                dir,
                files: vec![file],
            }),
        }
    }
    groups
}

/// Build a SpriteFrames resource from named animations of one character
pub fn build_sprite_frames(folder: &str, animations: &[(String, Animation)], speed: f64) -> Document {
    let mut resources = DocumentBuilder::new();
    let mut entries = Vec::with_capacity(animations.len());

    for (name, animation) in animations {
        let path = format!("res://assets/Character Animations/{}/{}.ani.png", folder, name);
        let texture = resources.add_ext_resource(&path, "Texture");

        let frames = animation
            .frames
            .iter()
            .map(|frame| {
                let r = frame.region;
                let id = resources.add_sub_resource(
                    "AtlasTexture",
                    vec![
                        ("flags".into(), Value::Int(ATLAS_FLAGS)),
                        ("atlas".into(), Value::ExtResource(texture)),
                        ("region".into(), Value::rect2(r.x, r.y, r.w, r.h)),
                    ],
                );
                Value::SubResource(id)
            })
            .collect();

        entries.push(Value::dict([
            ("frames", Value::Array(frames)),
            ("loop", Value::Bool(true)),
            ("name", Value::Str(name.clone())),
            ("speed", Value::Float(speed)),
        ]));
    }

    resources.into_resource(
        "SpriteFrames",
        vec![("animations".into(), Value::Array(entries))],
    )
}

fn convert_group(group: &SpriteGroup, out_dir: Option<&Path>, speed: f64) -> Result<PathBuf> {
    let folder = group.name()?;
    let animations = group
        .files
        .iter()
        .map(|path| Ok((file_stem(path)?.to_string(), Animation::load(path)?)))
        .collect::<Result<Vec<_>>>()?;

    let output = out_dir
        .unwrap_or(group.dir.as_path())
        .join(format!("{}.tres", folder));
    let document = build_sprite_frames(folder, &animations, speed);
    crate::formats::write_document(&output, &document)?;
    Ok(output)
}

/// Convert every character folder under `input`
pub fn convert_sprite_anims(input: &Path, out_dir: Option<&Path>, speed: f64) -> Result<()> {
    let groups = group_by_folder(find_animation_files(input)?);
    tracing::info!("Converting {} sprite folders from {:?}", groups.len(), input);

    let written = groups
        .par_iter()
        .map(|group| {
            convert_group(group, out_dir, speed)
                .with_context(|| format!("In sprite folder {:?}", group.dir))
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::info!("Exported {} sprite frame resources", written.len());
    Ok(())
}
