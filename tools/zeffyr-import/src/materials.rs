//! Art object material relinking
//!
//! Imported art object materials embed their texture as an Image +
//! ImageTexture pair. This swaps the embedded copy for a reference to the
//! staged `res://assets/Art Objects/<name>.png`.

use anyhow::{Context, Result, bail};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

use crate::formats::tscn::{Document, Section, Value};

const TEXTURE_PROPERTY: &str = "albedo_texture";

/// Sections a material needs before there is anything to relink
const MIN_SECTIONS: usize = 4;

/// Sections of a material that also carries a leading ext_resource
const WITH_EXT_SECTIONS: usize = 5;

/// Texture path for the material named `stem`
pub fn texture_path(stem: &str) -> String {
    format!("res://assets/Art Objects/{}.png", stem)
}

fn is_sub_resource(section: &Section, kind: &str) -> bool {
    section.tag == "sub_resource" && section.attr("type") == Some(&Value::from(kind))
}

/// Replace embedded image resources with an external texture.
///
/// Returns `false` when the material does not embed an Image + ImageTexture pair.
pub fn relink(document: &mut Document, texture: &str) -> Result<bool> {
    if document.len() < MIN_SECTIONS {
        return Ok(false);
    }

    let removed = if document.len() >= WITH_EXT_SECTIONS { 3 } else { 2 };
    let sections = &document.sections[1..=removed];
    let [.., image, image_texture] = sections else {
        return Ok(false);
    };
    if !is_sub_resource(image, "Image")
        || !is_sub_resource(image_texture, "ImageTexture")
        || (removed == 3 && sections[0].tag != "ext_resource")
    {
        return Ok(false);
    }
    for _ in 0..removed {
        document.remove_at(1);
    }

    let id = document.add_ext_resource(texture, "Texture");
    let Some(resource) = document.find_section_mut("resource") else {
        bail!("Material has no [resource] section");
    };
    resource.set_prop(TEXTURE_PROPERTY, Value::ExtResource(id));
    document.update_load_steps();
    Ok(true)
}

/// Relink one `.tres` file in place
pub fn relink_file(path: &Path) -> Result<bool> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read material: {:?}", path))?;
    let mut document = Document::parse(&text)?;

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .with_context(|| format!("Invalid file name: {:?}", path))?;
    if !relink(&mut document, &texture_path(stem))? {
        tracing::debug!("[Skip] {:?}", path);
        return Ok(false);
    }

    crate::formats::write_document(path, &document)?;
    Ok(true)
}

fn material_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("Failed to read {:?}", dir))? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == "tres") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Relink every material in `dir`, in parallel
pub fn relink_materials(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        bail!("Not a directory: {:?}", dir);
    }

    let files = material_files(dir)?;
    let relinked = files
        .par_iter()
        .map(|path| relink_file(path).with_context(|| format!("In material {:?}", path)))
        .collect::<Result<Vec<bool>>>()?
        .into_iter()
        .filter(|&changed| changed)
        .count();

    tracing::info!("Relinked {}/{} materials in {:?}", relinked, files.len(), dir);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MATERIAL: &str = r#"[gd_resource type="SpatialMaterial" load_steps=4 format=2]

[ext_resource path="res://old.png" type="Texture" id=1]

[sub_resource type="Image" id=1]
data = {
"data": PoolByteArray( 0, 0 ),
"format": "RGBA8",
"height": 1,
"mipmaps": false,
"width": 1
}

[sub_resource type="ImageTexture" id=2]
flags = 0
image = SubResource( 1 )

[resource]
flags_unshaded = true
albedo_texture = SubResource( 2 )
"#;

    #[test]
    fn test_relink_with_ext() {
        let mut doc = Document::parse(MATERIAL).unwrap();
        assert!(relink(&mut doc, &texture_path("well_a")).unwrap());
        assert_eq!(
            doc.to_string(),
            "[gd_resource type=\"SpatialMaterial\" load_steps=2 format=2]\n\n\
             [ext_resource path=\"res://assets/Art Objects/well_a.png\" type=\"Texture\" id=1]\n\n\
             [resource]\nflags_unshaded = true\nalbedo_texture = ExtResource( 1 )\n"
        );
    }

    #[test]
    fn test_relink_without_ext() {
        let text = MATERIAL.replace("[ext_resource path=\"res://old.png\" type=\"Texture\" id=1]\n\n", "");
        let mut doc = Document::parse(&text).unwrap();
        assert_eq!(doc.len(), 4);
        assert!(relink(&mut doc, &texture_path("tree")).unwrap());
        assert_eq!(doc.len(), 3);
        assert!(doc.to_string().contains("albedo_texture = ExtResource( 1 )"));
    }

    #[test]
    fn test_nothing_embedded() {
        let text = "[gd_resource type=\"SpatialMaterial\" format=2]\n\n[resource]\nflags_unshaded = true\n";
        let mut doc = Document::parse(text).unwrap();
        assert!(!relink(&mut doc, &texture_path("x")).unwrap());
    }

    #[test]
    fn test_external_textures_untouched() {
        let text = "[gd_resource type=\"SpatialMaterial\" load_steps=3 format=2]\n\n\
                    [ext_resource path=\"res://a.png\" type=\"Texture\" id=1]\n\n\
                    [ext_resource path=\"res://b.png\" type=\"Texture\" id=2]\n\n\
                    [sub_resource type=\"Gradient\" id=1]\n\n\
                    [resource]\nalbedo_texture = ExtResource( 1 )\nnormal_texture = ExtResource( 2 )\n";
        let mut doc = Document::parse(text).unwrap();
        assert!(!relink(&mut doc, &texture_path("x")).unwrap());
        assert_eq!(doc.to_string(), Document::parse(text).unwrap().to_string());

        let swapped = MATERIAL
            .replace("type=\"Image\" id=1", "type=\"Tmp\" id=1")
            .replace("type=\"ImageTexture\"", "type=\"Image\"")
            .replace("type=\"Tmp\"", "type=\"ImageTexture\"");
        let mut doc = Document::parse(&swapped).unwrap();
        assert!(!relink(&mut doc, &texture_path("x")).unwrap());
    }

    #[test]
    fn test_relink_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("well_a.tres"), MATERIAL).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a material").unwrap();

        relink_materials(dir.path()).unwrap();
        let text = std::fs::read_to_string(dir.path().join("well_a.tres")).unwrap();
        assert!(text.contains("res://assets/Art Objects/well_a.png"));
        assert!(!text.contains("ImageTexture"));
    }
}
