//! Asset folder staging
//!
//! Copies the images and sounds of an extracted content folder into a fresh
//! `assets/` folder next to it, laid out the way the game project expects:
//! known root folders only, title-cased names, no `_alpha` masks and no
//! `drums` sub-folders.

use anyhow::{Context, Result, bail};
use std::io::{BufRead, Write};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use crate::naming::title_case;

/// Root folders kept in the staged copy (lowercase)
pub const ROOT_FOLDERS: [&str; 8] = [
    "art objects",
    "background planes",
    "character animations",
    "music",
    "other textures",
    "skies",
    "sounds",
    "trile sets",
];

/// File extensions that are copied
pub const EXTENSIONS: [&str; 2] = ["png", "wav"];

/// Roots whose direct sub-folders are per-character / per-category names
const NAMED_SUBFOLDER_ROOTS: [&str; 2] = ["Character Animations", "Sounds"];

const ALPHA_MARKER: &str = "_alpha";
const FLATTENED_FOLDER: &str = "drums";

fn root_folder_name(name: &str) -> Option<String> {
    let lower = name.to_lowercase();
    if !ROOT_FOLDERS.contains(&lower.as_str()) {
        return None;
    }
    Some(if lower == "trile sets" {
        "Trilesets".to_string()
    } else {
        title_case(name)
    })
}

/// Staged location of a source file, relative to both roots.
///
/// `None` when the file is left out.
pub fn staged_path(relative: &Path) -> Option<PathBuf> {
    let parts: Vec<&str> = relative
        .components()
        .map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect::<Option<_>>()?;

    let (file, dirs) = parts.split_last()?;
    let (root, rest) = dirs.split_first()?;

    let ext = Path::new(file).extension()?.to_str()?.to_lowercase();
    if !EXTENSIONS.contains(&ext.as_str()) || file.contains(ALPHA_MARKER) {
        return None;
    }

    let root = root_folder_name(root)?;
    let mut out = PathBuf::from(&root);
    for (depth, dir) in rest.iter().enumerate() {
        if *dir == FLATTENED_FOLDER {
            continue;
        }
        if depth == 0 && NAMED_SUBFOLDER_ROOTS.contains(&root.as_str()) {
            out.push(title_case(dir).replace('_', " "));
        } else {
            out.push(dir);
        }
    }
    out.push(file);
    Some(out)
}

/// `(source, destination)` for every file that is staged
pub fn plan(src: &Path, dst: &Path) -> Result<Vec<(PathBuf, PathBuf)>> {
    let mut copies = Vec::new();
    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to scan {:?}", src))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(src)?;
        match staged_path(relative) {
            Some(staged) => copies.push((entry.path().to_path_buf(), dst.join(staged))),
            None => tracing::debug!("[Skip] {:?}", relative),
        }
    }
    Ok(copies)
}

/// `<src>/../assets`
pub fn default_destination(src: &Path) -> PathBuf {
    src.parent().unwrap_or(Path::new(".")).join("assets")
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

/// Absolute path with symlinks resolved up to the deepest existing ancestor
fn resolve(path: &Path) -> Result<PathBuf> {
    let absolute =
        std::path::absolute(path).with_context(|| format!("Failed to resolve {:?}", path))?;
    for ancestor in absolute.ancestors() {
        if ancestor.exists() {
            let rest = absolute.strip_prefix(ancestor)?;
            let base = ancestor
                .canonicalize()
                .with_context(|| format!("Failed to resolve {:?}", ancestor))?;
            return Ok(base.join(rest));
        }
    }
    Ok(absolute)
}

/// `dst` is deleted before copying, so it must not contain or sit inside `src`
fn check_disjoint(src: &Path, dst: &Path) -> Result<()> {
    let (src_abs, dst_abs) = (resolve(src)?, resolve(dst)?);
    if src_abs.starts_with(&dst_abs) || dst_abs.starts_with(&src_abs) {
        bail!(
            "Destination {:?} overlaps source {:?}, pick a folder outside it",
            dst,
            src
        );
    }
    Ok(())
}

/// Stage `src` into `dst`, replacing `dst` if it exists
pub fn copy_assets(src: &Path, dst: &Path, assume_yes: bool) -> Result<()> {
    if !src.is_dir() {
        bail!("Not a directory: {:?}", src);
    }
    check_disjoint(src, dst)?;

    let copies = plan(src, dst)?;
    tracing::info!("Source folder: {:?}", src);
    tracing::info!("Dest folder: {:?}", dst);
    tracing::info!("Number of files: {}", copies.len());

    if !assume_yes && !confirm("Continue?")? {
        tracing::info!("Cancelled");
        return Ok(());
    }

    if dst.exists() {
        tracing::info!("[Delete] {:?}", dst);
        std::fs::remove_dir_all(dst)
            .with_context(|| format!("Failed to delete {:?}, remove it by hand", dst))?;
    }

    for (from, to) in &copies {
        if let Some(parent) = to.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }
        std::fs::copy(from, to).with_context(|| format!("Failed to copy {:?} -> {:?}", from, to))?;
        tracing::debug!("[Copy] {:?} -> {:?}", from, to);
    }

    tracing::info!("Staged {} files into {:?}", copies.len(), dst);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn staged(path: &str) -> Option<String> {
        staged_path(Path::new(path)).map(|p| p.to_string_lossy().replace('\\', "/"))
    }

    #[test]
    fn test_root_folders() {
        assert_eq!(staged("art objects/well.png").as_deref(), Some("Art Objects/well.png"));
        assert_eq!(staged("trile sets/untitled.png").as_deref(), Some("Trilesets/untitled.png"));
        assert_eq!(staged("Music/village.wav").as_deref(), Some("Music/village.wav"));
        assert_eq!(staged("fonts/zuish.png"), None);
        assert_eq!(staged("loose.png"), None);
    }

    #[test]
    fn test_filters() {
        assert_eq!(staged("skies/blue/clouds.xnb"), None);
        assert_eq!(staged("skies/blue/clouds_alpha.png"), None);
        assert_eq!(staged("skies/blue/CLOUDS.PNG").as_deref(), Some("Skies/blue/CLOUDS.PNG"));
    }

    #[test]
    fn test_named_subfolders() {
        assert_eq!(
            staged("character animations/old_man/idle.ani.png").as_deref(),
            Some("Character Animations/Old Man/idle.ani.png")
        );
        assert_eq!(
            staged("sounds/npc_talk/hello.wav").as_deref(),
            Some("Sounds/Npc Talk/hello.wav")
        );
        assert_eq!(
            staged("other textures/map_screens/tree.png").as_deref(),
            Some("Other Textures/map_screens/tree.png")
        );
    }

    #[test]
    fn test_drums_flattened() {
        assert_eq!(
            staged("music/village/drums/kick.wav").as_deref(),
            Some("Music/village/kick.wav")
        );
    }

    #[test]
    fn test_copy_assets() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("content");
        std::fs::create_dir_all(src.join("art objects")).unwrap();
        std::fs::create_dir_all(src.join("fonts")).unwrap();
        std::fs::write(src.join("art objects").join("well.png"), b"png").unwrap();
        std::fs::write(src.join("fonts").join("zuish.png"), b"png").unwrap();

        let dst = default_destination(&src);
        std::fs::create_dir_all(dst.join("stale")).unwrap();

        copy_assets(&src, &dst, true).unwrap();
        assert_eq!(std::fs::read(dst.join("Art Objects").join("well.png")).unwrap(), b"png");
        assert!(!dst.join("Fonts").exists());
        assert!(!dst.join("stale").exists());
    }

    #[test]
    fn test_overlapping_destination() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("content");
        let png = src.join("art objects").join("well.png");
        std::fs::create_dir_all(png.parent().unwrap()).unwrap();
        std::fs::write(&png, b"png").unwrap();

        assert!(copy_assets(&src, &src, true).is_err());
        assert!(copy_assets(&src, dir.path(), true).is_err());
        assert!(copy_assets(&src, &src.join("art objects").join("..").join("staged"), true).is_err());
        assert!(copy_assets(&src, &src.join("assets"), true).is_err());

        assert_eq!(std::fs::read(&png).unwrap(), b"png");
        assert!(!src.join("Art Objects").exists());
    }
}
