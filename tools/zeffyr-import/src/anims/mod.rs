//! Sprite animation XML (frame strips with per-frame regions and durations)
//!
//! - [`sprite`] - SpriteFrames resources for NPCs
//! - [`player`] - AnimationPlayer tracks for the player character
//! - [`words`] - Splitting concatenated animation names into words

pub mod player;
pub mod sprite;
pub mod words;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use zeffyr_shared::math::round_to;

use crate::xml;

/// Frame durations are stored in 100 ns ticks
pub const TICKS_PER_SECOND: f64 = 10_000_000.0;

/// Path fragment marking sidecar files that are not animations
const METADATA_MARKER: &str = "metadata";

/// Atlas region of one frame, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: i64,
    pub y: i64,
    pub w: i64,
    pub h: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Seconds
    pub duration: f64,
    pub region: Region,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    pub width: u32,
    pub height: u32,
    pub actual_width: u32,
    pub actual_height: u32,
    pub frames: Vec<Frame>,
}

impl Animation {
    pub fn parse(text: &str) -> Result<Self> {
        let doc = xml::parse(text)?;
        let root = doc.root_element();

        let frames = xml::find_all(root, "Frames/FramePC")
            .into_iter()
            .map(|frame| {
                let rect = xml::require(frame, "Rectangle")?;
                Ok(Frame {
                    duration: xml::attr_f64(frame, "duration")? / TICKS_PER_SECOND,
                    region: Region {
                        x: xml::attr_i64(rect, "x")?,
                        y: xml::attr_i64(rect, "y")?,
                        w: xml::attr_i64(rect, "w")?,
                        h: xml::attr_i64(rect, "h")?,
                    },
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            width: xml::attr_u32(root, "width")?,
            height: xml::attr_u32(root, "height")?,
            actual_width: xml::attr_u32(root, "actualWidth")?,
            actual_height: xml::attr_u32(root, "actualHeight")?,
            frames,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = xml::read_text(path)?;
        tracing::debug!("Reading animation {:?}", path);
        Self::parse(&text).with_context(|| format!("In animation {:?}", path))
    }

    /// Sum of all frame durations, in seconds
    pub fn length(&self) -> f64 {
        self.frames.iter().map(|f| f.duration).sum()
    }

    /// Start time of every frame, rounded to hundredths
    pub fn start_times(&self) -> Vec<f64> {
        let mut elapsed = 0.0;
        self.frames
            .iter()
            .map(|frame| {
                let start = round_to(elapsed, 2);
                elapsed += frame.duration;
                start
            })
            .collect()
    }
}

/// Animation XML files under `dir`, sorted by path, skipping metadata
pub fn find_animation_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to scan {:?}", dir))?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().is_none_or(|e| e != "xml") {
            continue;
        }
        if path.to_string_lossy().to_lowercase().contains(METADATA_MARKER) {
            continue;
        }
        files.push(path.to_path_buf());
    }
    Ok(files)
}

/// File stem as UTF-8 text
pub fn file_stem(path: &Path) -> Result<&str> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .with_context(|| format!("Invalid file name: {:?}", path))
}
