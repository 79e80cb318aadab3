//! zeffyr.toml import configuration
//!
//! Every field has a default, so an absent file or an empty table behaves
//! like the stock pipeline. Command line arguments override these values.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "zeffyr.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub paths: PathsSection,
    pub level: LevelSection,
    pub anims: AnimsSection,
    pub text: TextSection,
}

/// Input locations
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PathsSection {
    /// Directory with trileset XML files.
    /// Default: `trile sets` next to the level being converted
    pub trilesets: Option<PathBuf>,
}

/// Level scene generation
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LevelSection {
    /// World units per sprite pixel
    pub pixel_size: f64,
    /// Camera zoom written to the GameCamera node
    pub pixels_per_trixel: i64,
    /// Case-insensitive substrings of trile names left out of grid maps
    pub skip_trile_patterns: Vec<String>,
}

impl Default for LevelSection {
    fn default() -> Self {
        Self {
            pixel_size: 0.0625,
            pixels_per_trixel: 2,
            skip_trile_patterns: vec!["key".to_string(), "cube".to_string()],
        }
    }
}

/// Sprite and player animation import
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnimsSection {
    /// Playback speed (frames per second) of generated sprite frames
    pub speed: f64,
    /// Character folder used in player texture paths
    pub character: String,
    /// Extra dictionary words for splitting concatenated animation names
    pub words: Vec<String>,
}

impl Default for AnimsSection {
    fn default() -> Self {
        Self {
            speed: 7.0,
            character: "Gomez".to_string(),
            words: Vec::new(),
        }
    }
}

/// Localization catalogs
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TextSection {
    /// PO header blocks, resolved next to the input file when relative
    pub headers: PathBuf,
}

impl Default for TextSection {
    fn default() -> Self {
        Self {
            headers: PathBuf::from("headers.po"),
        }
    }
}

impl ImportConfig {
    /// Parse configuration text
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse import configuration")
    }

    /// Load from a file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {:?}", path))?;
        Self::parse(&text).with_context(|| format!("In {:?}", path))
    }

    /// Load `explicit` if given, else `./zeffyr.toml` if present, else defaults
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let local = Path::new(CONFIG_FILE_NAME);
        if local.is_file() {
            tracing::debug!("Using {:?}", local);
            return Self::load(local);
        }
        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ImportConfig::parse("").unwrap();
        assert_eq!(config.level.pixel_size, 0.0625);
        assert_eq!(config.level.pixels_per_trixel, 2);
        assert_eq!(config.level.skip_trile_patterns, vec!["key", "cube"]);
        assert_eq!(config.anims.speed, 7.0);
        assert_eq!(config.anims.character, "Gomez");
        assert_eq!(config.text.headers, PathBuf::from("headers.po"));
        assert!(config.paths.trilesets.is_none());
    }

    #[test]
    fn test_partial_sections() {
        let config = ImportConfig::parse(
            r#"
[paths]
trilesets = "assets/trile sets"

[level]
skip_trile_patterns = ["door"]

[anims]
words = ["idle", "play"]
"#,
        )
        .unwrap();
        assert_eq!(config.paths.trilesets, Some(PathBuf::from("assets/trile sets")));
        assert_eq!(config.level.skip_trile_patterns, vec!["door"]);
        assert_eq!(config.level.pixel_size, 0.0625);
        assert_eq!(config.anims.words, vec!["idle", "play"]);
        assert_eq!(config.anims.character, "Gomez");
    }

    #[test]
    fn test_rejects_wrong_types() {
        assert!(ImportConfig::parse("[level]\npixel_size = \"big\"\n").is_err());
    }
}
