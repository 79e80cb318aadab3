//! zeffyr-import library
//!
//! Converters from the legacy XML asset exports to scene, resource and
//! catalog files. The `zeffyr-import` binary is a thin CLI over these.

pub mod anims;
pub mod assets;
pub mod color;
pub mod config;
pub mod formats;
pub mod level;
pub mod maptree;
pub mod materials;
pub mod naming;
pub mod text;
pub mod trileset;
pub mod xml;

pub use config::{CONFIG_FILE_NAME, ImportConfig};
pub use formats::tscn::{Document, DocumentBuilder, Node, Value};

// Re-export level conversion types
pub use level::Level;
pub use level::scene::{SceneOptions, build_scene, convert_level};

// Re-export animation helpers
pub use anims::words::{DictionarySplitter, WordSplitter};
