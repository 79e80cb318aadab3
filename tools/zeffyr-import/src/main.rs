//! zeffyr-import - Zeffyr asset import tool
//!
//! Converts legacy XML exports (levels, trilesets, map tree, string tables,
//! sprite animations) to scene (.tscn), resource (.tres), JSON and gettext
//! files, and stages raw assets for the game project.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use zeffyr_import::anims::{player, sprite};
use zeffyr_import::{
    ImportConfig, SceneOptions, assets, convert_level, maptree, materials, text, trileset,
    DictionarySplitter,
};

/// Trileset folder name next to level files
const DEFAULT_TRILESET_DIR: &str = "trile sets";

#[derive(Parser)]
#[command(name = "zeffyr-import")]
#[command(about = "Zeffyr asset import tool")]
#[command(version)]
struct Cli {
    /// Configuration file (default: ./zeffyr.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a level XML to a scene
    Level {
        /// Input level XML
        input: PathBuf,

        /// Output .tscn file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Trileset XML directory (overrides config)
        #[arg(short, long)]
        trilesets: Option<PathBuf>,

        /// Also dump the parsed level as JSON next to the scene
        #[arg(long)]
        json: bool,
    },

    /// Build a preview scene for a trileset XML
    Tileset {
        /// Input trileset XML
        input: PathBuf,

        /// Output .tscn file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Convert the world map tree XML to JSON and a scene
    MapTree {
        /// Input map tree XML
        input: PathBuf,

        /// Output .tscn file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Convert a static text XML to JSON, .pot and per-language .po files
    Text {
        /// Input static text XML
        input: PathBuf,

        /// PO header blocks (overrides config)
        #[arg(long)]
        headers: Option<PathBuf>,
    },

    /// Build SpriteFrames resources from NPC animation folders
    SpriteAnims {
        /// Folder of per-character animation folders
        input: PathBuf,

        /// Output directory (default: next to each character folder)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Playback speed (overrides config)
        #[arg(long)]
        speed: Option<f64>,
    },

    /// Build AnimationPlayer tracks from player animation XMLs
    PlayerAnims {
        /// Folder of player animation XMLs
        input: PathBuf,

        /// Output text file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Character folder used in texture paths (overrides config)
        #[arg(long)]
        character: Option<String>,
    },

    /// Stage .png/.wav files into a sibling assets/ folder
    CopyAssets {
        /// Extracted content folder
        input: PathBuf,

        /// Destination folder (default: ../assets)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Replace the destination without asking
        #[arg(short, long)]
        yes: bool,
    },

    /// Point art object materials at their staged textures
    RelinkMaterials {
        /// Folder of .tres materials
        input: PathBuf,
    },
}

/// Resolve `path` against `base` when relative
fn relative_to(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn parent_dir(path: &Path) -> &Path {
    path.parent().unwrap_or(Path::new("."))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    let config = ImportConfig::discover(cli.config.as_deref())?;

    match cli.command {
        Commands::Level {
            input,
            output,
            trilesets,
            json,
        } => {
            let output = output.unwrap_or_else(|| input.with_extension("tscn"));
            let trilesets = trilesets
                .or_else(|| config.paths.trilesets.clone())
                .unwrap_or_else(|| parent_dir(&input).join(DEFAULT_TRILESET_DIR));
            let json = json.then(|| output.with_extension("json"));
            tracing::info!("Converting {:?} -> {:?}", input, output);

            let options = SceneOptions::from_config(&config.level);
            convert_level(&input, &output, &trilesets, &options, json.as_deref())?;
            tracing::info!("Done!");
        }

        Commands::Tileset { input, output } => {
            let output = output.unwrap_or_else(|| input.with_extension("tscn"));
            tracing::info!("Converting {:?} -> {:?}", input, output);
            trileset::preview::convert_trileset(&input, &output)?;
            tracing::info!("Done!");
        }

        Commands::MapTree { input, output } => {
            let output = output.unwrap_or_else(|| input.with_extension("tscn"));
            let json = output.with_extension("json");
            tracing::info!("Converting {:?} -> {:?}", input, output);
            maptree::convert_map_tree(&input, &output, &json)?;
            tracing::info!("Done!");
        }

        Commands::Text { input, headers } => {
            let headers = headers
                .unwrap_or_else(|| relative_to(parent_dir(&input), &config.text.headers));
            tracing::info!("Converting {:?} (headers {:?})", input, headers);
            text::convert_text(&input, &headers)?;
            tracing::info!("Done!");
        }

        Commands::SpriteAnims {
            input,
            output,
            speed,
        } => {
            let speed = speed.unwrap_or(config.anims.speed);
            sprite::convert_sprite_anims(&input, output.as_deref(), speed)?;
            tracing::info!("Done!");
        }

        Commands::PlayerAnims {
            input,
            output,
            character,
        } => {
            let character = character.unwrap_or_else(|| config.anims.character.clone());
            let output = output.unwrap_or_else(|| input.join(player::output_name(&character)));
            let splitter = DictionarySplitter::with_extra(&config.anims.words);
            tracing::info!("Converting {:?} -> {:?}", input, output);
            player::convert_player_anims(&input, &output, &character, &splitter)?;
            tracing::info!("Done!");
        }

        Commands::CopyAssets { input, output, yes } => {
            let output = output.unwrap_or_else(|| assets::default_destination(&input));
            assets::copy_assets(&input, &output, yes)?;
            tracing::info!("Done! Copy the staged folder to the root of the game project");
        }

        Commands::RelinkMaterials { input } => {
            materials::relink_materials(&input)?;
            tracing::info!("Done!");
        }
    }

    Ok(())
}
