//! Level XML model
//!
//! Reads a legacy level export into owned records. Every placed object keeps
//! its raw position/rotation/scale; transforms are only formed when the scene
//! is built.

pub mod gridmap;
pub mod scene;

use anyhow::{Context, Result};
use roxmltree::Node;
use serde::Serialize;
use std::path::Path;

use zeffyr_shared::{FaceOrientation, Quaternion, Vector3};

use crate::trileset::Trileset;
use crate::xml;

/// Level-wide attributes from the root element
#[derive(Debug, Clone, Serialize)]
pub struct LevelAttributes {
    pub name: String,
    /// Lowercased trileset name
    pub trileset: String,
    pub start: Vector3,
    pub size: Vector3,
    pub song: Option<String>,
    pub node_type: String,
    pub rainy: bool,
    pub halo_filtering: bool,
    pub water_type: String,
    pub water_height: f64,
    pub base_ambient: f64,
    pub base_diffuse: f64,
}

/// Axis-aligned trigger box
#[derive(Debug, Clone, Serialize)]
pub struct Volume {
    pub key: String,
    pub from: Vector3,
    pub to: Vector3,
    pub faces: Vec<FaceOrientation>,
}

impl Volume {
    /// (half extents, centre)
    pub fn area(&self) -> (Vector3, Vector3) {
        let half = (self.from - self.to).abs() / 2.0;
        let centre = (self.from + self.to) / 2.0;
        (half, centre)
    }
}

/// One trile placed in the grid
#[derive(Debug, Clone, Serialize)]
pub struct TrileInstance {
    /// Trileset key
    pub trile_id: String,
    /// Position of the key in the trileset
    pub index: usize,
    pub name: String,
    /// Legacy rotation index (0..4)
    pub orientation: u32,
    pub position: Vector3,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArtInstance {
    pub key: String,
    /// Lowercased art object name
    pub name: String,
    pub position: Vector3,
    pub rotation: Quaternion,
    pub scale: Vector3,
}

#[derive(Debug, Clone, Serialize)]
pub struct BackgroundPlane {
    pub key: String,
    /// Lowercased texture name
    pub texture: String,
    pub position: Vector3,
    pub rotation: Quaternion,
    pub scale: Vector3,
    pub repeat: (bool, bool),
    pub animated: bool,
    pub double_sided: bool,
    pub opacity: f64,
    pub billboard: bool,
    pub filter: String,
    pub actor_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrileGroup {
    pub key: String,
    pub actor_type: String,
    pub triles: Vec<TrileInstance>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Npc {
    pub key: String,
    pub name: String,
    pub position: Vector3,
    pub destination: Vector3,
    pub walk_speed: f64,
    pub randomize_speech: bool,
    pub say_first_line_once: bool,
    pub avoids_gomez: bool,
    pub actor_type: String,
    pub speech: Vec<String>,
    /// Animation names, first one is the idle animation
    pub actions: Vec<String>,
}

/// Music layers and the day phases they play in
#[derive(Debug, Clone, Serialize)]
pub struct AmbienceTrack {
    pub name: String,
    pub dawn: bool,
    pub day: bool,
    pub dusk: bool,
    pub night: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Level {
    pub attributes: LevelAttributes,
    pub volumes: Vec<Volume>,
    pub triles: Vec<TrileInstance>,
    pub arts: Vec<ArtInstance>,
    pub planes: Vec<BackgroundPlane>,
    pub groups: Vec<TrileGroup>,
    pub npcs: Vec<Npc>,
    pub tracks: Vec<AmbienceTrack>,
}

impl Level {
    /// Parse level XML, resolving trile ids against `trileset`
    pub fn parse(text: &str, trileset: &Trileset) -> Result<Self> {
        let doc = xml::parse(text)?;
        let root = doc.root_element();

        Ok(Self {
            attributes: parse_attributes(root)?,
            volumes: collect(root, "Volumes/Entry", parse_volume)?,
            triles: collect(root, "Triles/Entry/TrileInstance", |n| parse_trile(n, trileset))?,
            arts: collect(root, "ArtObjects/Entry", parse_art)?,
            planes: collect(root, "BackgroundPlanes/Entry", parse_plane)?,
            groups: collect(root, "Groups/Entry", |n| parse_group(n, trileset))?,
            npcs: collect(root, "NonplayerCharacters/Entry", parse_npc)?,
            tracks: collect(root, "AmbienceTracks/AmbienceTrack", parse_track)?,
        })
    }

    /// Read only the trileset name of a level file
    pub fn trileset_name(text: &str) -> Result<String> {
        let doc = xml::parse(text)?;
        Ok(xml::attr(doc.root_element(), "trileSetName")?.to_lowercase())
    }

    /// Load a level and its trileset from `trileset_dir`
    pub fn load(path: &Path, trileset_dir: &Path) -> Result<Self> {
        let text = xml::read_text(path)?;
        tracing::info!("Reading level {:?}", path);

        let set_name = Self::trileset_name(&text).with_context(|| format!("In level {:?}", path))?;
        let trileset = Trileset::load(&Trileset::path_in(trileset_dir, &set_name))?;

        Self::parse(&text, &trileset).with_context(|| format!("In level {:?}", path))
    }
}

fn collect<'a, 'input, T>(
    root: Node<'a, 'input>,
    path: &str,
    parse: impl Fn(Node<'a, 'input>) -> Result<T>,
) -> Result<Vec<T>> {
    xml::find_all(root, path).into_iter().map(parse).collect()
}

fn parse_attributes(root: Node<'_, '_>) -> Result<LevelAttributes> {
    Ok(LevelAttributes {
        name: xml::attr(root, "name")?.to_string(),
        trileset: xml::attr(root, "trileSetName")?.to_lowercase(),
        start: xml::vec3_at(root, "StartingPosition/TrileFace/TrileId/TrileEmplacement")?,
        size: xml::vec3_at(root, "Size/Vector3")?,
        song: root.attribute("songName").map(str::to_string),
        node_type: xml::attr(root, "nodeType")?.to_string(),
        rainy: xml::attr_bool(root, "rainy")?,
        halo_filtering: xml::attr_bool(root, "haloFiltering")?,
        water_type: xml::attr(root, "waterType")?.to_string(),
        water_height: xml::attr_f64(root, "waterHeight")?,
        base_ambient: xml::attr_f64(root, "baseAmbient")?,
        base_diffuse: xml::attr_f64(root, "baseDiffuse")?,
    })
}

fn parse_volume(entry: Node<'_, '_>) -> Result<Volume> {
    let volume = xml::require(entry, "Volume")?;
    let faces = xml::find_all(volume, "Orientations/FaceOrientation")
        .into_iter()
        .map(|face| xml::text(face).parse::<FaceOrientation>().map_err(anyhow::Error::from))
        .collect::<Result<Vec<_>>>()?;

    Ok(Volume {
        key: xml::attr(entry, "key")?.to_string(),
        from: xml::vec3_at(volume, "From/Vector3")?,
        to: xml::vec3_at(volume, "To/Vector3")?,
        faces,
    })
}

fn parse_trile(instance: Node<'_, '_>, trileset: &Trileset) -> Result<TrileInstance> {
    let trile_id = xml::attr(instance, "trileId")?;
    let (index, name) = trileset.lookup(trile_id).with_context(|| {
        format!(
            "Trile id '{}' not found in trileset '{}'",
            trile_id, trileset.name
        )
    })?;

    Ok(TrileInstance {
        trile_id: trile_id.to_string(),
        index,
        name: name.to_string(),
        orientation: xml::attr_u32(instance, "orientation")?,
        position: xml::vec3_at(instance, "Position/Vector3")?,
    })
}

fn parse_art(entry: Node<'_, '_>) -> Result<ArtInstance> {
    let art = xml::require(entry, "ArtObjectInstance")?;
    Ok(ArtInstance {
        key: xml::attr(entry, "key")?.to_string(),
        name: xml::attr(art, "name")?.to_lowercase(),
        position: xml::vec3_at(art, "Position/Vector3")?,
        rotation: xml::quat_at(art, "Rotation/Quaternion")?,
        scale: xml::vec3_at(art, "Scale/Vector3")?,
    })
}

fn parse_plane(entry: Node<'_, '_>) -> Result<BackgroundPlane> {
    let plane = xml::require(entry, "BackgroundPlane")?;
    Ok(BackgroundPlane {
        key: xml::attr(entry, "key")?.to_string(),
        texture: xml::attr(plane, "textureName")?.to_lowercase(),
        position: xml::vec3_at(plane, "Position/Vector3")?,
        rotation: xml::quat_at(plane, "Rotation/Quaternion")?,
        scale: xml::vec3_at(plane, "Scale/Vector3")?,
        repeat: (
            xml::attr_bool(plane, "xTextureRepeat")?,
            xml::attr_bool(plane, "yTextureRepeat")?,
        ),
        animated: xml::attr_bool(plane, "animated")?,
        double_sided: xml::attr_bool(plane, "doubleSided")?,
        opacity: xml::attr_f64(plane, "opacity")?,
        billboard: xml::attr_bool(plane, "billboard")?,
        filter: xml::attr(plane, "filter")?.to_string(),
        actor_type: xml::attr(plane, "actorType")?.to_string(),
    })
}

fn parse_group(entry: Node<'_, '_>, trileset: &Trileset) -> Result<TrileGroup> {
    let group = xml::require(entry, "TrileGroup")?;
    Ok(TrileGroup {
        key: xml::attr(entry, "key")?.to_string(),
        actor_type: xml::attr(group, "actorType")?.to_string(),
        triles: collect(group, "Triles/TrileInstance", |n| parse_trile(n, trileset))?,
    })
}

fn parse_npc(entry: Node<'_, '_>) -> Result<Npc> {
    let npc = xml::require(entry, "NpcInstance")?;

    let speech = xml::find_all(npc, "Speech/SpeechLine")
        .into_iter()
        .map(|line| xml::attr(line, "text").map(str::to_string))
        .collect::<Result<Vec<_>>>()?;

    let actions = xml::find_all(npc, "Actions/Action")
        .into_iter()
        .map(|action| {
            let content = xml::require(action, "NpcActionContent")?;
            xml::attr(content, "animationName").map(str::to_string)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Npc {
        key: xml::attr(entry, "key")?.to_string(),
        name: xml::attr(npc, "name")?.to_string(),
        position: xml::vec3_at(npc, "Position/Vector3")?,
        destination: xml::vec3_at(npc, "DestinationOffset/Vector3")?,
        walk_speed: xml::attr_f64(npc, "walkSpeed")?,
        randomize_speech: xml::attr_bool(npc, "randomizeSpeech")?,
        say_first_line_once: xml::attr_bool(npc, "sayFirstSpeechLineOnce")?,
        avoids_gomez: xml::attr_bool(npc, "avoidsGomez")?,
        actor_type: xml::attr(npc, "actorType")?.to_string(),
        speech,
        actions,
    })
}

fn parse_track(track: Node<'_, '_>) -> Result<AmbienceTrack> {
    Ok(AmbienceTrack {
        name: xml::attr(track, "name")?.to_string(),
        dawn: xml::attr_bool(track, "dawn")?,
        day: xml::attr_bool(track, "day")?,
        dusk: xml::attr_bool(track, "dusk")?,
        night: xml::attr_bool(track, "night")?,
    })
}
