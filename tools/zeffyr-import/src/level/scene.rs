//! Level scene generation (level.xml -> .tscn)

use anyhow::{Context, Result};
use hashbrown::HashMap;
use std::path::Path;

use zeffyr_shared::{Quaternion, Transform};

use super::gridmap::{SkipPatterns, build_gridmap};
use super::{ArtInstance, BackgroundPlane, Level, Npc, Volume};
use crate::color::parse_color;
use crate::config::LevelSection;
use crate::formats::tscn::{Document, DocumentBuilder, Node, Value};
use crate::naming::{UniqueNames, title_case};

const GOMEZ_SCENE: &str = "res://scenes/Gomez.tscn";
const CAMERA_SCENE: &str = "res://scenes/GameCamera.tscn";
const WATER_SCENE: &str = "res://scenes/Water.tscn";
const NPC_SCRIPT: &str = "res://src/Components/NpcInstance.cs";

const PACKED_SCENE: &str = "PackedScene";

/// Scene generation settings
#[derive(Debug, Clone)]
pub struct SceneOptions {
    pub pixel_size: f64,
    pub pixels_per_trixel: i64,
    pub skip: SkipPatterns,
}

impl SceneOptions {
    pub fn from_config(level: &LevelSection) -> Self {
        Self {
            pixel_size: level.pixel_size,
            pixels_per_trixel: level.pixels_per_trixel,
            skip: SkipPatterns::new(&level.skip_trile_patterns),
        }
    }
}

impl Default for SceneOptions {
    fn default() -> Self {
        Self::from_config(&LevelSection::default())
    }
}

/// NPC folder/display name: `old_man` -> `Old Man`, any McMayor -> `Mayor McMayor`
pub fn npc_display_name(name: &str) -> String {
    let name = title_case(&name.replace('_', " "));
    if name.contains("Mcmayor") {
        "Mayor McMayor".to_string()
    } else {
        name
    }
}

/// Rotation of a volume, taken from its first face
fn volume_rotation(volume: &Volume) -> Quaternion {
    match volume.faces.first() {
        Some(face) => face.quaternion().unwrap_or_else(|| {
            tracing::warn!("Volume {} faces {}, using identity rotation", volume.key, face);
            Quaternion::IDENTITY
        }),
        None => {
            tracing::warn!("Volume {} has no faces, using identity rotation", volume.key);
            Quaternion::IDENTITY
        }
    }
}

struct SceneBuilder<'a> {
    level: &'a Level,
    options: &'a SceneOptions,
    resources: DocumentBuilder,
}

impl<'a> SceneBuilder<'a> {
    fn build(mut self) -> Result<Document> {
        let level = self.level;
        let attributes = &level.attributes;

        let gomez_scene = self.resources.add_ext_resource(GOMEZ_SCENE, PACKED_SCENE);
        let camera_scene = self.resources.add_ext_resource(CAMERA_SCENE, PACKED_SCENE);

        let water = (attributes.water_type != "None").then(|| {
            let scene = self.resources.add_ext_resource(WATER_SCENE, PACKED_SCENE);
            Node::instance("Water", scene)
                .with("Height", attributes.water_height)
                .with("Type", attributes.water_type.as_str())
        });

        let meshlib_path = format!("res://assets/Trilesets/{}.meshlib", attributes.trileset);
        let meshlib = self.resources.add_ext_resource(&meshlib_path, "MeshLibrary");

        let triles = build_gridmap("Triles", &level.triles, meshlib, &self.options.skip)?;
        let groups = level
            .groups
            .iter()
            .map(|group| {
                build_gridmap(&group.key, &group.triles, meshlib, &self.options.skip)
                    .with_context(|| format!("In trile group {}", group.key))
            })
            .collect::<Result<Vec<_>>>()?;

        let arts = self.arts(&level.arts);
        let planes = self.planes(&level.planes)?;
        let volumes = self.volumes(&level.volumes);
        let npcs = self.npcs(&level.npcs);

        let gomez = Node::instance("Gomez", gomez_scene)
            .with("transform", &Transform::from_translation(attributes.start));
        let camera = Node::instance("GameCamera", camera_scene)
            .with("PixelsPerTrixel", self.options.pixels_per_trixel)
            .with("TargetPath", Value::NodePath("../Gomez".into()));

        let mut root = Node::new(attributes.name.as_str(), "Spatial");
        root.add_child(triles);
        if let Some(water) = water {
            root.add_child(water);
        }
        root.add_child(gomez);
        root.add_child(camera);
        root.add_child(Node::new("Groups", "Spatial").with_children(groups));
        root.add_child(Node::new("Arts", "Spatial").with_children(arts));
        root.add_child(Node::new("Planes", "Spatial").with_children(planes));
        root.add_child(Node::new("Volumes", "Spatial").with_children(volumes));
        root.add_child(Node::new("Npcs", "Spatial").with_children(npcs));

        Ok(self.resources.into_scene(root))
    }

    fn arts(&mut self, arts: &[ArtInstance]) -> Vec<Node> {
        arts.iter()
            .map(|art| {
                let path = format!("res://assets/Art Objects/{}.gltf", art.name);
                let scene = self.resources.add_ext_resource(&path, PACKED_SCENE);
                Node::instance(art.key.as_str(), scene).with(
                    "transform",
                    &Transform::form(art.position, art.rotation, art.scale),
                )
            })
            .collect()
    }

    fn planes(&mut self, planes: &[BackgroundPlane]) -> Result<Vec<Node>> {
        let mut names = UniqueNames::new(planes.iter().map(|p| p.texture.as_str()));

        planes
            .iter()
            .map(|plane| {
                let color = parse_color(&plane.filter)
                    .with_context(|| format!("Background plane {} filter", plane.key))?;
                let transform = Transform::form(plane.position, plane.rotation, plane.scale);
                let kind = if plane.animated { "AnimatedSprite3D" } else { "Sprite3D" };

                let node = Node::new(names.next(&plane.texture), kind)
                    .with("transform", &transform)
                    .with("modulate", Value::color(&color))
                    .with("opacity", plane.opacity)
                    .with("pixel_size", self.options.pixel_size)
                    .with("billboard", if plane.billboard { 2i64 } else { 0 })
                    .with("transparent", true)
                    .with("shaded", true)
                    .with("double_sided", plane.double_sided)
                    .with("alpha_cut", 2i64);

                Ok(if plane.animated {
                    let path = format!("res://assets/Background Planes/{}.tres", plane.texture);
                    let frames = self.resources.add_ext_resource(&path, "SpriteFrames");
                    node.with("frames", Value::ExtResource(frames))
                        .with("animation", plane.texture.as_str())
                        .with("playing", true)
                } else {
                    let path = format!("res://assets/Background Planes/{}.png", plane.texture);
                    let texture = self.resources.add_ext_resource(&path, "Texture");
                    node.with("texture", Value::ExtResource(texture))
                })
            })
            .collect()
    }

    fn volumes(&mut self, volumes: &[Volume]) -> Vec<Node> {
        volumes
            .iter()
            .map(|volume| {
                let (extents, centre) = volume.area();
                let shape = self
                    .resources
                    .add_sub_resource("BoxShape", vec![("extents".into(), Value::vector3(extents))]);

                Node::new(volume.key.as_str(), "Area")
                    .with(
                        "transform",
                        &Transform::from_translation_rotation(centre, volume_rotation(volume)),
                    )
                    .with_children([Node::new("Shape", "CollisionShape")
                        .with("shape", Value::SubResource(shape))])
            })
            .collect()
    }

    fn npcs(&mut self, npcs: &[Npc]) -> Vec<Node> {
        if npcs.is_empty() {
            return Vec::new();
        }

        let script = self.resources.add_ext_resource(NPC_SCRIPT, "Script");
        let display: Vec<String> = npcs.iter().map(|npc| npc_display_name(&npc.name)).collect();

        let mut frames: HashMap<&str, u32> = HashMap::new();
        for name in &display {
            if !frames.contains_key(name.as_str()) {
                let path = format!("res://assets/Character Animations/{0}/{0}.tres", name);
                frames.insert(name, self.resources.add_ext_resource(&path, "SpriteFrames"));
            }
        }

        let mut names = UniqueNames::new(display.iter().map(String::as_str));
        npcs.iter()
            .zip(&display)
            .map(|(npc, name)| {
                let mut node = Node::new(names.next(name), "AnimatedSprite3D")
                    .with("transform", &Transform::from_translation(npc.position))
                    .with("pixel_size", self.options.pixel_size)
                    .with("frames", Value::ExtResource(frames[name.as_str()]));

                match npc.actions.first() {
                    Some(action) => node = node.with("animation", action.to_lowercase()),
                    None => tracing::warn!("NPC '{}' has no actions", npc.name),
                }

                node.with("script", Value::ExtResource(script))
                    .with("WalkSpeed", npc.walk_speed)
                    .with("AvoidsGomez", npc.avoids_gomez)
                    .with("RandomizeSpeech", npc.randomize_speech)
                    .with("SayFirstSpeechLineOnce", npc.say_first_line_once)
                    .with("SpeechTags", Value::string_array(&npc.speech))
                    .with("DestinationOffset", npc.destination)
            })
            .collect()
    }
}

/// Build the scene document for a parsed level
pub fn build_scene(level: &Level, options: &SceneOptions) -> Result<Document> {
    SceneBuilder {
        level,
        options,
        resources: DocumentBuilder::new(),
    }
    .build()
}

/// Convert a level XML file into a scene; optionally dump the parsed model
pub fn convert_level(
    input: &Path,
    output: &Path,
    trileset_dir: &Path,
    options: &SceneOptions,
    json: Option<&Path>,
) -> Result<()> {
    let level = Level::load(input, trileset_dir)?;

    if let Some(json) = json {
        crate::formats::write_json(json, &level)?;
    }

    let scene = build_scene(&level, options)?;
    crate::formats::write_document(output, &scene)?;

    tracing::info!(
        "Exported level '{}': {} triles, {} arts, {} planes, {} npcs",
        level.attributes.name,
        level.triles.len(),
        level.arts.len(),
        level.planes.len(),
        level.npcs.len()
    );
    Ok(())
}
