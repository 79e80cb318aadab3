//! Player animation tracks (AnimationPlayer with one Animation per XML)
//!
//! Each animation swaps the sprite texture once and then steps the region
//! rectangle through the atlas at the recorded frame start times.

use anyhow::{Context, Result};
use hashbrown::HashSet;
use std::path::Path;

use zeffyr_shared::math::round_to;

use super::words::WordSplitter;
use super::{Animation, file_stem, find_animation_files};
use crate::formats::tscn::{Document, DocumentBuilder, Node, Value};

const TEXTURE_TRACK: &str = "AnimationPlayer/Sprite:texture";
const REGION_TRACK: &str = "AnimationPlayer/Sprite:region_rect";

/// Output file name for a character's tracks
pub fn output_name(character: &str) -> String {
    format!("{}_player_anis.txt", character.to_lowercase())
}

fn track(index: usize, path: &str, times: &[f64], values: Vec<Value>) -> Vec<(String, Value)> {
    let key = |field: &str| format!("tracks/{}/{}", index, field);
    vec![
        (key("type"), Value::from("value")),
        (key("path"), Value::NodePath(path.to_string())),
        (key("interp"), Value::Int(0)),
        (key("loop_wrap"), Value::Bool(true)),
        (key("imported"), Value::Bool(false)),
        (key("enabled"), Value::Bool(true)),
        (
            key("keys"),
            Value::dict([
                ("times", Value::real_array(times)),
                ("transitions", Value::real_array(&vec![1.0; times.len()])),
                ("update", Value::Int(0)),
                ("values", Value::Array(values)),
            ]),
        ),
    ]
}

/// Animation sub-resource properties for one strip
pub fn animation_props(name: &str, animation: &Animation, texture: u32) -> Vec<(String, Value)> {
    let regions = animation
        .frames
        .iter()
        .map(|f| Value::rect2(f.region.x, f.region.y, f.region.w, f.region.h))
        .collect();

    let mut props = vec![
        ("resource_name".to_string(), Value::from(name)),
        ("length".to_string(), Value::Float(round_to(animation.length(), 3))),
    ];
    props.extend(track(0, TEXTURE_TRACK, &[0.0], vec![Value::ExtResource(texture)]));
    props.extend(track(1, REGION_TRACK, &animation.start_times(), regions));
    props
}

/// `base`, or `base_2`, `base_3`, ... when an earlier animation has it
fn unused_name(used: &mut HashSet<String>, base: &str) -> String {
    if used.insert(base.to_string()) {
        return base.to_string();
    }
    let mut n = 2;
    loop {
        let candidate = format!("{}_{}", base, n);
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

/// Build the AnimationPlayer scene for `(file stem, animation)` pairs
pub fn build_player(
    character: &str,
    animations: &[(String, Animation)],
    splitter: &dyn WordSplitter,
) -> Document {
    let mut resources = DocumentBuilder::new();
    let mut player = Node::new("AnimationPlayer", "AnimationPlayer");
    let mut used = HashSet::new();

    for (stem, animation) in animations {
        let path = format!("res://Assets/Character Animations/{}/{}.ani.png", character, stem);
        let texture = resources.add_ext_resource(&path, "Texture");

        let base = splitter.snake_case(stem);
        let name = unused_name(&mut used, &base);
        if name != base {
            tracing::warn!("Animation name {} already taken, exporting {:?} as {}", base, stem, name);
        }
        tracing::debug!("[Anim] {} -> {} ({} frames)", stem, name, animation.frames.len());

        let id = resources.add_sub_resource("Animation", animation_props(&name, animation, texture));
        player = player.with(&format!("anims/{}", name), Value::SubResource(id));
    }

    resources.into_scene(player)
}

/// Convert every animation XML under `input` into one player track file
pub fn convert_player_anims(
    input: &Path,
    output: &Path,
    character: &str,
    splitter: &dyn WordSplitter,
) -> Result<()> {
    let animations = find_animation_files(input)?
        .iter()
        .map(|path| Ok((file_stem(path)?.to_string(), Animation::load(path)?)))
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("In player animations {:?}", input))?;

    let document = build_player(character, &animations, splitter);
    crate::formats::write_document(output, &document)?;

    tracing::info!("Exported {} player animations for {}", animations.len(), character);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anims::tests::ANIMATION;
    use crate::anims::words::DictionarySplitter;

    #[test]
    fn test_output_name() {
        assert_eq!(output_name("Gomez"), "gomez_player_anis.txt");
    }

    #[test]
    fn test_player_document() {
        let anim = Animation::parse(ANIMATION).unwrap();
        let text = build_player(
            "Gomez",
            &[("idleplay".to_string(), anim)],
            &DictionarySplitter::default(),
        )
        .to_string();

        assert!(text.starts_with("[gd_scene load_steps=3 format=2]\n"));
        assert!(text.contains("[ext_resource path=\"res://Assets/Character Animations/Gomez/idleplay.ani.png\" type=\"Texture\" id=1]"));
        assert!(text.contains("resource_name = \"idle_play\"\nlength = 0.325\n"));
        assert!(text.contains("tracks/0/path = NodePath(\"AnimationPlayer/Sprite:texture\")"));
        assert!(text.contains("\"times\": PoolRealArray( 0, 0.1, 0.23 ),\n\"transitions\": PoolRealArray( 1, 1, 1 ),"));
        assert!(text.contains("\"values\": [ Rect2( 0, 0, 16, 16 ), Rect2( 16, 0, 16, 16 ), Rect2( 32, 0, 16, 16 ) ]"));
        assert!(text.contains("[node name=\"AnimationPlayer\" type=\"AnimationPlayer\"]\nanims/idle_play = SubResource( 1 )\n"));
    }

    #[test]
    fn test_colliding_names_numbered() {
        let anim = Animation::parse(ANIMATION).unwrap();
        let animations = [
            ("idleplay".to_string(), anim.clone()),
            ("idleplay".to_string(), anim.clone()),
            ("idleplay".to_string(), anim),
        ];
        let text = build_player("Gomez", &animations, &DictionarySplitter::default()).to_string();

        assert!(text.contains("anims/idle_play = SubResource( 1 )\nanims/idle_play_2 = SubResource( 2 )\nanims/idle_play_3 = SubResource( 3 )\n"));
        assert!(text.contains("resource_name = \"idle_play_2\""));
    }
}
