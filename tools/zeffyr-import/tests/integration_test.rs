//! Integration tests for zeffyr-import
//!
//! Tests the full pipeline: write legacy XML fixtures -> run the CLI -> verify output


use std::path::Path;
use std::process::Output;
use tempfile::tempdir;

/// Run zeffyr-import with `args` from `dir`
fn zeffyr_import(dir: &Path, args: &[&str]) -> Output {
    std::process::Command::new(env!("CARGO_BIN_EXE_zeffyr-import"))
        .current_dir(dir)
        .args(args)
        .output()
        .expect("Failed to run zeffyr-import")
}

fn assert_success(output: &Output, what: &str) {
    assert!(
        output.status.success(),
        "zeffyr-import {} failed:\n{}",
        what,
        String::from_utf8_lossy(&output.stderr)
    );
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap_or_else(|e| panic!("Failed to read {:?}: {}", path, e))
}

/// Test level XML -> scene with trileset lookup, grid cells and transforms
#[test]
fn test_level_to_scene() {
    let dir = tempdir().expect("Failed to create temp dir");
    fixtures::write(&dir.path().join("trile sets").join("village.xml"), fixtures::TRILESET);
    fixtures::write(&dir.path().join("town.xml"), fixtures::LEVEL);

    let output = zeffyr_import(dir.path(), &["level", "town.xml", "--json"]);
    assert_success(&output, "level");

    let scene = read(&dir.path().join("town.tscn"));
    assert!(scene.starts_with("[gd_scene load_steps=6 format=2]\n"));
    assert!(scene.contains("[ext_resource path=\"res://assets/Trilesets/village.meshlib\" type=\"MeshLibrary\" id=3]"));
    assert!(scene.contains("[ext_resource path=\"res://assets/Art Objects/fountain.gltf\" type=\"PackedScene\" id=4]"));
    assert!(scene.contains("[node name=\"TOWN\" type=\"Spatial\"]"));
    assert!(!scene.contains("Water"), "waterType None must not add water");

    // Gold Cube is filtered out of the grid
    assert!(scene.contains("\"cells\": PoolIntArray( 65534, 1, 655360, 327684, 6, 1441792 )"));
    assert!(scene.contains("transform = Transform( -1, 0, 0, 0, 1, 0, 0, 0, -1, 2, 1, 1 )"));
    assert!(scene.contains("extents = Vector3( 2, 1, 1 )"));
    assert!(scene.contains("[node name=\"7\" parent=\"Arts\" instance=ExtResource( 4 )]"));

    let json: serde_json::Value =
        serde_json::from_str(&read(&dir.path().join("town.json"))).expect("Invalid level JSON");
    assert_eq!(json["attributes"]["name"], "TOWN");
    assert_eq!(json["triles"].as_array().map(Vec::len), Some(3));
    assert_eq!(json["triles"][1]["name"], "Gold Cube");
}

/// Test that an unknown trile id fails the conversion
#[test]
fn test_level_unknown_trile() {
    let dir = tempdir().expect("Failed to create temp dir");
    fixtures::write(&dir.path().join("sets").join("village.xml"), fixtures::TRILESET);
    fixtures::write(
        &dir.path().join("broken.xml"),
        &fixtures::LEVEL.replace("trileId=\"5\"", "trileId=\"42\""),
    );

    let output = zeffyr_import(dir.path(), &["level", "broken.xml", "-t", "sets"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("42"));
    assert!(!dir.path().join("broken.tscn").exists());
}

/// Test trileset XML -> preview scene
#[test]
fn test_tileset_preview() {
    let dir = tempdir().expect("Failed to create temp dir");
    fixtures::write(&dir.path().join("village.xml"), fixtures::TRILESET);

    let output = zeffyr_import(dir.path(), &["tileset", "village.xml", "-o", "preview.tscn"]);
    assert_success(&output, "tileset");

    let scene = read(&dir.path().join("preview.tscn"));
    assert!(scene.contains("[node name=\"Village\" type=\"Spatial\"]"));
    assert!(scene.contains("[node name=\"Brick\" type=\"MeshInstance\" parent=\".\"]"));
    assert!(scene.contains("[node name=\"Gold Cube\" type=\"MeshInstance\" parent=\".\"]"));
    assert!(scene.contains("SurfaceType = 3"));
}

/// Test map tree XML -> JSON dump and nested scene
#[test]
fn test_map_tree() {
    let dir = tempdir().expect("Failed to create temp dir");
    fixtures::write(&dir.path().join("maptree.xml"), fixtures::MAP_TREE);

    let output = zeffyr_import(dir.path(), &["map-tree", "maptree.xml"]);
    assert_success(&output, "map-tree");

    let scene = read(&dir.path().join("maptree.tscn"));
    assert!(scene.contains("[node name=\"MapTree\" type=\"Spatial\"]"));
    assert!(scene.contains("[node name=\"SHED\" parent=\"HUB\" instance=ExtResource( 1 )]"));
    assert!(scene.contains("transform = Transform( 1, 0, 0, 0, 1, 0, 0, 0, 1, -12, 0, 0 )"));
    assert!(scene.contains("\"Chests\": 2,"));

    let json: serde_json::Value =
        serde_json::from_str(&read(&dir.path().join("maptree.json"))).expect("Invalid map JSON");
    assert_eq!(json["name"], "HUB");
    assert_eq!(json["connections"][0]["id"], 0);
    assert_eq!(json["connections"][0]["face"], "Left");
    assert_eq!(json["connections"][0]["child"]["size"], 1);
}

/// Test static text XML -> JSON, template and per-language catalogs
#[test]
fn test_text_catalogs() {
    let dir = tempdir().expect("Failed to create temp dir");
    fixtures::write(&dir.path().join("statictext.xml"), fixtures::STATIC_TEXT);
    fixtures::write(&dir.path().join("headers.po"), fixtures::PO_HEADERS);

    let output = zeffyr_import(dir.path(), &["text", "statictext.xml"]);
    assert_success(&output, "text");

    let pot = read(&dir.path().join("statictext.pot"));
    assert!(pot.starts_with("msgid \"\"\nmsgstr \"\"\n\nmsgid \"GREETING\"\nmsgstr \"\"\n"));

    let en = read(&dir.path().join("statictext.en.po"));
    assert!(en.starts_with("msgid \"\"\nmsgstr \"\"\n\"Language: en\\n\"\n\n"));
    assert!(en.contains("msgid \"GREETING\"\nmsgstr \"Hello\\nthere\"\n"));
    assert!(en.contains("msgstr \"Say \\\"hi\\\"\""));

    let fr = read(&dir.path().join("statictext.fr.po"));
    assert!(fr.contains("\"Language: fr\\n\""));
    assert!(fr.contains("msgstr \"Salut\""));

    let json = read(&dir.path().join("statictext.json"));
    let en_at = json.find("\"en\"").expect("Missing en");
    let fr_at = json.find("\"fr\"").expect("Missing fr");
    assert!(en_at < fr_at, "languages must keep document order");
}

/// Test NPC animation folders -> SpriteFrames resources
#[test]
fn test_sprite_anims() {
    let dir = tempdir().expect("Failed to create temp dir");
    let owl = dir.path().join("anims").join("owl");
    fixtures::write(&owl.join("idle.xml"), fixtures::ANIMATION);
    fixtures::write(&owl.join("fly.xml"), fixtures::ANIMATION);
    fixtures::write(&owl.join("metadata").join("ignored.xml"), "not xml at all");

    let output = zeffyr_import(dir.path(), &["sprite-anims", "anims"]);
    assert_success(&output, "sprite-anims");

    let tres = read(&owl.join("owl.tres"));
    assert!(tres.starts_with("[gd_resource type=\"SpriteFrames\" load_steps=7 format=2]\n"));
    assert!(tres.contains("res://assets/Character Animations/owl/fly.ani.png"));
    assert!(tres.contains("\"name\": \"idle\""));
    assert!(tres.contains("region = Rect2( 16, 0, 16, 16 )"));
}

/// Test player animation XMLs -> AnimationPlayer track file
#[test]
fn test_player_anims() {
    let dir = tempdir().expect("Failed to create temp dir");
    fixtures::write(&dir.path().join("gomez").join("idleplay.xml"), fixtures::ANIMATION);

    let output = zeffyr_import(dir.path(), &["player-anims", "gomez"]);
    assert_success(&output, "player-anims");

    let text = read(&dir.path().join("gomez").join("gomez_player_anis.txt"));
    assert!(text.contains("anims/idle_play = SubResource( 1 )"));
    assert!(text.contains("length = 0.4"));
    assert!(text.contains("\"times\": PoolRealArray( 0, 0.2 ),"));
}

/// Test asset staging with the confirmation skipped
#[test]
fn test_copy_assets() {
    let dir = tempdir().expect("Failed to create temp dir");
    let content = dir.path().join("content");
    fixtures::write(&content.join("trile sets").join("village.png"), "png");
    fixtures::write(&content.join("sounds").join("npc_talk").join("hi.wav"), "wav");
    fixtures::write(&content.join("sounds").join("npc_talk").join("hi.xnb"), "xnb");

    let output = zeffyr_import(dir.path(), &["copy-assets", "content", "--yes"]);
    assert_success(&output, "copy-assets");

    let assets = dir.path().join("assets");
    assert!(assets.join("Trilesets").join("village.png").is_file());
    assert!(assets.join("Sounds").join("Npc Talk").join("hi.wav").is_file());
    assert!(!assets.join("Sounds").join("Npc Talk").join("hi.xnb").exists());
}

/// Test material relinking in place
#[test]
fn test_relink_materials() {
    let dir = tempdir().expect("Failed to create temp dir");
    let materials = dir.path().join("Art Objects");
    fixtures::write(&materials.join("fountain.tres"), fixtures::MATERIAL);

    let output = zeffyr_import(dir.path(), &["relink-materials", "Art Objects"]);
    assert_success(&output, "relink-materials");

    let text = read(&materials.join("fountain.tres"));
    assert_eq!(
        text,
        "[gd_resource type=\"SpatialMaterial\" load_steps=2 format=2]\n\n\
         [ext_resource path=\"res://assets/Art Objects/fountain.png\" type=\"Texture\" id=1]\n\n\
         [resource]\nalbedo_texture = ExtResource( 1 )\n"
    );
}
