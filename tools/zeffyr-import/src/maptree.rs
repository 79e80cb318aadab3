//! World map tree (maptree.xml -> .json + .tscn)
//!
//! The map is a tree of level nodes joined by connections on one of their
//! six faces. Each scene node is placed relative to its parent, one step of
//! `parent size x 4` along the connection face.

use anyhow::{Context, Result, bail};
use roxmltree::Node as XmlNode;
use serde::Serialize;
use std::path::Path;

use zeffyr_shared::{FaceOrientation, Transform, Vector3};

use crate::formats::tscn::{Document, DocumentBuilder, Node, Value};
use crate::xml;

const MAP_NODE_SCENE: &str = "res://src/Components/Map/MapNode.tscn";
const ROOT_NAME: &str = "MapTree";

/// Scene units per node size step
const SPACING: f64 = 4.0;

/// Node kinds, by their map size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MapNodeType {
    Lesser,
    Node,
    Hub,
}

impl MapNodeType {
    pub fn from_name(name: &str) -> Result<Self> {
        Ok(match name {
            "Lesser" => Self::Lesser,
            "Node" => Self::Node,
            "Hub" => Self::Hub,
            _ => bail!("Unknown map node type '{}'", name),
        })
    }

    pub fn size(self) -> u32 {
        match self {
            Self::Lesser => 1,
            Self::Node => 2,
            Self::Hub => 3,
        }
    }
}

/// Collectables and requirements counted on a map node
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WinConditions {
    pub chests: i64,
    pub locked_doors: i64,
    pub unlocked_doors: i64,
    pub cube_shards: i64,
    pub split_up: i64,
    pub secrets: i64,
    pub others: i64,
    pub scripts: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MapNode {
    pub name: String,
    pub node_type: MapNodeType,
    pub size: u32,
    pub has_lesser_gate: bool,
    pub has_warp_gate: bool,
    pub conditions: WinConditions,
    pub connections: Vec<Connection>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Connection {
    /// Depth-first position of this connection in the whole tree
    pub id: u32,
    pub face: FaceOrientation,
    pub branch_oversize: f64,
    pub child: MapNode,
}

/// Hands out connection ids in visiting order
#[derive(Debug, Default)]
struct ConnectionIds {
    next: u32,
}

impl ConnectionIds {
    fn take(&mut self) -> u32 {
        let id = self.next;
        self.next += 1;
        id
    }
}

impl MapNode {
    /// Parse the tree under the document's top-level `Node`
    pub fn parse(text: &str) -> Result<Self> {
        let doc = xml::parse(text)?;
        let root = xml::require(doc.root_element(), "Node")?;
        parse_node(root, &mut ConnectionIds::default())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = xml::read_text(path)?;
        tracing::info!("Reading map tree {:?}", path);
        Self::parse(&text).with_context(|| format!("In map tree {:?}", path))
    }

    /// Number of nodes in this subtree
    pub fn count(&self) -> usize {
        1 + self.connections.iter().map(|c| c.child.count()).sum::<usize>()
    }
}

fn parse_node(element: XmlNode<'_, '_>, ids: &mut ConnectionIds) -> Result<MapNode> {
    let name = xml::attr(element, "name")?.to_string();
    let node_type = MapNodeType::from_name(xml::attr(element, "type")?)
        .with_context(|| format!("In map node '{}'", name))?;

    let win = xml::require(element, "WinConditions")?;
    let conditions = WinConditions {
        chests: xml::attr_i64(win, "chests")?,
        locked_doors: xml::attr_i64(win, "lockedDoors")?,
        unlocked_doors: xml::attr_i64(win, "unlockedDoors")?,
        cube_shards: xml::attr_i64(win, "cubeShards")?,
        split_up: xml::attr_i64(win, "splitUp")?,
        secrets: xml::attr_i64(win, "secrets")?,
        others: xml::attr_i64(win, "others")?,
        scripts: xml::find_all(win, "Scripts/Script")
            .into_iter()
            .map(|s| xml::text(s).to_string())
            .collect(),
    };

    let mut connections = Vec::new();
    for conn in xml::find_all(element, "Connections/Connection") {
        let id = ids.take();
        let face = xml::attr(conn, "face")?.parse::<FaceOrientation>()?;
        let branch_oversize = xml::attr_f64(conn, "branchOversize")?;
        let child = parse_node(xml::require(conn, "Node")?, ids)?;
        connections.push(Connection {
            id,
            face,
            branch_oversize,
            child,
        });
    }

    Ok(MapNode {
        name,
        node_type,
        size: node_type.size(),
        has_lesser_gate: xml::attr_bool(element, "hasLesserGate")?,
        has_warp_gate: xml::attr_bool(element, "hasWarpGate")?,
        conditions,
        connections,
    })
}

fn conditions_value(c: &WinConditions) -> Value {
    Value::dict([
        ("Big Cubes", Value::Int(c.cube_shards)),
        ("Chests", Value::Int(c.chests)),
        ("Locked Doors", Value::Int(c.locked_doors)),
        ("Other", Value::Int(c.others)),
        ("Secrets", Value::Int(c.secrets)),
        ("Small Cubes", Value::Int(c.split_up)),
        ("Unlocked Doors", Value::Int(c.unlocked_doors)),
    ])
}

fn build_node(
    node: &MapNode,
    offset: Vector3,
    scene: u32,
    resources: &mut DocumentBuilder,
) -> Node {
    let path = format!(
        "res://assets/Other Textures/map_screens/{}.png",
        node.name.to_lowercase()
    );
    let screen = resources.add_ext_resource(&path, "Texture");

    let mut out = Node::instance(node.name.as_str(), scene)
        .with("transform", &Transform::from_translation(offset))
        .with("_conditions", conditions_value(&node.conditions))
        .with("UnknownColor", Value::color(&[0.5, 0.5, 0.5, 0.5]))
        .with("State", 1i64)
        .with("NodeSize", node.size)
        .with("HasWarpGate", node.has_warp_gate)
        .with("MapScreen", Value::ExtResource(screen))
        .with("HasLesserGate", node.has_lesser_gate);

    let step = node.size as f64 * SPACING;
    for conn in &node.connections {
        tracing::debug!("[MapTree] {} -> {} ({})", node.name, conn.child.name, conn.face);
        out.add_child(build_node(&conn.child, conn.face.offset(step), scene, resources));
    }
    out
}

/// Build the map scene: a `MapTree` root with nested map node instances
pub fn build_scene(tree: &MapNode) -> Document {
    let mut resources = DocumentBuilder::new();
    let scene = resources.add_ext_resource(MAP_NODE_SCENE, "PackedScene");

    let mut root = Node::new(ROOT_NAME, "Spatial");
    root.add_child(build_node(tree, Vector3::ZERO, scene, &mut resources));
    resources.into_scene(root)
}

/// Convert a map tree XML file into its JSON dump and scene
pub fn convert_map_tree(input: &Path, output: &Path, json: &Path) -> Result<()> {
    let tree = MapNode::load(input)?;
    crate::formats::write_json(json, &tree)?;
    crate::formats::write_document(output, &build_scene(&tree))?;

    tracing::info!("Exported map tree: {} nodes", tree.count());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAP_TREE: &str = r#"<MapTree>
  <Node name="NATURE_HUB" type="Hub" hasLesserGate="False" hasWarpGate="True">
    <WinConditions chests="1" lockedDoors="2" unlockedDoors="3" cubeShards="4" splitUp="5" secrets="6" others="7">
      <Scripts><Script>12</Script></Scripts>
    </WinConditions>
    <Connections>
      <Connection face="Right" branchOversize="0.5">
        <Node name="WELL_2" type="Node" hasLesserGate="True" hasWarpGate="False">
          <WinConditions chests="0" lockedDoors="0" unlockedDoors="0" cubeShards="0" splitUp="0" secrets="0" others="0"/>
          <Connections>
            <Connection face="Top" branchOversize="0">
              <Node name="TREE" type="Lesser" hasLesserGate="False" hasWarpGate="False">
                <WinConditions chests="0" lockedDoors="0" unlockedDoors="0" cubeShards="0" splitUp="0" secrets="0" others="0"/>
              </Node>
            </Connection>
          </Connections>
        </Node>
      </Connection>
      <Connection face="Back" branchOversize="0">
        <Node name="SEWER_START" type="Lesser" hasLesserGate="False" hasWarpGate="False">
          <WinConditions chests="0" lockedDoors="0" unlockedDoors="0" cubeShards="0" splitUp="0" secrets="0" others="0"/>
        </Node>
      </Connection>
    </Connections>
  </Node>
</MapTree>"#;

    #[test]
    fn test_parse() {
        let tree = MapNode::parse(MAP_TREE).unwrap();
        assert_eq!(tree.name, "NATURE_HUB");
        assert_eq!(tree.size, 3);
        assert!(tree.has_warp_gate);
        assert_eq!(tree.conditions.scripts, vec!["12"]);
        assert_eq!(tree.conditions.split_up, 5);
        assert_eq!(tree.count(), 4);
    }

    #[test]
    fn test_connection_ids_depth_first() {
        let tree = MapNode::parse(MAP_TREE).unwrap();
        assert_eq!(tree.connections[0].id, 0);
        assert_eq!(tree.connections[0].child.connections[0].id, 1);
        assert_eq!(tree.connections[1].id, 2);
    }

    #[test]
    fn test_ids_restart_per_parse() {
        let first = MapNode::parse(MAP_TREE).unwrap();
        let second = MapNode::parse(MAP_TREE).unwrap();
        assert_eq!(first.connections[1].id, second.connections[1].id);
    }

    #[test]
    fn test_unknown_type() {
        let text = MAP_TREE.replace("type=\"Hub\"", "type=\"Mega\"");
        assert!(MapNode::parse(&text).is_err());
    }

    #[test]
    fn test_scene() {
        let tree = MapNode::parse(MAP_TREE).unwrap();
        let text = build_scene(&tree).to_string();

        assert!(text.starts_with("[gd_scene load_steps=6 format=2]\n"));
        assert!(text.contains("[ext_resource path=\"res://assets/Other Textures/map_screens/nature_hub.png\" type=\"Texture\" id=2]"));
        assert!(text.contains("[node name=\"MapTree\" type=\"Spatial\"]"));
        assert!(text.contains("[node name=\"NATURE_HUB\" parent=\".\" instance=ExtResource( 1 )]"));
        assert!(text.contains("[node name=\"WELL_2\" parent=\"NATURE_HUB\" instance=ExtResource( 1 )]"));
        assert!(text.contains("[node name=\"TREE\" parent=\"NATURE_HUB/WELL_2\" instance=ExtResource( 1 )]"));
        // hub (size 3) -> 12 units, node (size 2) -> 8 units
        assert!(text.contains("transform = Transform( 1, 0, 0, 0, 1, 0, 0, 0, 1, 12, 0, 0 )"));
        assert!(text.contains("transform = Transform( 1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 8, 0 )"));
        assert!(text.contains("transform = Transform( 1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, -12 )"));
        assert!(text.contains("_conditions = {\n\"Big Cubes\": 4,\n\"Chests\": 1,"));
        assert!(text.contains("MapScreen = ExtResource( 2 )"));
        assert!(text.contains("HasWarpGate = true"));
    }
}
