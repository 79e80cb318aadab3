//! Trileset XML reading
//!
//! A trileset is the shared catalogue of trile definitions referenced by
//! levels. Levels only need the key -> (index, name) lookup; the preview
//! scene needs the per-trile collision and geometry metadata.

pub mod preview;

use anyhow::{Context, Result, bail};
use hashbrown::HashMap;
use roxmltree::Node;
use std::path::{Path, PathBuf};

use zeffyr_shared::Vector3;

use crate::xml;

const VERTEX_PATH: &str =
    "Geometry/ShaderInstancedIndexedPrimitives/Vertices/VertexPositionNormalTextureInstance";

/// Key -> position lookup over a trileset's entries
#[derive(Debug, Clone, Default)]
pub struct Trileset {
    pub name: String,
    /// (key, trile name) in document order
    pub entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl Trileset {
    pub fn parse(text: &str) -> Result<Self> {
        let doc = xml::parse(text)?;
        let root = doc.root_element();
        let name = root.attribute("name").unwrap_or_default().to_lowercase();

        let mut set = Self {
            name,
            ..Self::default()
        };
        for entry in trile_entries(root) {
            let key = xml::attr(entry, "key")?.to_string();
            let trile = xml::require(entry, "Trile")?;
            let name = xml::attr(trile, "name")?.to_string();
            set.insert(key, name);
        }
        Ok(set)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = xml::read_text(path)?;
        tracing::debug!("Reading trileset {:?}", path);
        Self::parse(&text).with_context(|| format!("In trileset {:?}", path))
    }

    /// `<dir>/<name>.xml`
    pub fn path_in(dir: &Path, name: &str) -> PathBuf {
        dir.join(format!("{}.xml", name))
    }

    /// Add an entry; a repeated key keeps its first position.
    pub fn insert(&mut self, key: String, name: String) {
        if !self.index.contains_key(&key) {
            self.index.insert(key.clone(), self.entries.len());
        }
        self.entries.push((key, name));
    }

    /// Position and name of the entry with `key`
    pub fn lookup(&self, key: &str) -> Option<(usize, &str)> {
        self.index
            .get(key)
            .map(|&i| (i, self.entries[i].1.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Full definition of one trile
#[derive(Debug, Clone, PartialEq)]
pub struct TrileInfo {
    pub key: String,
    pub name: String,
    pub immaterial: bool,
    pub surface: String,
    pub actor: String,
    pub size: Vector3,
    /// Collision type per face, in document order
    pub faces: Vec<String>,
    /// Whether the trile carries its own mesh
    pub geometry: bool,
}

/// Read every trile definition with its metadata
pub fn parse_trile_infos(text: &str) -> Result<(String, Vec<TrileInfo>)> {
    let doc = xml::parse(text)?;
    let root = doc.root_element();
    let set_name = xml::attr(root, "name")?.to_lowercase();

    let mut triles = Vec::new();
    for entry in trile_entries(root) {
        let trile = xml::require(entry, "Trile")?;
        let faces = xml::find_all(trile, "Faces/Face")
            .into_iter()
            .map(|face| xml::require(face, "CollisionType").map(|c| xml::text(c).trim().to_string()))
            .collect::<Result<Vec<_>>>()?;

        let info = TrileInfo {
            key: xml::attr(entry, "key")?.to_string(),
            name: xml::attr(trile, "name")?.to_string(),
            immaterial: xml::attr_bool(trile, "immaterial")?,
            surface: xml::attr(trile, "surfaceType")?.to_string(),
            actor: xml::attr(xml::require(trile, "ActorSettings")?, "type")?.to_string(),
            size: xml::vec3_at(trile, "Size/Vector3")?,
            faces,
            geometry: !xml::find_all(trile, VERTEX_PATH).is_empty(),
        };
        if info.faces.len() < 4 {
            bail!("Trile '{}' has {} faces, expected 4", info.name, info.faces.len());
        }
        triles.push(info);
    }

    Ok((set_name, triles))
}

fn trile_entries<'a, 'input>(root: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    root.descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "TrileEntry")
}
