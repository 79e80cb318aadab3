//! XML access helpers
//!
//! Thin layer over `roxmltree` with slash-separated child paths
//! (`"Position/Vector3"`) and typed attribute readers that fail with context
//! instead of silently defaulting.

use anyhow::{Context, Result, anyhow};
use roxmltree::Node;
use std::path::Path;

use zeffyr_shared::{Quaternion, Vector3, parse_bool};

/// Read a file into a string for `roxmltree::Document::parse`.
pub fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read XML: {:?}", path))
}

/// Parse XML text
pub fn parse(text: &str) -> Result<roxmltree::Document<'_>> {
    roxmltree::Document::parse(text).context("Malformed XML")
}

/// Element children with the given tag name
pub fn children<'a, 'input>(node: Node<'a, 'input>, tag: &'a str) -> impl Iterator<Item = Node<'a, 'input>> + 'a
where
    'input: 'a,
{
    node.children()
        .filter(move |c| c.is_element() && c.tag_name().name() == tag)
}

/// First element matching a slash-separated child path
pub fn find<'a, 'input>(node: Node<'a, 'input>, path: &str) -> Option<Node<'a, 'input>> {
    let mut current = node;
    for tag in path.split('/').filter(|s| !s.is_empty()) {
        current = current
            .children()
            .find(|c| c.is_element() && c.tag_name().name() == tag)?;
    }
    Some(current)
}

/// Every element matching a slash-separated child path, in document order
pub fn find_all<'a, 'input>(node: Node<'a, 'input>, path: &str) -> Vec<Node<'a, 'input>> {
    let mut current = vec![node];
    for tag in path.split('/').filter(|s| !s.is_empty()) {
        current = current
            .into_iter()
            .flat_map(|n| n.children())
            .filter(|c| c.is_element() && c.tag_name().name() == tag)
            .collect();
    }
    current
}

/// Like [`find`] but missing elements are an error
pub fn require<'a, 'input>(node: Node<'a, 'input>, path: &str) -> Result<Node<'a, 'input>> {
    find(node, path).ok_or_else(|| {
        anyhow!(
            "Missing <{}> under <{}> (line {})",
            path,
            node.tag_name().name(),
            line_of(node)
        )
    })
}

/// Required attribute text
pub fn attr<'a>(node: Node<'a, '_>, name: &str) -> Result<&'a str> {
    node.attribute(name).ok_or_else(|| {
        anyhow!(
            "Missing attribute '{}' on <{}> (line {})",
            name,
            node.tag_name().name(),
            line_of(node)
        )
    })
}

pub fn attr_f64(node: Node<'_, '_>, name: &str) -> Result<f64> {
    let text = attr(node, name)?;
    text.trim()
        .parse()
        .with_context(|| format!("Attribute '{}' is not a number: {:?}", name, text))
}

pub fn attr_i64(node: Node<'_, '_>, name: &str) -> Result<i64> {
    let text = attr(node, name)?;
    text.trim()
        .parse()
        .with_context(|| format!("Attribute '{}' is not an integer: {:?}", name, text))
}

pub fn attr_u32(node: Node<'_, '_>, name: &str) -> Result<u32> {
    let text = attr(node, name)?;
    text.trim()
        .parse()
        .with_context(|| format!("Attribute '{}' is not an unsigned integer: {:?}", name, text))
}

pub fn attr_bool(node: Node<'_, '_>, name: &str) -> Result<bool> {
    let text = attr(node, name)?;
    parse_bool(text).with_context(|| format!("Attribute '{}' on <{}>", name, node.tag_name().name()))
}

/// `<Vector3 x= y= z=/>`
pub fn vec3(node: Node<'_, '_>) -> Result<Vector3> {
    Ok(Vector3::new(
        attr_f64(node, "x")?,
        attr_f64(node, "y")?,
        attr_f64(node, "z")?,
    ))
}

/// `<Quaternion x= y= z= w=/>`
pub fn quat(node: Node<'_, '_>) -> Result<Quaternion> {
    Ok(Quaternion::from_xyzw(
        attr_f64(node, "x")?,
        attr_f64(node, "y")?,
        attr_f64(node, "z")?,
        attr_f64(node, "w")?,
    ))
}

pub fn vec3_at(node: Node<'_, '_>, path: &str) -> Result<Vector3> {
    vec3(require(node, path)?)
}

pub fn quat_at(node: Node<'_, '_>, path: &str) -> Result<Quaternion> {
    quat(require(node, path)?)
}

/// Element text, empty when the element has none
pub fn text<'a>(node: Node<'a, '_>) -> &'a str {
    node.text().unwrap_or("")
}

fn line_of(node: Node<'_, '_>) -> u32 {
    node.document().text_pos_at(node.range().start).row
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<Root name="r">
    <Items>
        <Item id="1"><Position><Vector3 x="1" y="2.5" z="-3"/></Position></Item>
        <Item id="2" flag="True"/>
    </Items>
    <Items>
        <Item id="3"/>
    </Items>
    <Rotation><Quaternion x="0" y="1" z="0" w="0"/></Rotation>
</Root>"#;

    #[test]
    fn test_paths() {
        let doc = parse(SAMPLE).unwrap();
        let root = doc.root_element();

        let ids: Vec<_> = find_all(root, "Items/Item")
            .into_iter()
            .map(|n| attr_i64(n, "id").unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);

        let first = find(root, "Items/Item").unwrap();
        assert_eq!(vec3_at(first, "Position/Vector3").unwrap(), Vector3::new(1.0, 2.5, -3.0));
        assert_eq!(quat_at(root, "Rotation/Quaternion").unwrap(), Quaternion::from_xyzw(0.0, 1.0, 0.0, 0.0));
        assert_eq!(children(root, "Items").count(), 2);
    }

    #[test]
    fn test_errors_carry_location() {
        let doc = parse(SAMPLE).unwrap();
        let root = doc.root_element();

        let err = require(root, "Missing/Thing").unwrap_err();
        assert!(err.to_string().contains("Missing/Thing"));

        let item = find_all(root, "Items/Item")[1];
        assert!(attr_bool(item, "flag").unwrap());
        let err = attr_f64(item, "nope").unwrap_err();
        assert!(err.to_string().contains("'nope'"));
        assert!(attr_bool(root, "name").is_err());
    }
}
