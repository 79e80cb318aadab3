//! Scene / resource text format (`.tscn` / `.tres`, format=2)
//!
//! A document is an ordered list of sections. Section 0 is the file header
//! (`gd_scene` or `gd_resource`), followed by `ext_resource`, `sub_resource`
//! and `node` / `resource` sections. Each section has header attributes and
//! ordered `key = value` properties.

use hashbrown::HashMap;
use std::fmt;

use zeffyr_shared::math::TRANSFORM_PRECISION;
use zeffyr_shared::{Transform, Vector3};

/// File format version written in the header
pub const FORMAT_VERSION: i64 = 2;

pub const SCENE_TAG: &str = "gd_scene";
pub const RESOURCE_TAG: &str = "gd_resource";
pub const EXT_RESOURCE_TAG: &str = "ext_resource";
pub const SUB_RESOURCE_TAG: &str = "sub_resource";
pub const NODE_TAG: &str = "node";
pub const RESOURCE_BODY_TAG: &str = "resource";

/// Failure to read a scene/resource text file
#[derive(Debug, thiserror::Error)]
pub enum TscnError {
    #[error("line {line}: property outside of any section")]
    OrphanProperty { line: usize },

    #[error("line {line}: malformed section header {text:?}")]
    BadHeader { line: usize, text: String },

    #[error("line {line}: unterminated string")]
    UnterminatedString { line: usize },

    #[error("document has no header section")]
    MissingHeader,
}

/// Property or header attribute value
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Constructor call, e.g. `Vector3( 1, 2, 3 )`
    Object(String, Vec<Value>),
    Array(Vec<Value>),
    /// Dictionary, written one entry per line in insertion order
    Dict(Vec<(String, Value)>),
    ExtResource(u32),
    SubResource(u32),
    NodePath(String),
    /// Verbatim text (values read back from disk)
    Raw(String),
}

impl Value {
    pub fn object(name: &str, args: impl IntoIterator<Item = Value>) -> Self {
        Self::Object(name.to_string(), args.into_iter().collect())
    }

    pub fn vector3(v: Vector3) -> Self {
        Self::object("Vector3", [v.x, v.y, v.z].map(Value::Float))
    }

    /// Transform rounded for text output
    pub fn transform(t: &Transform) -> Self {
        Self::object("Transform", t.rounded(TRANSFORM_PRECISION).map(Value::Float))
    }

    pub fn color(components: &[f64]) -> Self {
        Self::object("Color", components.iter().copied().map(Value::Float))
    }

    pub fn rect2(x: i64, y: i64, w: i64, h: i64) -> Self {
        Self::object("Rect2", [x, y, w, h].map(Value::Int))
    }

    pub fn int_array(values: &[u32]) -> Self {
        Self::object("PoolIntArray", values.iter().map(|&v| Value::Int(v as i64)))
    }

    pub fn real_array(values: &[f64]) -> Self {
        Self::object("PoolRealArray", values.iter().copied().map(Value::Float))
    }

    pub fn string_array<S: AsRef<str>>(values: &[S]) -> Self {
        Self::object(
            "PoolStringArray",
            values.iter().map(|s| Value::Str(s.as_ref().to_string())),
        )
    }

    pub fn dict<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Self::Dict(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Shortest text that reads back as the same double; `-0` is written as `0`.
pub fn format_float(value: f64) -> String {
    if value == 0.0 {
        "0".to_string()
    } else {
        format!("{}", value)
    }
}

/// Quote a string, escaping backslashes and double quotes.
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => f.write_str(&format_float(*v)),
            Value::Str(s) => f.write_str(&quote(s)),
            Value::Object(name, args) => {
                write!(f, "{}( ", name)?;
                write_list(f, args)?;
                f.write_str(" )")
            }
            Value::Array(items) => {
                f.write_str("[ ")?;
                write_list(f, items)?;
                f.write_str(" ]")
            }
            Value::Dict(entries) => {
                f.write_str("{\n")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",\n")?;
                    }
                    write!(f, "{}: {}", quote(key), value)?;
                }
                f.write_str("\n}")
            }
            Value::ExtResource(id) => write!(f, "ExtResource( {} )", id),
            Value::SubResource(id) => write!(f, "SubResource( {} )", id),
            Value::NodePath(path) => write!(f, "NodePath({})", quote(path)),
            Value::Raw(text) => f.write_str(text),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Vector3> for Value {
    fn from(v: Vector3) -> Self {
        Value::vector3(v)
    }
}

impl From<&Transform> for Value {
    fn from(t: &Transform) -> Self {
        Value::transform(t)
    }
}

/// One `[tag attr=value ...]` block and its properties
#[derive(Clone, Debug, PartialEq)]
pub struct Section {
    pub tag: String,
    pub attrs: Vec<(String, Value)>,
    pub props: Vec<(String, Value)>,
}

impl Section {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attrs: Vec::new(),
            props: Vec::new(),
        }
    }

    pub fn with_attr(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set_attr(key, value);
        self
    }

    pub fn with_prop(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set_prop(key, value);
        self
    }

    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.attrs.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn prop(&self, key: &str) -> Option<&Value> {
        self.props.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Replace an attribute in place, or append it
    pub fn set_attr(&mut self, key: &str, value: impl Into<Value>) {
        set_entry(&mut self.attrs, key, value.into());
    }

    /// Replace a property in place, or append it
    pub fn set_prop(&mut self, key: &str, value: impl Into<Value>) {
        set_entry(&mut self.props, key, value.into());
    }

    /// Integer `id` attribute of a resource section
    pub fn id(&self) -> Option<u32> {
        match self.attr("id") {
            Some(Value::Int(id)) => u32::try_from(*id).ok(),
            _ => None,
        }
    }
}

fn set_entry(entries: &mut Vec<(String, Value)>, key: &str, value: Value) {
    match entries.iter_mut().find(|(k, _)| k == key) {
        Some(entry) => entry.1 = value,
        None => entries.push((key.to_string(), value)),
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}", self.tag)?;
        for (key, value) in &self.attrs {
            write!(f, " {}={}", key, value)?;
        }
        writeln!(f, "]")?;
        for (key, value) in &self.props {
            writeln!(f, "{} = {}", key, value)?;
        }
        Ok(())
    }
}

/// Whole scene or resource file
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub sections: Vec<Section>,
}

impl Document {
    pub fn header(&self) -> Option<&Section> {
        self.sections.first()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn sections_tagged<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Section> + 'a {
        self.sections.iter().filter(move |s| s.tag == tag)
    }

    pub fn find_section(&self, tag: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.tag == tag)
    }

    pub fn find_section_mut(&mut self, tag: &str) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.tag == tag)
    }

    /// Remove and return the section at `index`
    pub fn remove_at(&mut self, index: usize) -> Section {
        self.sections.remove(index)
    }

    /// Append an `ext_resource` after the existing ones and return its id.
    pub fn add_ext_resource(&mut self, path: &str, kind: &str) -> u32 {
        let id = self
            .sections_tagged(EXT_RESOURCE_TAG)
            .filter_map(Section::id)
            .max()
            .unwrap_or(0)
            + 1;

        let insert_at = self
            .sections
            .iter()
            .rposition(|s| s.tag == EXT_RESOURCE_TAG)
            .map(|i| i + 1)
            .unwrap_or(1.min(self.sections.len()));

        self.sections.insert(insert_at, ext_resource_section(path, kind, id));
        id
    }

    /// Recompute the header's `load_steps` from the resource count.
    pub fn update_load_steps(&mut self) {
        let resources = self
            .sections
            .iter()
            .filter(|s| s.tag == EXT_RESOURCE_TAG || s.tag == SUB_RESOURCE_TAG)
            .count();

        let Some(header) = self.sections.first_mut() else {
            return;
        };

        let mut attrs: Vec<(String, Value)> = header
            .attrs
            .drain(..)
            .filter(|(k, _)| k != "load_steps")
            .collect();
        if resources > 0 {
            // load_steps goes right before format
            let at = attrs.iter().position(|(k, _)| k == "format").unwrap_or(attrs.len());
            attrs.insert(at, ("load_steps".to_string(), Value::Int(resources as i64 + 1)));
        }
        header.attrs = attrs;
    }

    /// Parse scene/resource text. Property values are kept verbatim.
    pub fn parse(text: &str) -> Result<Self, TscnError> {
        let mut sections: Vec<Section> = Vec::new();
        // (key, accumulated text, open bracket depth)
        let mut pending: Option<(String, String, i32)> = None;

        for (index, line) in text.lines().enumerate() {
            let line_no = index + 1;

            if let Some((_, value, depth)) = pending.as_mut() {
                value.push('\n');
                value.push_str(line);
                *depth += bracket_delta(line);
                if *depth <= 0 {
                    flush_property(&mut sections, &mut pending, line_no)?;
                }
                continue;
            }

            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with(';') {
                continue;
            }

            if trimmed.starts_with('[') && trimmed.ends_with(']') {
                sections.push(parse_header(trimmed, line_no)?);
                continue;
            }

            let Some((key, value)) = trimmed.split_once(" = ").or_else(|| trimmed.split_once('=')) else {
                return Err(TscnError::BadHeader {
                    line: line_no,
                    text: trimmed.to_string(),
                });
            };
            let value = value.trim_start();
            let depth = bracket_delta(value);
            pending = Some((key.trim().to_string(), value.to_string(), depth));
            if depth <= 0 {
                flush_property(&mut sections, &mut pending, line_no)?;
            }
        }

        if pending.is_some() {
            let line = text.lines().count();
            flush_property(&mut sections, &mut pending, line)?;
        }

        if sections.is_empty() {
            return Err(TscnError::MissingHeader);
        }

        Ok(Self { sections })
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, section) in self.sections.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", section)?;
        }
        Ok(())
    }
}

fn flush_property(
    sections: &mut [Section],
    pending: &mut Option<(String, String, i32)>,
    line: usize,
) -> Result<(), TscnError> {
    if let Some((key, value, _)) = pending.take() {
        let section = sections
            .last_mut()
            .ok_or(TscnError::OrphanProperty { line })?;
        section.props.push((key, Value::Raw(value)));
    }
    Ok(())
}

/// Net change of `([{` nesting, ignoring quoted text
fn bracket_delta(text: &str) -> i32 {
    let mut depth = 0;
    let mut in_string = false;
    let mut escaped = false;
    for c in text.chars() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            _ => {}
        }
    }
    depth
}

fn parse_header(text: &str, line: usize) -> Result<Section, TscnError> {
    let bad = || TscnError::BadHeader {
        line,
        text: text.to_string(),
    };
    let inner = &text[1..text.len() - 1];
    let inner = inner.trim();
    let (tag, mut rest) = inner.split_once(' ').unwrap_or((inner, ""));
    if tag.is_empty() {
        return Err(bad());
    }

    let mut section = Section::new(tag);
    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }
        let (key, after) = rest.split_once('=').ok_or_else(bad)?;
        let after = after.trim_start();

        let (value, remaining) = if let Some(body) = after.strip_prefix('"') {
            let end = closing_quote(body).ok_or(TscnError::UnterminatedString { line })?;
            (Value::Str(unescape(&body[..end])), &body[end + 1..])
        } else {
            let end = bare_token_end(after);
            let token = &after[..end];
            let value = token
                .parse::<i64>()
                .map(Value::Int)
                .unwrap_or_else(|_| Value::Raw(token.to_string()));
            (value, &after[end..])
        };

        section.attrs.push((key.trim().to_string(), value));
        rest = remaining;
    }
    Ok(section)
}

fn closing_quote(body: &str) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in body.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => return Some(i),
            _ => {}
        }
    }
    None
}

/// End of an unquoted attribute value: first space at bracket depth zero
fn bare_token_end(text: &str) -> usize {
    let mut depth = 0;
    for (i, c) in text.char_indices() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            ' ' if depth <= 0 => return i,
            _ => {}
        }
    }
    text.len()
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn ext_resource_section(path: &str, kind: &str, id: u32) -> Section {
    Section::new(EXT_RESOURCE_TAG)
        .with_attr("path", path)
        .with_attr("type", kind)
        .with_attr("id", id)
}

/// Scene tree node
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub name: String,
    pub kind: Option<String>,
    /// `ExtResource` id of an instanced scene
    pub instance: Option<u32>,
    pub props: Vec<(String, Value)>,
    pub children: Vec<Node>,
}

impl Node {
    /// Plain node of a built-in type
    pub fn new(name: impl Into<String>, kind: &str) -> Self {
        Self {
            name: name.into(),
            kind: Some(kind.to_string()),
            instance: None,
            props: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Instance of an external scene
    pub fn instance(name: impl Into<String>, ext_id: u32) -> Self {
        Self {
            name: name.into(),
            kind: None,
            instance: Some(ext_id),
            props: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        set_entry(&mut self.props, key, value.into());
        self
    }

    pub fn prop(&self, key: &str) -> Option<&Value> {
        self.props.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn add_child(&mut self, child: Node) {
        self.children.push(child);
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    fn flatten_into(self, parent: Option<&str>, out: &mut Vec<Section>) {
        let mut section = Section::new(NODE_TAG).with_attr("name", self.name.as_str());
        if let Some(kind) = &self.kind {
            section.set_attr("type", kind.as_str());
        }
        if let Some(parent) = parent {
            section.set_attr("parent", parent);
        }
        if let Some(id) = self.instance {
            section.set_attr("instance", Value::ExtResource(id));
        }
        section.props = self.props;
        out.push(section);

        let child_parent = match parent {
            None => ".".to_string(),
            Some(".") => self.name.clone(),
            Some(path) => format!("{}/{}", path, self.name),
        };
        for child in self.children {
            child.flatten_into(Some(&child_parent), out);
        }
    }
}

/// Collects resources while a scene or resource file is being built.
#[derive(Debug, Default)]
pub struct DocumentBuilder {
    ext: Vec<Section>,
    ext_ids: HashMap<(String, String), u32>,
    sub: Vec<Section>,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reference an external resource; the same path and type share one id.
    pub fn add_ext_resource(&mut self, path: &str, kind: &str) -> u32 {
        let key = (path.to_string(), kind.to_string());
        if let Some(&id) = self.ext_ids.get(&key) {
            return id;
        }
        let id = self.ext.len() as u32 + 1;
        self.ext.push(ext_resource_section(path, kind, id));
        self.ext_ids.insert(key, id);
        id
    }

    /// Embed a resource and return its id
    pub fn add_sub_resource(&mut self, kind: &str, props: Vec<(String, Value)>) -> u32 {
        let id = self.sub.len() as u32 + 1;
        let mut section = Section::new(SUB_RESOURCE_TAG)
            .with_attr("type", kind)
            .with_attr("id", id);
        section.props = props;
        self.sub.push(section);
        id
    }

    /// Finish as a `gd_scene` rooted at `root`
    pub fn into_scene(self, root: Node) -> Document {
        let header = Section::new(SCENE_TAG).with_attr("format", FORMAT_VERSION);
        let mut sections = self.into_sections(header);
        root.flatten_into(None, &mut sections);
        finish(sections)
    }

    /// Finish as a `gd_resource` of `kind` with the given `[resource]` properties
    pub fn into_resource(self, kind: &str, props: Vec<(String, Value)>) -> Document {
        let header = Section::new(RESOURCE_TAG)
            .with_attr("type", kind)
            .with_attr("format", FORMAT_VERSION);
        let mut sections = self.into_sections(header);
        let mut body = Section::new(RESOURCE_BODY_TAG);
        body.props = props;
        sections.push(body);
        finish(sections)
    }

    fn into_sections(self, header: Section) -> Vec<Section> {
        let mut sections = Vec::with_capacity(1 + self.ext.len() + self.sub.len());
        sections.push(header);
        sections.extend(self.ext);
        sections.extend(self.sub);
        sections
    }
}

fn finish(sections: Vec<Section>) -> Document {
    let mut document = Document { sections };
    document.update_load_steps();
    document
}
