//! Output file formats
//!
//! - [`tscn`] - Scene / resource text documents
//! - [`po`] - Gettext catalogs and templates

pub mod po;
pub mod tscn;

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tscn::Document;

/// Write a scene or resource document to disk
pub fn write_document(path: &Path, document: &Document) -> Result<()> {
    write_text(path, &document.to_string())
}

/// Write a UTF-8 text file
pub fn write_text(path: &Path, text: &str) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create output: {:?}", path))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(text.as_bytes())
        .and_then(|_| writer.flush())
        .with_context(|| format!("Failed to write output: {:?}", path))?;
    tracing::info!("Wrote {:?}", path);
    Ok(())
}

/// Write pretty JSON with 4-space indentation
pub fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value
        .serialize(&mut serializer)
        .with_context(|| format!("Failed to serialize {:?}", path))?;
    let text = String::from_utf8(out).context("JSON output is not UTF-8")?;
    write_text(path, &text)
}
