//! Gettext catalog writing (`.po` / `.pot`)

use std::fmt::Write;

/// Escape text for a quoted PO string
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

fn push_entry(out: &mut String, id: &str, message: &str) {
    let _ = writeln!(out, "msgid \"{}\"", escape(id));
    let _ = writeln!(out, "msgstr \"{}\"", escape(message));
    out.push('\n');
}

/// Translated catalog: header block then one entry per message
pub fn catalog<'a>(header: &str, messages: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    let mut out = String::new();
    if !header.is_empty() {
        out.push_str(header.trim_end_matches('\n'));
        out.push_str("\n\n");
    }
    for (id, message) in messages {
        push_entry(&mut out, id, message);
    }
    out
}

/// Template: empty header entry then every id with an empty translation
pub fn template<'a>(ids: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = String::new();
    push_entry(&mut out, "", "");
    for id in ids {
        push_entry(&mut out, id, "");
    }
    out
}

/// Header block mentioning `Language: <language>` among blank-line separated blocks
pub fn find_header<'a>(headers: &'a str, language: &str) -> Option<&'a str> {
    let needle = format!("Language: {}", language);
    blocks(headers)
        .into_iter()
        .find(|block| block.lines().any(|line| language_matches(line, &needle)))
}

/// Runs of non-blank lines; `\r\n` and whitespace-only lines separate blocks too
fn blocks(text: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut current: Option<(usize, usize)> = None;
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let content = line.trim_end_matches(['\r', '\n']);
        if content.trim().is_empty() {
            if let Some((start, end)) = current.take() {
                blocks.push(&text[start..end]);
            }
        } else {
            let start = current.map_or(offset, |(start, _)| start);
            current = Some((start, offset + content.len()));
        }
        offset += line.len();
    }
    if let Some((start, end)) = current {
        blocks.push(&text[start..end]);
    }
    blocks
}

/// `Language: en` must not match `Language: en_GB`
fn language_matches(line: &str, needle: &str) -> bool {
    line.split(needle)
        .nth(1)
        .is_some_and(|rest| !rest.starts_with(|c: char| c.is_alphanumeric() || c == '_' || c == '-'))
}
