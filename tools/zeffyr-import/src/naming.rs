//! Node naming helpers

use hashbrown::{HashMap, HashSet};

/// Hands out sibling-unique node names.
///
/// Names that occur once are kept as-is; names that occur several times get a
/// running 1-based suffix (`Owl1`, `Owl2`, ...), skipping any suffixed name
/// that is already taken.
#[derive(Debug, Default)]
pub struct UniqueNames {
    totals: HashMap<String, usize>,
    issued: HashMap<String, usize>,
    taken: HashSet<String>,
}

impl UniqueNames {
    pub fn new<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut totals: HashMap<String, usize> = HashMap::new();
        for name in names {
            *totals.entry(name.to_string()).or_default() += 1;
        }
        let taken = totals.keys().cloned().collect();
        Self {
            totals,
            issued: HashMap::new(),
            taken,
        }
    }

    pub fn next(&mut self, name: &str) -> String {
        if self.totals.get(name).copied().unwrap_or(0) <= 1 {
            return name.to_string();
        }
        let n = self.issued.entry(name.to_string()).or_default();
        loop {
            *n += 1;
            let candidate = format!("{}{}", name, n);
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

/// Uppercase the first letter of every word, lowercase the rest.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_letter = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_letter = true;
        } else {
            out.push(c);
            prev_letter = false;
        }
    }
    out
}

/// Uppercase the first character, lowercase the rest.
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
