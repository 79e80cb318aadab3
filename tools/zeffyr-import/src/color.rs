//! Color strings to normalized components

use anyhow::{Result, bail};

const NAMED: &[(&str, [u8; 3])] = &[
    ("black", [0, 0, 0]),
    ("white", [255, 255, 255]),
    ("red", [255, 0, 0]),
    ("lime", [0, 255, 0]),
    ("green", [0, 128, 0]),
    ("blue", [0, 0, 255]),
    ("yellow", [255, 255, 0]),
    ("cyan", [0, 255, 255]),
    ("magenta", [255, 0, 255]),
    ("gray", [128, 128, 128]),
    ("grey", [128, 128, 128]),
    ("silver", [192, 192, 192]),
];

/// Parse `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`, `rgb(r, g, b)`,
/// `rgba(r, g, b, a)` or a basic color name into 8-bit channels.
///
/// Alpha is only present when the input spells it out.
pub fn parse_color8(text: &str) -> Result<Vec<u8>> {
    let text = text.trim();

    if let Some(hex) = text.strip_prefix('#') {
        return parse_hex(hex).ok_or_else(|| anyhow::anyhow!("Invalid hex color {:?}", text));
    }

    let lower = text.to_ascii_lowercase();
    if let Some(args) = lower
        .strip_prefix("rgba(")
        .or_else(|| lower.strip_prefix("rgb("))
        .and_then(|s| s.strip_suffix(')'))
    {
        let channels: Option<Vec<u8>> = args.split(',').map(|c| c.trim().parse().ok()).collect();
        match channels {
            Some(c) if c.len() == 3 || c.len() == 4 => return Ok(c),
            _ => bail!("Invalid rgb color {:?}", text),
        }
    }

    match NAMED.iter().find(|(name, _)| *name == lower) {
        Some((_, rgb)) => Ok(rgb.to_vec()),
        None => bail!("Unknown color {:?}", text),
    }
}

/// Channels scaled to 0..1
pub fn parse_color(text: &str) -> Result<Vec<f64>> {
    Ok(parse_color8(text)?
        .into_iter()
        .map(|c| c as f64 / 255.0)
        .collect())
}

fn parse_hex(hex: &str) -> Option<Vec<u8>> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        3 | 4 => hex
            .chars()
            .map(|c| c.to_digit(16).map(|d| (d * 17) as u8))
            .collect(),
        6 | 8 => (0..hex.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).ok())
            .collect(),
        _ => None,
    }
}
