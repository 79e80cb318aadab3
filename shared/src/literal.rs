//! Attribute literal parsing
//!
//! Legacy XML stores booleans as `True`/`False` and small tuples as
//! `(1, 2)`. Only those exact shapes are accepted; nothing is ever evaluated.

use crate::error::LiteralError;

/// Parse `True` / `False` (lowercase accepted too).
pub fn parse_bool(text: &str) -> Result<bool, LiteralError> {
    match text.trim() {
        "True" | "true" => Ok(true),
        "False" | "false" => Ok(false),
        other => Err(LiteralError::Bool(other.to_string())),
    }
}

/// Parse a parenthesised, comma separated list of decimal numbers.
///
/// Accepts `(1, 2)`, `(1.5,)` and `()`. A trailing comma is allowed.
pub fn parse_tuple(text: &str) -> Result<Vec<f64>, LiteralError> {
    let err = || LiteralError::Tuple(text.to_string());

    let inner = text
        .trim()
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(err)?
        .trim();

    if inner.is_empty() {
        return Ok(Vec::new());
    }

    let inner = inner.strip_suffix(',').unwrap_or(inner);
    inner
        .split(',')
        .map(|item| parse_number(item.trim()).ok_or_else(err))
        .collect()
}

fn parse_number(item: &str) -> Option<f64> {
    let allowed = |c: char| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E');
    if item.is_empty() || !item.chars().all(allowed) || !item.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    item.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool() {
        assert_eq!(parse_bool("True"), Ok(true));
        assert_eq!(parse_bool("False"), Ok(false));
        assert_eq!(parse_bool(" true "), Ok(true));
        assert!(parse_bool("1").is_err());
        assert!(parse_bool("__import__('os')").is_err());
        assert!(parse_bool("").is_err());
    }

    #[test]
    fn test_tuple() {
        assert_eq!(parse_tuple("(1,2)"), Ok(vec![1.0, 2.0]));
        assert_eq!(parse_tuple(" ( -1.5 , 2e3 ) "), Ok(vec![-1.5, 2000.0]));
        assert_eq!(parse_tuple("(4,)"), Ok(vec![4.0]));
        assert_eq!(parse_tuple("()"), Ok(vec![]));
    }

    #[test]
    fn test_tuple_rejects_expressions() {
        assert!(parse_tuple("1, 2").is_err());
        assert!(parse_tuple("(1, x)").is_err());
        assert!(parse_tuple("(1,,2)").is_err());
        assert!(parse_tuple("(inf, 1)").is_err());
        assert!(parse_tuple("(open('f'),)").is_err());
        assert!(parse_tuple("(.)").is_err());
    }
}
