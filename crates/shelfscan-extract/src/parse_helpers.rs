//! Small text and JSON helpers shared by the extractors and the mapper.

use serde_json::Value;

/// Returns the shortest prefix of `s` forming a complete JSON object or
/// array, or `None` if `s` does not start with `{`/`[` or is unterminated.
///
/// Tracks bracket depth while respecting string literals and escapes. Only
/// the closer matching the opening bracket at depth 0 ends the scan, so
/// `[42}` is never accepted.
pub(crate) fn extract_balanced_json(s: &str) -> Option<&str> {
    let closer = match s.chars().next()? {
        '{' => '}',
        '[' => ']',
        _ => return None,
    };
    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut escape = false;
    for (i, c) in s.char_indices() {
        if escape {
            escape = false;
            continue;
        }
        if in_string {
            match c {
                '\\' => escape = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' | '{' => depth += 1,
            ']' | '}' => {
                depth -= 1;
                if depth == 0 {
                    return (c == closer).then(|| &s[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parses a human-formatted price such as `"$1,299.99"` by keeping only
/// digits and decimal points. Returns `None` when nothing numeric remains.
#[must_use]
pub fn parse_price_text(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Reads a JSON number or numeric string as `f64`.
pub(crate) fn value_as_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Reads a JSON string or number as a non-empty identifier string.
pub(crate) fn value_as_id(value: &Value) -> Option<String> {
    let id = match value {
        Value::String(s) => Some(s.trim().to_owned()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    };
    id.filter(|s| !s.is_empty())
}

/// Generates a URL-safe slug: lowercase ASCII alphanumerics joined by `-`.
#[must_use]
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}
