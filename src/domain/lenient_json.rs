//! Lenient structured decode for free-form model output.
//!
//! Models wrap JSON in prose, markdown fences, or both. Every caller that
//! expects structured output goes through [`decode_lenient`], which tries in
//! order:
//!
//! 1. the body of a fenced code block (```` ```json ```` or a bare fence)
//! 2. the first balanced `{...}` or `[...]` span (string/escape aware)
//! 3. the whole trimmed text
//!
//! and yields `None` when nothing parses. Callers treat `None` as "absent"
//! and fall back to a conservative default.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Decodes the first JSON value found in `text`.
pub fn decode_lenient(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(body) = fenced_block(trimmed) {
        if let Some(value) = parse(body) {
            return Some(value);
        }
    }

    if let Some(span) = bracket_span(trimmed) {
        if let Some(value) = parse(span) {
            return Some(value);
        }
    }

    parse(trimmed)
}

/// Decodes the first JSON object found in `text`.
pub fn decode_object(text: &str) -> Option<Map<String, Value>> {
    match decode_lenient(text)? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Decodes `text` leniently and deserializes it into `T`.
pub fn decode_as<T: DeserializeOwned>(text: &str) -> Option<T> {
    decode_lenient(text).and_then(|v| serde_json::from_value(v).ok())
}

fn parse(candidate: &str) -> Option<Value> {
    serde_json::from_str(candidate.trim()).ok()
}

fn fenced_block(s: &str) -> Option<&str> {
    let open = s.find("```")?;
    let after_ticks = &s[open + 3..];
    // Skip an optional language tag on the opening line.
    let body_start = after_ticks.find('\n').map(|i| i + 1)?;
    let body = &after_ticks[body_start..];
    let close = body.find("```")?;
    Some(body[..close].trim())
}

fn bracket_span(s: &str) -> Option<&str> {
    let (start, open, close) = match (s.find('{'), s.find('[')) {
        (Some(o), Some(a)) if a < o => (a, '[', ']'),
        (Some(o), _) => (o, '{', '}'),
        (None, Some(a)) => (a, '[', ']'),
        (None, None) => return None,
    };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (offset, c) in s[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            _ if in_string => {}
            c if c == open => depth += 1,
            c if c == close => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&s[start..start + offset + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}
