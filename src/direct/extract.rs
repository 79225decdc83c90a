//! Defensive extraction from undocumented response bodies.
//!
//! The remote schema is observed, not specified: the same logical field has
//! been seen at several different locations across captures. Extraction
//! therefore walks a fixed list of known locations in preference order and,
//! for image URLs, falls back to scanning string content for a URL-like
//! pattern. Best-effort: none of these shapes is authoritative.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?:https?://|blob:)[^\s"'<>]+"#).expect("static regex"));

/// Walk a dot-notation path with optional `[idx]` segments.
fn dot_path<'a>(body: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = body;
    for part in path.split('.') {
        if let Some(bracket) = part.find('[') {
            let key = &part[..bracket];
            let idx: usize = part[bracket + 1..].trim_end_matches(']').parse().ok()?;
            if !key.is_empty() {
                current = current.as_object()?.get(key)?;
            }
            current = current.as_array()?.get(idx)?;
        } else {
            current = current.as_object()?.get(part)?;
        }
    }
    Some(current)
}

/// Known locations of the assistant text, most-structured first.
const TEXT_LOCATIONS: &[&str] = &[
    "data.data.choices[0].message.content",
    "data.choices[0].message.content",
    "choices[0].message.content",
    "response",
];

/// Normalize a chat body into a single flat text field.
///
/// Prefers the nested structured path over the flat `response` field.
pub fn response_text(body: &Value) -> Option<String> {
    for path in TEXT_LOCATIONS {
        if let Some(text) = dot_path(body, path).and_then(Value::as_str) {
            return Some(text.to_string());
        }
    }
    None
}

/// Locations where an image reference has been observed.
const IMAGE_LOCATIONS: &[&str] = &[
    "choices[0].message.content.image_url",
    "choices[0].message.content",
    "data.data.choices[0].message.content",
    "data.choices[0].message.content",
    "image_url",
];

/// Extract a concrete image URL from an image-generation body.
///
/// A location that holds a string qualifies only if the string contains a
/// URL; plain prose does not. Returns `None` when no reference is
/// discoverable, which callers must treat as a failed generation.
pub fn image_url(body: &Value) -> Option<String> {
    for path in IMAGE_LOCATIONS {
        match dot_path(body, path) {
            Some(Value::String(s)) => {
                if let Some(m) = URL_PATTERN.find(s) {
                    return Some(m.as_str().to_string());
                }
            }
            Some(Value::Object(obj)) => {
                if let Some(url) = obj.get("image_url").and_then(Value::as_str) {
                    return Some(url.to_string());
                }
                if let Some(url) = obj.get("url").and_then(Value::as_str) {
                    return Some(url.to_string());
                }
            }
            _ => {}
        }
    }
    None
}

/// Chat id as reported by the conversation-creation endpoint.
pub fn created_chat_id(body: &Value) -> Option<String> {
    dot_path(body, "data.id")
        .or_else(|| dot_path(body, "id"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Model list from `/api/models`, which has been seen both wrapped and bare.
pub fn model_list(body: &Value) -> Vec<Value> {
    match body {
        Value::Array(items) => items.clone(),
        Value::Object(_) => body
            .get("data")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}
