//! JSON decoding for bodies that may carry noise around the payload.

use serde_json::Value;
use tracing::{debug, warn};

use super::constants::BODY_PREVIEW_CHARS;
use super::error::FetchError;

/// Parses a response body as JSON.
///
/// Tries a direct parse first; on failure, looks for the first balanced
/// `{...}` substring that parses. Empty objects, empty arrays and `null` are
/// rejected.
///
/// # Errors
///
/// Returns [`FetchError::ResponseInvalid`] when no usable JSON is found.
pub fn parse_json_body(url: &str, text: &str) -> Result<Value, FetchError> {
    let value = match serde_json::from_str::<Value>(text.trim()) {
        Ok(value) => value,
        Err(error) => {
            debug!(url, error = %error, "direct JSON parse failed, scanning for embedded object");
            let Some(value) = find_json_object(text) else {
                warn!(
                    url,
                    preview = %preview(text, BODY_PREVIEW_CHARS),
                    "no JSON object found in response"
                );
                return Err(FetchError::response_invalid(url, "no JSON object found in body"));
            };
            value
        }
    };

    if is_empty_json(&value) {
        warn!(url, "response decoded to empty JSON");
        return Err(FetchError::response_invalid(url, "empty JSON payload"));
    }

    Ok(value)
}

/// Returns the JSON object embedded in `text`.
///
/// The span from the first `{` to the last `}` is tried first; otherwise every
/// `{` is probed in order and the first balanced object that parses wins.
#[must_use]
pub fn find_json_object(text: &str) -> Option<Value> {
    let greedy = match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => text.get(start..=end),
        _ => None,
    };
    if let Some(value) = greedy.and_then(|span| serde_json::from_str::<Value>(span).ok()) {
        return Some(value);
    }

    text.match_indices('{').find_map(|(start, _)| {
        let candidate = balanced_object_at(text, start)?;
        serde_json::from_str::<Value>(candidate).ok()
    })
}

/// Returns the balanced `{...}` slice beginning at byte offset `start`.
///
/// String literals and escapes are honored so braces inside strings do not
/// affect nesting. Returns `None` when `start` is not an opening brace or the
/// object never closes.
#[must_use]
pub fn balanced_object_at(text: &str, start: usize) -> Option<&str> {
    let bytes = text.as_bytes();
    if bytes.get(start) != Some(&b'{') {
        return None;
    }

    let mut depth: usize = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return text.get(start..=start + offset);
                }
            }
            _ => {}
        }
    }

    None
}

/// Returns true for `null`, `{}`, `[]` and `""`.
#[must_use]
pub fn is_empty_json(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(text) => text.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Returns at most `max_chars` characters of `text`.
#[must_use]
pub fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}
