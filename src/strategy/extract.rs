//! Embedded state extraction from browser-facing HTML pages.
//!
//! Pages carry the item's data in a global-state assignment. The bundler
//! varies its shape, so several prefixes are tried in order; the object that
//! follows is cut out with a string-aware brace scan rather than a lazy regex,
//! so nested objects and `;` inside strings do not truncate it.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, trace};

use crate::parser::compile_static_regex;
use crate::transport::json::balanced_object_at;

/// Keys whose presence indicates the payload describes a media item.
pub const MEDIA_DATA_KEYS: [&str; 5] = ["aweme_id", "video", "aweme_list", "item_list", "aweme_detail"];

/// Maximum nesting depth inspected by [`contains_media_data`].
pub const MAX_SEARCH_DEPTH: usize = 10;

/// Maximum number of nodes visited by [`contains_media_data`].
pub const MAX_SEARCH_NODES: usize = 100_000;

/// Assignment prefixes, in the order they are tried. Each ends right before
/// the opening brace.
static STATE_PREFIXES: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [
        compile_static_regex(r"window\._ROUTER_DATA\s*=\s*"),
        compile_static_regex(r"window\.__INITIAL_STATE__\s*=\s*"),
        compile_static_regex(r"self\.__pace_f\.push\(\[function\(\)\{window\._ROUTER_DATA\s*=\s*"),
        compile_static_regex(r"<script[^>]*>window\._ROUTER_DATA\s*=\s*"),
    ]
});

/// Returns the first embedded state object that describes a media item.
///
/// Candidates that fail to parse, are not objects, or hold no media keys are
/// skipped. Returns `None` when nothing qualifies.
#[must_use]
pub fn extract_embedded_json(html: &str) -> Option<Value> {
    for (index, prefix) in STATE_PREFIXES.iter().enumerate() {
        for found in prefix.find_iter(html) {
            let Some(candidate) = balanced_object_at(html, found.end()) else {
                trace!(pattern = index, offset = found.end(), "assignment without a closed object");
                continue;
            };
            let Ok(value) = serde_json::from_str::<Value>(candidate) else {
                trace!(pattern = index, len = candidate.len(), "embedded state is not valid JSON");
                continue;
            };
            if value.is_object() && contains_media_data(&value) {
                debug!(pattern = index, len = candidate.len(), "embedded media state extracted");
                return Some(value);
            }
        }
    }
    None
}

/// Searches `value` for any of [`MEDIA_DATA_KEYS`] as an object key.
///
/// Iterative with an explicit stack; nodes deeper than [`MAX_SEARCH_DEPTH`]
/// are not expanded and the walk stops after [`MAX_SEARCH_NODES`] nodes.
#[must_use]
pub fn contains_media_data(value: &Value) -> bool {
    let mut stack: Vec<(&Value, usize)> = vec![(value, 0)];
    let mut visited: usize = 0;

    while let Some((node, depth)) = stack.pop() {
        visited += 1;
        if visited > MAX_SEARCH_NODES {
            debug!(visited, "media search node budget exhausted");
            return false;
        }
        if depth > MAX_SEARCH_DEPTH {
            continue;
        }
        match node {
            Value::Object(map) => {
                if MEDIA_DATA_KEYS.iter().any(|key| map.contains_key(*key)) {
                    return true;
                }
                stack.extend(map.values().map(|child| (child, depth + 1)));
            }
            Value::Array(items) => {
                stack.extend(items.iter().map(|child| (child, depth + 1)));
            }
            _ => {}
        }
    }
    false
}
