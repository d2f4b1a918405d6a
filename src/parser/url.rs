//! URL extraction from free-form share text.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, trace};

use super::compile_static_regex;

/// First `http(s)://` run up to whitespace.
static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"https?://\S+"));

/// Extracts the first URL from share text.
///
/// Input that already starts with a scheme is returned unchanged. Otherwise
/// full-width and ASCII commas are treated as separators, the first
/// `http(s)://` run is taken and trailing sentence punctuation is removed.
///
/// # Examples
///
/// ```
/// use vidmeta_core::parser::find_url;
///
/// let text = "7.43 复制打开抖音，看看【作品】 https://v.douyin.com/iRNBho6u/, 好看!";
/// assert_eq!(find_url(text).as_deref(), Some("https://v.douyin.com/iRNBho6u/"));
/// assert_eq!(find_url("no link here"), None);
/// ```
#[tracing::instrument(skip(input), fields(input_len = input.len()))]
#[must_use]
pub fn find_url(input: &str) -> Option<String> {
    let input = input.trim();
    if input.starts_with("http://") || input.starts_with("https://") {
        debug!(url = input, "input is already a URL");
        return Some(input.to_string());
    }

    let separated = input.replace(['，', ','], " ");
    let candidate = URL_PATTERN.find(&separated)?.as_str();
    trace!(candidate, "found URL candidate");

    let cleaned = clean_url_trailing(candidate);
    if cleaned.is_empty() {
        return None;
    }
    debug!(url = cleaned, "URL extracted from text");
    Some(cleaned.to_string())
}

/// Strips sentence punctuation captured at the end of a URL.
fn clean_url_trailing(url: &str) -> &str {
    url.trim_end_matches(['.', ',', ';', ':', '!', '?', ')'])
}
