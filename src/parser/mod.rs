//! Input parsing for free-form share text.
//!
//! Users paste whatever the app's share sheet produced: a bare URL, or a
//! sentence with a URL somewhere inside it. [`find_url`] recovers the URL.

mod url;

pub use url::find_url;

use regex::Regex;

/// Compiles a regex literal that is known to be valid.
///
/// # Panics
///
/// Panics if the pattern is invalid; only call with static literals covered
/// by tests.
#[must_use]
pub fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}
