//! Canonical entity identifiers and the URL shapes they are read from.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::parser::compile_static_regex;

/// Canonical identifier of one content item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Wraps an identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered URL shapes. The first match wins.
static ENTITY_ID_PATTERNS: LazyLock<[(&'static str, Regex); 4]> = LazyLock::new(|| {
    [
        ("video_path", compile_static_regex(r"video/([^/?]*)")),
        ("vid_query", compile_static_regex(r"[?&]vid=(\d+)")),
        ("note_path", compile_static_regex(r"note/([^/?]*)")),
        ("modal_query", compile_static_regex(r"modal_id=([0-9]+)")),
    ]
});

/// Matches `url` against the known shapes in priority order.
///
/// Returns the name of the matching shape and the identifier. Empty captures
/// (e.g. `.../video/?x=1`) do not count as a match.
#[must_use]
pub fn match_entity_id(url: &str) -> Option<(&'static str, EntityId)> {
    ENTITY_ID_PATTERNS.iter().find_map(|(shape, pattern)| {
        let id = pattern.captures(url)?.get(1)?.as_str();
        (!id.is_empty()).then(|| (*shape, EntityId::new(id)))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn id_of(url: &str) -> Option<String> {
        match_entity_id(url).map(|(_, id)| id.to_string())
    }

    #[test]
    fn test_video_path() {
        assert_eq!(
            id_of("https://www.douyin.com/video/7123456789?x=1").as_deref(),
            Some("7123456789")
        );
    }

    #[test]
    fn test_vid_query() {
        assert_eq!(
            id_of("https://www.douyin.com/share?vid=555").as_deref(),
            Some("555")
        );
        assert_eq!(
            id_of("https://www.douyin.com/share?a=1&vid=556").as_deref(),
            Some("556")
        );
    }

    #[test]
    fn test_note_path_and_modal_query() {
        assert_eq!(
            id_of("https://www.douyin.com/note/7300000000000").as_deref(),
            Some("7300000000000")
        );
        assert_eq!(
            id_of("https://www.douyin.com/discover?modal_id=7311111111").as_deref(),
            Some("7311111111")
        );
    }

    #[test]
    fn test_priority_order() {
        let (shape, id) = match_entity_id("https://x.test/video/111?vid=222").unwrap();
        assert_eq!(shape, "video_path");
        assert_eq!(id.as_str(), "111");
    }

    #[test]
    fn test_no_match() {
        assert!(match_entity_id("https://www.douyin.com/user/abc").is_none());
        assert!(match_entity_id("https://www.douyin.com/?vid=abc").is_none());
    }

    #[test]
    fn test_empty_capture_falls_through() {
        let (shape, id) = match_entity_id("https://x.test/video/?modal_id=9").unwrap();
        assert_eq!(shape, "modal_query");
        assert_eq!(id.as_str(), "9");
    }
}
