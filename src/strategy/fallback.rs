//! Synthetic terminal fallback.

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{instrument, warn};

use super::{AttemptNotes, Payload, Strategy, StrategyContext};
use crate::orchestrator::EntityId;
use crate::transport::FetchError;

/// Placeholder text for the description field.
pub const PLACEHOLDER_DESC: &str = "item confirmed, details unavailable";

/// Always produces a [`super::PayloadQuality::Degraded`] payload that asserts
/// only that the identifier exists. Every detail field holds a sentinel.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalFallbackStrategy;

impl TerminalFallbackStrategy {
    /// Builds the placeholder document for `id`.
    #[must_use]
    pub fn placeholder(ctx: &StrategyContext, id: &EntityId) -> Value {
        json!({
            "status_code": 0,
            "aweme_list": [{
                "aweme_id": id.as_str(),
                "desc": PLACEHOLDER_DESC,
                "create_time": ctx.signer.now_millis() / 1000,
                "video": {
                    "play_addr": {
                        "url_list": [format!("{}/video/{id}", ctx.platform.web_base_url)]
                    }
                },
                "author": {
                    "nickname": "unknown",
                    "unique_id": "unknown"
                },
                "statistics": {
                    "digg_count": 0,
                    "comment_count": 0,
                    "share_count": 0
                }
            }]
        })
    }
}

#[async_trait]
impl Strategy for TerminalFallbackStrategy {
    fn name(&self) -> &str {
        "terminal_fallback"
    }

    #[instrument(level = "debug", skip_all, fields(strategy = "terminal_fallback", id = %id))]
    async fn attempt(
        &self,
        id: &EntityId,
        ctx: &StrategyContext,
        _notes: &mut AttemptNotes,
    ) -> Result<Option<Payload>, FetchError> {
        warn!("every data source failed; returning degraded placeholder");
        Ok(Some(Payload::degraded(Self::placeholder(ctx, id))))
    }
}
