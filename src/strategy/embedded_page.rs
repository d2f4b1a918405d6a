//! Embedded state scraped from the item's browser page.

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use super::extract::extract_embedded_json;
use super::{AttemptNotes, Payload, Strategy, StrategyContext};
use crate::orchestrator::EntityId;
use crate::transport::{FetchError, FetchRequest, Route};

/// Fetches the item page as an embedded frame would and extracts the
/// global-state object.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedPageStrategy;

#[async_trait]
impl Strategy for EmbeddedPageStrategy {
    fn name(&self) -> &str {
        "embedded_page"
    }

    #[instrument(level = "debug", skip_all, fields(strategy = "embedded_page", id = %id))]
    async fn attempt(
        &self,
        id: &EntityId,
        ctx: &StrategyContext,
        _notes: &mut AttemptNotes,
    ) -> Result<Option<Payload>, FetchError> {
        let url = format!(
            "{}/video/{id}?modeFrom=userPost&secUid=",
            ctx.platform.web_base_url
        );
        let request = FetchRequest::get(url)
            .headers(ctx.base_headers())
            .header("Referer", format!("{}/", ctx.platform.web_base_url))
            .header("Sec-Fetch-Dest", "iframe")
            .header("Sec-Fetch-Mode", "navigate")
            .header("Sec-Fetch-Site", "same-origin")
            .header("Upgrade-Insecure-Requests", "1")
            .route(Route::Direct);

        scrape_page(ctx, &request).await
    }
}

/// Fetches an HTML page and returns its embedded media state, if any.
pub(super) async fn scrape_page(
    ctx: &StrategyContext,
    request: &FetchRequest,
) -> Result<Option<Payload>, FetchError> {
    let envelope = ctx.transport.fetch_raw(request).await?;
    if envelope.status != 200 {
        debug!(status = envelope.status, url = %envelope.final_url, "page not served directly");
        return Ok(None);
    }

    match extract_embedded_json(&envelope.body) {
        Some(value) => {
            info!(url = %envelope.final_url, "embedded state extracted from page");
            Ok(Some(Payload::genuine(value)))
        }
        None => {
            debug!(
                url = %envelope.final_url,
                body_len = envelope.body.len(),
                "page carries no embedded media state"
            );
            Ok(None)
        }
    }
}
