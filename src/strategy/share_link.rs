//! Embedded state scraped from the canonical share-link page.

use async_trait::async_trait;
use tracing::instrument;

use super::embedded_page::scrape_page;
use super::{AttemptNotes, Payload, Strategy, StrategyContext};
use crate::orchestrator::EntityId;
use crate::transport::{FetchError, FetchRequest, Route};

/// Resolves `/share/video/{id}/` on the share origin, following redirects,
/// and extracts the global-state object from the landing page.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShareLinkStrategy;

#[async_trait]
impl Strategy for ShareLinkStrategy {
    fn name(&self) -> &str {
        "share_link"
    }

    #[instrument(level = "debug", skip_all, fields(strategy = "share_link", id = %id))]
    async fn attempt(
        &self,
        id: &EntityId,
        ctx: &StrategyContext,
        _notes: &mut AttemptNotes,
    ) -> Result<Option<Payload>, FetchError> {
        let url = format!("{}/share/video/{id}/", ctx.platform.share_base_url);
        let request = FetchRequest::get(url)
            .headers(ctx.base_headers())
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            )
            .header(
                "Accept-Language",
                "zh-CN,zh;q=0.8,zh-TW;q=0.7,zh-HK;q=0.5,en-US;q=0.3,en;q=0.2",
            )
            .header("Cache-Control", "no-cache")
            .header("Pragma", "no-cache")
            .route(Route::Direct);

        scrape_page(ctx, &request).await
    }
}
