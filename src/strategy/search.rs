//! Public search API keyed by the identifier.

use async_trait::async_trait;
use tracing::{info, instrument};

use super::{AttemptNotes, Payload, Strategy, StrategyContext, object_payload};
use crate::orchestrator::EntityId;
use crate::transport::{FetchError, FetchRequest, Route};

/// Path of the general search endpoint.
pub const SEARCH_PATH: &str = "/aweme/v1/web/general/search/single/";

/// Queries the search API with the identifier as keyword; any JSON object
/// is accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchStrategy;

#[async_trait]
impl Strategy for SearchStrategy {
    fn name(&self) -> &str {
        "search"
    }

    #[instrument(level = "debug", skip_all, fields(strategy = "search", id = %id))]
    async fn attempt(
        &self,
        id: &EntityId,
        ctx: &StrategyContext,
        _notes: &mut AttemptNotes,
    ) -> Result<Option<Payload>, FetchError> {
        let url = format!(
            "{}{SEARCH_PATH}?keyword={}&search_source=video_search",
            ctx.platform.web_base_url,
            urlencoding::encode(id.as_str())
        );
        let request = FetchRequest::get(url)
            .headers(ctx.base_headers())
            .header("Accept", "application/json, text/plain, */*")
            .header("X-Requested-With", "XMLHttpRequest")
            .route(Route::Direct);

        let value = ctx.transport.fetch_json(&request).await?;
        info!("search API returned a JSON payload");
        Ok(object_payload(value))
    }
}
