//! Known endpoint variants tried in sequence.

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use super::{AttemptNotes, Payload, Strategy, StrategyContext, serialized_len};
use crate::config::DEFAULT_WEB_USER_AGENT;
use crate::orchestrator::EntityId;
use crate::transport::{FetchError, FetchRequest, HeaderFields, Route};

/// Tries each endpoint variant with a simplified header set and accepts the
/// first JSON response whose serialization exceeds the configured minimum.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlternativeEndpointsStrategy;

impl AlternativeEndpointsStrategy {
    /// Variant URLs in the order they are tried.
    #[must_use]
    pub fn endpoints(ctx: &StrategyContext, id: &EntityId) -> Vec<String> {
        let platform = &ctx.platform;
        vec![
            format!(
                "{}/aweme/v1/web/aweme/detail/?aweme_id={id}&aid=1128&version_name=23.5.0&device_platform=webapp&os=pc",
                platform.web_base_url
            ),
            format!(
                "{}/web/api/v2/aweme/iteminfo/?item_ids={id}",
                platform.item_info_base_url
            ),
            format!(
                "{}/aweme/v1/web/aweme/post/?aweme_id={id}",
                platform.web_base_url
            ),
        ]
    }

    fn simple_headers(ctx: &StrategyContext) -> HeaderFields {
        let mut headers = HeaderFields::new();
        headers.insert("User-Agent".to_string(), DEFAULT_WEB_USER_AGENT.to_string());
        headers.insert("Referer".to_string(), ctx.platform.headers.referer.clone());
        headers.insert(
            "Accept".to_string(),
            "application/json, text/plain, */*".to_string(),
        );
        headers.insert("Accept-Language".to_string(), "zh-CN,zh;q=0.9".to_string());
        if !ctx.platform.headers.cookie.is_empty() {
            headers.insert("Cookie".to_string(), ctx.platform.headers.cookie.clone());
        }
        headers
    }
}

#[async_trait]
impl Strategy for AlternativeEndpointsStrategy {
    fn name(&self) -> &str {
        "alternative_endpoints"
    }

    #[instrument(level = "debug", skip_all, fields(strategy = "alternative_endpoints", id = %id))]
    async fn attempt(
        &self,
        id: &EntityId,
        ctx: &StrategyContext,
        _notes: &mut AttemptNotes,
    ) -> Result<Option<Payload>, FetchError> {
        let mut last_error: Option<FetchError> = None;
        let mut any_response = false;

        for endpoint in Self::endpoints(ctx, id) {
            StrategyContext::pause(ctx.pacing.variant_delay()).await;

            let request = FetchRequest::get(&endpoint)
                .headers(Self::simple_headers(ctx))
                .route(Route::Proxied);

            match ctx.transport.fetch_json(&request).await {
                Ok(value) => {
                    any_response = true;
                    let len = serialized_len(&value);
                    if len > ctx.min_variant_bytes {
                        info!(endpoint = %endpoint, len, "alternative endpoint succeeded");
                        return Ok(Some(Payload::genuine(value)));
                    }
                    debug!(
                        endpoint = %endpoint,
                        len,
                        min = ctx.min_variant_bytes,
                        "alternative endpoint response too small"
                    );
                }
                Err(error) => {
                    warn!(endpoint = %endpoint, kind = %error.kind(), error = %error, "alternative endpoint failed");
                    last_error = Some(error);
                }
            }
        }

        match last_error {
            Some(error) if !any_response => Err(error),
            _ => Ok(None),
        }
    }
}
