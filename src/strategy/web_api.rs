//! Signed web detail API.

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use super::{AttemptNotes, Payload, Strategy, StrategyContext, object_payload};
use crate::orchestrator::EntityId;
use crate::profile::ProfileGenerator;
use crate::signature::SESSION_TOKEN_COOKIE;
use crate::transport::{FetchError, FetchRequest, QueryParams, Route, encode_query};

/// Path of the web detail endpoint.
pub const WEB_DETAIL_PATH: &str = "/aweme/v1/web/aweme/detail/";

/// Query parameter carrying the request signature.
const SIGNATURE_PARAM: &str = "a_bogus";

/// Baseline parameter set of the desktop web client for one item.
///
/// Device and network fields hold neutral defaults; the profile generator
/// overwrites them with values from the chosen fingerprint.
#[must_use]
pub fn web_client_params(id: &EntityId) -> QueryParams {
    [
        ("aweme_id", id.as_str()),
        ("device_platform", "webapp"),
        ("aid", "6383"),
        ("channel", "channel_pc_web"),
        ("pc_client_type", "1"),
        ("version_code", "290100"),
        ("version_name", "29.1.0"),
        ("cookie_enabled", "true"),
        ("screen_width", "1920"),
        ("screen_height", "1080"),
        ("browser_language", "zh-CN"),
        ("browser_platform", "Win32"),
        ("browser_name", "Chrome"),
        ("browser_version", "131.0.0.0"),
        ("browser_online", "true"),
        ("engine_name", "Blink"),
        ("engine_version", "131.0.0.0"),
        ("os_name", "Windows"),
        ("os_version", "10"),
        ("cpu_core_num", "12"),
        ("device_memory", "8"),
        ("platform", "PC"),
        ("downlink", "10"),
        ("effective_type", "4g"),
        ("from_user_page", "1"),
        ("locate_query", "false"),
        ("need_time_list", "1"),
        ("pc_libra_divert", "Windows"),
        ("publish_video_strategy_type", "2"),
        ("round_trip_time", "0"),
        ("show_live_replay_strategy", "1"),
        ("time_list_query", "0"),
        ("whale_cut_token", ""),
        ("update_version_code", "170400"),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value.to_string()))
    .collect()
}

/// Calls the web detail API with a session token, a fingerprint-consistent
/// parameter set and a synthesized request signature.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebApiStrategy;

#[async_trait]
impl Strategy for WebApiStrategy {
    fn name(&self) -> &str {
        "web_api"
    }

    #[instrument(level = "debug", skip_all, fields(strategy = "web_api", id = %id))]
    async fn attempt(
        &self,
        id: &EntityId,
        ctx: &StrategyContext,
        notes: &mut AttemptNotes,
    ) -> Result<Option<Payload>, FetchError> {
        if !ProfileGenerator::is_cookie_plausible(&ctx.platform.headers.cookie) {
            warn!("configured session cookie looks stale; update it if the web API keeps failing");
        }

        let token = ctx
            .signer
            .synthesize_session_token(&ctx.transport, &ctx.platform.token)
            .await;
        notes.token_surrogate = token.is_surrogate();

        let fingerprint = ctx.profiles.pick_fingerprint().clone();
        let mut base = web_client_params(id);
        base.insert(SESSION_TOKEN_COOKIE.to_string(), token.value);
        let params = ctx.profiles.build_params(&base, &fingerprint);

        let signature = ctx
            .signer
            .synthesize_request_signature(&params, &fingerprint.user_agent);
        notes.signature_degraded = signature.degraded;

        let url = format!(
            "{}{WEB_DETAIL_PATH}?{}&{SIGNATURE_PARAM}={}",
            ctx.platform.web_base_url,
            encode_query(&params),
            signature.value
        );
        debug!(signature = %signature.value, "web API request prepared");

        StrategyContext::pause(ctx.profiles.compute_jitter_delay()).await;

        let headers = ctx.profiles.build_headers(&ctx.base_headers(), &fingerprint);
        ProfileGenerator::log_detection_attempt(&url, &headers, &params);

        let request = FetchRequest::get(url).headers(headers).route(Route::Proxied);
        let value = ctx.transport.fetch_json(&request).await?;
        info!("web API returned a JSON payload");
        Ok(object_payload(value))
    }
}
