//! Mobile app impersonation.
//!
//! Two variants share the device profile and endpoint. The bypass variant
//! sends only the device's own headers and goes direct; the impersonation
//! variant layers the device onto the configured header template, adds the
//! mobile header signatures and goes through the proxy.

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use super::{AttemptNotes, Payload, Strategy, StrategyContext, object_payload};
use crate::orchestrator::EntityId;
use crate::profile::MobileDevice;
use crate::transport::{FetchError, FetchRequest, HeaderFields, Route, encode_query};

/// Path of the mobile detail endpoint.
pub const MOBILE_DETAIL_PATH: &str = "/aweme/v1/aweme/detail/";

fn mobile_detail_url(ctx: &StrategyContext, device: &MobileDevice, id: &EntityId) -> String {
    format!(
        "{}{MOBILE_DETAIL_PATH}?{}",
        ctx.platform.mobile_base_url,
        encode_query(&device.detail_params(id.as_str()))
    )
}

/// Random device, device headers only, direct route.
#[derive(Debug, Clone, Copy, Default)]
pub struct MobileBypassStrategy;

#[async_trait]
impl Strategy for MobileBypassStrategy {
    fn name(&self) -> &str {
        "mobile_bypass"
    }

    #[instrument(level = "debug", skip_all, fields(strategy = "mobile_bypass", id = %id))]
    async fn attempt(
        &self,
        id: &EntityId,
        ctx: &StrategyContext,
        _notes: &mut AttemptNotes,
    ) -> Result<Option<Payload>, FetchError> {
        let device = ctx.profiles.pick_mobile_device().clone();
        let url = mobile_detail_url(ctx, &device, id);
        debug!(device = %device.device_type, url = %url, "mobile bypass request");

        let request = FetchRequest::get(url)
            .headers(device.headers())
            .header("Connection", "keep-alive")
            .route(Route::Direct);

        let value = ctx.transport.fetch_json(&request).await?;
        info!(device = %device.device_type, "mobile bypass returned a JSON payload");
        Ok(object_payload(value))
    }
}

/// Random device on top of the header template, with `X-Khronos`,
/// `X-Gorgon` and `X-Ladon`, proxied route.
#[derive(Debug, Clone, Copy, Default)]
pub struct MobileApiStrategy;

#[async_trait]
impl Strategy for MobileApiStrategy {
    fn name(&self) -> &str {
        "mobile_api"
    }

    #[instrument(level = "debug", skip_all, fields(strategy = "mobile_api", id = %id))]
    async fn attempt(
        &self,
        id: &EntityId,
        ctx: &StrategyContext,
        _notes: &mut AttemptNotes,
    ) -> Result<Option<Payload>, FetchError> {
        let device = ctx.profiles.pick_mobile_device().clone();
        let url = mobile_detail_url(ctx, &device, id);

        let mut headers: HeaderFields = ctx.base_headers();
        headers.extend(device.headers());
        ctx.signer.mobile_header_signatures().apply(&mut headers);
        debug!(device = %device.device_type, url = %url, "mobile API request");

        StrategyContext::pause(ctx.pacing.variant_delay()).await;

        let request = FetchRequest::get(url).headers(headers).route(Route::Proxied);
        let value = ctx.transport.fetch_json(&request).await?;
        info!(device = %device.device_type, "mobile API returned a JSON payload");
        Ok(object_payload(value))
    }
}
