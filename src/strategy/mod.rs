//! Alternate acquisition paths for one entity.
//!
//! Each [`Strategy`] is an independent way of obtaining the item's data. The
//! orchestrator tries them in the order returned by [`default_strategies`]:
//!
//! - [`WebApiStrategy`] - signed web detail API
//! - [`EmbeddedPageStrategy`] - global state embedded in the item page
//! - [`ShareLinkStrategy`] - the same extraction on the share-link page
//! - [`SearchStrategy`] - public search API keyed by the identifier
//! - [`MobileBypassStrategy`] - mobile detail API as a random device, direct
//! - [`MobileApiStrategy`] - mobile detail API with header signatures, proxied
//! - [`AlternativeEndpointsStrategy`] - known endpoint variants in sequence
//! - [`TerminalFallbackStrategy`] - synthetic degraded payload
//!
//! A strategy returns `Ok(None)` when it ran but found nothing usable and
//! `Err` when a call failed; either way the orchestrator moves on.

mod alternative;
mod embedded_page;
pub mod extract;
mod fallback;
mod mobile;
mod search;
mod share_link;
mod web_api;

pub use alternative::AlternativeEndpointsStrategy;
pub use embedded_page::EmbeddedPageStrategy;
pub use fallback::TerminalFallbackStrategy;
pub use mobile::{MobileApiStrategy, MobileBypassStrategy};
pub use search::SearchStrategy;
pub use share_link::ShareLinkStrategy;
pub use web_api::{WEB_DETAIL_PATH, WebApiStrategy, web_client_params};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::config::{ConfigError, FetchConfig, PacingConfig, PlatformConfig};
use crate::orchestrator::EntityId;
use crate::profile::{ProfileGenerator, RandomSource};
use crate::signature::SignatureSynthesizer;
use crate::transport::{ErrorKind, FetchError, HeaderFields, TransportClient};

/// Whether a payload is real data or a placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadQuality {
    /// Data obtained from the remote service.
    Genuine,
    /// Synthetic placeholder confirming only that the entity exists.
    Degraded,
}

/// Data produced by a strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    /// The structured payload.
    pub data: Value,
    /// Provenance of the data.
    pub quality: PayloadQuality,
}

impl Payload {
    /// Real data.
    #[must_use]
    pub fn genuine(data: Value) -> Self {
        Self {
            data,
            quality: PayloadQuality::Genuine,
        }
    }

    /// Placeholder data.
    #[must_use]
    pub fn degraded(data: Value) -> Self {
        Self {
            data,
            quality: PayloadQuality::Degraded,
        }
    }

    /// Length of the compact JSON serialization.
    #[must_use]
    pub fn serialized_len(&self) -> usize {
        serialized_len(&self.data)
    }
}

/// Length of `value` serialized as compact JSON.
#[must_use]
pub fn serialized_len(value: &Value) -> usize {
    serde_json::to_string(value).map_or(0, |text| text.len())
}

/// Side observations collected during one attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttemptNotes {
    /// The request signature came from the surrogate path.
    pub signature_degraded: bool,
    /// The session token is a local surrogate.
    pub token_surrogate: bool,
}

impl AttemptNotes {
    /// Recoverable degradations to report alongside the outcome.
    #[must_use]
    pub fn warnings(&self) -> Vec<ErrorKind> {
        if self.signature_degraded || self.token_surrogate {
            vec![ErrorKind::SignatureSynthesisDegraded]
        } else {
            Vec::new()
        }
    }
}

/// Diagnostic record of one strategy attempt.
#[derive(Debug, Clone, Serialize)]
pub struct StrategyResult {
    /// Strategy name.
    pub strategy: String,
    /// True when the payload was accepted.
    pub success: bool,
    /// The payload, when the strategy produced one (accepted or not).
    #[serde(skip)]
    pub payload: Option<Payload>,
    /// Human-readable outcome.
    pub message: String,
    /// Error kind when the attempt failed with an error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    /// Recoverable degradations observed during the attempt.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ErrorKind>,
    /// Payload quality when a payload was produced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<PayloadQuality>,
    /// Wall time spent in the attempt, in milliseconds.
    pub elapsed_ms: u64,
}

/// Shared collaborators handed to every strategy.
#[derive(Debug, Clone)]
pub struct StrategyContext {
    /// Shared transport.
    pub transport: Arc<TransportClient>,
    /// Fingerprint and device profiles.
    pub profiles: ProfileGenerator,
    /// Token and signature synthesis.
    pub signer: SignatureSynthesizer,
    /// Endpoints and header template.
    pub platform: Arc<PlatformConfig>,
    /// Delays between requests.
    pub pacing: PacingConfig,
    /// Size an alternative-endpoint response must exceed.
    pub min_variant_bytes: usize,
}

impl StrategyContext {
    /// Builds a context from configuration around an existing transport.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyPool`] when a profile pool is empty.
    pub fn from_config(
        config: &FetchConfig,
        transport: Arc<TransportClient>,
    ) -> Result<Self, ConfigError> {
        let rng = RandomSource::from_seed(config.seed);
        let profiles = ProfileGenerator::new(
            config.fingerprints.clone(),
            config.mobile_devices.clone(),
            config.pacing.jitter,
            rng.clone(),
        )?;
        Ok(Self {
            transport,
            profiles,
            signer: SignatureSynthesizer::new(rng),
            platform: Arc::new(config.platform.clone()),
            pacing: config.pacing,
            min_variant_bytes: config.min_variant_bytes,
        })
    }

    /// The configured header template as header fields.
    #[must_use]
    pub fn base_headers(&self) -> HeaderFields {
        self.platform.headers.to_fields()
    }

    /// Sleeps for `delay`; no-op for zero.
    pub async fn pause(delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// One acquisition path.
///
/// Uses `async_trait` so strategies can be stored as `Box<dyn Strategy>` in
/// the orchestrator's ordered list.
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Stable name used in logs and diagnostics.
    fn name(&self) -> &str;

    /// Attempts to obtain the entity's data.
    ///
    /// # Errors
    ///
    /// Returns the [`FetchError`] of the call that failed. The orchestrator
    /// treats errors and `Ok(None)` alike: the next strategy runs.
    async fn attempt(
        &self,
        id: &EntityId,
        ctx: &StrategyContext,
        notes: &mut AttemptNotes,
    ) -> Result<Option<Payload>, FetchError>;
}

/// The built-in strategy list in priority order.
#[must_use]
pub fn default_strategies() -> Vec<Box<dyn Strategy>> {
    vec![
        Box::new(WebApiStrategy),
        Box::new(EmbeddedPageStrategy),
        Box::new(ShareLinkStrategy),
        Box::new(SearchStrategy),
        Box::new(MobileBypassStrategy),
        Box::new(MobileApiStrategy),
        Box::new(AlternativeEndpointsStrategy),
        Box::new(TerminalFallbackStrategy),
    ]
}

/// Accepts any non-empty JSON object.
pub(crate) fn object_payload(value: Value) -> Option<Payload> {
    match &value {
        Value::Object(map) if !map.is_empty() => Some(Payload::genuine(value)),
        _ => None,
    }
}
