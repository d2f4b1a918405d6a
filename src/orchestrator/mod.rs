//! Entity resolution and the strategy cascade.
//!
//! [`Orchestrator::fetch`] is the single entry point: it extracts a URL from
//! free-form text, resolves redirects, reads the entity identifier from the
//! final URL and runs the strategies in priority order, pausing between
//! attempts, until one produces an acceptable payload.
//!
//! # Example
//!
//! ```no_run
//! use vidmeta_core::config::FetchConfig;
//! use vidmeta_core::orchestrator::{MediaFormat, Orchestrator};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let orchestrator = Orchestrator::open(&FetchConfig::default())?;
//! let outcome = orchestrator
//!     .fetch("https://v.douyin.com/iRNBho6u/", MediaFormat::Png)
//!     .await?;
//! println!("{} via {} ({:?})", outcome.entity_id, outcome.strategy, outcome.quality);
//! orchestrator.close();
//! # Ok(())
//! # }
//! ```

mod entity_id;

pub use entity_id::{EntityId, match_entity_id};

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::config::{ConfigError, FetchConfig};
use crate::parser::find_url;
use crate::strategy::{
    AttemptNotes, Payload, PayloadQuality, Strategy, StrategyContext, StrategyResult,
    default_strategies,
};
use crate::transport::json::is_empty_json;
use crate::transport::{FetchError, FetchRequest, Route, shared_transport};

/// Desired media output type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaFormat {
    /// PNG images.
    #[default]
    Png,
    /// WebP images.
    Webp,
}

/// Unrecognized media format name.
#[derive(Debug, Clone, Error)]
#[error("unknown media format '{0}'\n  Suggestion: Use one of: png, webp")]
pub struct UnknownMediaFormat(String);

impl FromStr for MediaFormat {
    type Err = UnknownMediaFormat;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "webp" => Ok(Self::Webp),
            _ => Err(UnknownMediaFormat(value.to_string())),
        }
    }
}

impl fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Png => "png",
            Self::Webp => "webp",
        })
    }
}

/// Successful resolution of one entity.
#[derive(Debug, Clone, Serialize)]
pub struct FetchOutcome {
    /// Resolved identifier.
    pub entity_id: EntityId,
    /// Name of the strategy whose payload was accepted.
    pub strategy: String,
    /// Genuine data, or the degraded placeholder.
    pub quality: PayloadQuality,
    /// Requested output type.
    pub format: MediaFormat,
    /// The accepted payload.
    pub payload: Value,
    /// One record per strategy attempted, in order.
    pub attempts: Vec<StrategyResult>,
}

impl FetchOutcome {
    /// True when the payload is the synthetic placeholder.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.quality == PayloadQuality::Degraded
    }
}

/// The accepted payload of a cascade run with its diagnostics.
#[derive(Debug, Clone)]
pub struct CascadeSuccess {
    /// Winning strategy.
    pub strategy: String,
    /// Accepted payload.
    pub payload: Payload,
    /// Every attempt, the winner last.
    pub attempts: Vec<StrategyResult>,
}

/// Sequences strategies over a shared transport.
pub struct Orchestrator {
    ctx: StrategyContext,
    strategies: Vec<Box<dyn Strategy>>,
    min_payload_bytes: usize,
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field(
                "strategies",
                &self.strategies.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .field("min_payload_bytes", &self.min_payload_bytes)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Validates `config`, opens the transport and installs the default
    /// strategy list.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for invalid configuration or when the HTTP
    /// client cannot be built.
    pub fn open(config: &FetchConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let transport = shared_transport(&config.transport)?;
        let ctx = StrategyContext::from_config(config, transport)?;
        info!(
            strategies = default_strategies().len(),
            seeded = config.seed.is_some(),
            "orchestrator opened"
        );
        Ok(Self::with_context(ctx, config.min_payload_bytes))
    }

    /// Builds an orchestrator around an existing context.
    #[must_use]
    pub fn with_context(ctx: StrategyContext, min_payload_bytes: usize) -> Self {
        Self {
            ctx,
            strategies: default_strategies(),
            min_payload_bytes,
        }
    }

    /// Replaces the strategy list; order is priority.
    #[must_use]
    pub fn with_strategies(mut self, strategies: Vec<Box<dyn Strategy>>) -> Self {
        self.strategies = strategies;
        self
    }

    /// Shared collaborators.
    #[must_use]
    pub fn context(&self) -> &StrategyContext {
        &self.ctx
    }

    /// Names of the installed strategies, in order.
    #[must_use]
    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Resolves free-form text to an entity identifier and fetches its data.
    ///
    /// # Errors
    ///
    /// - [`FetchError::IdNotFound`] when no identifier can be derived;
    /// - [`FetchError::RetryExhausted`] when no strategy produced an
    ///   acceptable payload;
    /// - [`FetchError::Closed`] after [`Self::close`].
    #[instrument(skip(self, text), fields(format = %format))]
    pub async fn fetch(&self, text: &str, format: MediaFormat) -> Result<FetchOutcome, FetchError> {
        if self.ctx.transport.is_closed() {
            return Err(FetchError::Closed);
        }
        let entity_id = self.resolve_entity_id(text).await?;
        let success = self.run_cascade(&entity_id).await?;
        Ok(FetchOutcome {
            entity_id,
            strategy: success.strategy,
            quality: success.payload.quality,
            format,
            payload: success.payload.data,
            attempts: success.attempts,
        })
    }

    /// Extracts the URL from `text`, follows redirects and matches the final
    /// URL against the known shapes.
    ///
    /// The landing page's status and body are ignored. When no response
    /// arrives at all, the shapes are matched against the extracted URL.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::IdNotFound`] when the text holds no URL or no
    /// shape matches.
    #[instrument(skip(self, text), fields(input_len = text.len()))]
    pub async fn resolve_entity_id(&self, text: &str) -> Result<EntityId, FetchError> {
        let Some(url) = find_url(text) else {
            return Err(FetchError::id_not_found(text, "no URL in input"));
        };

        let request = FetchRequest::get(&url)
            .headers(self.ctx.base_headers())
            .route(Route::Direct);

        let resolved = match self.ctx.transport.resolve_final_url(&request).await {
            Ok(final_url) => {
                debug!(from = %url, to = %final_url, "input URL resolved");
                final_url
            }
            Err(FetchError::Closed) => return Err(FetchError::Closed),
            Err(error) => {
                warn!(
                    url = %url,
                    kind = %error.kind(),
                    error = %error,
                    "redirect resolution failed, matching the input URL as given"
                );
                url.clone()
            }
        };

        match match_entity_id(&resolved) {
            Some((shape, id)) => {
                info!(id = %id, shape, "entity id resolved");
                Ok(id)
            }
            None => Err(FetchError::id_not_found(
                resolved,
                "no known URL shape matched",
            )),
        }
    }

    /// Runs strategies in order until one produces an acceptable payload.
    ///
    /// The inter-strategy delay is applied before every attempt but the first.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::RetryExhausted`] when every strategy failed.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn run_cascade(&self, id: &EntityId) -> Result<CascadeSuccess, FetchError> {
        let total = self.strategies.len();
        let mut attempts = Vec::with_capacity(total);

        for (index, strategy) in self.strategies.iter().enumerate() {
            if index > 0 {
                StrategyContext::pause(self.ctx.pacing.inter_strategy_delay()).await;
            }
            info!(
                strategy = strategy.name(),
                position = index + 1,
                total,
                "trying strategy"
            );

            let started = Instant::now();
            let mut notes = AttemptNotes::default();
            let outcome = strategy.attempt(id, &self.ctx, &mut notes).await;
            let elapsed_ms = millis(started.elapsed());

            let mut result = StrategyResult {
                strategy: strategy.name().to_string(),
                success: false,
                payload: None,
                message: String::new(),
                error_kind: None,
                warnings: notes.warnings(),
                quality: None,
                elapsed_ms,
            };

            match outcome {
                Ok(Some(payload)) => {
                    result.quality = Some(payload.quality);
                    match self.rejection_reason(&payload) {
                        None => {
                            result.success = true;
                            result.message = format!("accepted {} bytes", payload.serialized_len());
                            info!(
                                strategy = strategy.name(),
                                quality = ?payload.quality,
                                elapsed_ms,
                                "strategy succeeded"
                            );
                            result.payload = Some(payload.clone());
                            attempts.push(result);
                            return Ok(CascadeSuccess {
                                strategy: strategy.name().to_string(),
                                payload,
                                attempts,
                            });
                        }
                        Some(reason) => {
                            warn!(strategy = strategy.name(), %reason, "strategy returned unusable data");
                            result.message = reason;
                            result.payload = Some(payload);
                        }
                    }
                }
                Ok(None) => {
                    warn!(strategy = strategy.name(), elapsed_ms, "strategy found no data");
                    result.message = "no usable data".to_string();
                }
                Err(error) => {
                    warn!(
                        strategy = strategy.name(),
                        kind = %error.kind(),
                        error = %error,
                        elapsed_ms,
                        "strategy failed"
                    );
                    result.error_kind = Some(error.kind());
                    result.message = error.to_string();
                }
            }
            attempts.push(result);
        }

        warn!(id = %id, attempts = attempts.len(), "all strategies exhausted");
        Err(FetchError::retry_exhausted(
            id.as_str(),
            u32::try_from(attempts.len()).unwrap_or(u32::MAX),
        ))
    }

    /// Closes the transport. Later calls fail with [`FetchError::Closed`].
    pub fn close(&self) {
        self.ctx.transport.close();
    }

    fn rejection_reason(&self, payload: &Payload) -> Option<String> {
        if is_empty_json(&payload.data) {
            return Some("empty payload".to_string());
        }
        // The placeholder is accepted whatever the size threshold.
        if payload.quality == PayloadQuality::Degraded {
            return None;
        }
        let len = payload.serialized_len();
        (len <= self.min_payload_bytes).then(|| {
            format!(
                "payload too small: {len} bytes, need more than {}",
                self.min_payload_bytes
            )
        })
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
