//! Per-request authentication artifacts.
//!
//! The web API expects a session token (`msToken`) and a request signature
//! (`a_bogus`); the mobile API expects a set of `X-*` header signatures.
//! The algorithms here approximate an undocumented client-side mechanism
//! inferred from observed traffic. They reproduce the expected format and
//! length, not necessarily the remote validation logic, and need periodic
//! recalibration as the remote client changes.
//!
//! Synthesis never fails outward: every path has a local surrogate, and the
//! returned values record whether a surrogate was used.

mod mobile;
mod token;

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use md5::{Digest, Md5};
use sha2::Sha256;
use thiserror::Error;
use tracing::{debug, warn};

pub use mobile::MobileHeaderSignatures;
pub use token::{SESSION_TOKEN_COOKIE, SURROGATE_TOKEN_LEN, SessionToken, TokenProvenance};

use crate::profile::RandomSource;
use crate::transport::{QueryParams, join_raw_params};

/// Length of every request signature.
pub const SIGNATURE_LEN: usize = 32;

/// Client version declared in the signing string.
pub const DECLARED_CLIENT_VERSION: &str = "131.0.0.0";

/// Source of the current unix time in milliseconds; `None` when unavailable.
pub type Clock = Arc<dyn Fn() -> Option<u64> + Send + Sync>;

/// Internal failures of the primary synthesis path.
///
/// These never leave the module; they select the surrogate path and are
/// logged.
#[derive(Debug, Clone, Error)]
pub enum SynthesisError {
    /// The clock produced no timestamp.
    #[error("clock unavailable")]
    ClockUnavailable,

    /// The token issuer answered without a usable token.
    #[error("token issuer returned no usable token: {reason}")]
    TokenRejected {
        /// What was wrong with the answer.
        reason: String,
    },
}

/// A request signature and how it was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSignature {
    /// 32 lowercase hex characters.
    pub value: String,
    /// True when the surrogate path produced the value.
    pub degraded: bool,
}

/// Inputs of one signature computation. Single use.
#[derive(Debug, Clone)]
pub struct SignatureContext {
    /// Parameters, sorted by key.
    pub params: QueryParams,
    /// Unix time in milliseconds.
    pub timestamp_ms: u64,
    /// 16-character alphanumeric nonce.
    pub nonce_primary: String,
    /// 8-character lowercase alphanumeric nonce.
    pub nonce_secondary: String,
    /// First 8 hex characters of the user-agent MD5.
    pub user_agent_hash: String,
}

impl SignatureContext {
    /// Builds the signing string.
    ///
    /// Components joined by `&`: raw sorted params, timestamp, both nonces,
    /// user-agent hash, environment block and declared client version.
    #[must_use]
    pub fn signing_string(&self) -> String {
        let param = |key: &str, default: &str| {
            self.params
                .get(key)
                .map_or_else(|| default.to_string(), Clone::clone)
        };
        let environment = [
            format!(
                "screen={}x{}",
                param("screen_width", "1920"),
                param("screen_height", "1080")
            ),
            format!("cores={}", param("cpu_core_num", "8")),
            format!("memory={}", param("device_memory", "8")),
            format!("platform={}", param("platform", "PC")),
            format!("browser={}", param("browser_name", "Chrome")),
        ]
        .join("&");

        [
            join_raw_params(&self.params),
            format!("timestamp={}", self.timestamp_ms),
            format!("r1={}", self.nonce_primary),
            format!("r2={}", self.nonce_secondary),
            format!("ua_hash={}", self.user_agent_hash),
            environment,
            format!("version={DECLARED_CLIENT_VERSION}"),
        ]
        .join("&")
    }

    /// Interleaves MD5 and SHA-256 of the signing string into 32 hex chars.
    ///
    /// Position `i % 3 == 0` takes the MD5 digit, `1` the SHA-256 digit and
    /// `2` the low nibble of their XOR.
    #[must_use]
    pub fn sign(&self) -> String {
        let signing = self.signing_string();
        let md5_hex = md5_hex(&signing);
        let sha_hex = hex::encode(Sha256::digest(signing.as_bytes()));

        md5_hex
            .bytes()
            .zip(sha_hex.bytes())
            .enumerate()
            .take(SIGNATURE_LEN)
            .map(|(i, (m, s))| match i % 3 {
                0 => char::from(m),
                1 => char::from(s),
                _ => hex_digit((m ^ s) % 16),
            })
            .collect()
    }
}

/// Computes signatures and session tokens.
#[derive(Clone)]
pub struct SignatureSynthesizer {
    rng: RandomSource,
    clock: Clock,
}

impl std::fmt::Debug for SignatureSynthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureSynthesizer")
            .field("rng", &self.rng)
            .finish_non_exhaustive()
    }
}

impl SignatureSynthesizer {
    /// Uses the system clock.
    #[must_use]
    pub fn new(rng: RandomSource) -> Self {
        Self::with_clock(rng, Arc::new(system_millis))
    }

    /// Uses an injected clock.
    #[must_use]
    pub fn with_clock(rng: RandomSource, clock: Clock) -> Self {
        Self { rng, clock }
    }

    /// Signs `params` for a client identified by `user_agent`.
    ///
    /// Always returns a 32-character hex value.
    #[must_use]
    pub fn synthesize_request_signature(
        &self,
        params: &QueryParams,
        user_agent: &str,
    ) -> RequestSignature {
        match self.signature_context(params, user_agent) {
            Ok(context) => {
                let value = context.sign();
                debug!(signature = %value, "request signature synthesized");
                RequestSignature {
                    value,
                    degraded: false,
                }
            }
            Err(error) => {
                warn!(error = %error, "signature synthesis degraded, using surrogate hash");
                RequestSignature {
                    value: surrogate_signature(params, user_agent, system_millis().unwrap_or(0) / 1000),
                    degraded: true,
                }
            }
        }
    }

    /// Mobile header signatures for the current time.
    #[must_use]
    pub fn mobile_header_signatures(&self) -> MobileHeaderSignatures {
        MobileHeaderSignatures::for_timestamp(self.now_millis() / 1000)
    }

    fn signature_context(
        &self,
        params: &QueryParams,
        user_agent: &str,
    ) -> Result<SignatureContext, SynthesisError> {
        let timestamp_ms = (self.clock)().ok_or(SynthesisError::ClockUnavailable)?;
        Ok(SignatureContext {
            params: params.clone(),
            timestamp_ms,
            nonce_primary: self.rng.alphanumeric(16),
            nonce_secondary: self.rng.lower_alphanumeric(8),
            user_agent_hash: md5_hex(user_agent)[..8].to_string(),
        })
    }

    pub(crate) fn now_millis(&self) -> u64 {
        (self.clock)().or_else(system_millis).unwrap_or(0)
    }

    pub(crate) fn rng(&self) -> &RandomSource {
        &self.rng
    }
}

fn surrogate_signature(params: &QueryParams, user_agent: &str, timestamp_secs: u64) -> String {
    let raw = format!("{}_{user_agent}_{timestamp_secs}", join_raw_params(params));
    md5_hex(&raw)
}

pub(crate) fn md5_hex(input: &str) -> String {
    hex::encode(Md5::digest(input.as_bytes()))
}

fn hex_digit(nibble: u8) -> char {
    char::from_digit(u32::from(nibble), 16).unwrap_or('0')
}

fn system_millis() -> Option<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|elapsed| u64::try_from(elapsed.as_millis()).ok())
}
