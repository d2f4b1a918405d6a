//! Inert configuration injected at construction time.
//!
//! Every numeric knob, endpoint, header template and pool the fetch pipeline
//! uses comes from [`FetchConfig`]. Nothing is read from the environment or
//! from disk here; the binary decides where a config comes from.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::profile::{DeviceFingerprint, MobileDevice, default_fingerprints, default_mobile_devices};
use crate::transport::constants::{
    DEFAULT_CONNECT_RETRIES, DEFAULT_MAX_CONNECTIONS, DEFAULT_MAX_RETRIES, DEFAULT_MAX_TASKS,
    DEFAULT_TIMEOUT_MS,
};

/// Desktop browser user-agent used by the default header template.
pub const DEFAULT_WEB_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Errors raised for invalid configuration values.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// A pool that must contain entries is empty.
    #[error("config pool `{pool}` is empty\n  Suggestion: Provide at least one entry or omit the field to use defaults")]
    EmptyPool {
        /// Name of the pool.
        pool: &'static str,
    },

    /// A numeric or textual value is out of range.
    #[error("invalid config value for `{field}`: {reason}")]
    InvalidValue {
        /// Field path.
        field: &'static str,
        /// Why the value is rejected.
        reason: String,
    },

    /// A URL field does not parse.
    #[error("invalid URL for `{field}`: '{value}'")]
    InvalidUrl {
        /// Field path.
        field: &'static str,
        /// The rejected value.
        value: String,
    },

    /// The HTTP client could not be constructed from the settings.
    #[error("HTTP client construction failed: {reason}")]
    HttpClient {
        /// Underlying builder error.
        reason: String,
    },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

/// Proxy addresses per scheme.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    /// Proxy for `http://` targets.
    pub http: Option<String>,
    /// Proxy for `https://` targets.
    pub https: Option<String>,
}

impl ProxySettings {
    /// Returns true when neither scheme has a proxy.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.http.is_none() && self.https.is_none()
    }
}

/// Transport client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Business-level attempts per request (empty-body retries).
    pub max_retries: u32,
    /// Idle pooled connections kept per host.
    pub max_connections: usize,
    /// Concurrently admitted requests.
    pub max_tasks: usize,
    /// Per-attempt timeout; also the pause after an empty body.
    pub timeout_ms: u64,
    /// Connection-level retries for connect failures.
    pub connect_retries: u32,
    /// Proxy used by the proxied route.
    pub proxy: ProxySettings,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            max_tasks: DEFAULT_MAX_TASKS,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            connect_retries: DEFAULT_CONNECT_RETRIES,
            proxy: ProxySettings::default(),
        }
    }
}

impl TransportConfig {
    /// Per-attempt timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Baseline request headers for the target platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderTemplate {
    /// Browser user-agent.
    pub user_agent: String,
    /// Referer sent with web requests.
    pub referer: String,
    /// Accept-Language value.
    pub accept_language: String,
    /// Session cookie string; empty when none is configured.
    pub cookie: String,
}

impl Default for HeaderTemplate {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_WEB_USER_AGENT.to_string(),
            referer: "https://www.douyin.com/".to_string(),
            accept_language: "zh-CN,zh;q=0.9,en;q=0.8,en-GB;q=0.7,en-US;q=0.6".to_string(),
            cookie: String::new(),
        }
    }
}

impl HeaderTemplate {
    /// Returns the template as header fields, skipping an empty cookie.
    #[must_use]
    pub fn to_fields(&self) -> BTreeMap<String, String> {
        let mut fields = BTreeMap::new();
        fields.insert("User-Agent".to_string(), self.user_agent.clone());
        fields.insert("Referer".to_string(), self.referer.clone());
        fields.insert("Accept-Language".to_string(), self.accept_language.clone());
        if !self.cookie.is_empty() {
            fields.insert("Cookie".to_string(), self.cookie.clone());
        }
        fields
    }
}

/// Session token issuer endpoint and payload fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenIssuerConfig {
    /// Issuer URL.
    pub url: String,
    /// Payload `magic` field.
    pub magic: u64,
    /// Payload `version` field.
    pub version: u32,
    /// Payload `dataType` field.
    pub data_type: u32,
    /// Payload `strData` field (device-derived blob).
    pub str_data: String,
    /// User-agent sent to the issuer.
    pub user_agent: String,
}

impl Default for TokenIssuerConfig {
    fn default() -> Self {
        Self {
            url: "https://mssdk.bytedance.com/web/report".to_string(),
            magic: 538_969_122,
            version: 1,
            data_type: 8,
            str_data: String::new(),
            user_agent: DEFAULT_WEB_USER_AGENT.to_string(),
        }
    }
}

/// Endpoints and templates for the target platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Web origin hosting the detail API and HTML pages.
    pub web_base_url: String,
    /// Share-link origin.
    pub share_base_url: String,
    /// Mobile API origin.
    pub mobile_base_url: String,
    /// Legacy item-info API origin.
    pub item_info_base_url: String,
    /// Baseline headers.
    pub headers: HeaderTemplate,
    /// Session token issuer.
    pub token: TokenIssuerConfig,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            web_base_url: "https://www.douyin.com".to_string(),
            share_base_url: "https://v.douyin.com".to_string(),
            mobile_base_url: "https://aweme.snssdk.com".to_string(),
            item_info_base_url: "https://www.iesdouyin.com".to_string(),
            headers: HeaderTemplate::default(),
            token: TokenIssuerConfig::default(),
        }
    }
}

impl PlatformConfig {
    /// Overrides every origin at once. Used to point the pipeline at a mock server.
    #[must_use]
    pub fn with_all_origins(mut self, origin: &str) -> Self {
        let origin = origin.trim_end_matches('/').to_string();
        self.web_base_url.clone_from(&origin);
        self.share_base_url.clone_from(&origin);
        self.mobile_base_url.clone_from(&origin);
        self.item_info_base_url.clone_from(&origin);
        self.token.url = format!("{origin}/web/report");
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let origins = [
            ("platform.web_base_url", &self.web_base_url),
            ("platform.share_base_url", &self.share_base_url),
            ("platform.mobile_base_url", &self.mobile_base_url),
            ("platform.item_info_base_url", &self.item_info_base_url),
            ("platform.token.url", &self.token.url),
        ];
        for (field, value) in origins {
            if Url::parse(value).is_err() {
                return Err(ConfigError::InvalidUrl {
                    field,
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Inclusive millisecond range for one randomized delay component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MillisRange {
    /// Lower bound.
    pub min: u64,
    /// Upper bound.
    pub max: u64,
}

impl MillisRange {
    /// Creates a range.
    #[must_use]
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    /// A range that always yields zero.
    #[must_use]
    pub const fn zero() -> Self {
        Self { min: 0, max: 0 }
    }
}

/// The three independent components of request jitter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct JitterConfig {
    /// Simulated think time.
    pub think_ms: MillisRange,
    /// Simulated network variance.
    pub network_ms: MillisRange,
    /// Simulated behavioral variance.
    pub behavior_ms: MillisRange,
}

impl Default for JitterConfig {
    fn default() -> Self {
        Self {
            think_ms: MillisRange::new(500, 2000),
            network_ms: MillisRange::new(100, 500),
            behavior_ms: MillisRange::new(200, 1000),
        }
    }
}

impl JitterConfig {
    /// Jitter that always resolves to zero.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            think_ms: MillisRange::zero(),
            network_ms: MillisRange::zero(),
            behavior_ms: MillisRange::zero(),
        }
    }
}

/// Delays inserted between requests.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Pause between consecutive strategies.
    pub inter_strategy_delay_ms: u64,
    /// Pause between endpoint variants inside one strategy.
    pub variant_delay_ms: u64,
    /// Jitter applied before signed web requests.
    pub jitter: JitterConfig,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            inter_strategy_delay_ms: 2000,
            variant_delay_ms: 1000,
            jitter: JitterConfig::default(),
        }
    }
}

impl PacingConfig {
    /// No pauses at all. Intended for tests.
    #[must_use]
    pub const fn immediate() -> Self {
        Self {
            inter_strategy_delay_ms: 0,
            variant_delay_ms: 0,
            jitter: JitterConfig::disabled(),
        }
    }

    /// Pause between consecutive strategies.
    #[must_use]
    pub fn inter_strategy_delay(&self) -> Duration {
        Duration::from_millis(self.inter_strategy_delay_ms)
    }

    /// Pause between endpoint variants.
    #[must_use]
    pub fn variant_delay(&self) -> Duration {
        Duration::from_millis(self.variant_delay_ms)
    }
}

/// Top-level configuration for the fetch pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Transport settings.
    pub transport: TransportConfig,
    /// Platform endpoints and templates.
    pub platform: PlatformConfig,
    /// Pacing and jitter.
    pub pacing: PacingConfig,
    /// Desktop fingerprint pool.
    pub fingerprints: Vec<DeviceFingerprint>,
    /// Mobile device pool.
    pub mobile_devices: Vec<MobileDevice>,
    /// Seed for the random source; `None` draws from OS entropy.
    pub seed: Option<u64>,
    /// Serialized size a payload must exceed to be accepted.
    pub min_payload_bytes: usize,
    /// Serialized size an alternative-endpoint response must exceed.
    pub min_variant_bytes: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            transport: TransportConfig::default(),
            platform: PlatformConfig::default(),
            pacing: PacingConfig::default(),
            fingerprints: default_fingerprints(),
            mobile_devices: default_mobile_devices(),
            seed: None,
            min_payload_bytes: 100,
            min_variant_bytes: 50,
        }
    }
}

impl FetchConfig {
    /// Parses a JSON document; absent fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error for malformed documents.
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Validates values against runtime constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] describing the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fingerprints.is_empty() {
            return Err(ConfigError::EmptyPool {
                pool: "fingerprints",
            });
        }
        if self.mobile_devices.is_empty() {
            return Err(ConfigError::EmptyPool {
                pool: "mobile_devices",
            });
        }
        if self.transport.max_retries == 0 {
            return Err(ConfigError::invalid(
                "transport.max_retries",
                "must be at least 1",
            ));
        }
        if self.transport.max_tasks == 0 {
            return Err(ConfigError::invalid(
                "transport.max_tasks",
                "must be at least 1",
            ));
        }
        if self.transport.timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "transport.timeout_ms",
                "must be greater than 0",
            ));
        }
        let jitter = self.pacing.jitter;
        for (field, range) in [
            ("pacing.jitter.think_ms", jitter.think_ms),
            ("pacing.jitter.network_ms", jitter.network_ms),
            ("pacing.jitter.behavior_ms", jitter.behavior_ms),
        ] {
            if range.min > range.max {
                return Err(ConfigError::invalid(
                    field,
                    format!("min {} exceeds max {}", range.min, range.max),
                ));
            }
        }
        self.platform.validate()
    }
}
