//! Anti-detection profile generation.
//!
//! A [`ProfileGenerator`] draws read-only entries from immutable fingerprint
//! and mobile-device pools and derives request headers, query parameters and
//! timing jitter from one entry at a time, so every value sent in a single
//! attempt describes the same client.

mod fingerprint;
mod mobile;
mod random;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

pub use fingerprint::{DeviceFingerprint, default_fingerprints};
pub use mobile::{MOBILE_VERSION_CODE, MOBILE_VERSION_NAME, MobileDevice, default_mobile_devices};
pub use random::RandomSource;

use crate::config::{ConfigError, JitterConfig};
use crate::transport::{HeaderFields, QueryParams};

/// Minimum plausible length of a session cookie string.
pub const MIN_COOKIE_LEN: usize = 100;

/// Cookie names a logged-in web session always carries.
pub const REQUIRED_COOKIE_FIELDS: [&str; 3] = ["sessionid", "sid_tt", "uid_tt"];

const DOWNLINK_CHOICES: [&str; 3] = ["10", "50", "100"];
const EFFECTIVE_TYPE_CHOICES: [&str; 2] = ["4g", "wifi"];

/// Produces consistent spoofed client profiles.
#[derive(Debug, Clone)]
pub struct ProfileGenerator {
    fingerprints: Arc<[DeviceFingerprint]>,
    mobile_devices: Arc<[MobileDevice]>,
    jitter: JitterConfig,
    rng: RandomSource,
}

impl ProfileGenerator {
    /// Creates a generator over the given pools.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyPool`] when either pool is empty.
    pub fn new(
        fingerprints: Vec<DeviceFingerprint>,
        mobile_devices: Vec<MobileDevice>,
        jitter: JitterConfig,
        rng: RandomSource,
    ) -> Result<Self, ConfigError> {
        if fingerprints.is_empty() {
            return Err(ConfigError::EmptyPool {
                pool: "fingerprints",
            });
        }
        if mobile_devices.is_empty() {
            return Err(ConfigError::EmptyPool {
                pool: "mobile_devices",
            });
        }
        Ok(Self {
            fingerprints: fingerprints.into(),
            mobile_devices: mobile_devices.into(),
            jitter,
            rng,
        })
    }

    /// The random source shared with this generator.
    #[must_use]
    pub fn rng(&self) -> &RandomSource {
        &self.rng
    }

    /// Draws one fingerprint from the pool.
    #[must_use]
    pub fn pick_fingerprint(&self) -> &DeviceFingerprint {
        // Pools are non-empty by construction.
        &self.fingerprints[self.rng.index(self.fingerprints.len())]
    }

    /// Draws one mobile device from the pool.
    #[must_use]
    pub fn pick_mobile_device(&self) -> &MobileDevice {
        &self.mobile_devices[self.rng.index(self.mobile_devices.len())]
    }

    /// Merges browser headers derived from `fingerprint` into `base`.
    ///
    /// Fingerprint-derived fields overwrite the template so that the
    /// `User-Agent` and client-hint headers always agree.
    #[must_use]
    pub fn build_headers(&self, base: &HeaderFields, fingerprint: &DeviceFingerprint) -> HeaderFields {
        let mut headers = base.clone();
        let minor = self.rng.int_in(1, 9);
        let derived = [
            ("Accept", "application/json, text/plain, */*".to_string()),
            ("Cache-Control", "no-cache".to_string()),
            ("Pragma", "no-cache".to_string()),
            ("Sec-Ch-Ua", fingerprint.sec_ch_ua.clone()),
            ("Sec-Ch-Ua-Mobile", "?0".to_string()),
            ("Sec-Ch-Ua-Platform", fingerprint.sec_ch_ua_platform()),
            ("Sec-Fetch-Dest", "empty".to_string()),
            ("Sec-Fetch-Mode", "cors".to_string()),
            ("Sec-Fetch-Site", "same-origin".to_string()),
            ("X-Requested-With", "XMLHttpRequest".to_string()),
            ("User-Agent", fingerprint.user_agent.clone()),
            ("X-Client-Version", format!("29.{minor}.0")),
            ("X-Tt-Env", "prod".to_string()),
        ];
        for (name, value) in derived {
            headers.insert(name.to_string(), value);
        }
        headers
    }

    /// Merges device parameters derived from `fingerprint` into `base`.
    ///
    /// Screen, hardware, platform, browser and OS fields come from the
    /// fingerprint; network hints and version codes are randomized.
    #[must_use]
    pub fn build_params(&self, base: &QueryParams, fingerprint: &DeviceFingerprint) -> QueryParams {
        let mut params = base.clone();
        let round_trip_time = self.rng.int_in(20, 150);
        let downlink = self.rng.choose(&DOWNLINK_CHOICES).copied().unwrap_or("10");
        let effective_type = self
            .rng
            .choose(&EFFECTIVE_TYPE_CHOICES)
            .copied()
            .unwrap_or("4g");
        let version_suffix = self.rng.int_in(1000, 9999);
        let update_suffix = self.rng.int_in(1000, 9999);

        let derived = [
            ("screen_width", fingerprint.screen_width.to_string()),
            ("screen_height", fingerprint.screen_height.to_string()),
            ("cpu_core_num", fingerprint.cpu_cores.to_string()),
            ("device_memory", fingerprint.memory_gb.to_string()),
            ("browser_platform", fingerprint.browser_platform().to_string()),
            ("browser_name", fingerprint.browser_name.clone()),
            ("browser_version", fingerprint.browser_version.clone()),
            ("engine_name", fingerprint.engine_name().to_string()),
            ("engine_version", fingerprint.browser_version.clone()),
            ("os_name", fingerprint.os_name().to_string()),
            ("os_version", fingerprint.os_version.clone()),
            ("pc_libra_divert", fingerprint.os_name().to_string()),
            ("round_trip_time", round_trip_time.to_string()),
            ("downlink", downlink.to_string()),
            ("effective_type", effective_type.to_string()),
            ("browser_online", "true".to_string()),
            ("cookie_enabled", "true".to_string()),
            ("version_code", format!("29{version_suffix}")),
            ("update_version_code", format!("17{update_suffix}")),
        ];
        for (name, value) in derived {
            params.insert(name.to_string(), value);
        }
        params
    }

    /// Sum of the three jitter components.
    #[must_use]
    pub fn compute_jitter_delay(&self) -> Duration {
        let think = self.rng.millis_in(self.jitter.think_ms);
        let network = self.rng.millis_in(self.jitter.network_ms);
        let behavior = self.rng.millis_in(self.jitter.behavior_ms);
        let total = Duration::from_millis(think + network + behavior);
        debug!(
            think_ms = think,
            network_ms = network,
            behavior_ms = behavior,
            total_ms = u64::try_from(total.as_millis()).unwrap_or(u64::MAX),
            "request jitter"
        );
        total
    }

    /// Heuristic check that `cookie` looks like a logged-in web session.
    #[must_use]
    pub fn is_cookie_plausible(cookie: &str) -> bool {
        if cookie.len() < MIN_COOKIE_LEN {
            warn!(len = cookie.len(), min = MIN_COOKIE_LEN, "session cookie too short");
            return false;
        }
        if let Some(missing) = REQUIRED_COOKIE_FIELDS
            .iter()
            .find(|field| !cookie.contains(*field))
        {
            warn!(field = missing, "session cookie missing required field");
            return false;
        }
        debug!("session cookie looks plausible");
        true
    }

    /// Logs the client profile about to be sent.
    pub fn log_detection_attempt(url: &str, headers: &HeaderFields, params: &QueryParams) {
        let field = |key: &str| params.get(key).map_or("n/a", String::as_str);
        debug!(
            url,
            user_agent = headers.get("User-Agent").map_or("n/a", String::as_str),
            screen = %format!("{}x{}", field("screen_width"), field("screen_height")),
            cpu_cores = field("cpu_core_num"),
            memory_gb = field("device_memory"),
            network = field("effective_type"),
            rtt_ms = field("round_trip_time"),
            "anti-detection request profile"
        );
    }
}
