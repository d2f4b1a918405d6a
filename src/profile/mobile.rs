//! Mobile app device descriptors.

use serde::{Deserialize, Serialize};

use crate::transport::{HeaderFields, QueryParams};

/// App version advertised by the mobile client.
pub const MOBILE_VERSION_CODE: &str = "290100";
/// Human-readable app version.
pub const MOBILE_VERSION_NAME: &str = "29.1.0";

/// A realistic mobile device as the native app reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MobileDevice {
    /// Model identifier.
    pub device_type: String,
    /// OS version.
    pub os_version: String,
    /// Screen resolution as `W*H`.
    pub resolution: String,
    /// Screen density.
    pub dpi: String,
    /// App user-agent.
    pub user_agent: String,
}

impl MobileDevice {
    /// True for Android app user-agents.
    #[must_use]
    pub fn is_android(&self) -> bool {
        self.user_agent.to_ascii_lowercase().contains("android")
    }

    /// `device_platform` query value.
    #[must_use]
    pub fn device_platform(&self) -> &'static str {
        if self.is_android() { "android" } else { "iphone" }
    }

    /// App id for the platform.
    #[must_use]
    pub fn app_id(&self) -> &'static str {
        if self.is_android() { "1128" } else { "1233" }
    }

    /// Distribution channel for the platform.
    #[must_use]
    pub fn channel(&self) -> &'static str {
        if self.device_type.starts_with("iPhone") {
            "App Store"
        } else {
            "googleplay"
        }
    }

    /// Query parameters for a detail request on behalf of this device.
    #[must_use]
    pub fn detail_params(&self, entity_id: &str) -> QueryParams {
        [
            ("aweme_id", entity_id),
            ("device_platform", self.device_platform()),
            ("aid", self.app_id()),
            ("version_code", MOBILE_VERSION_CODE),
            ("version_name", MOBILE_VERSION_NAME),
            ("manifest_version_code", MOBILE_VERSION_CODE),
            ("update_version_code", MOBILE_VERSION_CODE),
            ("device_type", self.device_type.as_str()),
            ("os_version", self.os_version.as_str()),
            ("resolution", self.resolution.as_str()),
            ("dpi", self.dpi.as_str()),
            ("ac", "wifi"),
            ("channel", self.channel()),
            ("app_name", "aweme"),
            ("app_type", "normal"),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
    }

    /// Headers the native app sends.
    #[must_use]
    pub fn headers(&self) -> HeaderFields {
        let mut headers = HeaderFields::new();
        headers.insert("User-Agent".to_string(), self.user_agent.clone());
        headers.insert(
            "Content-Type".to_string(),
            "application/x-www-form-urlencoded; charset=UTF-8".to_string(),
        );
        headers
    }
}

/// The built-in mobile device pool.
#[must_use]
pub fn default_mobile_devices() -> Vec<MobileDevice> {
    vec![
        MobileDevice {
            device_type: "SM-G973F".to_string(),
            os_version: "10".to_string(),
            resolution: "1080*2340".to_string(),
            dpi: "480".to_string(),
            user_agent: "com.ss.android.ugc.aweme/290100 (Linux; U; Android 10; zh_CN; SM-G973F; Build/QP1A.190711.020; Cronet/TTNetVersion:b4d74d15 2020-04-23 QuicVersion:0144d358 2020-03-24)".to_string(),
        },
        MobileDevice {
            device_type: "iPhone12,1".to_string(),
            os_version: "14.7.1".to_string(),
            resolution: "828*1792".to_string(),
            dpi: "326".to_string(),
            user_agent: "Aweme/29.1.0 (iPhone; iOS 14.7.1; Scale/2.00)".to_string(),
        },
        MobileDevice {
            device_type: "Pixel 5".to_string(),
            os_version: "11".to_string(),
            resolution: "1080*2340".to_string(),
            dpi: "432".to_string(),
            user_agent: "com.ss.android.ugc.aweme/290100 (Linux; U; Android 11; zh_CN; Pixel 5; Build/RQ3A.210905.001; Cronet/TTNetVersion:b4d74d15 2020-04-23 QuicVersion:0144d358 2020-03-24)".to_string(),
        },
    ]
}
