//! Desktop browser fingerprints.

use serde::{Deserialize, Serialize};

/// A consistent bundle of spoofed desktop client attributes.
///
/// Pool entries are never mutated; every header and parameter derived for an
/// attempt comes from one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceFingerprint {
    /// Full `User-Agent` string.
    pub user_agent: String,
    /// `Sec-Ch-Ua` brand list.
    pub sec_ch_ua: String,
    /// Operating system family: `Windows`, `macOS` or `Linux`.
    pub platform_hint: String,
    /// OS version reported in query parameters.
    pub os_version: String,
    /// Browser name reported in query parameters.
    pub browser_name: String,
    /// Browser version reported in query parameters.
    pub browser_version: String,
    /// Screen width in CSS pixels.
    pub screen_width: u32,
    /// Screen height in CSS pixels.
    pub screen_height: u32,
    /// `navigator.hardwareConcurrency`.
    pub cpu_cores: u32,
    /// `navigator.deviceMemory` in GB.
    pub memory_gb: u32,
}

impl DeviceFingerprint {
    /// Quoted `Sec-Ch-Ua-Platform` value.
    #[must_use]
    pub fn sec_ch_ua_platform(&self) -> String {
        format!("\"{}\"", self.platform_hint)
    }

    /// `navigator.platform` value matching the OS family.
    #[must_use]
    pub fn browser_platform(&self) -> &'static str {
        match self.platform_hint.as_str() {
            "macOS" => "MacIntel",
            "Linux" => "Linux x86_64",
            _ => "Win32",
        }
    }

    /// OS name as the web client reports it.
    #[must_use]
    pub fn os_name(&self) -> &'static str {
        match self.platform_hint.as_str() {
            "macOS" => "Mac OS",
            "Linux" => "Linux",
            _ => "Windows",
        }
    }

    /// Rendering engine name for the browser.
    #[must_use]
    pub fn engine_name(&self) -> &'static str {
        "Blink"
    }
}

/// The built-in fingerprint pool.
#[must_use]
pub fn default_fingerprints() -> Vec<DeviceFingerprint> {
    vec![
        DeviceFingerprint {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36".to_string(),
            sec_ch_ua: "\"Google Chrome\";v=\"131\", \"Chromium\";v=\"131\", \"Not_A Brand\";v=\"24\"".to_string(),
            platform_hint: "Windows".to_string(),
            os_version: "10".to_string(),
            browser_name: "Chrome".to_string(),
            browser_version: "131.0.0.0".to_string(),
            screen_width: 1920,
            screen_height: 1080,
            cpu_cores: 8,
            memory_gb: 8,
        },
        DeviceFingerprint {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36 Edg/130.0.0.0".to_string(),
            sec_ch_ua: "\"Chromium\";v=\"130\", \"Microsoft Edge\";v=\"130\", \"Not?A_Brand\";v=\"99\"".to_string(),
            platform_hint: "Windows".to_string(),
            os_version: "10".to_string(),
            browser_name: "Edge".to_string(),
            browser_version: "130.0.0.0".to_string(),
            screen_width: 1366,
            screen_height: 768,
            cpu_cores: 4,
            memory_gb: 8,
        },
        DeviceFingerprint {
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36".to_string(),
            sec_ch_ua: "\"Google Chrome\";v=\"131\", \"Chromium\";v=\"131\", \"Not_A Brand\";v=\"24\"".to_string(),
            platform_hint: "macOS".to_string(),
            os_version: "10.15.7".to_string(),
            browser_name: "Chrome".to_string(),
            browser_version: "131.0.0.0".to_string(),
            screen_width: 1440,
            screen_height: 900,
            cpu_cores: 8,
            memory_gb: 16,
        },
    ]
}
