//! Mobile API header signatures.

use super::md5_hex;
use crate::transport::HeaderFields;

/// Surrogate `X-Khronos` / `X-Gorgon` / `X-Ladon` header values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MobileHeaderSignatures {
    /// Unix seconds.
    pub khronos: String,
    /// First 8 hex chars of `md5("gorgon_<ts>")`.
    pub gorgon: String,
    /// First 8 hex chars of `md5("ladon_<ts>")`.
    pub ladon: String,
}

impl MobileHeaderSignatures {
    /// Derives all three values from one timestamp.
    #[must_use]
    pub fn for_timestamp(unix_secs: u64) -> Self {
        let short = |prefix: &str| md5_hex(&format!("{prefix}_{unix_secs}"))[..8].to_string();
        Self {
            khronos: unix_secs.to_string(),
            gorgon: short("gorgon"),
            ladon: short("ladon"),
        }
    }

    /// Adds the three headers to `headers`.
    pub fn apply(&self, headers: &mut HeaderFields) {
        headers.insert("X-Khronos".to_string(), self.khronos.clone());
        headers.insert("X-Gorgon".to_string(), self.gorgon.clone());
        headers.insert("X-Ladon".to_string(), self.ladon.clone());
    }
}
