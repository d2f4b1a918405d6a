//! Session token (`msToken`) issuance with a local surrogate.

use serde::Serialize;
use serde_json::json;
use tracing::{info, instrument, warn};

use super::{SignatureSynthesizer, SynthesisError};
use crate::config::TokenIssuerConfig;
use crate::transport::{FetchRequest, Route, TransportClient};

/// Cookie carrying the issued token.
pub const SESSION_TOKEN_COOKIE: &str = "msToken";

/// Length of a locally generated token.
pub const SURROGATE_TOKEN_LEN: usize = 120;

const ACCEPTED_TOKEN_LENS: [usize; 2] = [120, 128];

/// Where a session token came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenProvenance {
    /// Issued by the remote endpoint.
    Issued,
    /// Generated locally after the issuer failed.
    Surrogate,
}

/// A session token value with its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    /// Token text.
    pub value: String,
    /// Whether the issuer or the surrogate path produced it.
    pub provenance: TokenProvenance,
}

impl SessionToken {
    /// True when the value is a local surrogate.
    #[must_use]
    pub fn is_surrogate(&self) -> bool {
        self.provenance == TokenProvenance::Surrogate
    }
}

impl SignatureSynthesizer {
    /// Obtains a session token from the issuer, or a surrogate on any failure.
    ///
    /// Never fails: network errors, bad statuses, a missing cookie and a token
    /// of unexpected length all select a random 120-character surrogate.
    #[instrument(level = "debug", skip_all, fields(issuer = %issuer.url))]
    pub async fn synthesize_session_token(
        &self,
        transport: &TransportClient,
        issuer: &TokenIssuerConfig,
    ) -> SessionToken {
        match self.request_session_token(transport, issuer).await {
            Ok(value) => {
                info!(len = value.len(), "session token issued");
                SessionToken {
                    value,
                    provenance: TokenProvenance::Issued,
                }
            }
            Err(error) => {
                warn!(error = %error, "session token issuance failed, using surrogate token");
                SessionToken {
                    value: self.rng().alphanumeric(SURROGATE_TOKEN_LEN),
                    provenance: TokenProvenance::Surrogate,
                }
            }
        }
    }

    async fn request_session_token(
        &self,
        transport: &TransportClient,
        issuer: &TokenIssuerConfig,
    ) -> Result<String, SynthesisError> {
        let payload = json!({
            "magic": issuer.magic,
            "version": issuer.version,
            "dataType": issuer.data_type,
            "strData": issuer.str_data,
            "tspFromClient": self.now_millis(),
        });
        let request = FetchRequest::post(&issuer.url, payload.to_string())
            .header("User-Agent", &issuer.user_agent)
            .header("Content-Type", "application/json")
            .route(Route::Proxied)
            .max_retries(1);

        let envelope = transport
            .fetch_raw(&request)
            .await
            .map_err(|error| SynthesisError::TokenRejected {
                reason: error.to_string(),
            })?;

        let token = envelope
            .cookie(SESSION_TOKEN_COOKIE)
            .ok_or_else(|| SynthesisError::TokenRejected {
                reason: format!("no `{SESSION_TOKEN_COOKIE}` cookie in response"),
            })?;

        if !ACCEPTED_TOKEN_LENS.contains(&token.len()) {
            return Err(SynthesisError::TokenRejected {
                reason: format!("unexpected token length {}", token.len()),
            });
        }
        Ok(token.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::TransportConfig;
    use crate::profile::RandomSource;

    #[tokio::test]
    async fn test_closed_transport_yields_surrogate() {
        let transport = TransportClient::new(&TransportConfig::default()).unwrap();
        transport.close();
        let signer = SignatureSynthesizer::new(RandomSource::seeded(4));

        let token = signer
            .synthesize_session_token(&transport, &TokenIssuerConfig::default())
            .await;

        assert!(token.is_surrogate());
        assert_eq!(token.value.len(), SURROGATE_TOKEN_LEN);
        assert!(token.value.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
