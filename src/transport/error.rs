//! Error taxonomy for remote fetches.
//!
//! [`FetchError`] carries the context (URL, status, attempt counts) of each
//! failure. [`ErrorKind`] is the flat tag used for classification, diagnostics
//! and table-driven tests.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Flat classification tag for every failure the fetch pipeline can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// DNS, TLS, refused connection, or any failure before a response arrived.
    Connection,
    /// The attempt exceeded its timeout, or the remote side answered 408.
    Timeout,
    /// HTTP 401.
    Unauthorized,
    /// HTTP 404.
    NotFound,
    /// HTTP 503.
    Unavailable,
    /// HTTP 429.
    RateLimited,
    /// Any other non-2xx status.
    Response,
    /// The body could not be interpreted (no JSON, empty JSON, missing fields).
    ResponseInvalid,
    /// A retry budget ran out.
    RetryExhausted,
    /// No entity identifier could be derived from the input.
    IdNotFound,
    /// Signature synthesis fell back to a surrogate value. Recoverable.
    SignatureSynthesisDegraded,
    /// The transport was used after being closed.
    Closed,
}

impl ErrorKind {
    /// Stable label used in logs and serialized diagnostics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connection => "connection",
            Self::Timeout => "timeout",
            Self::Unauthorized => "unauthorized",
            Self::NotFound => "not_found",
            Self::Unavailable => "unavailable",
            Self::RateLimited => "rate_limited",
            Self::Response => "response",
            Self::ResponseInvalid => "response_invalid",
            Self::RetryExhausted => "retry_exhausted",
            Self::IdNotFound => "id_not_found",
            Self::SignatureSynthesisDegraded => "signature_synthesis_degraded",
            Self::Closed => "closed",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by the transport client and the orchestrator.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Network-level failure; no response was received.
    #[error(
        "connection to {url} failed: {message}\n  Suggestion: Check the network environment or proxy settings"
    )]
    Connection {
        /// The URL being requested.
        url: String,
        /// The underlying transport message.
        message: String,
    },

    /// The attempt timed out.
    #[error("timeout requesting {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// The remote side rejected the credentials (HTTP 401).
    #[error("unauthorized (HTTP 401) requesting {url}\n  Suggestion: Refresh the configured cookie")]
    Unauthorized {
        /// The URL that was rejected.
        url: String,
    },

    /// The endpoint does not exist (HTTP 404).
    #[error("not found (HTTP 404) requesting {url}")]
    NotFound {
        /// The missing URL.
        url: String,
    },

    /// The remote service is unavailable (HTTP 503).
    #[error("service unavailable (HTTP 503) requesting {url}")]
    Unavailable {
        /// The URL that was unavailable.
        url: String,
    },

    /// The remote side is throttling requests (HTTP 429).
    #[error("rate limited (HTTP 429) requesting {url}")]
    RateLimited {
        /// The throttled URL.
        url: String,
        /// Parsed `Retry-After` header, when present.
        retry_after: Option<Duration>,
    },

    /// Any other non-2xx status.
    #[error("HTTP {status} requesting {url}")]
    Response {
        /// The URL that returned the status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The response body could not be interpreted.
    #[error("invalid response from {url}: {reason}")]
    ResponseInvalid {
        /// The URL whose body was invalid.
        url: String,
        /// Why the body was rejected.
        reason: String,
    },

    /// Every allowed attempt was used without an acceptable result.
    #[error("retries exhausted for '{target}' after {attempts} attempt(s)")]
    RetryExhausted {
        /// URL or entity that was being fetched.
        target: String,
        /// Number of attempts made.
        attempts: u32,
    },

    /// No entity identifier could be derived from the input.
    #[error(
        "no entity id found in '{input}': {reason}\n  Suggestion: Pass a video or note share link"
    )]
    IdNotFound {
        /// The input that was searched.
        input: String,
        /// Why no identifier was found.
        reason: String,
    },

    /// The transport has been closed.
    #[error("transport is closed")]
    Closed,
}

impl FetchError {
    /// Creates a connection error.
    pub fn connection(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates a response-invalid error.
    pub fn response_invalid(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ResponseInvalid {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates a retry-exhausted error.
    pub fn retry_exhausted(target: impl Into<String>, attempts: u32) -> Self {
        Self::RetryExhausted {
            target: target.into(),
            attempts,
        }
    }

    /// Creates an id-not-found error.
    pub fn id_not_found(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::IdNotFound {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Maps a non-success status code to its typed error.
    ///
    /// Returns `None` for 2xx and 302, which pass through to the caller.
    #[must_use]
    pub fn from_status(url: &str, status: u16, retry_after: Option<Duration>) -> Option<Self> {
        let url = url.to_string();
        match status {
            200..=299 | 302 => None,
            404 => Some(Self::NotFound { url }),
            503 => Some(Self::Unavailable { url }),
            408 => Some(Self::Timeout { url }),
            401 => Some(Self::Unauthorized { url }),
            429 => Some(Self::RateLimited { url, retry_after }),
            _ => Some(Self::Response { url, status }),
        }
    }

    /// Returns the classification tag for this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Connection { .. } => ErrorKind::Connection,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Unavailable { .. } => ErrorKind::Unavailable,
            Self::RateLimited { .. } => ErrorKind::RateLimited,
            Self::Response { .. } => ErrorKind::Response,
            Self::ResponseInvalid { .. } => ErrorKind::ResponseInvalid,
            Self::RetryExhausted { .. } => ErrorKind::RetryExhausted,
            Self::IdNotFound { .. } => ErrorKind::IdNotFound,
            Self::Closed => ErrorKind::Closed,
        }
    }
}
