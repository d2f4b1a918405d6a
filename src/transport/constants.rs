//! Constants for the transport module (retry budgets, timeouts, pool sizes).

use std::time::Duration;

/// Default business-level retry budget per request.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default connection-level retry budget (connect failures only).
pub const DEFAULT_CONNECT_RETRIES: u32 = 5;

/// Default cap on pooled idle connections per host.
pub const DEFAULT_MAX_CONNECTIONS: usize = 50;

/// Default cap on concurrently admitted requests.
pub const DEFAULT_MAX_TASKS: usize = 50;

/// Default per-attempt timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Maximum redirect hops followed per request.
pub const MAX_REDIRECTS: usize = 10;

/// Maximum Retry-After value honored (1 hour).
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(3600);

/// Number of body characters included in error logs.
pub const BODY_PREVIEW_CHARS: usize = 200;
