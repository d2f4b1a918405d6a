//! Wiremock startup for sandboxes that may forbid loopback sockets.

use std::env;
use std::net::TcpListener;
use std::thread;

use wiremock::MockServer;

/// Set to a truthy value to fail instead of skipping when sockets are unavailable.
const STRICT_ENV: &str = "VIDMETA_REQUIRE_SOCKET_TESTS";

fn strict() -> bool {
    env::var(STRICT_ENV).is_ok_and(|value| {
        !matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "" | "0" | "false" | "no"
        )
    })
}

/// Starts a mock server, or returns `None` when nothing can bind to loopback.
///
/// The skip is reported on stderr under the running test's name.
pub async fn mock_server_or_skip() -> Option<MockServer> {
    if TcpListener::bind(("127.0.0.1", 0)).is_ok() {
        return Some(MockServer::start().await);
    }

    let test = thread::current().name().unwrap_or("<unnamed>").to_string();
    assert!(!strict(), "{test}: loopback bind failed and {STRICT_ENV} is set");
    eprintln!("{test}: loopback bind failed, skipping mock-server test");
    None
}
