//! Configuration and payload builders shared by the integration suites.

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{Value, json};
use vidmeta_core::config::{FetchConfig, PacingConfig, PlatformConfig, TransportConfig};
use vidmeta_core::strategy::StrategyContext;
use vidmeta_core::transport::TransportClient;

/// Identifier used across the suites.
pub const ITEM_ID: &str = "7345678901234567890";

/// A configuration whose every origin points at `origin`, with no pauses,
/// short timeouts and a fixed seed.
pub fn mock_config(origin: &str) -> FetchConfig {
    FetchConfig {
        transport: TransportConfig {
            max_retries: 2,
            timeout_ms: 1_000,
            connect_retries: 0,
            ..TransportConfig::default()
        },
        platform: PlatformConfig::default().with_all_origins(origin),
        pacing: PacingConfig::immediate(),
        seed: Some(7),
        ..FetchConfig::default()
    }
}

pub fn transport_for(config: &FetchConfig) -> Arc<TransportClient> {
    Arc::new(TransportClient::new(&config.transport).unwrap())
}

pub fn context_for(config: &FetchConfig) -> StrategyContext {
    StrategyContext::from_config(config, transport_for(config)).unwrap()
}

/// A detail document large enough to pass every size gate.
pub fn detail_document(id: &str) -> Value {
    json!({
        "status_code": 0,
        "aweme_detail": {
            "aweme_id": id,
            "desc": "a walk along the river at dusk with friends",
            "create_time": 1_700_000_000,
            "author": {"nickname": "riverwalker", "unique_id": "rw_2024"},
            "video": {"play_addr": {"url_list": ["https://cdn.example/v/1.mp4"]}},
            "statistics": {"digg_count": 1200, "comment_count": 34, "share_count": 5}
        }
    })
}

/// An HTML page carrying `state` in a router-data assignment.
pub fn page_with_state(state: &Value) -> String {
    format!(
        "<!doctype html><html><head><title>item</title></head><body>\
         <div id=\"root\"></div>\
         <script>window._ROUTER_DATA = {state};</script>\
         </body></html>"
    )
}
