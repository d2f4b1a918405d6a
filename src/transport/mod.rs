//! HTTP transport shared by every acquisition strategy.
//!
//! This module owns connection pooling, admission control, the two retry
//! budgets, response validation and typed error classification.
//!
//! # Example
//!
//! ```no_run
//! use vidmeta_core::config::TransportConfig;
//! use vidmeta_core::transport::{FetchRequest, TransportClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = TransportClient::new(&TransportConfig::default())?;
//! let value = transport
//!     .fetch_json(&FetchRequest::get("https://example.com/api/item"))
//!     .await?;
//! println!("{value}");
//! transport.close();
//! # Ok(())
//! # }
//! ```

mod client;
pub mod constants;
mod error;
pub mod json;
mod request;

pub use client::{TransportClient, parse_retry_after, shared_transport};
pub use error::{ErrorKind, FetchError};
pub use request::{
    FetchRequest, HeaderFields, Method, QueryParams, ResponseEnvelope, Route, encode_query,
    join_raw_params,
};
