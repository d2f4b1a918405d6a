//! Vidmeta Core Library
//!
//! Resilient metadata acquisition for short-video share links. A share URL
//! (or the text a share sheet produces) is resolved to an entity identifier,
//! then a cascade of acquisition strategies is tried in priority order until
//! one yields usable data.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`transport`] - Bounded-concurrency HTTP client with retries and status mapping
//! - [`signature`] - Request signatures, session tokens and mobile header signatures
//! - [`profile`] - Browser fingerprints, mobile devices and request jitter
//! - [`strategy`] - The individual acquisition strategies
//! - [`orchestrator`] - Entity resolution and the strategy cascade
//! - [`parser`] - URL extraction from share text
//! - [`config`] - Tunables loaded from JSON

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod orchestrator;
pub mod parser;
pub mod profile;
pub mod signature;
pub mod strategy;
pub mod transport;

// Re-export commonly used types
pub use config::{ConfigError, FetchConfig};
pub use orchestrator::{EntityId, FetchOutcome, MediaFormat, Orchestrator};
pub use parser::find_url;
pub use strategy::{PayloadQuality, Strategy, StrategyResult};
pub use transport::{ErrorKind, FetchError, TransportClient};
