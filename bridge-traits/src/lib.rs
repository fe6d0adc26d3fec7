//! # Host Bridge Traits
//!
//! Capability contracts between the connector core and the host runtime.
//!
//! ## Overview
//!
//! The connector never talks to the network or to the credential vault
//! directly. Every outbound effect goes through one of the traits below so
//! that the host (or a test) decides how it is carried out.
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - Async HTTP requests returning a status, headers and body
//! - [`SecretStore`](secrets::SecretStore) - Fetch and refresh OAuth credential material by secret id
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to host logging
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should convert transport specific failures into it and keep messages free
//! of token material.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so they can be shared behind `Arc`
//! across async tasks.

pub mod error;
pub mod http;
pub mod logging;
pub mod secrets;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use secrets::SecretStore;
