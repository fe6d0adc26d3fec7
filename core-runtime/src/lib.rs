//! # Core Runtime Module
//!
//! Foundational runtime pieces shared by the auth and provider crates:
//! - Validated connector configuration
//! - Per-invocation call context
//! - Typed event sink replacing the host's `emit` callback
//! - Logging and tracing bootstrap
//!
//! ## Overview
//!
//! The host runtime invokes a trigger or an action with a message, a raw
//! configuration object and, for triggers, a persisted snapshot. This crate
//! turns the configuration into a [`ConnectorConfig`](config::ConnectorConfig)
//! once at entry and gives the rest of the connector an explicit
//! [`CallContext`](context::CallContext) instead of ambient callbacks.

pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{ConnectorConfig, Dimension, QuotaConfig, SheetMode, WorksheetRef};
pub use context::CallContext;
pub use error::{Error, Result};
pub use events::{CollectingSink, ConnectorEvent, EventSink};
