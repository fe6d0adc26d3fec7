//! # Google Sheets Provider
//!
//! Spreadsheet operations on top of the Sheets API v4 and Drive API v3.
//!
//! ## Overview
//!
//! This module provides:
//! - [`GoogleSheetsConnector`]: paced, authorized calls for values, file
//!   metadata and worksheet listing
//! - [`QuotaPacer`]: fixed delay spreading the request budget over its window
//! - [`RowDiffWatcher`]: incremental new-row trigger driven by a
//!   [`WatcherSnapshot`]
//! - [`SheetActions`]: add, upsert and read actions
//! - [`metadata`]: out-schema and select models for configuration screens

pub mod a1;
pub mod actions;
pub mod connector;
pub mod error;
pub mod metadata;
pub mod pacer;
pub mod rows;
pub mod types;
pub mod watcher;

pub use actions::{ActionResult, SheetActions};
pub use connector::GoogleSheetsConnector;
pub use error::{Result, SheetsError};
pub use pacer::QuotaPacer;
pub use rows::{Record, RecordLayout};
pub use watcher::{PollOutcome, RowDiffWatcher, WatcherSnapshot};
