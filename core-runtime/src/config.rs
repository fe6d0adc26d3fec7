//! # Connector Configuration
//!
//! Typed, validated view of the configuration object the host runtime passes
//! to every trigger and action invocation.
//!
//! ## Overview
//!
//! The host hands over an untyped JSON object. It is parsed and validated
//! exactly once, at entry, into a [`ConnectorConfig`]. Everything downstream
//! works with named fields and explicit defaults; invalid values fail fast
//! with [`Error::Config`] before any network call is made.
//!
//! ## Usage
//!
//! ```
//! use core_runtime::config::{ConnectorConfig, Dimension, SheetMode};
//!
//! let config = ConnectorConfig::from_value(&serde_json::json!({
//!     "secretId": "5f1d0c",
//!     "spreadsheetId": "1BxiMVs0XRA5nFMdKvBdBZjgmUUqptlbs74OgvE2upms",
//!     "worksheetName": "Class Data",
//!     "dimension": "ROWS",
//!     "includeHeader": "yes"
//! }))
//! .expect("valid configuration");
//!
//! assert_eq!(config.dimension, Dimension::Rows);
//! assert_eq!(config.mode, SheetMode::Header);
//! assert_eq!(config.quota.delay_millis().unwrap(), 200);
//! ```
//!
//! ### Builder
//!
//! ```
//! use core_runtime::config::{ConnectorConfig, QuotaConfig};
//!
//! let config = ConnectorConfig::builder()
//!     .secret_id("5f1d0c")
//!     .spreadsheet_id("sheet-1")
//!     .worksheet_name("Sheet1")
//!     .quota(QuotaConfig::new(60_000, 60))
//!     .build()
//!     .expect("valid configuration");
//!
//! assert_eq!(config.quota.delay_millis().unwrap(), 1000);
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Hard ceiling for the pause between two outbound calls (19 minutes).
pub const MAX_DELAY_BETWEEN_CALLS_MS: i64 = 1_140_000;

/// Default quota window: Sheets API "per 100 seconds" buckets.
pub const DEFAULT_QUOTA_WINDOW_MS: i64 = 100_000;

/// Default number of calls allowed per quota window.
pub const DEFAULT_QUOTA_CALL_BUDGET: i64 = 500;

/// Default attempt count handed to the HTTP collaborator's retry policy.
pub const DEFAULT_RETRY_COUNT: u32 = 3;

/// Major dimension used when reading and writing values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Dimension {
    /// Row-major: each slice is a spreadsheet row
    #[default]
    #[serde(rename = "ROWS", alias = "rows")]
    Rows,
    /// Column-major: each slice is a spreadsheet column
    #[serde(rename = "COLUMNS", alias = "columns")]
    Columns,
}

impl Dimension {
    /// Value of the `majorDimension` query parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Rows => "ROWS",
            Dimension::Columns => "COLUMNS",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How slices are turned into keyed records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SheetMode {
    /// First row (or column) holds the field names
    #[default]
    Header,
    /// No header; keys are positional letters (rows) or numbers (columns)
    Array,
}

impl SheetMode {
    pub fn includes_header(&self) -> bool {
        matches!(self, SheetMode::Header)
    }
}

/// Worksheet selector: the numeric sheet id, the tab title, or both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorksheetRef {
    Id(i64),
    Name(String),
}

impl fmt::Display for WorksheetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorksheetRef::Id(id) => write!(f, "sheetId={}", id),
            WorksheetRef::Name(name) => write!(f, "{}", name),
        }
    }
}

/// Rate quota: `call_budget` calls per `window_millis`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaConfig {
    pub window_millis: i64,
    pub call_budget: i64,
}

impl QuotaConfig {
    pub fn new(window_millis: i64, call_budget: i64) -> Self {
        Self {
            window_millis,
            call_budget,
        }
    }

    /// Pacing delay in milliseconds, `window_millis / call_budget`.
    ///
    /// # Errors
    ///
    /// - `call_budget` is zero or negative
    /// - the delay is negative or above [`MAX_DELAY_BETWEEN_CALLS_MS`]
    pub fn delay_millis(&self) -> Result<i64> {
        if self.call_budget <= 0 {
            return Err(Error::Config(format!(
                "Quota call budget must be greater than 0, got {}",
                self.call_budget
            )));
        }

        let delay = self.window_millis / self.call_budget;

        if delay < 0 {
            return Err(Error::Config(format!(
                "Delay between calls cannot be negative, got {}ms",
                delay
            )));
        }

        if delay > MAX_DELAY_BETWEEN_CALLS_MS {
            return Err(Error::Config(format!(
                "Delay between calls of {}ms exceeds maximum of {}ms",
                delay, MAX_DELAY_BETWEEN_CALLS_MS
            )));
        }

        Ok(delay)
    }

    /// Validated delay as a [`Duration`]
    pub fn delay(&self) -> Result<Duration> {
        // delay_millis guarantees a non-negative value
        self.delay_millis().map(|ms| Duration::from_millis(ms as u64))
    }
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self::new(DEFAULT_QUOTA_WINDOW_MS, DEFAULT_QUOTA_CALL_BUDGET)
    }
}

/// Validated connector configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorConfig {
    /// Opaque id of the OAuth secret held by the host vault
    pub secret_id: String,
    pub spreadsheet_id: Option<String>,
    pub worksheet: Option<WorksheetRef>,
    pub dimension: Dimension,
    pub mode: SheetMode,
    pub quota: QuotaConfig,
    pub retry_count: u32,
    /// Record key whose value identifies the row to update in upserts
    pub upsert_criteria: Option<String>,
}

impl ConnectorConfig {
    pub fn builder() -> ConnectorConfigBuilder {
        ConnectorConfigBuilder::default()
    }

    /// Parse and validate the host's raw configuration object.
    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        let raw: RawConfig = serde_json::from_value(value.clone())
            .map_err(|e| Error::Config(format!("Malformed configuration: {}", e)))?;

        let mut builder = ConnectorConfigBuilder {
            secret_id: raw.secret_id,
            spreadsheet_id: raw.spreadsheet_id,
            worksheet_id: raw.worksheet_id.map(IdValue::into_id).transpose()?,
            worksheet_name: raw.worksheet_name,
            dimension: raw.dimension,
            mode: raw.mode,
            quota: None,
            retry_count: raw.retry_count,
            upsert_criteria: raw.upsert_criteria,
        };

        if let Some(include) = raw.include_header {
            let mode = if include.is_yes() {
                SheetMode::Header
            } else {
                SheetMode::Array
            };
            if builder.mode.is_some_and(|m| m != mode) {
                return Err(Error::Config(
                    "`includeHeader` contradicts `mode`".to_string(),
                ));
            }
            builder.mode = Some(mode);
        }

        if raw.quota_window_millis.is_some() || raw.quota_call_budget.is_some() {
            builder.quota = Some(QuotaConfig::new(
                raw.quota_window_millis.unwrap_or(DEFAULT_QUOTA_WINDOW_MS),
                raw.quota_call_budget.unwrap_or(DEFAULT_QUOTA_CALL_BUDGET),
            ));
        }

        builder.build()
    }

    /// Spreadsheet id, or a configuration error naming the missing field
    pub fn require_spreadsheet_id(&self) -> Result<&str> {
        self.spreadsheet_id
            .as_deref()
            .ok_or(Error::MissingField("spreadsheetId"))
    }

    pub fn require_worksheet(&self) -> Result<&WorksheetRef> {
        self.worksheet
            .as_ref()
            .ok_or(Error::MissingField("worksheetId or worksheetName"))
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Secret id is not blank
    /// - Optional identifiers are not blank when present
    /// - Quota parameters produce a delay within bounds
    /// - Retry count is at least one attempt
    pub fn validate(&self) -> Result<()> {
        if self.secret_id.trim().is_empty() {
            return Err(Error::Config("Secret id cannot be empty".to_string()));
        }

        if self
            .spreadsheet_id
            .as_deref()
            .is_some_and(|id| id.trim().is_empty())
        {
            return Err(Error::Config("Spreadsheet id cannot be empty".to_string()));
        }

        if let Some(WorksheetRef::Name(name)) = &self.worksheet {
            if name.trim().is_empty() {
                return Err(Error::Config("Worksheet name cannot be empty".to_string()));
            }
        }

        if self
            .upsert_criteria
            .as_deref()
            .is_some_and(|c| c.trim().is_empty())
        {
            return Err(Error::Config(
                "Upsert criteria cannot be empty".to_string(),
            ));
        }

        self.quota.delay_millis()?;

        if self.retry_count == 0 {
            return Err(Error::Config(
                "Retry count must allow at least one attempt".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for [`ConnectorConfig`]; [`build`](Self::build) validates.
#[derive(Debug, Default)]
pub struct ConnectorConfigBuilder {
    secret_id: Option<String>,
    spreadsheet_id: Option<String>,
    worksheet_id: Option<i64>,
    worksheet_name: Option<String>,
    dimension: Option<Dimension>,
    mode: Option<SheetMode>,
    quota: Option<QuotaConfig>,
    retry_count: Option<u32>,
    upsert_criteria: Option<String>,
}

impl ConnectorConfigBuilder {
    pub fn secret_id(mut self, id: impl Into<String>) -> Self {
        self.secret_id = Some(id.into());
        self
    }

    pub fn spreadsheet_id(mut self, id: impl Into<String>) -> Self {
        self.spreadsheet_id = Some(id.into());
        self
    }

    pub fn worksheet_id(mut self, id: i64) -> Self {
        self.worksheet_id = Some(id);
        self
    }

    pub fn worksheet_name(mut self, name: impl Into<String>) -> Self {
        self.worksheet_name = Some(name.into());
        self
    }

    pub fn dimension(mut self, dimension: Dimension) -> Self {
        self.dimension = Some(dimension);
        self
    }

    pub fn mode(mut self, mode: SheetMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn quota(mut self, quota: QuotaConfig) -> Self {
        self.quota = Some(quota);
        self
    }

    pub fn retry_count(mut self, count: u32) -> Self {
        self.retry_count = Some(count);
        self
    }

    pub fn upsert_criteria(mut self, key: impl Into<String>) -> Self {
        self.upsert_criteria = Some(key.into());
        self
    }

    /// Builds the configuration, filling defaults and validating once.
    pub fn build(self) -> Result<ConnectorConfig> {
        let secret_id = self.secret_id.ok_or(Error::MissingField("secretId"))?;

        // The tab title is what A1 ranges need, so it wins when both are given
        let worksheet = match (self.worksheet_name, self.worksheet_id) {
            (Some(name), _) => Some(WorksheetRef::Name(name)),
            (None, Some(id)) => Some(WorksheetRef::Id(id)),
            (None, None) => None,
        };

        let config = ConnectorConfig {
            secret_id,
            spreadsheet_id: self.spreadsheet_id,
            worksheet,
            dimension: self.dimension.unwrap_or_default(),
            mode: self.mode.unwrap_or_default(),
            quota: self.quota.unwrap_or_default(),
            retry_count: self.retry_count.unwrap_or(DEFAULT_RETRY_COUNT),
            upsert_criteria: self.upsert_criteria,
        };

        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfig {
    secret_id: Option<String>,
    spreadsheet_id: Option<String>,
    worksheet_id: Option<IdValue>,
    worksheet_name: Option<String>,
    dimension: Option<Dimension>,
    mode: Option<SheetMode>,
    include_header: Option<YesNo>,
    quota_window_millis: Option<i64>,
    quota_call_budget: Option<i64>,
    retry_count: Option<u32>,
    upsert_criteria: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IdValue {
    Number(i64),
    Text(String),
}

impl IdValue {
    fn into_id(self) -> Result<i64> {
        match self {
            IdValue::Number(id) => Ok(id),
            IdValue::Text(text) => text.trim().parse().map_err(|_| {
                Error::Config(format!("Worksheet id must be numeric, got {:?}", text))
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum YesNo {
    Flag(bool),
    Text(String),
}

impl YesNo {
    fn is_yes(&self) -> bool {
        match self {
            YesNo::Flag(flag) => *flag,
            YesNo::Text(text) => matches!(text.to_ascii_lowercase().as_str(), "yes" | "true"),
        }
    }
}
