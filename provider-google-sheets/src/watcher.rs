//! New-row polling trigger
//!
//! Each invocation checks the spreadsheet's modification time, reads only
//! the slices after the last emitted one and emits them as records followed
//! by an updated snapshot.

use chrono::{DateTime, Utc};
use core_runtime::config::{ConnectorConfig, Dimension, SheetMode, WorksheetRef};
use core_runtime::context::CallContext;
use core_runtime::events::ConnectorEvent;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, instrument, Instrument};

use crate::a1;
use crate::connector::GoogleSheetsConnector;
use crate::error::{Result, SheetsError};
use crate::rows::{self, Record, RecordLayout};

/// Cursor persisted by the host between invocations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatcherSnapshot {
    /// Data slices emitted so far, header excluded
    #[serde(default)]
    pub last_emitted_line: usize,

    /// Modification time observed by the last successful poll
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<DateTime<Utc>>,

    /// Spreadsheet, worksheet, dimension and mode the cursor belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl WatcherSnapshot {
    /// Snapshot from the host's stored value; `null` or absent starts fresh
    pub fn from_value(value: Option<&Value>) -> Result<Self> {
        match value {
            None | Some(Value::Null) => Ok(Self::default()),
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| SheetsError::ParseError(format!("Invalid snapshot: {}", e))),
        }
    }

    pub fn to_value(&self) -> Result<Value> {
        serde_json::to_value(self)
            .map_err(|e| SheetsError::ParseError(format!("Failed to serialize snapshot: {}", e)))
    }
}

/// Result of one poll, before anything is emitted.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The spreadsheet has not been modified since the snapshot was taken
    Unchanged,
    /// New records in sheet order and the snapshot that follows them
    Advanced {
        records: Vec<Record>,
        snapshot: WatcherSnapshot,
    },
}

/// Watches one worksheet for slices appended after the last poll.
pub struct RowDiffWatcher {
    connector: GoogleSheetsConnector,
    spreadsheet_id: String,
    worksheet: WorksheetRef,
    dimension: Dimension,
    mode: SheetMode,
}

impl RowDiffWatcher {
    pub fn new(connector: GoogleSheetsConnector, config: &ConnectorConfig) -> Result<Self> {
        Ok(Self {
            connector,
            spreadsheet_id: config.require_spreadsheet_id()?.to_string(),
            worksheet: config.require_worksheet()?.clone(),
            dimension: config.dimension,
            mode: config.mode,
        })
    }

    fn scope(&self) -> String {
        format!(
            "{}/{}/{}/{:?}",
            self.spreadsheet_id, self.worksheet, self.dimension, self.mode
        )
    }

    /// Compute new records and the next snapshot without emitting anything.
    #[instrument(skip(self, snapshot), fields(spreadsheet_id = %self.spreadsheet_id, worksheet = %self.worksheet))]
    pub async fn poll(&self, snapshot: &WatcherSnapshot) -> Result<PollOutcome> {
        let scope = self.scope();
        let snapshot = match &snapshot.scope {
            Some(previous) if *previous != scope => {
                info!(previous = %previous, "Watched worksheet changed, starting from the first slice");
                WatcherSnapshot::default()
            }
            _ => snapshot.clone(),
        };

        let modified_time = self.connector.get_modified_time(&self.spreadsheet_id).await?;
        if snapshot.modified_time == Some(modified_time) {
            debug!(%modified_time, "Spreadsheet not modified since last poll");
            return Ok(PollOutcome::Unchanged);
        }

        let title = self
            .connector
            .resolve_worksheet_title(&self.spreadsheet_id, &self.worksheet)
            .await?;

        let with_header = self.mode.includes_header();
        let first_slice = snapshot.last_emitted_line + if with_header { 2 } else { 1 };

        let mut ranges = Vec::with_capacity(2);
        if with_header {
            ranges.push(a1::slice_range(&title, self.dimension, 1)?);
        }
        ranges.push(a1::slices_from(&title, self.dimension, first_slice)?);

        let value_ranges = self
            .connector
            .batch_get(&self.spreadsheet_id, &ranges, self.dimension)
            .await?;

        let layout = if with_header {
            RecordLayout::from_header(self.dimension, value_ranges[0].values.first())?
        } else {
            RecordLayout::positional(self.dimension)
        };

        let data = value_ranges
            .last()
            .map(|range| range.values.as_slice())
            .unwrap_or_default();
        let records: Vec<Record> = rows::reshape(&layout, data)?
            .into_iter()
            .map(|(_, record)| record)
            .collect();

        let next = WatcherSnapshot {
            last_emitted_line: snapshot.last_emitted_line + records.len(),
            modified_time: Some(modified_time),
            scope: Some(scope),
        };

        info!(
            first_slice,
            new_records = records.len(),
            last_emitted_line = next.last_emitted_line,
            "Polled worksheet"
        );

        Ok(PollOutcome::Advanced {
            records,
            snapshot: next,
        })
    }

    /// Poll and emit: one data event per new record, then the snapshot, then
    /// end. A failure emits a single error event and no snapshot, so the
    /// host keeps the previous cursor.
    ///
    /// Returns the new snapshot, or `None` when the sheet was unchanged.
    pub async fn run(
        &self,
        ctx: &CallContext,
        snapshot: &WatcherSnapshot,
    ) -> Result<Option<WatcherSnapshot>> {
        let outcome = match self.connector.ensure_context(ctx) {
            Ok(()) => self.poll(snapshot).instrument(ctx.span.clone()).await,
            Err(err) => Err(err),
        };

        match outcome {
            Ok(PollOutcome::Unchanged) => {
                ctx.sink.emit(ConnectorEvent::End).await?;
                Ok(None)
            }
            Ok(PollOutcome::Advanced { records, snapshot }) => {
                for record in records {
                    ctx.sink.emit(ConnectorEvent::data(Value::Object(record))).await?;
                }
                ctx.sink
                    .emit(ConnectorEvent::Snapshot(snapshot.to_value()?))
                    .await?;
                ctx.sink.emit(ConnectorEvent::End).await?;
                Ok(Some(snapshot))
            }
            Err(err) => {
                error!(parent: &ctx.span, error = %err, "Polling worksheet failed");
                if let Err(emit_err) = ctx.sink.emit(ConnectorEvent::error(err.to_string())).await {
                    error!(parent: &ctx.span, error = %emit_err, "Failed to emit error event");
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_snapshot_from_host_value() {
        let snapshot = WatcherSnapshot::from_value(Some(&json!({
            "lastEmittedLine": 4,
            "modifiedTime": "2024-05-01T08:00:00Z"
        })))
        .unwrap();

        assert_eq!(snapshot.last_emitted_line, 4);
        assert_eq!(
            snapshot.modified_time.map(|t| t.to_rfc3339()),
            Some("2024-05-01T08:00:00+00:00".to_string())
        );
        assert_eq!(snapshot.scope, None);
    }

    #[test]
    fn test_missing_snapshot_starts_fresh() {
        assert_eq!(
            WatcherSnapshot::from_value(None).unwrap(),
            WatcherSnapshot::default()
        );
        assert_eq!(
            WatcherSnapshot::from_value(Some(&Value::Null)).unwrap(),
            WatcherSnapshot::default()
        );
        assert_eq!(
            WatcherSnapshot::from_value(Some(&json!({}))).unwrap(),
            WatcherSnapshot::default()
        );
    }

    #[test]
    fn test_malformed_snapshot() {
        let result = WatcherSnapshot::from_value(Some(&json!({ "lastEmittedLine": "four" })));
        assert!(matches!(result, Err(SheetsError::ParseError(_))));
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let snapshot = WatcherSnapshot {
            last_emitted_line: 11,
            modified_time: None,
            scope: None,
        };

        assert_eq!(snapshot.to_value().unwrap(), json!({ "lastEmittedLine": 11 }));
    }
}
