//! Write and read actions on one worksheet.

use core_runtime::config::{ConnectorConfig, Dimension, SheetMode, WorksheetRef};
use core_runtime::context::CallContext;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{info, instrument, warn, Instrument};

use crate::a1;
use crate::connector::GoogleSheetsConnector;
use crate::error::{Result, SheetsError};
use crate::rows::{self, cell_text, RecordLayout};

/// Outcome of an action, emitted by the host as one data event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionResult {
    pub body: Value,
}

impl ActionResult {
    fn new(body: impl Serialize) -> Result<Self> {
        let body = serde_json::to_value(body)
            .map_err(|e| SheetsError::ParseError(format!("Failed to serialize result: {}", e)))?;
        Ok(Self { body })
    }
}

/// Worksheet content split into layout and data slices.
struct SheetContent {
    layout: RecordLayout,
    data: Vec<Vec<Value>>,
    /// Slice number of `data[0]`
    first_data_slice: usize,
}

pub struct SheetActions {
    connector: GoogleSheetsConnector,
    spreadsheet_id: String,
    worksheet: WorksheetRef,
    dimension: Dimension,
    mode: SheetMode,
    upsert_criteria: Option<String>,
}

impl SheetActions {
    pub fn new(connector: GoogleSheetsConnector, config: &ConnectorConfig) -> Result<Self> {
        Ok(Self {
            connector,
            spreadsheet_id: config.require_spreadsheet_id()?.to_string(),
            worksheet: config.require_worksheet()?.clone(),
            dimension: config.dimension,
            mode: config.mode,
            upsert_criteria: config.upsert_criteria.clone(),
        })
    }

    /// Append the message as a new slice after the last one.
    pub async fn add_row(&self, ctx: &CallContext, message: &Value) -> Result<ActionResult> {
        self.connector.ensure_context(ctx)?;
        self.append_message(message).instrument(ctx.span.clone()).await
    }

    /// Update the single slice whose criteria field equals the message's,
    /// or append the message when none does.
    ///
    /// # Errors
    ///
    /// [`SheetsError::AmbiguousMatch`] when several slices match; nothing is
    /// written in that case.
    pub async fn upsert_row(&self, ctx: &CallContext, message: &Value) -> Result<ActionResult> {
        self.connector.ensure_context(ctx)?;
        self.upsert_message(message).instrument(ctx.span.clone()).await
    }

    /// Every record of the worksheet up to the first empty slice.
    pub async fn read_sheet(&self, ctx: &CallContext) -> Result<ActionResult> {
        self.connector.ensure_context(ctx)?;
        self.read_records().instrument(ctx.span.clone()).await
    }

    #[instrument(skip(self, message), fields(spreadsheet_id = %self.spreadsheet_id, worksheet = %self.worksheet))]
    async fn append_message(&self, message: &Value) -> Result<ActionResult> {
        let record = message_object(message)?;
        let title = self.title().await?;

        let layout = match self.mode {
            SheetMode::Header => {
                let header = self
                    .connector
                    .get_values(
                        &self.spreadsheet_id,
                        &a1::slice_range(&title, self.dimension, 1)?,
                        self.dimension,
                    )
                    .await?;
                RecordLayout::from_header(self.dimension, header.values.first())?
            }
            SheetMode::Array => RecordLayout::positional(self.dimension),
        };

        let slice = layout.to_slice(record)?;
        let appended = self
            .connector
            .append_values(
                &self.spreadsheet_id,
                &a1::sheet_range(&title),
                self.dimension,
                vec![slice],
            )
            .await?;

        ActionResult::new(appended)
    }

    #[instrument(skip(self, message), fields(spreadsheet_id = %self.spreadsheet_id, worksheet = %self.worksheet))]
    async fn upsert_message(&self, message: &Value) -> Result<ActionResult> {
        let record = message_object(message)?;
        let criteria = self
            .upsert_criteria
            .as_deref()
            .ok_or(core_runtime::Error::MissingField("upsertCriteria"))?;
        let wanted = record.get(criteria).map(cell_text).ok_or_else(|| {
            SheetsError::Configuration(format!(
                "message has no value for upsert criteria '{}'",
                criteria
            ))
        })?;

        let title = self.title().await?;
        let content = self.read_content(&title).await?;

        if let Some(keys) = content.layout.header_keys() {
            if !keys.iter().any(|k| k == criteria) {
                return Err(SheetsError::Configuration(format!(
                    "upsert criteria '{}' is not a column of the sheet",
                    criteria
                )));
            }
        }

        let matches: Vec<usize> = rows::reshape(&content.layout, &content.data)?
            .into_iter()
            .filter(|(_, existing)| existing.get(criteria).map(cell_text).as_deref() == Some(wanted.as_str()))
            .map(|(offset, _)| offset)
            .collect();

        let slice = content.layout.to_slice(record)?;

        match matches.as_slice() {
            [] => {
                info!(criteria, "No matching slice, appending");
                let appended = self
                    .connector
                    .append_values(
                        &self.spreadsheet_id,
                        &a1::sheet_range(&title),
                        self.dimension,
                        vec![slice],
                    )
                    .await?;
                ActionResult::new(appended)
            }
            [offset] => {
                let slice_number = content.first_data_slice + offset;
                info!(criteria, slice_number, "Updating matching slice");
                let updated = self
                    .connector
                    .update_values(
                        &self.spreadsheet_id,
                        &a1::slice_range(&title, self.dimension, slice_number)?,
                        self.dimension,
                        vec![slice],
                    )
                    .await?;
                ActionResult::new(updated)
            }
            several => {
                warn!(criteria, count = several.len(), "Upsert criteria is ambiguous");
                Err(SheetsError::AmbiguousMatch {
                    criteria: criteria.to_string(),
                    value: wanted,
                    count: several.len(),
                })
            }
        }
    }

    #[instrument(skip(self), fields(spreadsheet_id = %self.spreadsheet_id, worksheet = %self.worksheet))]
    async fn read_records(&self) -> Result<ActionResult> {
        let title = self.title().await?;
        let content = self.read_content(&title).await?;

        let records: Vec<Value> = rows::reshape(&content.layout, &content.data)?
            .into_iter()
            .map(|(_, record)| Value::Object(record))
            .collect();

        info!(records = records.len(), "Read worksheet");
        Ok(ActionResult {
            body: json!({ "records": records }),
        })
    }

    async fn title(&self) -> Result<String> {
        self.connector
            .resolve_worksheet_title(&self.spreadsheet_id, &self.worksheet)
            .await
    }

    async fn read_content(&self, title: &str) -> Result<SheetContent> {
        let range = self
            .connector
            .get_values(&self.spreadsheet_id, &a1::sheet_range(title), self.dimension)
            .await?;
        let mut slices = range.values;

        match self.mode {
            SheetMode::Header => {
                let layout = RecordLayout::from_header(self.dimension, slices.first())?;
                slices.remove(0);
                Ok(SheetContent {
                    layout,
                    data: slices,
                    first_data_slice: 2,
                })
            }
            SheetMode::Array => Ok(SheetContent {
                layout: RecordLayout::positional(self.dimension),
                data: slices,
                first_data_slice: 1,
            }),
        }
    }
}

fn message_object(message: &Value) -> Result<&Map<String, Value>> {
    match message {
        Value::Object(record) if !record.is_empty() => Ok(record),
        Value::Object(_) => Err(SheetsError::Configuration(
            "message body has no fields".to_string(),
        )),
        _ => Err(SheetsError::Configuration(
            "message body must be a JSON object".to_string(),
        )),
    }
}
