//! Dynamic metadata and select models for host configuration screens.

use std::collections::BTreeMap;

use core_runtime::config::{ConnectorConfig, Dimension, SheetMode};
use serde_json::{json, Map, Value};
use tracing::instrument;

use crate::a1;
use crate::connector::GoogleSheetsConnector;
use crate::error::Result;
use crate::rows::{cell_text, positional_key, RecordLayout};

/// Out-schema for records produced from `header`.
///
/// Duplicate or empty header names are configuration errors, the same way
/// they are when reshaping records.
pub fn describe_header(dimension: Dimension, header: &[Value]) -> Result<Value> {
    let header = header.to_vec();
    let layout = RecordLayout::from_header(dimension, Some(&header))?;

    let mut properties = Map::new();
    if let Some(keys) = layout.header_keys() {
        for (key, cell) in keys.iter().zip(&header) {
            properties.insert(
                key.clone(),
                json!({ "type": "string", "title": cell_text(cell).trim() }),
            );
        }
    }

    Ok(object_schema(properties))
}

/// Out-schema for positional records `width` cells wide.
pub fn describe_positional(dimension: Dimension, width: usize) -> Value {
    let mut properties = Map::new();
    for index in 0..width {
        let key = positional_key(dimension, index);
        properties.insert(key.clone(), json!({ "type": "string", "title": key }));
    }
    object_schema(properties)
}

fn object_schema(properties: Map<String, Value>) -> Value {
    json!({ "type": "object", "properties": properties })
}

/// Read the first slice of the configured worksheet and describe the
/// records the trigger and actions will produce.
#[instrument(skip(connector, config))]
pub async fn out_metadata(connector: &GoogleSheetsConnector, config: &ConnectorConfig) -> Result<Value> {
    let spreadsheet_id = config.require_spreadsheet_id()?;
    let title = connector
        .resolve_worksheet_title(spreadsheet_id, config.require_worksheet()?)
        .await?;

    let first = connector
        .get_values(
            spreadsheet_id,
            &a1::slice_range(&title, config.dimension, 1)?,
            config.dimension,
        )
        .await?;
    let first_slice = first.values.into_iter().next().unwrap_or_default();

    match config.mode {
        SheetMode::Header => describe_header(config.dimension, &first_slice),
        SheetMode::Array => Ok(describe_positional(config.dimension, first_slice.len())),
    }
}

/// Spreadsheet id to name, for the spreadsheet picker
pub async fn spreadsheet_options(connector: &GoogleSheetsConnector) -> Result<BTreeMap<String, String>> {
    Ok(connector
        .list_spreadsheets()
        .await?
        .into_iter()
        .map(|file| (file.id, file.name))
        .collect())
}

/// Worksheet title to title, for the worksheet picker
pub async fn worksheet_options(
    connector: &GoogleSheetsConnector,
    spreadsheet_id: &str,
) -> Result<BTreeMap<String, String>> {
    Ok(connector
        .list_worksheets(spreadsheet_id)
        .await?
        .into_iter()
        .map(|sheet| (sheet.title.clone(), sheet.title))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SheetsError;

    #[test]
    fn test_describe_header() {
        let schema =
            describe_header(Dimension::Rows, &[json!("First Name"), json!("Email")]).unwrap();

        assert_eq!(
            schema,
            json!({
                "type": "object",
                "properties": {
                    "FirstName": { "type": "string", "title": "First Name" },
                    "Email": { "type": "string", "title": "Email" }
                }
            })
        );
    }

    #[test]
    fn test_duplicate_header_rejected() {
        let result = describe_header(Dimension::Rows, &[json!("Email"), json!("E mail")]);
        assert!(matches!(result, Err(SheetsError::Configuration(_))));
    }

    #[test]
    fn test_blank_header_rejected() {
        let result = describe_header(Dimension::Rows, &[]);
        assert!(matches!(result, Err(SheetsError::DataShape(_))));
    }

    #[test]
    fn test_describe_positional_columns() {
        let schema = describe_positional(Dimension::Columns, 2);

        assert_eq!(
            schema["properties"],
            json!({
                "1": { "type": "string", "title": "1" },
                "2": { "type": "string", "title": "2" }
            })
        );
    }
}
