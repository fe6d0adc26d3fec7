//! Google Sheets and Drive API wire types
//!
//! Data structures for the Sheets API v4 values endpoints and the two Drive
//! API v3 calls the connector makes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sheets API `ValueRange` resource
///
/// See: https://developers.google.com/sheets/api/reference/rest/v4/spreadsheets.values#ValueRange
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    /// Range in A1 notation; the API echoes back the range it actually read
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major_dimension: Option<String>,

    /// Slices in `major_dimension` order. Trailing empty cells and slices
    /// are omitted by the API.
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
}

/// Sheets API `values:batchGet` response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchGetValuesResponse {
    pub spreadsheet_id: String,

    #[serde(default)]
    pub value_ranges: Vec<ValueRange>,
}

/// Sheets API `values.update` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateValuesResponse {
    pub spreadsheet_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_range: Option<String>,

    #[serde(default)]
    pub updated_rows: u32,

    #[serde(default)]
    pub updated_columns: u32,

    #[serde(default)]
    pub updated_cells: u32,
}

/// Sheets API `values.append` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendValuesResponse {
    pub spreadsheet_id: String,

    /// Table range the values were appended to, before the append
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_range: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updates: Option<UpdateValuesResponse>,
}

/// Sheets API `Spreadsheet` resource, reduced to sheet properties
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spreadsheet {
    #[serde(default)]
    pub sheets: Vec<Sheet>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Sheet {
    pub properties: SheetProperties,
}

/// Worksheet (tab) properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetProperties {
    /// Numeric sheet id; the first tab usually has id 0
    #[serde(default)]
    pub sheet_id: i64,

    pub title: String,

    #[serde(default)]
    pub index: i64,
}

/// Drive API file resource, as requested with `fields=id,name,modifiedTime`
///
/// See: https://developers.google.com/drive/api/v3/reference/files#resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<DateTime<Utc>>,
}

/// Drive API files.list response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilesListResponse {
    #[serde(default)]
    pub files: Vec<DriveFile>,

    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Google API error envelope
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: String,

    #[serde(default)]
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_range_without_values() {
        // The API omits `values` entirely for an empty range
        let range: ValueRange = serde_json::from_value(json!({
            "range": "Sheet1!A5:ZZZ1000",
            "majorDimension": "ROWS"
        }))
        .unwrap();

        assert!(range.values.is_empty());
        assert_eq!(range.major_dimension.as_deref(), Some("ROWS"));
    }

    #[test]
    fn test_drive_file_modified_time() {
        let file: DriveFile = serde_json::from_value(json!({
            "modifiedTime": "2024-03-01T10:15:30.123Z"
        }))
        .unwrap();

        let modified = file.modified_time.unwrap();
        assert_eq!(modified.to_rfc3339(), "2024-03-01T10:15:30.123+00:00");
    }

    #[test]
    fn test_spreadsheet_sheet_properties() {
        let spreadsheet: Spreadsheet = serde_json::from_value(json!({
            "sheets": [
                { "properties": { "sheetId": 0, "title": "Sheet1", "index": 0 } },
                { "properties": { "sheetId": 1524, "title": "Leads", "index": 1 } }
            ]
        }))
        .unwrap();

        let titles: Vec<_> = spreadsheet
            .sheets
            .iter()
            .map(|s| s.properties.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Sheet1", "Leads"]);
        assert_eq!(spreadsheet.sheets[1].properties.sheet_id, 1524);
    }
}
