//! Reshaping value slices into keyed records and back.
//!
//! A slice is one row (row-major reads) or one column (column-major reads).
//! With a header the first slice names the fields; without one the keys are
//! positional.

use core_runtime::config::Dimension;
use serde_json::{Map, Value};

use crate::a1::{column_letters_to_index, index_to_column_letters, MAX_COLUMNS, MAX_ROWS};
use crate::error::{Result, SheetsError};

/// One reshaped slice: field name to cell value
pub type Record = Map<String, Value>;

/// Field name for a header cell: the cell text with all whitespace removed
pub fn header_key(cell: &Value) -> String {
    cell_text(cell).chars().filter(|c| !c.is_whitespace()).collect()
}

/// Positional field name: `A`, `B`, ... across a row, `1`, `2`, ... down a
/// column
pub fn positional_key(dimension: Dimension, index: usize) -> String {
    match dimension {
        Dimension::Rows => index_to_column_letters(index),
        Dimension::Columns => (index + 1).to_string(),
    }
}

/// Cell position named by a positional key, `None` past the addressable
/// edge of the worksheet
fn positional_index(dimension: Dimension, key: &str) -> Option<usize> {
    match dimension {
        Dimension::Rows => column_letters_to_index(key).filter(|&index| index < MAX_COLUMNS),
        Dimension::Columns => key
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .filter(|&index| index < MAX_ROWS),
    }
}

pub fn cell_text(cell: &Value) -> String {
    match cell {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn is_empty_cell(cell: &Value) -> bool {
    match cell {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// A slice with no cells, or only empty ones, marks the end of the data
pub fn is_empty_slice(slice: &[Value]) -> bool {
    slice.iter().all(is_empty_cell)
}

/// How cell positions map to field names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordLayout {
    Header(Vec<String>),
    Positional(Dimension),
}

impl RecordLayout {
    /// Layout from the header slice.
    ///
    /// # Errors
    ///
    /// - [`SheetsError::DataShape`] when the header slice is missing or blank
    /// - [`SheetsError::Configuration`] when a header cell is empty or two
    ///   cells produce the same field name
    pub fn from_header(dimension: Dimension, header: Option<&Vec<Value>>) -> Result<Self> {
        let header = match header {
            Some(cells) if !is_empty_slice(cells) => cells,
            _ => {
                return Err(SheetsError::DataShape(
                    "expected a header in the first slice but it is empty".to_string(),
                ))
            }
        };

        let mut keys: Vec<String> = Vec::with_capacity(header.len());
        for (index, cell) in header.iter().enumerate() {
            let key = header_key(cell);
            if key.is_empty() {
                return Err(SheetsError::Configuration(format!(
                    "header cell {} is empty",
                    positional_key(dimension, index)
                )));
            }
            if keys.contains(&key) {
                return Err(SheetsError::Configuration(format!(
                    "duplicate header name '{}'",
                    key
                )));
            }
            keys.push(key);
        }

        Ok(RecordLayout::Header(keys))
    }

    pub fn positional(dimension: Dimension) -> Self {
        RecordLayout::Positional(dimension)
    }

    pub fn header_keys(&self) -> Option<&[String]> {
        match self {
            RecordLayout::Header(keys) => Some(keys),
            RecordLayout::Positional(_) => None,
        }
    }

    /// Record for one slice. Missing trailing cells become empty strings.
    pub fn to_record(&self, slice: &[Value]) -> Result<Record> {
        let mut record = Record::new();
        match self {
            RecordLayout::Header(keys) => {
                if let Some(extra) = slice
                    .iter()
                    .skip(keys.len())
                    .position(|cell| !is_empty_cell(cell))
                {
                    return Err(SheetsError::DataShape(format!(
                        "value at position {} has no header",
                        keys.len() + extra + 1
                    )));
                }
                for (index, key) in keys.iter().enumerate() {
                    let value = slice
                        .get(index)
                        .cloned()
                        .unwrap_or_else(|| Value::String(String::new()));
                    record.insert(key.clone(), value);
                }
            }
            RecordLayout::Positional(dimension) => {
                for (index, cell) in slice.iter().enumerate() {
                    record.insert(positional_key(*dimension, index), cell.clone());
                }
            }
        }
        Ok(record)
    }

    /// Cells for writing `record` back as one slice. Fields not present in
    /// the record become `null`, which the API leaves untouched.
    pub fn to_slice(&self, record: &Map<String, Value>) -> Result<Vec<Value>> {
        let mut positions = Vec::with_capacity(record.len());
        for (key, value) in record {
            let index = match self {
                RecordLayout::Header(keys) => keys.iter().position(|k| k == key),
                RecordLayout::Positional(dimension) => positional_index(*dimension, key),
            };
            let index = index.ok_or_else(|| {
                SheetsError::Configuration(format!("'{}' does not name a column of the sheet", key))
            })?;
            positions.push((index, write_value(value)));
        }

        let width = match self {
            RecordLayout::Header(keys) => keys.len(),
            RecordLayout::Positional(_) => positions.iter().map(|(i, _)| i + 1).max().unwrap_or(0),
        };
        let mut slice = vec![Value::Null; width];
        for (index, value) in positions {
            slice[index] = value;
        }
        Ok(slice)
    }
}

// The values API accepts strings, numbers and booleans only
fn write_value(value: &Value) -> Value {
    match value {
        Value::Array(_) | Value::Object(_) => Value::String(value.to_string()),
        other => other.clone(),
    }
}

/// Reshape slices in order, stopping at the first empty slice.
///
/// Returns the records together with their 0-based offset into `slices`.
pub fn reshape(layout: &RecordLayout, slices: &[Vec<Value>]) -> Result<Vec<(usize, Record)>> {
    let mut records = Vec::new();
    for (offset, slice) in slices.iter().enumerate() {
        if is_empty_slice(slice) {
            break;
        }
        records.push((offset, layout.to_record(slice)?));
    }
    Ok(records)
}
