//! A1 notation helpers
//!
//! Slice numbers are 1-based along the major dimension: row numbers for
//! [`Dimension::Rows`], column numbers (A = 1) for [`Dimension::Columns`].

use core_runtime::config::Dimension;

use crate::error::{Result, SheetsError};

/// Rightmost column the API addresses (`ZZZ`, 18278 columns).
pub const LAST_COLUMN: &str = "ZZZ";
pub const MAX_COLUMNS: usize = 18_278;
/// A worksheet holds at most ten million cells, so no row number goes past it.
pub const MAX_ROWS: usize = 10_000_000;

/// 0 -> A, 25 -> Z, 26 -> AA
pub fn index_to_column_letters(mut index: usize) -> String {
    let mut out = String::new();
    index += 1;
    while index > 0 {
        let rem = (index - 1) % 26;
        out.push((b'A' + rem as u8) as char);
        index = (index - 1) / 26;
    }
    out.chars().rev().collect()
}

/// A -> 0, AA -> 26; `None` for anything but upper-case ASCII letters
pub fn column_letters_to_index(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    let mut col: usize = 0;
    for ch in letters.chars() {
        if !ch.is_ascii_uppercase() {
            return None;
        }
        let v = (ch as u8 - b'A' + 1) as usize;
        col = col.checked_mul(26)?;
        col = col.checked_add(v)?;
    }
    Some(col - 1)
}

/// Quote a worksheet title for use in a range: `It's` -> `'It''s'`
pub fn quote_title(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

/// The whole worksheet
pub fn sheet_range(title: &str) -> String {
    quote_title(title)
}

/// A single slice, e.g. the header row or column
pub fn slice_range(title: &str, dimension: Dimension, slice: usize) -> Result<String> {
    let slice = checked_slice(dimension, slice)?;
    Ok(match dimension {
        Dimension::Rows => format!("{}!A{}:{}{}", quote_title(title), slice, LAST_COLUMN, slice),
        Dimension::Columns => {
            let column = index_to_column_letters(slice - 1);
            format!("{}!{}:{}", quote_title(title), column, column)
        }
    })
}

/// Every slice from `first_slice` to the end of the worksheet
pub fn slices_from(title: &str, dimension: Dimension, first_slice: usize) -> Result<String> {
    let first_slice = checked_slice(dimension, first_slice)?;
    Ok(match dimension {
        Dimension::Rows => format!("{}!A{}:{}", quote_title(title), first_slice, LAST_COLUMN),
        Dimension::Columns => format!(
            "{}!{}:{}",
            quote_title(title),
            index_to_column_letters(first_slice - 1),
            LAST_COLUMN
        ),
    })
}

fn checked_slice(dimension: Dimension, slice: usize) -> Result<usize> {
    if slice == 0 {
        return Err(SheetsError::DataShape(
            "slice numbers start at 1".to_string(),
        ));
    }
    if dimension == Dimension::Rows && slice > MAX_ROWS {
        return Err(SheetsError::DataShape(format!(
            "row {} is past the last addressable row {}",
            slice, MAX_ROWS
        )));
    }
    if dimension == Dimension::Columns && slice > MAX_COLUMNS {
        return Err(SheetsError::DataShape(format!(
            "column {} is past the last addressable column {}",
            slice, LAST_COLUMN
        )));
    }
    Ok(slice)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_letters_roundtrip_boundaries() {
        for (index, letters) in [(0, "A"), (25, "Z"), (26, "AA"), (701, "ZZ"), (702, "AAA")] {
            assert_eq!(index_to_column_letters(index), letters);
            assert_eq!(column_letters_to_index(letters), Some(index));
        }
        assert_eq!(index_to_column_letters(MAX_COLUMNS - 1), LAST_COLUMN);
    }

    #[test]
    fn rejects_non_letters() {
        assert_eq!(column_letters_to_index(""), None);
        assert_eq!(column_letters_to_index("a"), None);
        assert_eq!(column_letters_to_index("A1"), None);
    }

    #[test]
    fn quotes_titles() {
        assert_eq!(quote_title("Sheet1"), "'Sheet1'");
        assert_eq!(quote_title("Q1 Leads"), "'Q1 Leads'");
        assert_eq!(quote_title("It's"), "'It''s'");
    }

    #[test]
    fn row_ranges() {
        assert_eq!(
            slice_range("Sheet1", Dimension::Rows, 1).unwrap(),
            "'Sheet1'!A1:ZZZ1"
        );
        assert_eq!(
            slices_from("Sheet1", Dimension::Rows, 6).unwrap(),
            "'Sheet1'!A6:ZZZ"
        );
    }

    #[test]
    fn column_ranges() {
        assert_eq!(
            slice_range("Sheet1", Dimension::Columns, 1).unwrap(),
            "'Sheet1'!A:A"
        );
        assert_eq!(
            slices_from("Sheet1", Dimension::Columns, 28).unwrap(),
            "'Sheet1'!AB:ZZZ"
        );
    }

    #[test]
    fn out_of_bounds_slices() {
        assert!(slices_from("Sheet1", Dimension::Rows, 0).is_err());
        assert!(slices_from("Sheet1", Dimension::Columns, MAX_COLUMNS + 1).is_err());
        assert!(slices_from("Sheet1", Dimension::Rows, MAX_COLUMNS + 1).is_ok());
        assert!(slice_range("Sheet1", Dimension::Rows, MAX_ROWS).is_ok());
        assert!(slice_range("Sheet1", Dimension::Rows, MAX_ROWS + 1).is_err());
    }
}
