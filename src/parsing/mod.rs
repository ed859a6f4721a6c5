//! Loaders for part position files and station catalogs.
//!
//! This module provides parsers for:
//!
//! - **Position files**: CSV exported by the board layout tool, one placed part per row
//! - **Station catalogs**: CSV exported from the machine's station table, or a JSON array
//!
//! ## Example
//!
//! ```rust
//! use feeder_solver::parsing::positions::parse_positions_text;
//!
//! let csv = "Ref,Val,Package,PosX,PosY,Rot,Side\nR1,10k,R_0603,10.5,20,90,top\n";
//! let parts = parse_positions_text(csv).unwrap();
//! assert_eq!(parts[0].reference, "R1");
//! ```
//!
//! ## Position Columns
//!
//! | Column | Description | Required |
//! |--------|-------------|----------|
//! | Ref | Reference designator | Yes |
//! | Val | Marking used for matching | Yes |
//! | Package | Footprint name | No |
//! | PosX, PosY | Placement position | Yes |
//! | Rot | Rotation in degrees | Yes |
//! | Side | `top` or `bottom` | No |
//! | Station | Prior assignment (`-` = ignored) | No |
//! | Nozzle | Head to place with | No |
//!
//! Header names are matched case-insensitively. Rows with an empty `Ref`
//! (or `ID` for stations) are skipped.

use std::collections::HashMap;

use csv::StringRecord;
use thiserror::Error;

pub mod positions;
pub mod stations;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing required column '{0}'")]
    MissingColumn(String),

    #[error("Invalid number on line {line} in column '{field}': '{value}'")]
    InvalidNumber {
        line: usize,
        field: String,
        value: String,
    },

    #[error("Too many records: {0} exceeds maximum allowed (100000)")]
    TooManyRecords(usize),
}

/// Lowercased header name -> column index
pub(crate) fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim().to_lowercase(), i))
        .collect()
}

/// Fail unless every column in `required` is present
pub(crate) fn require_columns(
    header_map: &HashMap<String, usize>,
    required: &[&str],
) -> Result<(), ParseError> {
    for column in required {
        if !header_map.contains_key(&column.to_lowercase()) {
            return Err(ParseError::MissingColumn((*column).to_string()));
        }
    }
    Ok(())
}

/// Trimmed field text, empty when the column or cell is absent
pub(crate) fn get_field<'r>(
    record: &'r StringRecord,
    header_map: &HashMap<String, usize>,
    field: &str,
) -> &'r str {
    header_map
        .get(&field.to_lowercase())
        .and_then(|&idx| record.get(idx))
        .map_or("", str::trim)
}

/// Parse a numeric cell; blank cells read as zero
pub(crate) fn get_number(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
    field: &str,
    line: usize,
) -> Result<f64, ParseError> {
    let text = get_field(record, header_map, field);
    if text.is_empty() {
        return Ok(0.0);
    }

    text.parse().map_err(|_| ParseError::InvalidNumber {
        line,
        field: field.to_string(),
        value: text.to_string(),
    })
}

/// 1-based line a record starts on
pub(crate) fn record_line(record: &StringRecord, row_idx: usize) -> usize {
    record
        .position()
        .and_then(|p| usize::try_from(p.line()).ok())
        .unwrap_or(row_idx + 2)
}

pub(crate) fn csv_reader(text: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.trim_start_matches('\u{feff}').as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let headers = StringRecord::from(vec!["Ref", " VAL ", "PosX"]);
        let map = build_header_map(&headers);
        let record = StringRecord::from(vec!["R1", " 10k", "1.5"]);

        assert_eq!(get_field(&record, &map, "ref"), "R1");
        assert_eq!(get_field(&record, &map, "Val"), "10k");
        assert_eq!(get_field(&record, &map, "Side"), "");
        assert!((get_number(&record, &map, "PosX", 2).unwrap() - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_require_columns() {
        let map = build_header_map(&StringRecord::from(vec!["ID", "Note"]));
        assert!(require_columns(&map, &["id", "NOTE"]).is_ok());
        assert!(matches!(
            require_columns(&map, &["ID", "Rotation"]),
            Err(ParseError::MissingColumn(c)) if c == "Rotation"
        ));
    }

    #[test]
    fn test_invalid_number_names_line() {
        let map = build_header_map(&StringRecord::from(vec!["Rot"]));
        let record = StringRecord::from(vec!["ninety"]);
        let err = get_number(&record, &map, "Rot", 7).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid number on line 7 in column 'Rot': 'ninety'"
        );
    }
}
