use std::path::Path;

use tracing::debug;

use crate::core::component::ComponentRecord;
use crate::core::types::{Assignment, Side};
use crate::parsing::{
    build_header_map, csv_reader, get_field, get_number, record_line, require_columns, ParseError,
};
use crate::utils::validation::{check_record_limit, MAX_PARTS};

const REQUIRED_COLUMNS: [&str; 5] = ["Ref", "Val", "PosX", "PosY", "Rot"];

/// Parse a position CSV file
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or other parse errors
/// if the content is invalid.
pub fn parse_positions_file(path: &Path) -> Result<Vec<ComponentRecord>, ParseError> {
    let content = std::fs::read_to_string(path)?;
    parse_positions_text(&content)
}

/// Parse position CSV text into parts, in file order
///
/// # Errors
///
/// Returns `ParseError::MissingColumn` if a required header is absent,
/// `ParseError::InvalidNumber` for an unparsable coordinate or rotation,
/// `ParseError::Csv` for malformed CSV, or `ParseError::TooManyRecords` if
/// the limit is exceeded.
pub fn parse_positions_text(text: &str) -> Result<Vec<ComponentRecord>, ParseError> {
    let mut rdr = csv_reader(text);
    let header_map = build_header_map(rdr.headers()?);
    require_columns(&header_map, &REQUIRED_COLUMNS)?;

    let mut parts = Vec::new();

    for (row_idx, result) in rdr.records().enumerate() {
        let record = result?;
        let line = record_line(&record, row_idx);

        let reference = get_field(&record, &header_map, "Ref");
        if reference.is_empty() {
            debug!("Skipping line {} with empty reference", line);
            continue;
        }

        if check_record_limit(parts.len(), MAX_PARTS).is_some() {
            return Err(ParseError::TooManyRecords(parts.len()));
        }

        let nozzle = get_field(&record, &header_map, "Nozzle");

        let mut part = ComponentRecord::new(reference, get_field(&record, &header_map, "Val"))
            .with_package(get_field(&record, &header_map, "Package"))
            .with_position(
                get_number(&record, &header_map, "PosX", line)?,
                get_number(&record, &header_map, "PosY", line)?,
                get_number(&record, &header_map, "Rot", line)?,
            )
            .with_side(Side::parse(get_field(&record, &header_map, "Side")))
            .with_assignment(Assignment::parse(get_field(&record, &header_map, "Station")));

        if !nozzle.is_empty() {
            part = part.with_nozzle(nozzle);
        }

        parts.push(part);
    }

    debug!("Parsed {} parts", parts.len());
    Ok(parts)
}
