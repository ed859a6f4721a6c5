use std::path::Path;

use tracing::{debug, warn};

use crate::core::station::{StationRecord, DEFAULT_NOZZLE};
use crate::parsing::{
    build_header_map, csv_reader, get_field, get_number, record_line, require_columns, ParseError,
};
use crate::utils::validation::{check_record_limit, MAX_STATIONS};

const REQUIRED_COLUMNS: [&str; 2] = ["ID", "Note"];

/// Station catalog encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationFormat {
    Csv,
    Json,
}

impl StationFormat {
    /// JSON for a `.json` extension, CSV for anything else
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        if is_json {
            Self::Json
        } else {
            Self::Csv
        }
    }

    /// Guess from content: a leading `[` means a JSON array
    #[must_use]
    pub fn sniff(text: &str) -> Self {
        if text.trim_start_matches('\u{feff}').trim_start().starts_with('[') {
            Self::Json
        } else {
            Self::Csv
        }
    }
}

/// Parse a station catalog file, choosing the format from the extension
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or other parse errors
/// if the content is invalid.
pub fn parse_stations_file(path: &Path) -> Result<Vec<StationRecord>, ParseError> {
    let content = std::fs::read_to_string(path)?;
    parse_stations(&content, StationFormat::from_path(path))
}

/// Parse station catalog text in the given format
///
/// # Errors
///
/// Returns the errors of [`parse_stations_text`] or [`parse_stations_json`].
pub fn parse_stations(text: &str, format: StationFormat) -> Result<Vec<StationRecord>, ParseError> {
    match format {
        StationFormat::Csv => parse_stations_text(text),
        StationFormat::Json => parse_stations_json(text),
    }
}

/// Parse a station table exported as CSV, in file order
///
/// Stations get nozzle `1` unless a `Nozzle` column names one.
///
/// # Errors
///
/// Returns `ParseError::MissingColumn` if `ID` or `Note` is absent,
/// `ParseError::InvalidNumber` for an unparsable feed parameter,
/// `ParseError::Csv` for malformed CSV, or `ParseError::TooManyRecords` if
/// the limit is exceeded.
pub fn parse_stations_text(text: &str) -> Result<Vec<StationRecord>, ParseError> {
    let mut rdr = csv_reader(text);
    let header_map = build_header_map(rdr.headers()?);
    require_columns(&header_map, &REQUIRED_COLUMNS)?;

    let mut stations = Vec::new();

    for (row_idx, result) in rdr.records().enumerate() {
        let record = result?;
        let line = record_line(&record, row_idx);

        let id = get_field(&record, &header_map, "ID");
        if id.is_empty() {
            continue;
        }

        if check_record_limit(stations.len(), MAX_STATIONS).is_some() {
            return Err(ParseError::TooManyRecords(stations.len()));
        }

        let number = |field: &str| get_number(&record, &header_map, field, line);
        let free_text = |field: &str| get_field(&record, &header_map, field).to_string();

        let nozzle = match get_field(&record, &header_map, "Nozzle") {
            "" => DEFAULT_NOZZLE.to_string(),
            n => n.to_string(),
        };

        stations.push(StationRecord {
            delta_x: number("DeltX")?,
            delta_y: number("DeltY")?,
            feed_rate: number("FeedRates")?,
            height: number("Height")?,
            speed: free_text("Speed"),
            status: free_text("Status"),
            size_x: free_text("SizeX"),
            size_y: free_text("SizeY"),
            height_take: number("HeightTake")?,
            delay_take: number("DelayTake")?,
            rotation: number("Rotation")?,
            ..StationRecord::new(id, get_field(&record, &header_map, "Note"))
                .with_nozzle(Some(nozzle))
        });
    }

    debug!("Parsed {} stations from CSV", stations.len());
    Ok(stations)
}

/// Parse a JSON array of station objects keyed like the machine's table
///
/// # Errors
///
/// Returns `ParseError::Json` if the text is not an array of stations, or
/// `ParseError::TooManyRecords` if the limit is exceeded.
pub fn parse_stations_json(text: &str) -> Result<Vec<StationRecord>, ParseError> {
    let stations: Vec<StationRecord> =
        serde_json::from_str(text.trim_start_matches('\u{feff}'))?;

    let total = stations.len();
    let stations: Vec<StationRecord> = stations
        .into_iter()
        .filter(|s| !s.id.as_str().trim().is_empty())
        .collect();

    if total != stations.len() {
        warn!("Skipped {} stations with an empty ID", total - stations.len());
    }

    if stations.len() > MAX_STATIONS {
        return Err(ParseError::TooManyRecords(stations.len()));
    }

    debug!("Parsed {} stations from JSON", stations.len());
    Ok(stations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::StationId;

    const HEADER: &str =
        "ID,DeltX,DeltY,FeedRates,Note,Height,Speed,Status,SizeX,SizeY,HeightTake,DelayTake,Rotation";

    #[test]
    fn test_parse_stations_text() {
        let csv = format!(
            "{HEADER}\n1,0,0,4,10k,0.5,100,6,0,0,0,0,90\n2,0.1,-0.2,2,100n,0.5,50,6,0,0,0,0,0\n"
        );

        let stations = parse_stations_text(&csv).unwrap();
        assert_eq!(stations.len(), 2);
        assert_eq!(stations[0].id, StationId::new("1"));
        assert_eq!(stations[0].note, "10k");
        assert!((stations[0].rotation - 90.0).abs() < f64::EPSILON);
        assert_eq!(stations[0].speed, "100");
        assert_eq!(stations[0].nozzle.as_deref(), Some("1"));
        assert!((stations[1].delta_y + 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn test_nozzle_column() {
        let csv = "ID,Note,Nozzle\n1,10k,2\n2,22k,\n";
        let stations = parse_stations_text(csv).unwrap();
        assert_eq!(stations[0].nozzle.as_deref(), Some("2"));
        assert_eq!(stations[1].nozzle.as_deref(), Some("1"));
    }

    #[test]
    fn test_empty_id_rows_skipped() {
        let csv = "ID,Note\n,10k\n3,22k\n";
        let stations = parse_stations_text(csv).unwrap();
        assert_eq!(stations.len(), 1);
        assert_eq!(stations[0].id, StationId::new("3"));
    }

    #[test]
    fn test_missing_note_column() {
        assert!(matches!(
            parse_stations_text("ID,DeltX\n1,0\n"),
            Err(ParseError::MissingColumn(c)) if c == "Note"
        ));
    }

    #[test]
    fn test_invalid_number() {
        let err = parse_stations_text("ID,Note,Rotation\n1,10k,left\n").unwrap_err();
        assert!(matches!(err, ParseError::InvalidNumber { line: 2, .. }));
    }

    #[test]
    fn test_parse_stations_json() {
        let json = r#"[
            {"ID": "1", "Note": "10k", "Rotation": 90, "Nozzle": "2"},
            {"ID": "", "Note": "ghost"},
            {"ID": "2", "Note": "100n"}
        ]"#;

        let stations = parse_stations_json(json).unwrap();
        assert_eq!(stations.len(), 2);
        assert_eq!(stations[0].nozzle.as_deref(), Some("2"));
        assert_eq!(stations[1].nozzle.as_deref(), Some("1"));
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(
            StationFormat::from_path(Path::new("feeders.JSON")),
            StationFormat::Json
        );
        assert_eq!(
            StationFormat::from_path(Path::new("feeders.csv")),
            StationFormat::Csv
        );
        assert_eq!(StationFormat::from_path(Path::new("feeders")), StationFormat::Csv);
        assert_eq!(StationFormat::sniff("  [{}]"), StationFormat::Json);
        assert_eq!(StationFormat::sniff("ID,Note\n"), StationFormat::Csv);
    }
}
