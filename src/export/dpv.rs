use chrono::{Datelike, Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::catalog::store::StationStore;
use crate::core::component::ComponentRecord;
use crate::core::station::{StationRecord, DEFAULT_NOZZLE};

/// Skip code for a component that should be placed
const SKIP_PLACE: u8 = 4;

/// Offset between board rotation and the machine's zero angle
const MACHINE_ANGLE_OFFSET: f64 = 90.0;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to write table: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Table is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Board repetition on a panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelArray {
    pub count_x: u32,
    pub count_y: u32,
    pub interval_x: f64,
    pub interval_y: f64,
}

impl Default for PanelArray {
    fn default() -> Self {
        Self {
            count_x: 1,
            count_y: 1,
            interval_x: 0.0,
            interval_y: 0.0,
        }
    }
}

/// Fiducial used to calibrate the board position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibPoint {
    pub offset_x: f64,
    pub offset_y: f64,
    pub note: Option<String>,
}

impl Default for CalibPoint {
    fn default() -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            note: Some("Origin".to_string()),
        }
    }
}

/// Linear correction applied to every coordinate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibFactor {
    pub delta_x: f64,
    pub delta_y: f64,
    pub alpha_x: f64,
    pub alpha_y: f64,
    pub beta_x: f64,
    pub beta_y: f64,
    pub delta_angle: f64,
}

impl Default for CalibFactor {
    fn default() -> Self {
        Self {
            delta_x: 0.0,
            delta_y: 0.0,
            alpha_x: 0.0,
            alpha_y: 0.0,
            beta_x: 1.0,
            beta_y: 1.0,
            delta_angle: 0.0,
        }
    }
}

/// Everything in a DPV program besides the stations and parts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportOptions {
    /// Name written on the `FILE` line
    pub file_name: String,
    /// Name written on the `PCBFILE` line
    pub pcb_file: String,
    pub panel_type: u32,
    pub panels: Vec<PanelArray>,
    pub calib_points: Vec<CalibPoint>,
    pub calib_factors: Vec<CalibFactor>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            file_name: "export.dpv".to_string(),
            pcb_file: "board".to_string(),
            panel_type: 1,
            panels: vec![PanelArray::default()],
            calib_points: vec![CalibPoint::default()],
            calib_factors: vec![CalibFactor::default()],
        }
    }
}

/// Row counts of an exported program
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    pub stations: usize,
    pub components: usize,
    /// Parts left out: unassigned, ignored, or assigned to a missing station
    pub omitted: usize,
}

/// A rendered DPV program
#[derive(Debug, Clone)]
pub struct DpvDocument {
    pub text: String,
    pub summary: ExportSummary,
}

/// Machine angle for a part placed from a station.
///
/// The sum of both rotations is shifted by -90 degrees, wrapped into
/// (-180, 180] and rounded to two decimals (halves round up). Rounding can
/// land on -180, which is folded back to 180.
#[must_use]
#[allow(clippy::float_cmp)] // Only -0.0 and 0.0 compare equal to zero here
pub fn rotate(part_rotation: f64, station_rotation: f64) -> f64 {
    let mut rot = (part_rotation + station_rotation - MACHINE_ANGLE_OFFSET) % 360.0;
    if rot > 180.0 {
        rot -= 360.0;
    } else if rot <= -180.0 {
        rot += 360.0;
    }

    let mut rounded = (rot * 100.0 + 0.5).floor() / 100.0;
    if rounded <= -180.0 {
        rounded += 360.0;
    }
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Shortest decimal form, without a trailing `.0` and never `-0`
#[allow(clippy::float_cmp)]
fn fmt_number(value: f64) -> String {
    if value == 0.0 {
        "0".to_string()
    } else {
        value.to_string()
    }
}

#[derive(Serialize)]
struct StationRow<'a> {
    #[serde(rename = "Table")]
    table: &'static str,
    #[serde(rename = "No.")]
    no: usize,
    #[serde(rename = "ID")]
    id: &'a str,
    #[serde(rename = "DeltX")]
    delta_x: String,
    #[serde(rename = "DeltY")]
    delta_y: String,
    #[serde(rename = "FeedRates")]
    feed_rate: String,
    #[serde(rename = "Note")]
    note: &'a str,
    #[serde(rename = "Height")]
    height: String,
    #[serde(rename = "Speed")]
    speed: &'a str,
    #[serde(rename = "Status")]
    status: &'a str,
    #[serde(rename = "SizeX")]
    size_x: &'a str,
    #[serde(rename = "SizeY")]
    size_y: &'a str,
    #[serde(rename = "HeightTake")]
    height_take: String,
    #[serde(rename = "DelayTake")]
    delay_take: String,
    #[serde(rename = "Rotation")]
    rotation: String,
}

#[derive(Serialize)]
struct ComponentRow<'a> {
    #[serde(rename = "Table")]
    table: &'static str,
    #[serde(rename = "No.")]
    no: usize,
    #[serde(rename = "ID")]
    id: usize,
    #[serde(rename = "PHead")]
    head: &'a str,
    #[serde(rename = "STNo.")]
    station: &'a str,
    #[serde(rename = "DeltX")]
    delta_x: String,
    #[serde(rename = "DeltY")]
    delta_y: String,
    #[serde(rename = "Angle")]
    angle: String,
    #[serde(rename = "Height")]
    height: String,
    #[serde(rename = "Skip")]
    skip: u8,
    #[serde(rename = "Speed")]
    speed: &'a str,
    #[serde(rename = "Explain")]
    explain: &'a str,
    #[serde(rename = "Note")]
    note: &'a str,
    #[serde(rename = "Delay")]
    delay: String,
}

#[derive(Serialize)]
struct PanelRow {
    #[serde(rename = "Table")]
    table: &'static str,
    #[serde(rename = "No.")]
    no: usize,
    #[serde(rename = "ID")]
    id: usize,
    #[serde(rename = "IntervalX")]
    interval_x: String,
    #[serde(rename = "IntervalY")]
    interval_y: String,
    #[serde(rename = "NumX")]
    count_x: u32,
    #[serde(rename = "NumY")]
    count_y: u32,
}

#[derive(Serialize)]
struct CalibPointRow<'a> {
    #[serde(rename = "Table")]
    table: &'static str,
    #[serde(rename = "No.")]
    no: usize,
    #[serde(rename = "ID")]
    id: usize,
    #[serde(rename = "offsetX")]
    offset_x: String,
    #[serde(rename = "offsetY")]
    offset_y: String,
    #[serde(rename = "Note")]
    note: Option<&'a str>,
}

#[derive(Serialize)]
struct CalibFactorRow {
    #[serde(rename = "Table")]
    table: &'static str,
    #[serde(rename = "No.")]
    no: usize,
    #[serde(rename = "DeltX")]
    delta_x: String,
    #[serde(rename = "DeltY")]
    delta_y: String,
    #[serde(rename = "AlphaX")]
    alpha_x: String,
    #[serde(rename = "AlphaY")]
    alpha_y: String,
    #[serde(rename = "BetaX")]
    beta_x: String,
    #[serde(rename = "BetaY")]
    beta_y: String,
    #[serde(rename = "DeltaAngle")]
    delta_angle: String,
}

/// Write rows as a comma-separated table with a header line.
///
/// No rows produce an empty string. The result has no trailing newline.
fn build_table<T: Serialize>(rows: impl IntoIterator<Item = T>) -> Result<String, ExportError> {
    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(Vec::new());

    for row in rows {
        wtr.serialize(row)?;
    }

    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    let text = String::from_utf8(bytes)?;
    Ok(text.trim_end_matches('\n').to_string())
}

/// Program header stamped with `timestamp`
#[must_use]
pub fn generate_header(options: &ExportOptions, timestamp: NaiveDateTime) -> String {
    format!(
        "\nseparated\nFILE,{}\nPCBFILE,{}\nDATE,{}/{}/{}\nTIME,{}:{}:{}\nPANELTYPE,{}",
        options.file_name,
        options.pcb_file,
        timestamp.year(),
        timestamp.month(),
        timestamp.day(),
        timestamp.hour(),
        timestamp.minute(),
        timestamp.second(),
        options.panel_type,
    )
}

/// Station table in catalog order
///
/// # Errors
///
/// Returns `ExportError` if a row cannot be written.
pub fn generate_station_table<'a>(
    stations: impl IntoIterator<Item = &'a StationRecord>,
) -> Result<String, ExportError> {
    build_table(stations.into_iter().enumerate().map(|(no, s)| StationRow {
        table: "Station",
        no,
        id: s.id.as_str(),
        delta_x: fmt_number(s.delta_x),
        delta_y: fmt_number(s.delta_y),
        feed_rate: fmt_number(s.feed_rate),
        note: &s.note,
        height: fmt_number(s.height),
        speed: &s.speed,
        status: &s.status,
        size_x: &s.size_x,
        size_y: &s.size_y,
        height_take: fmt_number(s.height_take),
        delay_take: fmt_number(s.delay_take),
        rotation: fmt_number(s.rotation),
    }))
}

/// Parts paired with the station that supplies them; everything else is dropped
fn placeable<'a>(
    parts: impl IntoIterator<Item = &'a ComponentRecord>,
    stations: &'a StationStore,
) -> Vec<(&'a ComponentRecord, &'a StationRecord)> {
    parts
        .into_iter()
        .filter_map(|part| {
            let station = part.station().and_then(|id| stations.get(id));
            if station.is_none() {
                debug!("Leaving {} out of the component table", part.reference);
            }
            station.map(|s| (part, s))
        })
        .collect()
}

/// Component table for the parts that resolve to a station
///
/// # Errors
///
/// Returns `ExportError` if a row cannot be written.
pub fn generate_component_table<'a>(
    parts: impl IntoIterator<Item = &'a ComponentRecord>,
    stations: &'a StationStore,
) -> Result<String, ExportError> {
    build_component_rows(&placeable(parts, stations))
}

fn build_component_rows(placed: &[(&ComponentRecord, &StationRecord)]) -> Result<String, ExportError> {
    build_table(placed.iter().enumerate().map(|(no, (part, station))| {
        let head = part
            .nozzle
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_NOZZLE);

        ComponentRow {
            table: "EComponent",
            no,
            id: no + 1,
            head,
            station: station.id.as_str(),
            delta_x: fmt_number(part.pos_x),
            delta_y: fmt_number(part.pos_y),
            angle: fmt_number(rotate(part.rotation, station.rotation)),
            height: fmt_number(station.height),
            skip: SKIP_PLACE,
            speed: &station.speed,
            explain: &part.reference,
            note: &part.value,
            delay: fmt_number(station.delay_take),
        }
    }))
}

fn generate_panel_table(panels: &[PanelArray]) -> Result<String, ExportError> {
    build_table(panels.iter().enumerate().map(|(no, p)| PanelRow {
        table: "Panel_Array",
        no,
        id: no + 1,
        interval_x: fmt_number(p.interval_x),
        interval_y: fmt_number(p.interval_y),
        count_x: p.count_x,
        count_y: p.count_y,
    }))
}

fn generate_calib_point_table(points: &[CalibPoint]) -> Result<String, ExportError> {
    build_table(points.iter().enumerate().map(|(no, p)| CalibPointRow {
        table: "CalibPoint",
        no,
        id: no + 1,
        offset_x: fmt_number(p.offset_x),
        offset_y: fmt_number(p.offset_y),
        note: p.note.as_deref(),
    }))
}

fn generate_calib_factor_table(factors: &[CalibFactor]) -> Result<String, ExportError> {
    build_table(factors.iter().enumerate().map(|(no, f)| CalibFactorRow {
        table: "CalibFator",
        no,
        delta_x: fmt_number(f.delta_x),
        delta_y: fmt_number(f.delta_y),
        alpha_x: fmt_number(f.alpha_x),
        alpha_y: fmt_number(f.alpha_y),
        beta_x: fmt_number(f.beta_x),
        beta_y: fmt_number(f.beta_y),
        delta_angle: fmt_number(f.delta_angle),
    }))
}

/// Render a complete DPV program
///
/// # Errors
///
/// Returns `ExportError` if a table cannot be written.
pub fn generate<'a>(
    parts: impl IntoIterator<Item = &'a ComponentRecord>,
    stations: &'a StationStore,
    options: &ExportOptions,
    timestamp: NaiveDateTime,
) -> Result<DpvDocument, ExportError> {
    let parts: Vec<&ComponentRecord> = parts.into_iter().collect();
    let placed = placeable(parts.iter().copied(), stations);

    let sections = [
        generate_header(options, timestamp),
        generate_station_table(stations.iter())?,
        build_component_rows(&placed)?,
        generate_panel_table(&options.panels)?,
        generate_calib_point_table(&options.calib_points)?,
        generate_calib_factor_table(&options.calib_factors)?,
    ];

    let summary = ExportSummary {
        stations: stations.len(),
        components: placed.len(),
        omitted: parts.len() - placed.len(),
    };

    debug!(
        "Exported {} stations and {} components ({} omitted)",
        summary.stations, summary.components, summary.omitted
    );

    Ok(DpvDocument {
        text: sections.join("\n\n"),
        summary,
    })
}

/// Render a DPV program stamped with the local time
///
/// # Errors
///
/// Returns `ExportError` if a table cannot be written.
pub fn generate_now<'a>(
    parts: impl IntoIterator<Item = &'a ComponentRecord>,
    stations: &'a StationStore,
    options: &ExportOptions,
) -> Result<DpvDocument, ExportError> {
    generate(parts, stations, options, Local::now().naive_local())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Assignment, StationId};
    use chrono::NaiveDate;

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 7)
            .unwrap()
            .and_hms_opt(9, 5, 3)
            .unwrap()
    }

    fn assigned(reference: &str, value: &str, station: &str) -> ComponentRecord {
        ComponentRecord::new(reference, value)
            .with_assignment(Assignment::Station(StationId::new(station)))
    }

    #[test]
    fn test_rotate() {
        assert!((rotate(0.0, 0.0) - -90.0).abs() < f64::EPSILON);
        assert!((rotate(90.0, 0.0)).abs() < f64::EPSILON);
        assert!((rotate(90.0, 90.0) - 90.0).abs() < f64::EPSILON);
        assert!((rotate(270.0, 90.0) - -90.0).abs() < f64::EPSILON);
        assert!((rotate(0.0, 270.0) - 180.0).abs() < f64::EPSILON);
        // Wraps into (-180, 180]
        assert!((rotate(-90.0, 0.0) - 180.0).abs() < f64::EPSILON);
        assert!((rotate(-200.0, 0.0) - 70.0).abs() < f64::EPSILON);
        assert!((rotate(45.126, 0.0) - -44.87).abs() < 1e-9);
    }

    #[test]
    fn test_rotate_rounding_stays_in_range() {
        assert!((rotate(-89.996, 0.0) - 180.0).abs() < f64::EPSILON);
        assert!((rotate(269.996, 0.0) - 180.0).abs() < f64::EPSILON);
        assert!((rotate(-89.994, 0.0) - -179.99).abs() < 1e-9);
    }

    #[test]
    fn test_rotate_never_negative_zero() {
        assert_eq!(fmt_number(rotate(-270.0, 0.0)), "0");
        assert_eq!(fmt_number(rotate(450.0, 0.0)), "0");
    }

    #[test]
    fn test_fmt_number() {
        assert_eq!(fmt_number(0.0), "0");
        assert_eq!(fmt_number(-0.0), "0");
        assert_eq!(fmt_number(90.0), "90");
        assert_eq!(fmt_number(10.25), "10.25");
        assert_eq!(fmt_number(-3.5), "-3.5");
    }

    #[test]
    fn test_header() {
        let header = generate_header(&ExportOptions::default(), timestamp());
        assert_eq!(
            header,
            "\nseparated\nFILE,export.dpv\nPCBFILE,board\nDATE,2024/3/7\nTIME,9:5:3\nPANELTYPE,1"
        );
    }

    #[test]
    fn test_station_table() {
        let stations = vec![
            StationRecord::new("1", "10k").with_rotation(90.0),
            StationRecord::new("2", "NE555, DIP"),
        ];
        let table = generate_station_table(&stations).unwrap();
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(
            lines[0],
            "Table,No.,ID,DeltX,DeltY,FeedRates,Note,Height,Speed,Status,SizeX,SizeY,HeightTake,DelayTake,Rotation"
        );
        assert_eq!(lines[1], "Station,0,1,0,0,0,10k,0,,,,,0,0,90");
        assert_eq!(lines[2], "Station,1,2,0,0,0,\"NE555, DIP\",0,,,,,0,0,0");
        assert!(!table.ends_with('\n'));
    }

    #[test]
    fn test_component_table_skips_unplaceable_parts() {
        let stations = StationStore::from_records(vec![
            StationRecord::new("1", "10k"),
            StationRecord::new("2", "100n").with_rotation(90.0),
        ]);
        let parts = vec![
            ComponentRecord::new("U1", "NE555"),
            assigned("R1", "10k", "1").with_position(10.5, 20.0, 0.0),
            ComponentRecord::new("J1", "USB_B").with_assignment(Assignment::Ignored),
            assigned("R9", "1M", "99"),
            assigned("C1", "100n", "2").with_nozzle("2"),
        ];

        let table = generate_component_table(&parts, &stations).unwrap();
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(
            lines[0],
            "Table,No.,ID,PHead,STNo.,DeltX,DeltY,Angle,Height,Skip,Speed,Explain,Note,Delay"
        );
        assert_eq!(lines[1], "EComponent,0,1,1,1,10.5,20,-90,0,4,,R1,10k,0");
        assert_eq!(lines[2], "EComponent,1,2,2,2,0,0,0,0,4,,C1,100n,0");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_empty_component_table_is_empty_section() {
        let stations = StationStore::from_records(vec![StationRecord::new("1", "10k")]);
        let parts = vec![ComponentRecord::new("U1", "NE555")];
        assert_eq!(generate_component_table(&parts, &stations).unwrap(), "");
    }

    #[test]
    fn test_generate_full_document() {
        let stations = StationStore::from_records(vec![StationRecord::new("1", "10k")]);
        let parts = vec![assigned("R1", "10k", "1"), ComponentRecord::new("U1", "NE555")];

        let doc = generate(&parts, &stations, &ExportOptions::default(), timestamp()).unwrap();
        assert_eq!(
            doc.summary,
            ExportSummary {
                stations: 1,
                components: 1,
                omitted: 1
            }
        );

        let sections: Vec<&str> = doc.text.split("\n\n").collect();
        assert_eq!(sections.len(), 6);
        assert!(sections[0].starts_with("\nseparated"));
        assert!(sections[1].starts_with("Table,No.,ID,DeltX"));
        assert!(sections[2].contains("EComponent,0,1,1,1,0,0,-90"));
        assert_eq!(
            sections[3],
            "Table,No.,ID,IntervalX,IntervalY,NumX,NumY\nPanel_Array,0,1,0,0,1,1"
        );
        assert_eq!(
            sections[4],
            "Table,No.,ID,offsetX,offsetY,Note\nCalibPoint,0,1,0,0,Origin"
        );
        assert_eq!(
            sections[5],
            "Table,No.,DeltX,DeltY,AlphaX,AlphaY,BetaX,BetaY,DeltaAngle\nCalibFator,0,0,0,0,0,1,1,0"
        );
    }
}
