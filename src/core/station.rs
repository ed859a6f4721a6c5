use serde::{Deserialize, Serialize};

use crate::core::marking::{classify, ClassifiedMarking};
use crate::core::types::StationId;

/// Nozzle assigned to stations whose catalog does not name one
pub const DEFAULT_NOZZLE: &str = "1";

fn default_nozzle() -> Option<String> {
    Some(DEFAULT_NOZZLE.to_string())
}

/// One feeder slot on the pick-and-place machine.
///
/// Field names follow the machine's station table so JSON catalogs can be
/// written by hand from an exported program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationRecord {
    #[serde(rename = "ID")]
    pub id: StationId,

    /// Free-text marking used for matching
    #[serde(rename = "Note", default)]
    pub note: String,

    #[serde(rename = "DeltX", default)]
    pub delta_x: f64,

    #[serde(rename = "DeltY", default)]
    pub delta_y: f64,

    #[serde(rename = "FeedRates", default)]
    pub feed_rate: f64,

    #[serde(rename = "Height", default)]
    pub height: f64,

    #[serde(rename = "Speed", default)]
    pub speed: String,

    #[serde(rename = "Status", default)]
    pub status: String,

    #[serde(rename = "SizeX", default)]
    pub size_x: String,

    #[serde(rename = "SizeY", default)]
    pub size_y: String,

    #[serde(rename = "HeightTake", default)]
    pub height_take: f64,

    #[serde(rename = "DelayTake", default)]
    pub delay_take: f64,

    /// Rotation offset added to every part picked from this station
    #[serde(rename = "Rotation", default)]
    pub rotation: f64,

    #[serde(rename = "Nozzle", default = "default_nozzle")]
    pub nozzle: Option<String>,
}

impl StationRecord {
    pub fn new(id: impl Into<String>, note: impl Into<String>) -> Self {
        Self {
            id: StationId::new(id),
            note: note.into(),
            delta_x: 0.0,
            delta_y: 0.0,
            feed_rate: 0.0,
            height: 0.0,
            speed: String::new(),
            status: String::new(),
            size_x: String::new(),
            size_y: String::new(),
            height_take: 0.0,
            delay_take: 0.0,
            rotation: 0.0,
            nozzle: default_nozzle(),
        }
    }

    #[must_use]
    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    #[must_use]
    pub fn with_nozzle(mut self, nozzle: Option<String>) -> Self {
        self.nozzle = nozzle;
        self
    }

    /// Classification of this station's note
    #[must_use]
    pub fn classified_note(&self) -> ClassifiedMarking {
        classify(&self.note)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ComponentKind;

    #[test]
    fn test_json_defaults() {
        let station: StationRecord = serde_json::from_str(r#"{"ID": "4", "Note": "100n"}"#).unwrap();
        assert_eq!(station.id, StationId::new("4"));
        assert_eq!(station.nozzle.as_deref(), Some(DEFAULT_NOZZLE));
        assert_eq!(station.classified_note().kind, ComponentKind::Capacitor);
    }

    #[test]
    fn test_json_explicit_null_nozzle() {
        let station: StationRecord =
            serde_json::from_str(r#"{"ID": "4", "Note": "x", "Nozzle": null}"#).unwrap();
        assert!(station.nozzle.is_none());
    }
}
