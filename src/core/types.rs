use serde::{Deserialize, Serialize};

/// Marker written in position files for a part that is deliberately not placed
pub const IGNORE_MARKER: &str = "-";

/// Unique identifier for a feeder station
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationId(pub String);

impl StationId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading integer of the ID, used for catalog ordering
    #[must_use]
    pub fn numeric_prefix(&self) -> Option<u64> {
        let digits: String = self
            .0
            .trim()
            .chars()
            .take_while(char::is_ascii_digit)
            .collect();
        digits.parse().ok()
    }

    /// Compare IDs numerically by leading integer; non-numeric IDs sort last
    #[must_use]
    pub fn catalog_cmp(&self, other: &Self) -> std::cmp::Ordering {
        match (self.numeric_prefix(), other.numeric_prefix()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl std::fmt::Display for StationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Board side a part is mounted on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    #[default]
    Top,
    Bottom,
}

impl Side {
    /// Parse a side from position-file text; anything but "bottom" is top
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("bottom") {
            Self::Bottom
        } else {
            Self::Top
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Top => write!(f, "top"),
            Self::Bottom => write!(f, "bottom"),
        }
    }
}

/// Which station (if any) supplies a part
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "station", rename_all = "snake_case")]
pub enum Assignment {
    #[default]
    Unassigned,
    Station(StationId),
    /// Deliberately not sourced from any station
    Ignored,
}

impl Assignment {
    /// Interpret the station column of a position file
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "" => Self::Unassigned,
            IGNORE_MARKER => Self::Ignored,
            id => Self::Station(StationId::new(id)),
        }
    }

    #[must_use]
    pub fn station(&self) -> Option<&StationId> {
        match self {
            Self::Station(id) => Some(id),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_ignored(&self) -> bool {
        matches!(self, Self::Ignored)
    }
}

impl std::fmt::Display for Assignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unassigned => Ok(()),
            Self::Station(id) => write!(f, "{id}"),
            Self::Ignored => write!(f, "{IGNORE_MARKER}"),
        }
    }
}

/// Semantic kind derived from a marking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Resistor,
    Capacitor,
    Fuse,
    Other,
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Resistor => write!(f, "resistor"),
            Self::Capacitor => write!(f, "capacitor"),
            Self::Fuse => write!(f, "fuse"),
            Self::Other => write!(f, "other"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assignment_parse() {
        assert_eq!(Assignment::parse(""), Assignment::Unassigned);
        assert_eq!(Assignment::parse("  "), Assignment::Unassigned);
        assert_eq!(Assignment::parse("-"), Assignment::Ignored);
        assert_eq!(
            Assignment::parse("12"),
            Assignment::Station(StationId::new("12"))
        );
    }

    #[test]
    fn test_assignment_display_round_trips_marker() {
        assert_eq!(Assignment::Ignored.to_string(), "-");
        assert_eq!(Assignment::Unassigned.to_string(), "");
        assert_eq!(Assignment::Station(StationId::new("7")).to_string(), "7");
    }

    #[test]
    fn test_side_parse() {
        assert_eq!(Side::parse("top"), Side::Top);
        assert_eq!(Side::parse("Bottom"), Side::Bottom);
        assert_eq!(Side::parse(""), Side::Top);
    }

    #[test]
    fn test_station_catalog_order() {
        let mut ids: Vec<StationId> = ["10", "2", "tray", "1", "2a"]
            .into_iter()
            .map(StationId::new)
            .collect();
        ids.sort_by(StationId::catalog_cmp);
        let sorted: Vec<&str> = ids.iter().map(StationId::as_str).collect();
        assert_eq!(sorted, vec!["1", "2", "2a", "10", "tray"]);
    }
}
