use serde::{Deserialize, Serialize};

use crate::core::types::{Assignment, Side, StationId};

/// One placed component from the BOM/position file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRecord {
    /// Unique designator (e.g. "R12")
    pub reference: String,

    /// Free-text marking used for matching (e.g. "4.7k")
    pub value: String,

    /// Footprint/package name
    pub package: String,

    /// Position in board units
    pub pos_x: f64,
    pub pos_y: f64,

    /// Rotation in degrees
    pub rotation: f64,

    pub side: Side,

    /// Station supplying this part
    #[serde(default)]
    pub assignment: Assignment,

    /// Head/tool identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nozzle: Option<String>,
}

impl ComponentRecord {
    pub fn new(reference: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            value: value.into(),
            package: String::new(),
            pos_x: 0.0,
            pos_y: 0.0,
            rotation: 0.0,
            side: Side::Top,
            assignment: Assignment::Unassigned,
            nozzle: None,
        }
    }

    #[must_use]
    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = package.into();
        self
    }

    #[must_use]
    pub fn with_position(mut self, x: f64, y: f64, rotation: f64) -> Self {
        self.pos_x = x;
        self.pos_y = y;
        self.rotation = rotation;
        self
    }

    #[must_use]
    pub fn with_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }

    #[must_use]
    pub fn with_assignment(mut self, assignment: Assignment) -> Self {
        self.assignment = assignment;
        self
    }

    #[must_use]
    pub fn with_nozzle(mut self, nozzle: impl Into<String>) -> Self {
        self.nozzle = Some(nozzle.into());
        self
    }

    /// Station this part is assigned to, if any
    #[must_use]
    pub fn station(&self) -> Option<&StationId> {
        self.assignment.station()
    }

    /// True when the part holds no station and is not ignored.
    ///
    /// Station `0` is how several position exports spell "no station".
    #[must_use]
    pub fn is_unassigned(&self) -> bool {
        match &self.assignment {
            Assignment::Unassigned => true,
            Assignment::Station(id) => id.as_str() == "0",
            Assignment::Ignored => false,
        }
    }
}
