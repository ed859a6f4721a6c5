use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::store::{PartStore, StationStore};
use crate::core::component::ComponentRecord;
use crate::core::station::StationRecord;
use crate::core::types::{Assignment, Side, StationId};
use crate::matching::engine::{MatchOutcome, StationMatcher};
use crate::matching::resolver::{AssociationConfig, MarkingResolver};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AssociationError {
    #[error("Unknown part '{0}'")]
    UnknownPart(String),

    #[error("Unknown station '{0}'")]
    UnknownStation(StationId),

    #[error("No part selected")]
    NoPartSelected,

    #[error("No station selected")]
    NoStationSelected,
}

/// Which board side the part list shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SideFilter {
    #[default]
    Top,
    Bottom,
    All,
}

impl SideFilter {
    #[must_use]
    pub fn accepts(self, side: Side) -> bool {
        match self {
            Self::All => true,
            Self::Top => side == Side::Top,
            Self::Bottom => side == Side::Bottom,
        }
    }
}

/// Filter applied to the part list that drives selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PartFilter {
    pub side: SideFilter,
    /// Show only parts without an assignment
    pub unassigned_only: bool,
}

impl PartFilter {
    #[must_use]
    pub fn accepts(&self, part: &ComponentRecord) -> bool {
        !part.reference.is_empty()
            && (!self.unassigned_only || part.is_unassigned())
            && self.side.accepts(part.side)
    }
}

/// Counts from a bulk association pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AssociationReport {
    /// Parts given a station
    pub matched: usize,
    /// Parts marked as ignored
    pub ignored: usize,
    /// Parts left as they were because nothing matched
    pub unmatched: usize,
}

/// Owns the part and station catalogs and applies associations to them.
///
/// Every mutation replaces the one affected part in the store; the bulk pass
/// replaces each part it changes. A current-part cursor walks the filtered
/// part list so an operator can associate parts one after another.
pub struct AssociationEngine {
    parts: PartStore,
    stations: StationStore,
    resolver: MarkingResolver,
    filter: PartFilter,
    selected_part: Option<String>,
    selected_station: Option<StationId>,
}

impl AssociationEngine {
    pub fn new(parts: PartStore, stations: StationStore, config: &AssociationConfig) -> Self {
        Self {
            parts,
            stations,
            resolver: MarkingResolver::new(config),
            filter: PartFilter::default(),
            selected_part: None,
            selected_station: None,
        }
    }

    pub fn from_records(
        parts: Vec<ComponentRecord>,
        stations: Vec<StationRecord>,
        config: &AssociationConfig,
    ) -> Self {
        Self::new(
            PartStore::from_records(parts),
            StationStore::from_records(stations),
            config,
        )
    }

    pub fn parts(&self) -> &PartStore {
        &self.parts
    }

    pub fn stations(&self) -> &StationStore {
        &self.stations
    }

    pub fn part(&self, reference: &str) -> Option<&ComponentRecord> {
        self.parts.get(&reference.to_string())
    }

    pub fn station(&self, id: &StationId) -> Option<&StationRecord> {
        self.stations.get(id)
    }

    /// Replace the part catalog wholesale (BOM reload); clears the selection
    pub fn replace_parts(&mut self, parts: PartStore) {
        self.parts = parts;
        self.selected_part = None;
    }

    /// Replace the station catalog wholesale (catalog reload)
    pub fn replace_stations(&mut self, stations: StationStore) {
        self.stations = stations;
        if let Some(id) = &self.selected_station {
            if !self.stations.contains(id) {
                self.selected_station = None;
            }
        }
    }

    /// Edit one part directly
    pub fn update_part(
        &mut self,
        reference: &str,
        f: impl FnOnce(&ComponentRecord) -> ComponentRecord,
    ) -> Result<&ComponentRecord, AssociationError> {
        let key = reference.to_string();
        if !self.parts.replace_with(&key, f) {
            return Err(AssociationError::UnknownPart(key));
        }
        self.part_or_err(reference)
    }

    /// Edit one station directly
    pub fn update_station(
        &mut self,
        id: &StationId,
        f: impl FnOnce(&StationRecord) -> StationRecord,
    ) -> Result<&StationRecord, AssociationError> {
        if !self.stations.replace_with(id, f) {
            return Err(AssociationError::UnknownStation(id.clone()));
        }
        self.stations
            .get(id)
            .ok_or_else(|| AssociationError::UnknownStation(id.clone()))
    }

    /// Station a part resolves to, treating stale references as none
    pub fn resolved_station(&self, part: &ComponentRecord) -> Option<&StationRecord> {
        part.station().and_then(|id| self.stations.get(id))
    }

    /// Run the matcher over every part.
    ///
    /// A match assigns the station and copies its nozzle onto the part,
    /// replacing any earlier assignment; an ignore-listed marking marks the
    /// part ignored; no match leaves the part untouched, so manual work on
    /// parts the catalog cannot place survives.
    pub fn auto_associate_all(&mut self) -> AssociationReport {
        let matcher = StationMatcher::new(self.resolver.clone(), self.stations.iter());
        let mut report = AssociationReport::default();

        let pending: Vec<(String, MatchOutcome)> = self
            .parts
            .iter()
            .map(|part| (part.reference.clone(), matcher.find_station(&part.value)))
            .collect();

        for (reference, outcome) in pending {
            match outcome {
                MatchOutcome::Station(id) => {
                    let nozzle = self.stations.get(&id).and_then(|s| s.nozzle.clone());
                    self.parts.replace_with(&reference, |p| ComponentRecord {
                        assignment: Assignment::Station(id),
                        nozzle,
                        ..p.clone()
                    });
                    report.matched += 1;
                }
                MatchOutcome::Ignore => {
                    self.parts.replace_with(&reference, |p| ComponentRecord {
                        assignment: Assignment::Ignored,
                        ..p.clone()
                    });
                    report.ignored += 1;
                }
                MatchOutcome::NoMatch => {
                    let stale = self
                        .part(&reference)
                        .and_then(ComponentRecord::station)
                        .filter(|id| !self.stations.contains(id));
                    if let Some(id) = stale {
                        warn!("Part {} keeps missing station {}", reference, id);
                    }
                    debug!("No station for part {}", reference);
                    report.unmatched += 1;
                }
            }
        }

        info!(
            "Auto-association: {} matched, {} ignored, {} unmatched",
            report.matched, report.ignored, report.unmatched
        );
        report
    }

    /// Clear every assignment so the next bulk pass starts fresh
    pub fn clear_assignments(&mut self) {
        let references: Vec<String> = self
            .parts
            .iter()
            .filter(|p| p.assignment != Assignment::Unassigned)
            .map(|p| p.reference.clone())
            .collect();

        for reference in references {
            self.parts.replace_with(&reference, |p| ComponentRecord {
                assignment: Assignment::Unassigned,
                ..p.clone()
            });
        }
    }

    /// Toggle the association of a part with a station.
    ///
    /// If the part already uses the station it becomes unassigned, otherwise
    /// it is assigned (overwriting any previous assignment). The cursor then
    /// moves to the next part in the filtered list.
    pub fn manual_associate(
        &mut self,
        reference: &str,
        station: &StationId,
    ) -> Result<&ComponentRecord, AssociationError> {
        if !self.stations.contains(station) {
            return Err(AssociationError::UnknownStation(station.clone()));
        }
        if self.part(reference).is_none() {
            return Err(AssociationError::UnknownPart(reference.to_string()));
        }

        let next = self.next_in_filter(reference);
        self.parts.replace_with(&reference.to_string(), |p| {
            let assignment = if p.station() == Some(station) {
                Assignment::Unassigned
            } else {
                Assignment::Station(station.clone())
            };
            ComponentRecord {
                assignment,
                ..p.clone()
            }
        });
        self.select_part_opt(next);

        self.part_or_err(reference)
    }

    /// Mark a part as deliberately not placed and advance the cursor
    pub fn ignore_part(&mut self, reference: &str) -> Result<&ComponentRecord, AssociationError> {
        if self.part(reference).is_none() {
            return Err(AssociationError::UnknownPart(reference.to_string()));
        }

        let next = self.next_in_filter(reference);
        self.parts.replace_with(&reference.to_string(), |p| ComponentRecord {
            assignment: Assignment::Ignored,
            ..p.clone()
        });
        self.select_part_opt(next);

        self.part_or_err(reference)
    }

    /// Associate the selected part with the selected station
    pub fn associate_selected(&mut self) -> Result<&ComponentRecord, AssociationError> {
        let reference = self
            .selected_part
            .clone()
            .ok_or(AssociationError::NoPartSelected)?;
        let station = self
            .selected_station
            .clone()
            .ok_or(AssociationError::NoStationSelected)?;
        self.manual_associate(&reference, &station)
    }

    /// Ignore the selected part
    pub fn ignore_selected(&mut self) -> Result<&ComponentRecord, AssociationError> {
        let reference = self
            .selected_part
            .clone()
            .ok_or(AssociationError::NoPartSelected)?;
        self.ignore_part(&reference)
    }

    fn part_or_err(&self, reference: &str) -> Result<&ComponentRecord, AssociationError> {
        self.part(reference)
            .ok_or_else(|| AssociationError::UnknownPart(reference.to_string()))
    }

    // === Selection and filtering ===

    pub fn filter(&self) -> PartFilter {
        self.filter
    }

    pub fn set_filter(&mut self, filter: PartFilter) {
        self.filter = filter;
    }

    /// Flip the "unassigned only" toggle
    pub fn toggle_unassigned_only(&mut self) {
        self.filter.unassigned_only = !self.filter.unassigned_only;
    }

    /// Parts visible under the current filter, in load order
    pub fn filtered_parts(&self) -> Vec<&ComponentRecord> {
        self.parts
            .iter()
            .filter(|p| self.filter.accepts(p))
            .collect()
    }

    pub fn selected_part(&self) -> Option<&ComponentRecord> {
        self.selected_part.as_deref().and_then(|r| self.part(r))
    }

    pub fn selected_station(&self) -> Option<&StationRecord> {
        self.selected_station
            .as_ref()
            .and_then(|id| self.stations.get(id))
    }

    /// Select a part; its assigned station (if any) becomes the selected station
    pub fn select_part(&mut self, reference: &str) -> Result<(), AssociationError> {
        let part = self.part_or_err(reference)?;
        let station = part.station().cloned();
        self.selected_part = Some(reference.to_string());
        self.selected_station = station;
        Ok(())
    }

    pub fn select_station(&mut self, id: &StationId) -> Result<(), AssociationError> {
        if !self.stations.contains(id) {
            return Err(AssociationError::UnknownStation(id.clone()));
        }
        self.selected_station = Some(id.clone());
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selected_part = None;
        self.selected_station = None;
    }

    /// Move the cursor to the next part in the filtered list.
    ///
    /// With no current part the first filtered part is selected; past the end
    /// the selection becomes empty.
    pub fn select_next_part(&mut self) -> Option<&ComponentRecord> {
        let next = match self.selected_part.clone() {
            Some(current) => self.next_in_filter(&current),
            None => self.filtered_parts().first().map(|p| p.reference.clone()),
        };
        self.select_part_opt(next);
        self.selected_part()
    }

    /// Reference after `reference` in the filtered list, or the first entry
    /// when `reference` is not in the list
    fn next_in_filter(&self, reference: &str) -> Option<String> {
        let list = self.filtered_parts();
        let next_idx = list
            .iter()
            .position(|p| p.reference == reference)
            .map_or(0, |idx| idx + 1);
        list.get(next_idx).map(|p| p.reference.clone())
    }

    fn select_part_opt(&mut self, reference: Option<String>) {
        match reference {
            Some(reference) => {
                // Reference came from the store, so selection cannot fail
                let _ = self.select_part(&reference);
            }
            None => self.selected_part = None,
        }
    }
}
