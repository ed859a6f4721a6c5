use serde::Serialize;
use tracing::debug;

use crate::core::marking::{classify, ClassifiedMarking};
use crate::core::station::StationRecord;
use crate::core::types::StationId;
use crate::matching::resolver::{AssociationConfig, MarkingResolver, Resolution};

/// Outcome of matching one marking against the station catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "station", rename_all = "snake_case")]
pub enum MatchOutcome {
    /// First station whose note classifies identically
    Station(StationId),
    /// Marking is on the ignore list
    Ignore,
    /// No station carries this marking
    NoMatch,
}

/// Station with its note classified once up front
#[derive(Debug, Clone)]
struct IndexedStation {
    id: StationId,
    info: ClassifiedMarking,
}

/// Check whether a station's classified note can supply a part.
///
/// Numeric markings must be exactly equal; there is no tolerance. Named
/// markings compare case-insensitively. A part with neither never matches.
#[must_use]
#[allow(clippy::float_cmp)] // Exact equality is the matching rule
pub fn is_candidate(part: &ClassifiedMarking, station: &ClassifiedMarking) -> bool {
    if part.kind != station.kind {
        return false;
    }

    if let Some(value) = part.numeric_value {
        return station.numeric_value == Some(value);
    }

    if let Some(name) = &part.raw_name {
        return station
            .raw_name
            .as_ref()
            .is_some_and(|station_name| station_name.to_uppercase() == name.to_uppercase());
    }

    false
}

/// Matches part markings against a station catalog
pub struct StationMatcher {
    resolver: MarkingResolver,
    /// Stations in catalog order with classified notes
    stations: Vec<IndexedStation>,
}

impl StationMatcher {
    /// Build a matcher over `stations`, classifying every note once
    pub fn new<'a>(
        resolver: MarkingResolver,
        stations: impl IntoIterator<Item = &'a StationRecord>,
    ) -> Self {
        let stations = stations
            .into_iter()
            .map(|s| IndexedStation {
                id: s.id.clone(),
                info: s.classified_note(),
            })
            .collect();

        Self { resolver, stations }
    }

    /// Build a matcher with resolver tables from `config`
    pub fn with_config<'a>(
        config: &AssociationConfig,
        stations: impl IntoIterator<Item = &'a StationRecord>,
    ) -> Self {
        Self::new(MarkingResolver::new(config), stations)
    }

    /// Find the station that should supply a part with this marking
    #[must_use]
    pub fn find_station(&self, marking: &str) -> MatchOutcome {
        let resolved = match self.resolver.resolve(marking) {
            Resolution::Ignore => return MatchOutcome::Ignore,
            Resolution::Marking(resolved) => resolved,
        };

        let part_info = classify(&resolved);

        // First candidate in catalog order wins
        let outcome = self
            .stations
            .iter()
            .find(|s| is_candidate(&part_info, &s.info))
            .map_or(MatchOutcome::NoMatch, |s| MatchOutcome::Station(s.id.clone()));

        debug!("Marking '{}' -> {:?}", marking, outcome);
        outcome
    }

    /// Every station that could supply this marking, in catalog order
    #[must_use]
    pub fn candidates(&self, marking: &str) -> Vec<StationId> {
        let Resolution::Marking(resolved) = self.resolver.resolve(marking) else {
            return Vec::new();
        };

        let part_info = classify(&resolved);
        self.stations
            .iter()
            .filter(|s| is_candidate(&part_info, &s.info))
            .map(|s| s.id.clone())
            .collect()
    }

    /// Number of stations in the catalog
    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}

/// Match a single marking against a station list
#[must_use]
pub fn find_station(
    marking: &str,
    stations: &[StationRecord],
    config: &AssociationConfig,
) -> MatchOutcome {
    StationMatcher::with_config(config, stations).find_station(marking)
}
