//! Part-to-station matching and association.
//!
//! This module provides the association pipeline:
//!
//! - [`MarkingResolver`](resolver::MarkingResolver): Applies alias and ignore tables
//! - [`StationMatcher`](engine::StationMatcher): Finds the station for one marking
//! - [`AssociationEngine`](association::AssociationEngine): Applies matches to a whole BOM
//!
//! ## Matching Algorithm
//!
//! 1. **Ignore check**: Markings on the ignore list are marked ignored
//! 2. **Alias substitution**: Known alternate spellings become the canonical name
//! 3. **Classification**: The marking is parsed into kind and numeric value
//! 4. **Station scan**: The first station (catalog order) whose note classifies
//!    identically supplies the part
//!
//! Numeric values must agree exactly. `0.1u` and `100n` match because they
//! normalize to the same value; `4.7k` and `4.75k` do not.
//!
//! ## Example
//!
//! ```rust
//! use feeder_solver::core::component::ComponentRecord;
//! use feeder_solver::core::station::StationRecord;
//! use feeder_solver::matching::association::AssociationEngine;
//! use feeder_solver::matching::resolver::AssociationConfig;
//!
//! let parts = vec![ComponentRecord::new("C1", "0.1u")];
//! let stations = vec![StationRecord::new("2", "100n")];
//!
//! let mut engine = AssociationEngine::from_records(parts, stations, &AssociationConfig::default());
//! let report = engine.auto_associate_all();
//!
//! assert_eq!(report.matched, 1);
//! assert_eq!(engine.part("C1").unwrap().station().unwrap().as_str(), "2");
//! ```

pub mod association;
pub mod engine;
pub mod resolver;

pub use association::{AssociationEngine, AssociationError, AssociationReport};
pub use engine::{MatchOutcome, StationMatcher};
