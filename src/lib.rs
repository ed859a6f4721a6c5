//! # feeder-solver
//!
//! A library for associating bill-of-materials parts with the feeder stations
//! of a pick-and-place machine.
//!
//! Position files list every placed part with a free-text marking such as
//! `4.7k`, `100n` or `DMG2302`. Station catalogs list what each feeder holds,
//! written the same loose way. `feeder-solver` normalizes both sides so that
//! `0.1u` finds the station labelled `100n`, applies a configurable alias and
//! ignore table, and writes the result as a DPV program.
//!
//! ## Features
//!
//! - **Value normalization**: Resistor, capacitor and fuse markings compare by value
//! - **Exact matching**: No tolerance; ambiguous parts are left for the operator
//! - **Alias and ignore tables**: Alternate part numbers and never-placed parts
//! - **Manual override**: Toggle associations and mark parts ignored
//! - **DPV export**: Station and component tables for the machine
//!
//! ## Example
//!
//! ```rust
//! use feeder_solver::{AssociationConfig, AssociationEngine, ComponentRecord, StationRecord};
//!
//! let parts = vec![
//!     ComponentRecord::new("R1", "4.7k"),
//!     ComponentRecord::new("J1", "USB_B"),
//! ];
//! let stations = vec![StationRecord::new("3", "4700")];
//!
//! let config = AssociationConfig::load_embedded().unwrap();
//! let mut engine = AssociationEngine::from_records(parts, stations, &config);
//! let report = engine.auto_associate_all();
//!
//! assert_eq!(report.matched, 1);
//! assert_eq!(report.ignored, 1);
//! ```
//!
//! ## Modules
//!
//! - [`catalog`]: Keyed copy-on-write storage for parts and stations
//! - [`core`]: Core data types for parts, stations and markings
//! - [`matching`]: Resolver, station matcher and association engine
//! - [`parsing`]: Position and station file loaders
//! - [`export`]: DPV program writer
//! - [`cli`]: Command-line interface implementation
//! - [`web`]: HTTP API

pub mod catalog;
pub mod cli;
pub mod core;
pub mod export;
pub mod matching;
pub mod parsing;
pub mod utils;
pub mod web;

// Re-export commonly used types for convenience
pub use catalog::store::{PartStore, StationStore};
pub use core::component::ComponentRecord;
pub use core::marking::{classify, ClassifiedMarking};
pub use core::station::StationRecord;
pub use core::types::*;
pub use matching::association::AssociationEngine;
pub use matching::engine::{MatchOutcome, StationMatcher};
pub use matching::resolver::AssociationConfig;
