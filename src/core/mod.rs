//! Core data types for part-to-station association.
//!
//! This module provides the fundamental types used throughout the library:
//!
//! - [`ComponentRecord`](component::ComponentRecord): A placed part from the BOM/position file
//! - [`StationRecord`](station::StationRecord): A feeder slot on the pick-and-place machine
//! - [`ClassifiedMarking`](marking::ClassifiedMarking): The semantic reading of a marking
//! - [`StationId`](types::StationId), [`Side`](types::Side), [`Assignment`](types::Assignment): Shared identifiers
//!
//! ## Markings
//!
//! Parts and stations are matched through their free-text markings:
//!
//! | Marking | Kind | Normalized value |
//! |---------|------|------------------|
//! | 4.7k    | resistor  | 4700 |
//! | 100n    | capacitor | 100000 (picofarad convention) |
//! | 10A     | fuse      | 10 |
//! | USB_B   | other     | name "USB_B" |

pub mod component;
pub mod marking;
pub mod station;
pub mod types;
