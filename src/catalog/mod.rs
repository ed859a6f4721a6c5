//! Keyed storage for parts and stations.
//!
//! Parts are keyed by reference designator and stations by station ID. Both
//! live in a [`RecordStore`](store::RecordStore), which replaces a changed
//! entry wholesale instead of editing it in place:
//!
//! ```rust
//! use feeder_solver::catalog::store::PartStore;
//! use feeder_solver::core::component::ComponentRecord;
//! use feeder_solver::core::types::Assignment;
//!
//! let mut parts = PartStore::from_records(vec![ComponentRecord::new("R1", "10k")]);
//! let before = parts.snapshot();
//!
//! parts.replace_with(&"R1".to_string(), |p| p.clone().with_assignment(Assignment::Ignored));
//!
//! assert!(parts.get(&"R1".to_string()).unwrap().assignment.is_ignored());
//! assert!(!before.get(&"R1".to_string()).unwrap().assignment.is_ignored());
//! ```

pub mod store;
