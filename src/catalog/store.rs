use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use tracing::warn;

use crate::core::component::ComponentRecord;
use crate::core::station::StationRecord;
use crate::core::types::StationId;

/// A record that carries its own stable key
pub trait Keyed {
    type Key: Clone + Eq + Hash + std::fmt::Debug + std::fmt::Display;

    fn key(&self) -> &Self::Key;
}

impl Keyed for ComponentRecord {
    type Key = String;

    fn key(&self) -> &String {
        &self.reference
    }
}

impl Keyed for StationRecord {
    type Key = StationId;

    fn key(&self) -> &StationId {
        &self.id
    }
}

/// Owned collection of records indexed by key.
///
/// Entries are never mutated in place: an update builds a new record from
/// the current one and swaps it in, so snapshots taken earlier keep seeing
/// the old value while sharing every unchanged entry.
#[derive(Debug)]
pub struct RecordStore<T: Keyed> {
    /// Records in load order
    records: Vec<Arc<T>>,

    /// Index: key -> position in records vec
    key_to_index: HashMap<T::Key, usize>,
}

/// BOM parts keyed by reference designator
pub type PartStore = RecordStore<ComponentRecord>;

/// Feeder stations keyed by station ID
pub type StationStore = RecordStore<StationRecord>;

impl<T: Keyed> RecordStore<T> {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            key_to_index: HashMap::new(),
        }
    }

    /// Build a store from records, keeping the first record for each key
    pub fn from_records(records: impl IntoIterator<Item = T>) -> Self {
        let mut store = Self::new();
        for record in records {
            store.insert(record);
        }
        store
    }

    /// Add a record; returns false (and drops it) if the key is taken
    pub fn insert(&mut self, record: T) -> bool {
        let key = record.key().clone();
        if self.key_to_index.contains_key(&key) {
            warn!("Duplicate key '{}' ignored", key);
            return false;
        }

        self.key_to_index.insert(key, self.records.len());
        self.records.push(Arc::new(record));
        true
    }

    /// Get a record by key
    pub fn get(&self, key: &T::Key) -> Option<&T> {
        self.key_to_index
            .get(key)
            .map(|&idx| &*self.records[idx])
    }

    pub fn contains(&self, key: &T::Key) -> bool {
        self.key_to_index.contains_key(key)
    }

    /// Position of a record in load order
    pub fn position(&self, key: &T::Key) -> Option<usize> {
        self.key_to_index.get(key).copied()
    }

    /// Iterate records in load order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.records.iter().map(|r| &**r)
    }

    /// Replace the record under `key` with `f(current)`.
    ///
    /// The replacement must keep the same key. Returns false when the key is
    /// unknown or `f` tried to change it.
    pub fn replace_with(&mut self, key: &T::Key, f: impl FnOnce(&T) -> T) -> bool {
        let Some(&idx) = self.key_to_index.get(key) else {
            return false;
        };

        let updated = f(&self.records[idx]);
        if updated.key() != key {
            warn!("Refusing update of '{}' that changes its key", key);
            return false;
        }

        self.records[idx] = Arc::new(updated);
        true
    }

    /// Cheap copy sharing every entry with this store
    #[must_use]
    pub fn snapshot(&self) -> Self {
        Self {
            records: self.records.clone(),
            key_to_index: self.key_to_index.clone(),
        }
    }

    /// Clone the records out in load order
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.iter().cloned().collect()
    }

    /// Number of records in the store
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<T: Keyed> Default for RecordStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl StationStore {
    /// Stations ordered for display: numerically by ID
    pub fn sorted_by_id(&self) -> Vec<&StationRecord> {
        let mut stations: Vec<&StationRecord> = self.iter().collect();
        stations.sort_by(|a, b| a.id.catalog_cmp(&b.id));
        stations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Assignment;

    fn make_parts() -> PartStore {
        PartStore::from_records(vec![
            ComponentRecord::new("R1", "10k"),
            ComponentRecord::new("C1", "100n"),
            ComponentRecord::new("R2", "4.7k"),
        ])
    }

    #[test]
    fn test_get_by_key() {
        let parts = make_parts();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts.get(&"C1".to_string()).unwrap().value, "100n");
        assert!(parts.get(&"U1".to_string()).is_none());
        assert_eq!(parts.position(&"R2".to_string()), Some(2));
    }

    #[test]
    fn test_duplicate_keys_keep_first() {
        let parts = PartStore::from_records(vec![
            ComponentRecord::new("R1", "10k"),
            ComponentRecord::new("R1", "22k"),
        ]);
        assert_eq!(parts.len(), 1);
        assert_eq!(parts.get(&"R1".to_string()).unwrap().value, "10k");
    }

    #[test]
    fn test_replace_with_leaves_snapshots_untouched() {
        let mut parts = make_parts();
        let before = parts.snapshot();

        let updated = parts.replace_with(&"R1".to_string(), |p| {
            p.clone()
                .with_assignment(Assignment::Station(StationId::new("3")))
        });
        assert!(updated);

        assert_eq!(
            parts.get(&"R1".to_string()).unwrap().assignment,
            Assignment::Station(StationId::new("3"))
        );
        assert_eq!(
            before.get(&"R1".to_string()).unwrap().assignment,
            Assignment::Unassigned
        );
    }

    #[test]
    fn test_replace_with_rejects_unknown_and_rekeyed() {
        let mut parts = make_parts();
        assert!(!parts.replace_with(&"U9".to_string(), Clone::clone));

        let rekeyed = parts.replace_with(&"R1".to_string(), |p| {
            let mut p = p.clone();
            p.reference = "R99".to_string();
            p
        });
        assert!(!rekeyed);
        assert!(parts.contains(&"R1".to_string()));
    }

    #[test]
    fn test_stations_sorted_by_id() {
        let stations = StationStore::from_records(vec![
            StationRecord::new("12", "a"),
            StationRecord::new("3", "b"),
            StationRecord::new("40", "c"),
        ]);
        let ids: Vec<&str> = stations
            .sorted_by_id()
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(ids, vec!["3", "12", "40"]);
    }
}
