//! A single lock-guarded slice of the keyspace.

use crate::record::{Record, RecordId};
use parking_lot::RwLock;
use std::collections::HashMap;

/// One independently locked keyed collection.
///
/// A partition is the unit of concurrency of the sharded engines: operations
/// on different partitions never contend. Its map is only touched while the
/// guard is held, and the guard is never held across partitions.
#[derive(Debug, Default)]
pub struct Partition {
    records: RwLock<HashMap<RecordId, Record>>,
}

impl Partition {
    /// Creates an empty partition.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites the record under its own identifier.
    pub fn insert(&self, record: Record) {
        self.records.write().insert(record.id, record);
    }

    /// Returns a copy of the record under `id`.
    pub fn get(&self, id: RecordId) -> Option<Record> {
        self.records.read().get(&id).cloned()
    }

    /// Replaces an existing record, forcing its identifier to `id`.
    ///
    /// Returns false, leaving the partition untouched, if `id` is absent.
    pub fn replace(&self, id: RecordId, record: Record) -> bool {
        let mut records = self.records.write();
        match records.get_mut(&id) {
            Some(slot) => {
                *slot = record.with_id(id);
                true
            }
            None => false,
        }
    }

    /// Removes the record under `id`, returning whether it existed.
    pub fn remove(&self, id: RecordId) -> bool {
        self.records.write().remove(&id).is_some()
    }

    /// Copies out every record under the read guard.
    pub fn snapshot(&self) -> Vec<Record> {
        self.records.read().values().cloned().collect()
    }

    /// Number of records currently stored.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// True if the partition holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Status;

    fn record(id: u64, name: &str) -> Record {
        Record::new(name, Status::Active).with_id(RecordId::new(id))
    }

    #[test]
    fn insert_and_get() {
        let p = Partition::new();
        p.insert(record(1, "a"));
        assert_eq!(p.get(RecordId::new(1)).unwrap().name, "a");
        assert!(p.get(RecordId::new(2)).is_none());
    }

    #[test]
    fn replace_forces_id() {
        let p = Partition::new();
        p.insert(record(4, "a"));

        assert!(p.replace(RecordId::new(4), record(99, "b")));
        let stored = p.get(RecordId::new(4)).unwrap();
        assert_eq!(stored.id, RecordId::new(4));
        assert_eq!(stored.name, "b");
        assert!(p.get(RecordId::new(99)).is_none());
    }

    #[test]
    fn replace_missing_is_noop() {
        let p = Partition::new();
        assert!(!p.replace(RecordId::new(1), record(1, "a")));
        assert!(p.is_empty());
    }

    #[test]
    fn remove_reports_presence() {
        let p = Partition::new();
        p.insert(record(1, "a"));
        assert!(p.remove(RecordId::new(1)));
        assert!(!p.remove(RecordId::new(1)));
    }

    #[test]
    fn snapshot_copies_all() {
        let p = Partition::new();
        for i in 1..=5 {
            p.insert(record(i, "x"));
        }
        let mut ids: Vec<_> = p.snapshot().into_iter().map(|r| r.id.as_u64()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert_eq!(p.len(), 5);
    }
}
