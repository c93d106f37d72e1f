//! Concurrent-map engine.
//!
//! Wraps a single [`DashMap`] with no partitioning of its own and no
//! external lock. `get_by_id`, `update` and `delete` first check that the
//! key exists and then act, as two separate map operations.
//!
//! # Consistency
//!
//! The gap between the existence check and the mutation is an accepted
//! race. A concurrent delete landing in that gap means `update` can
//! re-insert a record another caller just removed, and `delete` can report
//! success for a record another caller removed first. Callers that need
//! per-key linearizability should pick the sharded or actor engine.
//!
//! `get_all` walks the map shard by shard; the result is consistent with a
//! single pass, not a single instant.

use crate::alloc::IdAllocator;
use crate::config::Backend;
use crate::error::{StoreError, StoreResult};
use crate::record::{Record, RecordId};
use crate::store::RecordStore;
use dashmap::DashMap;

/// Engine backed by one concurrent map.
#[derive(Debug, Default)]
pub struct LockFreeStore {
    records: DashMap<RecordId, Record>,
    ids: IdAllocator,
}

impl LockFreeStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if no records are stored.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn ensure_exists(&self, id: RecordId) -> StoreResult<()> {
        if self.records.contains_key(&id) {
            Ok(())
        } else {
            Err(StoreError::not_found(id))
        }
    }
}

impl RecordStore for LockFreeStore {
    fn create(&self, record: &mut Record) -> StoreResult<()> {
        if record.id.is_assigned() {
            return Err(StoreError::invalid_argument(format!(
                "record already carries id {}",
                record.id
            )));
        }
        let id = self.ids.allocate();
        record.id = id;
        self.records.insert(id, record.clone());
        Ok(())
    }

    fn get_by_id(&self, id: RecordId) -> StoreResult<Record> {
        self.records
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::not_found(id))
    }

    fn get_all(&self) -> StoreResult<Vec<Record>> {
        Ok(self
            .records
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }

    fn update(&self, id: RecordId, record: Record) -> StoreResult<()> {
        self.ensure_exists(id)?;
        self.records.insert(id, record.with_id(id));
        Ok(())
    }

    fn delete(&self, id: RecordId) -> StoreResult<()> {
        self.ensure_exists(id)?;
        self.records.remove(&id);
        Ok(())
    }

    fn backend(&self) -> Backend {
        Backend::LockFree
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Status;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn crud() {
        let store = LockFreeStore::new();
        let mut record = Record::new("a", Status::Active);
        store.create(&mut record).unwrap();
        assert_eq!(store.get_by_id(record.id).unwrap(), record);

        store
            .update(record.id, Record::new("b", Status::Inactive))
            .unwrap();
        let stored = store.get_by_id(record.id).unwrap();
        assert_eq!(stored.name, "b");
        assert_eq!(stored.id, record.id);

        store.delete(record.id).unwrap();
        assert!(store.get_by_id(record.id).unwrap_err().is_not_found());
        assert!(store.delete(record.id).unwrap_err().is_not_found());
    }

    #[test]
    fn update_missing_does_not_insert() {
        let store = LockFreeStore::new();
        let result = store.update(RecordId::new(3), Record::new("x", Status::Active));
        assert!(result.unwrap_err().is_not_found());
        assert!(store.is_empty());
    }

    #[test]
    fn concurrent_creates() {
        let store = Arc::new(LockFreeStore::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..500 {
                        store.create(&mut Record::new("x", Status::Active)).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let all = store.get_all().unwrap();
        let ids: HashSet<_> = all.iter().map(|r| r.id).collect();
        assert_eq!(all.len(), 2000);
        assert_eq!(ids.len(), 2000);
    }
}
