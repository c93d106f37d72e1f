//! Model-based integration harness.
//!
//! [`IntegrationHarness`] drives a store and an in-memory model side by
//! side, asserting after every operation that the store agrees with the
//! model.

use crate::fixtures::{supports_get_all, TestStore};
use crate::generators::StoreOperation;
use recdb_core::{Backend, Record, RecordId, Status, StoreError};
use std::collections::BTreeMap;

/// An identifier no store in these tests will ever issue.
pub const NEVER_ISSUED: RecordId = RecordId::new(u64::MAX);

/// A store paired with the records it is expected to hold.
pub struct IntegrationHarness {
    /// The store under test.
    pub store: TestStore,
    expected: BTreeMap<RecordId, Record>,
    created: Vec<RecordId>,
}

impl IntegrationHarness {
    /// Creates a harness over a fresh store of `backend`.
    pub fn new(backend: Backend) -> Self {
        Self {
            store: TestStore::open(backend),
            expected: BTreeMap::new(),
            created: Vec::new(),
        }
    }

    /// Creates a record and tracks it.
    pub fn create(&mut self, mut record: Record) -> RecordId {
        self.store
            .create(&mut record)
            .expect("Failed to create record");
        assert!(record.id.is_assigned(), "create did not assign an id");
        if let Some(last) = self.created.last() {
            assert!(record.id > *last, "ids must increase: {:?} after {:?}", record.id, last);
        }
        self.created.push(record.id);
        self.expected.insert(record.id, record.clone());
        record.id
    }

    /// Applies one generated operation and checks its outcome.
    pub fn apply(&mut self, op: &StoreOperation) {
        match op {
            StoreOperation::Create { record } => {
                self.create(record.clone());
            }
            StoreOperation::Get { slot } => {
                if let Some(id) = self.pick(*slot) {
                    let actual = self.store.get_by_id(id);
                    self.check_against_model(id, actual);
                }
            }
            StoreOperation::Update { slot, record } => {
                if let Some(id) = self.pick(*slot) {
                    let result = self.store.update(id, record.clone());
                    if self.expected.contains_key(&id) {
                        result.expect("Failed to update record");
                        self.expected.insert(id, record.clone().with_id(id));
                    } else {
                        assert_not_found(result, id);
                    }
                }
            }
            StoreOperation::Delete { slot } => {
                if let Some(id) = self.pick(*slot) {
                    let result = self.store.delete(id);
                    if self.expected.remove(&id).is_some() {
                        result.expect("Failed to delete record");
                    } else {
                        assert_not_found(result, id);
                    }
                }
            }
            StoreOperation::Missing => {
                assert_not_found(self.store.get_by_id(NEVER_ISSUED), NEVER_ISSUED);
                assert_not_found(
                    self.store
                        .update(NEVER_ISSUED, Record::new("ghost", Status::Inactive)),
                    NEVER_ISSUED,
                );
                assert_not_found(self.store.delete(NEVER_ISSUED), NEVER_ISSUED);
            }
        }
    }

    /// Verifies every tracked record, and the full listing where supported.
    pub fn verify_all(&self) {
        for (id, expected) in &self.expected {
            let actual = self.store.get_by_id(*id).expect("Failed to get record");
            assert_eq!(&actual, expected, "record mismatch for {id:?}");
        }

        if supports_get_all(self.store.backend()) {
            let mut all = self.store.get_all().expect("Failed to list records");
            all.sort_by_key(|r| r.id);
            let expected: Vec<_> = self.expected.values().cloned().collect();
            assert_eq!(all, expected);
        }
    }

    /// Returns the count of tracked records.
    pub fn tracked_count(&self) -> usize {
        self.expected.len()
    }

    fn pick(&self, slot: usize) -> Option<RecordId> {
        if self.created.is_empty() {
            None
        } else {
            Some(self.created[slot % self.created.len()])
        }
    }

    fn check_against_model(&self, id: RecordId, actual: Result<Record, StoreError>) {
        match self.expected.get(&id) {
            Some(expected) => {
                assert_eq!(&actual.expect("Failed to get record"), expected);
            }
            None => assert_not_found(actual, id),
        }
    }
}

/// Asserts that `result` is a `NotFound` for `id`.
pub fn assert_not_found<T: std::fmt::Debug>(result: Result<T, StoreError>, id: RecordId) {
    match result {
        Err(StoreError::NotFound { id: missing }) => assert_eq!(missing, id),
        other => panic!("expected NotFound for {id:?}, got {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn harness_tracks_lifecycle() {
        let mut harness = IntegrationHarness::new(Backend::LockFree);
        let id = harness.create(Record::new("a", Status::Active));
        harness.apply(&StoreOperation::Update {
            slot: 0,
            record: Record::new("b", Status::Inactive),
        });
        harness.verify_all();
        assert_eq!(harness.tracked_count(), 1);

        harness.apply(&StoreOperation::Delete { slot: 0 });
        harness.apply(&StoreOperation::Delete { slot: 0 });
        harness.apply(&StoreOperation::Get { slot: 0 });
        assert_eq!(harness.tracked_count(), 0);
        assert_not_found(harness.store.get_by_id(id), id);
    }

    #[test]
    fn missing_ids_on_empty_store() {
        let mut harness = IntegrationHarness::new(Backend::Actor);
        harness.apply(&StoreOperation::Missing);
        harness.apply(&StoreOperation::Get { slot: 3 });
        harness.verify_all();
    }
}
