//! Test fixtures and store helpers.
//!
//! Stores opened here use small layouts (four partitions, a short actor
//! queue, a 4 MiB cache) so tests stay fast on any machine.

use recdb_core::{open, Backend, Record, RecordStore, Status, StoreConfig, StoreHandle};
use std::sync::Arc;

/// Byte budget used for off-heap fixtures.
pub const TEST_CACHE_BYTES: u64 = 4 * 1024 * 1024;

/// A test store that is closed when dropped.
pub struct TestStore {
    handle: StoreHandle,
}

impl TestStore {
    /// Opens `backend` with the test layout.
    pub fn open(backend: Backend) -> Self {
        Self::with_config(test_config(backend))
    }

    /// Opens a store from an explicit configuration.
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            handle: open(&config).expect("Failed to open test store"),
        }
    }

    /// The backend under test.
    pub fn backend(&self) -> Backend {
        self.handle.backend()
    }

    /// A shared reference to the engine, for handing to threads.
    pub fn shared(&self) -> Arc<dyn RecordStore> {
        self.handle.store()
    }

    /// The underlying handle.
    pub fn handle(&self) -> &StoreHandle {
        &self.handle
    }
}

impl std::ops::Deref for TestStore {
    type Target = dyn RecordStore;

    fn deref(&self) -> &Self::Target {
        &*self.handle
    }
}

impl Drop for TestStore {
    fn drop(&mut self) {
        self.handle.close();
    }
}

/// The configuration fixtures use for `backend`.
pub fn test_config(backend: Backend) -> StoreConfig {
    StoreConfig::new()
        .backend(backend)
        .partitions(4)
        .queue_capacity(64)
        .cache_capacity_bytes(TEST_CACHE_BYTES)
}

/// Every backend, in declaration order.
pub fn all_backends() -> Vec<Backend> {
    Backend::ALL.to_vec()
}

/// True for backends whose `get_all` enumerates records.
pub fn supports_get_all(backend: Backend) -> bool {
    backend != Backend::OffHeap
}

/// Runs `f` once against a fresh store of every backend.
///
/// # Example
///
/// ```rust,ignore
/// use recdb_testkit::for_each_backend;
///
/// for_each_backend(|store| {
///     assert!(store.get_by_id(1.into()).is_err());
/// });
/// ```
pub fn for_each_backend<F>(mut f: F)
where
    F: FnMut(&TestStore),
{
    for backend in all_backends() {
        let store = TestStore::open(backend);
        f(&store);
    }
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;

    /// Opens `backend` and creates `count` records named `record-{i}`.
    ///
    /// Even indices are active.
    pub fn populated_store(backend: Backend, count: usize) -> (TestStore, Vec<Record>) {
        let store = TestStore::open(backend);
        let mut records = Vec::with_capacity(count);
        for i in 0..count {
            let status = if i % 2 == 0 {
                Status::Active
            } else {
                Status::Inactive
            };
            let mut record = Record::new(format!("record-{i}"), status);
            store.create(&mut record).expect("Failed to create record");
            records.push(record);
        }
        (store, records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixtures_open_every_backend() {
        let mut seen = Vec::new();
        for_each_backend(|store| seen.push(store.backend()));
        assert_eq!(seen, all_backends());
    }

    #[test]
    fn drop_closes_handle() {
        let store = TestStore::open(Backend::Actor);
        let shared = store.shared();
        drop(store);
        assert!(shared.get_all().is_err());
    }

    #[test]
    fn populated_store_has_records() {
        let (store, records) = scenarios::populated_store(Backend::Sharded, 10);
        assert_eq!(records.len(), 10);
        assert_eq!(store.get_all().unwrap().len(), 10);
        assert_eq!(records[1].status, Status::Inactive);
    }
}
