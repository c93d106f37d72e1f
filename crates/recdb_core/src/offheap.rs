//! Byte-cache engine.
//!
//! Records live in a bounded byte cache keyed by the decimal form of their
//! identifier. The cache only stores opaque bytes, so every write pays a
//! CBOR encode and every read a decode.
//!
//! # Limitations
//!
//! - `get_all` is not supported. The cache is treated as a key/value byte
//!   store without key enumeration, and this engine reports
//!   [`StoreError::Unsupported`] rather than an empty list.
//! - The cache is bounded by a byte budget and evicts under pressure; an
//!   evicted record reads as `NotFound`.
//! - A record whose key and encoding together outweigh the whole budget is
//!   refused with `InvalidArgument`.
//!
//! # Consistency
//!
//! `update` and `delete` check for the key and then write or invalidate it
//! in a second cache call. A concurrent delete landing in that gap means
//! `update` can re-insert a record another caller just removed, and
//! `delete` can report success for a record another caller removed first.

use crate::alloc::IdAllocator;
use crate::config::Backend;
use crate::error::{StoreError, StoreResult};
use crate::record::{Record, RecordId};
use crate::store::{Closable, RecordStore};
use bytes::Bytes;
use moka::sync::Cache;
use recdb_codec::{Decode, Encode};
use std::sync::atomic::{AtomicBool, Ordering};

/// Engine backed by a bounded byte cache.
pub struct OffHeapStore {
    cache: Cache<String, Bytes>,
    ids: IdAllocator,
    capacity_bytes: u64,
    closed: AtomicBool,
}

impl OffHeapStore {
    /// Creates a store whose cache holds at most `capacity_bytes` of keys
    /// and encoded values.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a zero budget.
    pub fn with_capacity(capacity_bytes: u64) -> StoreResult<Self> {
        if capacity_bytes == 0 {
            return Err(StoreError::invalid_argument(
                "off-heap cache capacity must be non-zero",
            ));
        }

        let cache = Cache::builder()
            .max_capacity(capacity_bytes)
            .weigher(|key: &String, value: &Bytes| -> u32 {
                u32::try_from(key.len() + value.len()).unwrap_or(u32::MAX)
            })
            .build();

        tracing::debug!(capacity_bytes, "off-heap store opened");

        Ok(Self {
            cache,
            ids: IdAllocator::new(),
            capacity_bytes,
            closed: AtomicBool::new(false),
        })
    }

    /// Configured byte budget.
    pub fn capacity_bytes(&self) -> u64 {
        self.capacity_bytes
    }

    /// Bytes currently accounted to live entries.
    pub fn weighted_size(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.weighted_size()
    }

    /// Approximate number of live entries.
    pub fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }

    /// Drops every cached entry. Later calls do nothing.
    ///
    /// Operations after close return `Closed`.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.cache.invalidate_all();
        self.cache.run_pending_tasks();
        tracing::info!("off-heap store closed");
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if self.closed.load(Ordering::Acquire) {
            Err(StoreError::Closed)
        } else {
            Ok(())
        }
    }

    fn key(id: RecordId) -> String {
        id.to_string()
    }

    /// Encodes `record` and checks it fits the budget, without inserting.
    fn entry(&self, record: &Record) -> StoreResult<(String, Bytes)> {
        let key = Self::key(record.id);
        let bytes = Bytes::from(record.encode()?);
        let weight = (key.len() + bytes.len()) as u64;
        if weight > self.capacity_bytes {
            return Err(StoreError::invalid_argument(format!(
                "record of {weight} bytes exceeds cache budget of {} bytes",
                self.capacity_bytes
            )));
        }
        Ok((key, bytes))
    }

    fn put(&self, record: &Record) -> StoreResult<()> {
        let (key, bytes) = self.entry(record)?;
        self.cache.insert(key, bytes);
        Ok(())
    }

    fn ensure_exists(&self, id: RecordId) -> StoreResult<String> {
        let key = Self::key(id);
        if self.cache.contains_key(&key) {
            Ok(key)
        } else {
            Err(StoreError::not_found(id))
        }
    }
}

impl RecordStore for OffHeapStore {
    fn create(&self, record: &mut Record) -> StoreResult<()> {
        self.ensure_open()?;
        if record.id.is_assigned() {
            return Err(StoreError::invalid_argument(format!(
                "record already carries id {}",
                record.id
            )));
        }

        // The widest identifier encodes largest, so a record that fits with
        // it fits with whatever id is allocated next.
        self.entry(&record.clone().with_id(RecordId::new(u64::MAX)))?;

        let id = self.ids.allocate();
        self.put(&record.clone().with_id(id))?;
        record.id = id;
        Ok(())
    }

    fn get_by_id(&self, id: RecordId) -> StoreResult<Record> {
        self.ensure_open()?;
        let bytes = self
            .cache
            .get(&Self::key(id))
            .ok_or_else(|| StoreError::not_found(id))?;
        Ok(Record::decode(&bytes)?)
    }

    fn get_all(&self) -> StoreResult<Vec<Record>> {
        self.ensure_open()?;
        Err(StoreError::unsupported("get_all"))
    }

    fn update(&self, id: RecordId, record: Record) -> StoreResult<()> {
        self.ensure_open()?;
        self.ensure_exists(id)?;
        self.put(&record.with_id(id))
    }

    fn delete(&self, id: RecordId) -> StoreResult<()> {
        self.ensure_open()?;
        let key = self.ensure_exists(id)?;
        self.cache.invalidate(&key);
        Ok(())
    }

    fn backend(&self) -> Backend {
        Backend::OffHeap
    }
}

impl Closable for OffHeapStore {
    fn close(&self) {
        OffHeapStore::close(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Status;

    fn store() -> OffHeapStore {
        OffHeapStore::with_capacity(1024 * 1024).unwrap()
    }

    #[test]
    fn crud() {
        let store = store();
        let mut record = Record::new("a", Status::Active);
        store.create(&mut record).unwrap();
        assert_eq!(store.get_by_id(record.id).unwrap(), record);

        store
            .update(record.id, Record::new("b", Status::Inactive))
            .unwrap();
        assert_eq!(store.get_by_id(record.id).unwrap().name, "b");

        store.delete(record.id).unwrap();
        assert!(store.get_by_id(record.id).unwrap_err().is_not_found());
        assert!(store.delete(record.id).unwrap_err().is_not_found());
    }

    #[test]
    fn get_all_is_unsupported() {
        let store = store();
        store.create(&mut Record::new("a", Status::Active)).unwrap();
        assert!(matches!(
            store.get_all(),
            Err(StoreError::Unsupported {
                operation: "get_all"
            })
        ));
    }

    #[test]
    fn corrupt_bytes_surface_codec_error() {
        let store = store();
        store
            .cache
            .insert("1".to_string(), Bytes::from_static(&[0xff, 0x00]));
        assert!(matches!(
            store.get_by_id(RecordId::new(1)),
            Err(StoreError::Codec(_))
        ));
    }

    #[test]
    fn operations_after_close_are_closed() {
        let store = store();
        let mut record = Record::new("a", Status::Active);
        store.create(&mut record).unwrap();
        assert_eq!(store.entry_count(), 1);

        store.close();
        store.close();

        assert!(matches!(store.get_by_id(record.id), Err(StoreError::Closed)));
        assert!(matches!(
            store.create(&mut Record::new("b", Status::Active)),
            Err(StoreError::Closed)
        ));
        assert!(matches!(store.delete(record.id), Err(StoreError::Closed)));
    }

    #[test]
    fn budget_bounds_weighted_size() {
        let store = OffHeapStore::with_capacity(512).unwrap();
        for i in 0..200 {
            store
                .create(&mut Record::new(format!("record-{i}"), Status::Active))
                .unwrap();
        }
        assert!(store.weighted_size() <= store.capacity_bytes());
    }

    #[test]
    fn oversized_record_is_refused() {
        let store = OffHeapStore::with_capacity(4096).unwrap();
        let mut big = Record::new("x".repeat(8 * 1024), Status::Active);
        assert!(matches!(
            store.create(&mut big),
            Err(StoreError::InvalidArgument { .. })
        ));
        assert!(!big.id.is_assigned());

        let mut small = Record::new("a", Status::Active);
        store.create(&mut small).unwrap();
        assert_eq!(small.id, RecordId::new(1));

        let err = store.update(small.id, Record::new("x".repeat(8 * 1024), Status::Inactive));
        assert!(matches!(err, Err(StoreError::InvalidArgument { .. })));
        assert_eq!(store.get_by_id(small.id).unwrap(), small);
    }

    #[test]
    fn failed_create_can_be_retried() {
        let store = store();
        let mut record = Record::new(
            "x".repeat(recdb_codec::MAX_PAYLOAD_LEN + 10),
            Status::Active,
        );
        assert!(matches!(store.create(&mut record), Err(StoreError::Codec(_))));
        assert!(!record.id.is_assigned());

        record.name = "short".to_string();
        store.create(&mut record).unwrap();
        assert_eq!(record.id, RecordId::new(1));
        assert_eq!(store.get_by_id(record.id).unwrap(), record);
    }

    #[test]
    fn zero_capacity_rejected() {
        assert!(matches!(
            OffHeapStore::with_capacity(0),
            Err(StoreError::InvalidArgument { .. })
        ));
    }
}
