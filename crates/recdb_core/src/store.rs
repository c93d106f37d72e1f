//! The record store contract and the engine factory.

use crate::actor::ActorStore;
use crate::config::{Backend, StoreConfig};
use crate::error::StoreResult;
use crate::lockfree::LockFreeStore;
use crate::offheap::OffHeapStore;
use crate::record::{Record, RecordId};
use crate::sharded::ShardedStore;
use parking_lot::Mutex;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// The capability contract every engine implements.
///
/// Engines are `Send + Sync` and are shared behind an `Arc`; every method
/// takes `&self` and may be called from any number of threads.
///
/// # Invariants
///
/// - `create` assigns a fresh identifier and writes it back into the record
/// - `get_by_id`, `update` and `delete` on an identifier that is not stored
///   return [`StoreError::NotFound`](crate::StoreError::NotFound)
/// - `update` never changes a record's identifier
pub trait RecordStore: Send + Sync {
    /// Stores a new record.
    ///
    /// On success `record.id` holds the assigned identifier.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `record` already carries an identifier.
    fn create(&self, record: &mut Record) -> StoreResult<()>;

    /// Fetches a copy of the record stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no such record exists.
    fn get_by_id(&self, id: RecordId) -> StoreResult<Record>;

    /// Returns every live record.
    ///
    /// Ordering and snapshot semantics are engine specific.
    ///
    /// # Errors
    ///
    /// Returns `Unsupported` for engines that cannot enumerate, or `Closed`
    /// once background workers are gone.
    fn get_all(&self) -> StoreResult<Vec<Record>>;

    /// Replaces the record stored under `id`.
    ///
    /// The stored copy always carries `id`, whatever `record.id` says.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no such record exists.
    fn update(&self, id: RecordId, record: Record) -> StoreResult<()>;

    /// Removes the record stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no such record exists.
    fn delete(&self, id: RecordId) -> StoreResult<()>;

    /// The backend this engine implements.
    fn backend(&self) -> Backend;
}

impl<T: RecordStore + ?Sized> RecordStore for Arc<T> {
    fn create(&self, record: &mut Record) -> StoreResult<()> {
        (**self).create(record)
    }

    fn get_by_id(&self, id: RecordId) -> StoreResult<Record> {
        (**self).get_by_id(id)
    }

    fn get_all(&self) -> StoreResult<Vec<Record>> {
        (**self).get_all()
    }

    fn update(&self, id: RecordId, record: Record) -> StoreResult<()> {
        (**self).update(id, record)
    }

    fn delete(&self, id: RecordId) -> StoreResult<()> {
        (**self).delete(id)
    }

    fn backend(&self) -> Backend {
        (**self).backend()
    }
}

/// Optional capability of engines that hold background resources.
pub trait Closable: Send + Sync {
    /// Releases background threads or native resources.
    ///
    /// Callers are expected to close once; engines in this crate tolerate a
    /// second call as a no-op.
    fn close(&self);
}

/// An opened store together with its optional closer.
///
/// Whether the engine is [`Closable`] is decided once, when the handle is
/// built, so teardown never has to inspect the engine type.
pub struct StoreHandle {
    backend: Backend,
    store: Arc<dyn RecordStore>,
    closer: Mutex<Option<Arc<dyn Closable>>>,
}

impl StoreHandle {
    /// Wraps an engine without background resources.
    pub fn new<S>(store: S) -> Self
    where
        S: RecordStore + 'static,
    {
        Self {
            backend: store.backend(),
            store: Arc::new(store),
            closer: Mutex::new(None),
        }
    }

    /// Wraps an engine that must be closed on teardown.
    pub fn closable<S>(store: S) -> Self
    where
        S: RecordStore + Closable + 'static,
    {
        let backend = store.backend();
        let shared = Arc::new(store);
        let closer: Arc<dyn Closable> = shared.clone();
        Self {
            backend,
            store: shared,
            closer: Mutex::new(Some(closer)),
        }
    }

    /// The backend behind this handle.
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// A shared reference to the engine.
    pub fn store(&self) -> Arc<dyn RecordStore> {
        Arc::clone(&self.store)
    }

    /// True while a closer is pending.
    pub fn needs_close(&self) -> bool {
        self.closer.lock().is_some()
    }

    /// Runs the closer, if any, exactly once.
    ///
    /// Returns true when this call released resources.
    pub fn close(&self) -> bool {
        let closer = self.closer.lock().take();
        match closer {
            Some(closer) => {
                closer.close();
                tracing::info!(backend = %self.backend, "store closed");
                true
            }
            None => false,
        }
    }
}

impl Deref for StoreHandle {
    type Target = dyn RecordStore;

    fn deref(&self) -> &Self::Target {
        self.store.as_ref()
    }
}

impl fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreHandle")
            .field("backend", &self.backend)
            .field("needs_close", &self.needs_close())
            .finish()
    }
}

/// Constructs the engine selected by `config`.
///
/// Background workers are started before this returns.
///
/// # Errors
///
/// Returns `InvalidArgument` when the configuration cannot produce a working
/// engine (oversized partition request, zero cache budget, zero queue).
pub fn open(config: &StoreConfig) -> StoreResult<StoreHandle> {
    let handle = match config.backend {
        Backend::Sharded => StoreHandle::closable(ShardedStore::open(config.partitions)?),
        Backend::ShardedAffine => StoreHandle::closable(ShardedStore::open_affine(
            config.partitions,
            config.workers_per_pool,
        )?),
        Backend::Actor => StoreHandle::closable(ActorStore::spawn(config.queue_capacity)?),
        Backend::LockFree => StoreHandle::new(LockFreeStore::new()),
        Backend::OffHeap => {
            StoreHandle::closable(OffHeapStore::with_capacity(config.cache_capacity_bytes)?)
        }
    };

    tracing::debug!(backend = %handle.backend(), "store opened");
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Status;
    use crate::StoreError;

    #[test]
    fn open_every_backend() {
        for backend in Backend::ALL {
            let handle = open(&StoreConfig::new().backend(backend).partitions(4)).unwrap();
            assert_eq!(handle.backend(), backend);
            assert_eq!(handle.store().backend(), backend);
            handle.close();
        }
    }

    #[test]
    fn closable_is_resolved_at_open() {
        let lock_free = open(&StoreConfig::new().backend(Backend::LockFree)).unwrap();
        assert!(!lock_free.needs_close());
        assert!(!lock_free.close());

        let sharded = open(&StoreConfig::new().partitions(2)).unwrap();
        assert!(sharded.needs_close());
        assert!(sharded.close());
        assert!(!sharded.needs_close());
        assert!(!sharded.close());
    }

    #[test]
    fn handle_derefs_to_store() {
        let handle = open(&StoreConfig::new().backend(Backend::LockFree)).unwrap();
        let mut record = Record::new("a", Status::Active);
        handle.create(&mut record).unwrap();
        assert_eq!(handle.get_by_id(record.id).unwrap(), record);
    }

    #[test]
    fn invalid_config_fails_loudly() {
        let result = open(
            &StoreConfig::new()
                .backend(Backend::OffHeap)
                .cache_capacity_bytes(0),
        );
        assert!(matches!(result, Err(StoreError::InvalidArgument { .. })));

        let result = open(&StoreConfig::new().backend(Backend::Actor).queue_capacity(0));
        assert!(matches!(result, Err(StoreError::InvalidArgument { .. })));
    }
}
