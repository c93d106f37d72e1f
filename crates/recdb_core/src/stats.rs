//! Operation counters.
//!
//! [`StoreStats`] is a set of atomic counters that can be read while
//! operations are in flight. [`MeteredStore`] wraps any engine and feeds the
//! counters from each call's outcome.
//!
//! ```rust,ignore
//! use recdb_core::{open, MeteredStore, StoreConfig};
//!
//! let handle = open(&StoreConfig::new())?;
//! let metered = MeteredStore::new(handle.store());
//! // ... issue operations through `metered` ...
//! println!("reads: {}", metered.stats().reads());
//! ```

use crate::config::Backend;
use crate::error::{StoreError, StoreResult};
use crate::record::{Record, RecordId};
use crate::store::RecordStore;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Atomic per-operation counters.
///
/// Counters only grow. A call that fails still counts toward its operation,
/// and additionally toward `not_found` or `errors`.
#[derive(Debug, Default)]
pub struct StoreStats {
    creates: AtomicU64,
    reads: AtomicU64,
    updates: AtomicU64,
    deletes: AtomicU64,
    scans: AtomicU64,
    not_found: AtomicU64,
    errors: AtomicU64,
}

impl StoreStats {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_create(&self) {
        self.creates.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_read(&self) {
        self.reads.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_update(&self) {
        self.updates.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_delete(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_scan(&self) {
        self.scans.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts a failed call by kind.
    pub(crate) fn record_failure(&self, error: &StoreError) {
        if error.is_not_found() {
            self.not_found.fetch_add(1, Ordering::Relaxed);
        } else {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Create calls.
    pub fn creates(&self) -> u64 {
        self.creates.load(Ordering::Relaxed)
    }

    /// `get_by_id` calls.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Update calls.
    pub fn updates(&self) -> u64 {
        self.updates.load(Ordering::Relaxed)
    }

    /// Delete calls.
    pub fn deletes(&self) -> u64 {
        self.deletes.load(Ordering::Relaxed)
    }

    /// `get_all` calls.
    pub fn scans(&self) -> u64 {
        self.scans.load(Ordering::Relaxed)
    }

    /// Calls that failed with `NotFound`.
    pub fn not_found(&self) -> u64 {
        self.not_found.load(Ordering::Relaxed)
    }

    /// Calls that failed with anything other than `NotFound`.
    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    /// Copies every counter.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            creates: self.creates(),
            reads: self.reads(),
            updates: self.updates(),
            deletes: self.deletes(),
            scans: self.scans(),
            not_found: self.not_found(),
            errors: self.errors(),
        }
    }
}

/// Point-in-time copy of [`StoreStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StatsSnapshot {
    /// Create calls.
    pub creates: u64,
    /// `get_by_id` calls.
    pub reads: u64,
    /// Update calls.
    pub updates: u64,
    /// Delete calls.
    pub deletes: u64,
    /// `get_all` calls.
    pub scans: u64,
    /// Calls that failed with `NotFound`.
    pub not_found: u64,
    /// Calls that failed otherwise.
    pub errors: u64,
}

impl StatsSnapshot {
    /// Total calls across all five operations.
    pub fn operations(&self) -> u64 {
        self.creates + self.reads + self.updates + self.deletes + self.scans
    }
}

/// Engine decorator that counts every call.
pub struct MeteredStore<S> {
    inner: S,
    stats: Arc<StoreStats>,
}

impl<S: RecordStore> MeteredStore<S> {
    /// Wraps `inner` with fresh counters.
    pub fn new(inner: S) -> Self {
        Self::with_stats(inner, Arc::new(StoreStats::new()))
    }

    /// Wraps `inner`, feeding counters shared with other wrappers.
    pub fn with_stats(inner: S, stats: Arc<StoreStats>) -> Self {
        Self { inner, stats }
    }

    /// The counters.
    pub fn stats(&self) -> &Arc<StoreStats> {
        &self.stats
    }

    /// The wrapped engine.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn observe<T>(&self, result: StoreResult<T>) -> StoreResult<T> {
        if let Err(error) = &result {
            self.stats.record_failure(error);
        }
        result
    }
}

impl<S: RecordStore> RecordStore for MeteredStore<S> {
    fn create(&self, record: &mut Record) -> StoreResult<()> {
        self.stats.record_create();
        self.observe(self.inner.create(record))
    }

    fn get_by_id(&self, id: RecordId) -> StoreResult<Record> {
        self.stats.record_read();
        self.observe(self.inner.get_by_id(id))
    }

    fn get_all(&self) -> StoreResult<Vec<Record>> {
        self.stats.record_scan();
        self.observe(self.inner.get_all())
    }

    fn update(&self, id: RecordId, record: Record) -> StoreResult<()> {
        self.stats.record_update();
        self.observe(self.inner.update(id, record))
    }

    fn delete(&self, id: RecordId) -> StoreResult<()> {
        self.stats.record_delete();
        self.observe(self.inner.delete(id))
    }

    fn backend(&self) -> Backend {
        self.inner.backend()
    }
}
