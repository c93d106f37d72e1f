//! Partitioned record engine.
//!
//! Records are spread over a fixed, power-of-two number of [`Partition`]s.
//! The partition of a record is `id & (count - 1)`, computed once at
//! creation and again on every lookup, so a key operation touches exactly one
//! partition guard and never searches the others.
//!
//! Full scans are scatter/gather: one job per partition is handed to the
//! partition's scan lane, and the caller concatenates the per-partition
//! snapshots. There is no global ordering; the result is the union of
//! independent per-partition snapshots.
//!
//! Two layouts exist:
//! - [`ShardedStore::open`]: one dedicated scan thread per partition
//! - [`ShardedStore::open_affine`]: partitions folded onto a power-of-two
//!   number of core-pinned pools, `pool = partition & (pools - 1)`

mod scan;

use crate::alloc::IdAllocator;
use crate::config::Backend;
use crate::error::{StoreError, StoreResult};
use crate::partition::Partition;
use crate::record::{Record, RecordId};
use crate::store::{Closable, RecordStore};
use scan::{LaneLayout, ScanPool};
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Lower clamp for the derived default partition count.
pub const MIN_DEFAULT_PARTITIONS: usize = 4;

/// Upper clamp for the derived default partition count.
pub const MAX_DEFAULT_PARTITIONS: usize = 64;

/// Largest explicit partition request accepted.
///
/// Every partition of the plain layout owns a thread.
pub const MAX_PARTITIONS: usize = 4096;

/// Available hardware parallelism, at least 1.
pub fn hardware_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Realized partition count for a request.
///
/// Explicit requests are rounded up to the next power of two. A request of
/// `0` derives `2 * parallelism`, clamped to
/// [`MIN_DEFAULT_PARTITIONS`]..=[`MAX_DEFAULT_PARTITIONS`], then rounded.
///
/// # Errors
///
/// Returns `InvalidArgument` for requests above [`MAX_PARTITIONS`].
pub fn partition_count(requested: usize, parallelism: usize) -> StoreResult<usize> {
    if requested == 0 {
        let derived = parallelism
            .saturating_mul(2)
            .clamp(MIN_DEFAULT_PARTITIONS, MAX_DEFAULT_PARTITIONS);
        return Ok(derived.next_power_of_two());
    }
    if requested > MAX_PARTITIONS {
        return Err(StoreError::invalid_argument(format!(
            "{requested} partitions requested, maximum is {MAX_PARTITIONS}"
        )));
    }
    Ok(requested.next_power_of_two())
}

/// Number of core-affine pools for a partition count.
///
/// Parallelism rounded up to a power of two, never more than `partitions`.
pub fn pool_count(parallelism: usize, partitions: usize) -> usize {
    parallelism
        .max(1)
        .next_power_of_two()
        .min(partitions.max(1))
}

/// Partition owning `id` under `mask`.
#[inline]
pub fn partition_of(id: RecordId, mask: u64) -> usize {
    (id.as_u64() & mask) as usize
}

/// Partitioned engine with per-partition locking and parallel scans.
pub struct ShardedStore {
    partitions: Arc<[Partition]>,
    mask: u64,
    ids: IdAllocator,
    scans: ScanPool,
    backend: Backend,
}

impl ShardedStore {
    /// Opens a store with one dedicated scan worker per partition.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for oversized requests and `Storage` if a
    /// worker thread cannot be spawned.
    pub fn open(requested_partitions: usize) -> StoreResult<Self> {
        let count = partition_count(requested_partitions, hardware_parallelism())?;
        let layout = LaneLayout {
            lanes: count,
            workers_per_lane: 1,
            pinned: false,
        };
        Self::start(count, layout, Backend::Sharded)
    }

    /// Opens a store whose scans run on core-pinned worker pools.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for oversized requests or zero workers per
    /// pool, and `Storage` if a worker thread cannot be spawned.
    pub fn open_affine(requested_partitions: usize, workers_per_pool: usize) -> StoreResult<Self> {
        if workers_per_pool == 0 {
            return Err(StoreError::invalid_argument(
                "workers_per_pool must be at least 1",
            ));
        }
        let parallelism = hardware_parallelism();
        let count = partition_count(requested_partitions, parallelism)?;
        let layout = LaneLayout {
            lanes: pool_count(parallelism, count),
            workers_per_lane: workers_per_pool,
            pinned: true,
        };
        Self::start(count, layout, Backend::ShardedAffine)
    }

    fn start(count: usize, layout: LaneLayout, backend: Backend) -> StoreResult<Self> {
        let partitions: Arc<[Partition]> = (0..count).map(|_| Partition::new()).collect();
        let scans = ScanPool::start(Arc::clone(&partitions), layout)?;

        tracing::debug!(
            backend = %backend,
            partitions = count,
            scan_lanes = layout.lanes,
            "sharded store opened"
        );

        Ok(Self {
            partitions,
            mask: (count - 1) as u64,
            ids: IdAllocator::new(),
            scans,
            backend,
        })
    }

    /// Number of partitions, always a power of two.
    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    /// The shard mask, `partition_count - 1`.
    pub fn mask(&self) -> u64 {
        self.mask
    }

    /// Number of scan lanes (partitions for the plain layout, pools for affine).
    pub fn scan_lanes(&self) -> usize {
        self.scans.layout().lanes
    }

    /// Index of the partition that owns `id`.
    #[inline]
    pub fn partition_index(&self, id: RecordId) -> usize {
        partition_of(id, self.mask)
    }

    /// Scan lane serving the partition that owns `id`.
    pub fn lane_of(&self, id: RecordId) -> usize {
        self.scans.lane_of(self.partition_index(id))
    }

    /// Per-partition record counts, in partition order.
    pub fn partition_sizes(&self) -> Vec<usize> {
        self.partitions.iter().map(Partition::len).collect()
    }

    /// Total number of stored records.
    pub fn len(&self) -> usize {
        self.partitions.iter().map(Partition::len).sum()
    }

    /// True if no records are stored.
    pub fn is_empty(&self) -> bool {
        self.partitions.iter().all(Partition::is_empty)
    }

    /// Stops every scan worker.
    ///
    /// Key operations keep working afterwards; `get_all` returns `Closed`.
    pub fn shutdown(&self) {
        if self.scans.is_running() {
            tracing::info!(backend = %self.backend, "shutting down scan workers");
        }
        self.scans.shutdown();
    }

    #[inline]
    fn partition_for(&self, id: RecordId) -> &Partition {
        &self.partitions[self.partition_index(id)]
    }
}

impl RecordStore for ShardedStore {
    fn create(&self, record: &mut Record) -> StoreResult<()> {
        if record.id.is_assigned() {
            return Err(StoreError::invalid_argument(format!(
                "record already carries id {}",
                record.id
            )));
        }
        let id = self.ids.allocate();
        record.id = id;
        tracing::trace!(%id, partition = self.partition_index(id), "create");
        self.partition_for(id).insert(record.clone());
        Ok(())
    }

    fn get_by_id(&self, id: RecordId) -> StoreResult<Record> {
        self.partition_for(id)
            .get(id)
            .ok_or_else(|| StoreError::not_found(id))
    }

    fn get_all(&self) -> StoreResult<Vec<Record>> {
        self.scans.scatter_gather()
    }

    fn update(&self, id: RecordId, record: Record) -> StoreResult<()> {
        if self.partition_for(id).replace(id, record) {
            Ok(())
        } else {
            Err(StoreError::not_found(id))
        }
    }

    fn delete(&self, id: RecordId) -> StoreResult<()> {
        if self.partition_for(id).remove(id) {
            Ok(())
        } else {
            Err(StoreError::not_found(id))
        }
    }

    fn backend(&self) -> Backend {
        self.backend
    }
}

impl Closable for ShardedStore {
    fn close(&self) {
        self.shutdown();
    }
}
