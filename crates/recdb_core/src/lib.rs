//! # RecDB Core
//!
//! Interchangeable in-memory record engines behind one contract.
//!
//! Every engine implements [`RecordStore`]: create, fetch by id, list all,
//! update and delete over a small [`Record`]. They differ only in how they
//! handle concurrency:
//!
//! - [`ShardedStore`] - power-of-two partitions routed by `id & mask`, with a
//!   scatter/gather scan worker per partition (or per core-pinned pool in the
//!   affine variant)
//! - [`ActorStore`] - one owner thread applies every operation in arrival
//!   order
//! - [`LockFreeStore`] - one concurrent map, no outer lock
//! - [`OffHeapStore`] - CBOR-encoded records in a bounded byte cache
//!
//! Engines are built through [`open`] from a [`StoreConfig`], which returns a
//! [`StoreHandle`] that knows, once and for all, whether the engine needs
//! closing.
//!
//! ## Example
//!
//! ```rust
//! use recdb_core::{open, Backend, Record, RecordStore, Status, StoreConfig};
//!
//! let handle = open(&StoreConfig::new().backend(Backend::Sharded).partitions(4)).unwrap();
//!
//! let mut record = Record::new("alpha", Status::Active);
//! handle.create(&mut record).unwrap();
//! assert_eq!(handle.get_by_id(record.id).unwrap().name, "alpha");
//!
//! handle.close();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod actor;
mod alloc;
mod config;
mod error;
mod lockfree;
mod offheap;
mod partition;
mod record;
mod registry;
mod sharded;
mod stats;
mod store;

pub use actor::ActorStore;
pub use alloc::IdAllocator;
pub use config::{Backend, StoreConfig, DEFAULT_CACHE_CAPACITY_BYTES, DEFAULT_QUEUE_CAPACITY};
pub use error::{StoreError, StoreResult};
pub use lockfree::LockFreeStore;
pub use offheap::OffHeapStore;
pub use record::{Record, RecordId, Status};
pub use registry::Registry;
pub use sharded::{
    hardware_parallelism, partition_count, partition_of, pool_count, ShardedStore,
    MAX_DEFAULT_PARTITIONS, MAX_PARTITIONS, MIN_DEFAULT_PARTITIONS,
};
pub use stats::{MeteredStore, StatsSnapshot, StoreStats};
pub use store::{open, Closable, RecordStore, StoreHandle};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
