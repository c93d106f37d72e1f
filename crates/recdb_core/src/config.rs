//! Store configuration.

use std::fmt;

/// Default inbound queue capacity of the actor engine.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Default byte budget of the off-heap engine.
pub const DEFAULT_CACHE_CAPACITY_BYTES: u64 = 64 * 1024 * 1024;

/// Which engine implements the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Backend {
    /// Partitioned store with one scan worker per partition.
    #[default]
    Sharded,
    /// Partitioned store whose scans run on core-pinned worker pools.
    ShardedAffine,
    /// Single owner thread serializing every operation.
    Actor,
    /// One concurrent map, no partitioning.
    LockFree,
    /// Byte cache with per-operation CBOR encoding.
    OffHeap,
}

impl Backend {
    /// All backends, in declaration order.
    pub const ALL: [Backend; 5] = [
        Backend::Sharded,
        Backend::ShardedAffine,
        Backend::Actor,
        Backend::LockFree,
        Backend::OffHeap,
    ];

    /// Canonical configuration name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sharded => "sharded",
            Self::ShardedAffine => "sharded-affine",
            Self::Actor => "actor",
            Self::LockFree => "lock-free",
            Self::OffHeap => "off-heap",
        }
    }

    /// Parses a backend name, accepting a few aliases.
    ///
    /// Matching is case-insensitive and treats `_` like `-`.
    pub fn parse(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "sharded" | "shard" => Some(Self::Sharded),
            "sharded-affine" | "affine" | "power-affinity" => Some(Self::ShardedAffine),
            "actor" => Some(Self::Actor),
            "lock-free" | "lockfree" | "syncmap" => Some(Self::LockFree),
            "off-heap" | "offheap" | "cache" => Some(Self::OffHeap),
            _ => None,
        }
    }

    /// Parses a backend name, falling back to the default backend.
    ///
    /// Unknown names never fail startup; they are logged and replaced.
    pub fn from_name_or_default(name: &str) -> Self {
        Self::parse(name).unwrap_or_else(|| {
            let fallback = Self::default();
            tracing::warn!(
                requested = name,
                fallback = fallback.as_str(),
                "unknown backend, using default"
            );
            fallback
        })
    }

    /// True for engines that keep background threads.
    pub const fn has_workers(self) -> bool {
        matches!(self, Self::Sharded | Self::ShardedAffine | Self::Actor)
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for opening a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Engine to construct.
    pub backend: Backend,

    /// Requested partition count (0 = derive from hardware parallelism).
    ///
    /// Rounded up to a power of two by the sharded engines.
    pub partitions: usize,

    /// Threads per core-affine worker pool.
    pub workers_per_pool: usize,

    /// Bounded inbound queue length of the actor engine.
    pub queue_capacity: usize,

    /// Byte budget of the off-heap cache.
    pub cache_capacity_bytes: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            partitions: 0,
            workers_per_pool: 1,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            cache_capacity_bytes: DEFAULT_CACHE_CAPACITY_BYTES,
        }
    }
}

impl StoreConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the backend.
    #[must_use]
    pub const fn backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Sets the requested partition count.
    #[must_use]
    pub const fn partitions(mut self, count: usize) -> Self {
        self.partitions = count;
        self
    }

    /// Sets the number of threads per affine pool.
    #[must_use]
    pub const fn workers_per_pool(mut self, count: usize) -> Self {
        self.workers_per_pool = count;
        self
    }

    /// Sets the actor queue capacity.
    #[must_use]
    pub const fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Sets the off-heap byte budget.
    #[must_use]
    pub const fn cache_capacity_bytes(mut self, bytes: u64) -> Self {
        self.cache_capacity_bytes = bytes;
        self
    }
}
