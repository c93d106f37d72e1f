//! Identifier allocation.

use crate::record::RecordId;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic identifier source owned by one engine instance.
///
/// Allocation is a single atomic increment, so every creation path across
/// every partition can share it without a lock. Two instances never share
/// state; identifiers are only unique within the instance that issued them.
#[derive(Debug)]
pub struct IdAllocator {
    next: AtomicU64,
}

impl IdAllocator {
    /// Creates an allocator whose first identifier is `1`.
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Returns the next identifier.
    #[inline]
    pub fn allocate(&self) -> RecordId {
        RecordId::new(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// Number of identifiers handed out so far.
    pub fn issued(&self) -> u64 {
        self.next.load(Ordering::Relaxed) - 1
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
