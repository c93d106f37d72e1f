//! Set-once holder for the active store.
//!
//! A [`Registry`] is an ordinary value that can be passed to whatever builds
//! the service layer. [`Registry::global`] offers one process-wide instance
//! for callers that prefer not to thread it through.

use crate::store::StoreHandle;
use parking_lot::{const_rwlock, RwLock};
use std::fmt;
use std::sync::Arc;

static GLOBAL: Registry = Registry::new();

/// Holds at most one store, installed once.
pub struct Registry {
    slot: RwLock<Option<Arc<StoreHandle>>>,
}

impl Registry {
    /// Creates an empty registry.
    pub const fn new() -> Self {
        Self {
            slot: const_rwlock(None),
        }
    }

    /// The process-wide registry.
    pub fn global() -> &'static Registry {
        &GLOBAL
    }

    /// Installs `handle` if nothing is installed yet.
    ///
    /// Returns `false` and drops `handle` when a store is already present;
    /// the installed store is left untouched.
    pub fn init(&self, handle: StoreHandle) -> bool {
        let mut slot = self.slot.write();
        if slot.is_some() {
            tracing::debug!(backend = %handle.backend(), "registry already initialized, ignoring");
            return false;
        }
        tracing::info!(backend = %handle.backend(), "store registered");
        *slot = Some(Arc::new(handle));
        true
    }

    /// The installed store, if any.
    pub fn get(&self) -> Option<Arc<StoreHandle>> {
        self.slot.read().clone()
    }

    /// True once a store has been installed.
    pub fn is_initialized(&self) -> bool {
        self.slot.read().is_some()
    }

    /// Removes the installed store so another can be registered.
    ///
    /// Only for test isolation. The removed handle is closed when this was
    /// the last reference to it.
    #[cfg(any(test, feature = "test-util"))]
    pub fn reset(&self) {
        let previous = self.slot.write().take();
        if let Some(handle) = previous {
            if let Ok(handle) = Arc::try_unwrap(handle) {
                handle.close();
            }
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("backend", &self.slot.read().as_ref().map(|h| h.backend()))
            .finish()
    }
}
