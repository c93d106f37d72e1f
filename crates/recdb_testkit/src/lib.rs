//! # RecDB Testkit
//!
//! Test utilities for RecDB.
//!
//! This crate provides:
//! - Fixtures that open one store per backend and close it on drop
//! - Property-based generators for records and operation sequences
//! - A model-checking harness that replays operations against a store
//! - Stress runners for concurrent workloads
//!
//! ## Usage
//!
//! ```rust,ignore
//! use recdb_testkit::prelude::*;
//!
//! #[test]
//! fn create_then_get() {
//!     for_each_backend(|store| {
//!         let mut record = Record::new("a", Status::Active);
//!         store.create(&mut record).unwrap();
//!         assert_eq!(store.get_by_id(record.id).unwrap(), record);
//!     });
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod integration;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::integration::*;
    pub use crate::stress::*;
    pub use recdb_core::{Backend, Record, RecordId, RecordStore, Status, StoreError};
}

pub use fixtures::*;
pub use generators::*;
pub use integration::*;
pub use stress::*;
