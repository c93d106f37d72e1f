//! Property-based test generators using proptest.
//!
//! Generated records never carry an identifier; engines assign those.

use proptest::prelude::*;
use recdb_core::{Record, Status};

/// Strategy for generating record names, including empty and non-ASCII ones.
pub fn name_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => prop::string::string_regex("[a-zA-Z0-9_-]{1,24}").expect("Invalid regex"),
        1 => Just(String::new()),
        1 => "\\PC{0,16}",
    ]
}

/// Strategy for generating a status.
pub fn status_strategy() -> impl Strategy<Value = Status> {
    prop_oneof![Just(Status::Inactive), Just(Status::Active)]
}

/// Strategy for generating unsaved records.
pub fn record_strategy() -> impl Strategy<Value = Record> {
    (name_strategy(), status_strategy()).prop_map(|(name, status)| Record::new(name, status))
}

/// Strategy for generating a batch of unsaved records.
pub fn records_strategy(max: usize) -> impl Strategy<Value = Vec<Record>> {
    prop::collection::vec(record_strategy(), 0..max)
}

/// An operation against a store.
///
/// Operations that address existing records do so by position in the list
/// of records created so far, so generated sequences stay meaningful after
/// identifiers are assigned.
#[derive(Debug, Clone)]
pub enum StoreOperation {
    /// Create a record
    Create {
        /// Record to create
        record: Record,
    },
    /// Fetch a previously created record
    Get {
        /// Position among created records
        slot: usize,
    },
    /// Replace a previously created record
    Update {
        /// Position among created records
        slot: usize,
        /// Replacement content
        record: Record,
    },
    /// Delete a previously created record
    Delete {
        /// Position among created records
        slot: usize,
    },
    /// Address an identifier that was never issued
    Missing,
}

/// Strategy for generating store operations.
pub fn store_operation_strategy() -> impl Strategy<Value = StoreOperation> {
    prop_oneof![
        4 => record_strategy().prop_map(|record| StoreOperation::Create { record }),
        3 => any::<usize>().prop_map(|slot| StoreOperation::Get { slot }),
        2 => (any::<usize>(), record_strategy())
            .prop_map(|(slot, record)| StoreOperation::Update { slot, record }),
        2 => any::<usize>().prop_map(|slot| StoreOperation::Delete { slot }),
        1 => Just(StoreOperation::Missing),
    ]
}

/// Strategy for generating a sequence of operations.
pub fn operation_sequence_strategy(
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<StoreOperation>> {
    prop::collection::vec(store_operation_strategy(), min_ops..max_ops)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 128,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 24,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
