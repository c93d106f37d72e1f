//! Benchmark utilities.

use rand::distributions::Alphanumeric;
use rand::Rng;
use recdb_core::{open, Backend, Record, RecordId, Status, StoreConfig, StoreHandle};

/// Byte budget used when benchmarking the off-heap engine.
pub const BENCH_CACHE_BYTES: u64 = 256 * 1024 * 1024;

/// Generate a random record with a name of `name_len` characters.
pub fn random_record(name_len: usize) -> Record {
    let mut rng = rand::thread_rng();
    let name: String = (&mut rng)
        .sample_iter(&Alphanumeric)
        .take(name_len)
        .map(char::from)
        .collect();
    let status = if rng.gen_bool(0.5) {
        Status::Active
    } else {
        Status::Inactive
    };
    Record::new(name, status)
}

/// Opens `backend` with its default layout and a large cache budget.
pub fn open_backend(backend: Backend) -> StoreHandle {
    let config = StoreConfig::new()
        .backend(backend)
        .cache_capacity_bytes(BENCH_CACHE_BYTES);
    open(&config).unwrap()
}

/// Creates `count` random records and returns their identifiers.
pub fn populate(store: &StoreHandle, count: usize, name_len: usize) -> Vec<RecordId> {
    (0..count)
        .map(|_| {
            let mut record = random_record(name_len);
            store.create(&mut record).unwrap();
            record.id
        })
        .collect()
}

/// Pick `count` identifiers uniformly from `ids`.
pub fn sample_ids(ids: &[RecordId], count: usize) -> Vec<RecordId> {
    let mut rng = rand::thread_rng();
    (0..count).map(|_| ids[rng.gen_range(0..ids.len())]).collect()
}
