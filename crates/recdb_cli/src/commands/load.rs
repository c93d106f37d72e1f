//! Load command implementation.

use super::check_format;
use rand::Rng;
use recdb_core::{
    open, MeteredStore, Record, RecordId, RecordStore, StatsSnapshot, Status, StoreConfig,
    StoreResult,
};
use serde::Serialize;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

/// Shape of a load run.
#[derive(Debug, Clone)]
pub struct Workload {
    /// Worker threads.
    pub threads: usize,
    /// Operations each thread issues.
    pub ops_per_thread: usize,
    /// Percentage of operations that are reads.
    pub read_ratio: u8,
    /// Records created before timing starts.
    pub seed_records: usize,
}

/// Outcome of a load run.
#[derive(Debug, Serialize)]
pub struct LoadReport {
    /// Backend that served the run.
    pub backend: String,
    /// Worker threads.
    pub threads: usize,
    /// Operations issued after seeding.
    pub operations: u64,
    /// Wall-clock time of the timed phase.
    pub elapsed_ms: f64,
    /// Operations per second over the timed phase.
    pub ops_per_second: f64,
    /// Records listed by `get_all` at the end, if the engine can list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_records: Option<usize>,
    /// Per-operation counters, seeding included.
    pub stats: StatsSnapshot,
}

/// Runs `workload` against a store opened from `config`.
pub fn execute(config: &StoreConfig, workload: &Workload) -> StoreResult<LoadReport> {
    let handle = open(config)?;
    let store = Arc::new(MeteredStore::new(handle.store()));

    let mut seeded = Vec::with_capacity(workload.seed_records);
    for i in 0..workload.seed_records {
        let mut record = Record::new(format!("seed-{i}"), Status::Active);
        store.create(&mut record)?;
        seeded.push(record.id);
    }
    let seeded: Arc<[RecordId]> = seeded.into();
    let before = store.stats().snapshot().operations();

    tracing::info!(
        backend = %handle.backend(),
        threads = workload.threads,
        ops_per_thread = workload.ops_per_thread,
        seeded = seeded.len(),
        "starting load"
    );

    let start = Instant::now();
    let workers: Vec<_> = (0..workload.threads.max(1))
        .map(|t| {
            let store = Arc::clone(&store);
            let seeded = Arc::clone(&seeded);
            let workload = workload.clone();
            thread::spawn(move || drive(&*store, &seeded, &workload, t))
        })
        .collect();

    for worker in workers {
        if worker.join().is_err() {
            tracing::warn!("load worker panicked");
        }
    }
    let elapsed = start.elapsed();
    let operations = store.stats().snapshot().operations() - before;

    let final_records = store.get_all().ok().map(|all| all.len());
    let stats = store.stats().snapshot();
    handle.close();

    let secs = elapsed.as_secs_f64();
    Ok(LoadReport {
        backend: handle.backend().to_string(),
        threads: workload.threads.max(1),
        operations,
        elapsed_ms: secs * 1_000.0,
        ops_per_second: if secs > 0.0 { operations as f64 / secs } else { 0.0 },
        final_records,
        stats,
    })
}

/// One worker's share of the workload.
///
/// Every iteration issues exactly one call. Reads and updates target seeded
/// records; deletes only remove records this worker created itself.
fn drive<S: RecordStore>(store: &S, seeded: &[RecordId], workload: &Workload, worker: usize) {
    let mut rng = rand::thread_rng();
    let mut own: Vec<RecordId> = Vec::new();

    for i in 0..workload.ops_per_thread {
        let target = (!seeded.is_empty()).then(|| seeded[rng.gen_range(0..seeded.len())]);
        let roll = rng.gen_range(0..100u8);
        let write = rng.gen_range(0..10u8);

        // Failures are already counted by the metered store.
        match target {
            Some(id) if roll < workload.read_ratio => {
                let _ = store.get_by_id(id);
            }
            Some(id) if write < 4 => {
                let record = Record::new(format!("u{worker}-{i}"), Status::Inactive);
                let _ = store.update(id, record);
            }
            _ => match own.pop() {
                Some(victim) if write >= 8 => {
                    let _ = store.delete(victim);
                }
                kept => {
                    own.extend(kept);
                    let mut record = Record::new(format!("w{worker}-{i}"), Status::Active);
                    if store.create(&mut record).is_ok() {
                        own.push(record.id);
                    }
                }
            },
        }
    }
}

/// Runs the load command.
pub fn run(
    config: &StoreConfig,
    workload: &Workload,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    check_format(format)?;
    let report = execute(config, workload)?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Backend:     {}", report.backend);
    println!("Threads:     {}", report.threads);
    println!("Operations:  {}", report.operations);
    println!("Elapsed:     {:.2} ms", report.elapsed_ms);
    println!("Throughput:  {:.0} ops/sec", report.ops_per_second);
    if let Some(records) = report.final_records {
        println!("Records:     {records}");
    }
    let s = &report.stats;
    println!(
        "Calls:       create={} get={} update={} delete={} get_all={}",
        s.creates, s.reads, s.updates, s.deletes, s.scans
    );
    println!("Failures:    not_found={} other={}", s.not_found, s.errors);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use recdb_core::Backend;

    fn small() -> Workload {
        Workload {
            threads: 2,
            ops_per_thread: 500,
            read_ratio: 70,
            seed_records: 50,
        }
    }

    #[test]
    fn load_runs_on_every_backend() {
        for backend in Backend::ALL {
            let config = StoreConfig::new().backend(backend).partitions(4);
            let report = execute(&config, &small()).unwrap();
            assert_eq!(report.operations, 1_000, "{backend}");
            assert_eq!(report.stats.not_found, 0, "{backend}");
            assert_eq!(report.final_records.is_some(), backend != Backend::OffHeap);
        }
    }

    #[test]
    fn read_only_load_creates_nothing() {
        let workload = Workload {
            read_ratio: 100,
            ..small()
        };
        let report = execute(&StoreConfig::new().partitions(2), &workload).unwrap();
        assert_eq!(report.stats.creates, 50);
        assert_eq!(report.stats.reads, 1_000);
        assert_eq!(report.final_records, Some(50));
    }
}
