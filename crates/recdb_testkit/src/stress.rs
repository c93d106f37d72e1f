//! Stress runners.
//!
//! Each runner drives a shared store from several threads and reports how
//! many operations succeeded. Runners never panic on store errors; they
//! count them.

use recdb_core::{Record, RecordId, RecordStore, Status};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let secs = duration.as_secs_f64();
        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            duration,
            ops_per_second: if secs > 0.0 { total as f64 / secs } else { 0.0 },
        }
    }

    /// Prints a summary of the run.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {name} ===");
        println!("Total operations: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Failed: {}", self.failed_ops);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }
}

/// Configuration for stress runs.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Operations per run, split evenly across threads.
    pub operations: usize,
    /// Number of concurrent threads.
    pub threads: usize,
    /// Records created before read and mixed runs start.
    pub seed_records: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 10_000,
            threads: 4,
            seed_records: 1_000,
        }
    }
}

#[derive(Default)]
struct Tally {
    successful: AtomicUsize,
    failed: AtomicUsize,
}

impl Tally {
    fn count<T, E>(&self, result: &Result<T, E>) {
        let counter = if result.is_ok() {
            &self.successful
        } else {
            &self.failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn finish(&self, start: Instant) -> StressTestResult {
        StressTestResult::new(
            self.successful.load(Ordering::Relaxed),
            self.failed.load(Ordering::Relaxed),
            start.elapsed(),
        )
    }
}

fn run_threads<F, T>(config: &StressConfig, work: F) -> (StressTestResult, Vec<T>)
where
    F: Fn(usize, usize, &Tally) -> T + Send + Sync + 'static,
    T: Send + 'static,
{
    let tally = Arc::new(Tally::default());
    let work = Arc::new(work);
    let threads = config.threads.max(1);
    let per_thread = config.operations / threads;

    let start = Instant::now();
    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let tally = Arc::clone(&tally);
            let work = Arc::clone(&work);
            thread::spawn(move || work(t, per_thread, &tally))
        })
        .collect();

    let outputs = handles
        .into_iter()
        .map(|handle| handle.join().expect("Thread panicked"))
        .collect();
    (tally.finish(start), outputs)
}

/// Concurrent creates only.
///
/// Returns the result together with every identifier that was issued.
pub fn stress_concurrent_creates(
    store: Arc<dyn RecordStore>,
    config: &StressConfig,
) -> (StressTestResult, Vec<RecordId>) {
    let (result, per_thread) = run_threads(config, move |t, ops, tally| {
        let mut local = Vec::with_capacity(ops);
        for i in 0..ops {
            let mut record = Record::new(format!("t{t}-{i}"), Status::Active);
            let outcome = store.create(&mut record);
            tally.count(&outcome);
            if outcome.is_ok() {
                local.push(record.id);
            }
        }
        local
    });

    (result, per_thread.into_iter().flatten().collect())
}

/// Concurrent reads of pre-created records.
pub fn stress_concurrent_reads(
    store: Arc<dyn RecordStore>,
    config: &StressConfig,
) -> StressTestResult {
    let ids = seed(&*store, config.seed_records.max(1));
    let (result, _) = run_threads(config, move |t, ops, tally| {
        for i in 0..ops {
            let id = ids[(t * ops + i) % ids.len()];
            tally.count(&store.get_by_id(id));
        }
    });
    result
}

/// Mixed workload over pre-created records.
///
/// Of every ten operations a thread issues, six are reads, two are updates,
/// one is a create and one deletes a record that thread created earlier.
/// Updates only target seeded records, so no operation is expected to fail.
pub fn stress_mixed_operations(
    store: Arc<dyn RecordStore>,
    config: &StressConfig,
) -> StressTestResult {
    let shared = Arc::new(seed(&*store, config.seed_records.max(1)));
    let (result, _) = run_threads(config, move |t, ops, tally| {
        let mut own = Vec::new();
        for i in 0..ops {
            let id = shared[(t * 31 + i) % shared.len()];
            match i % 10 {
                0..=5 => tally.count(&store.get_by_id(id)),
                6 | 7 => {
                    let record = Record::new(format!("u{t}-{i}"), Status::Inactive);
                    tally.count(&store.update(id, record));
                }
                8 => {
                    let mut record = Record::new(format!("c{t}-{i}"), Status::Active);
                    let outcome = store.create(&mut record);
                    tally.count(&outcome);
                    if outcome.is_ok() {
                        own.push(record.id);
                    }
                }
                _ => match own.pop() {
                    Some(victim) => tally.count(&store.delete(victim)),
                    None => tally.count(&store.get_by_id(id)),
                },
            }
        }
    });
    result
}

fn seed(store: &dyn RecordStore, count: usize) -> Vec<RecordId> {
    (0..count)
        .map(|i| {
            let mut record = Record::new(format!("seed-{i}"), Status::Active);
            store.create(&mut record).expect("Failed to seed record");
            record.id
        })
        .collect()
}
