//! Layout command implementation.

use super::check_format;
use recdb_core::{hardware_parallelism, partition_count, pool_count, Backend, StoreConfig};
use serde::Serialize;

/// How a configuration is realized on this machine.
#[derive(Debug, Serialize)]
pub struct LayoutReport {
    /// Selected backend.
    pub backend: String,
    /// Hardware threads reported by the OS.
    pub parallelism: usize,
    /// Whether the engine keeps background threads.
    pub background_threads: bool,
    /// Partition count as requested (0 = derived).
    pub requested_partitions: usize,
    /// Realized partitions, for sharded backends.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partitions: Option<usize>,
    /// Scan worker lanes, for sharded backends.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_lanes: Option<usize>,
    /// Threads draining each lane, for sharded backends.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers_per_lane: Option<usize>,
    /// Actor inbox length.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_capacity: Option<usize>,
    /// Off-heap byte budget.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_capacity_bytes: Option<u64>,
}

/// Computes the layout `config` would produce.
pub fn describe(
    config: &StoreConfig,
    parallelism: usize,
) -> Result<LayoutReport, Box<dyn std::error::Error>> {
    let mut report = LayoutReport {
        backend: config.backend.to_string(),
        parallelism,
        background_threads: config.backend.has_workers(),
        requested_partitions: config.partitions,
        partitions: None,
        scan_lanes: None,
        workers_per_lane: None,
        queue_capacity: None,
        cache_capacity_bytes: None,
    };

    match config.backend {
        Backend::Sharded => {
            let count = partition_count(config.partitions, parallelism)?;
            report.partitions = Some(count);
            report.scan_lanes = Some(count);
            report.workers_per_lane = Some(1);
        }
        Backend::ShardedAffine => {
            let count = partition_count(config.partitions, parallelism)?;
            report.partitions = Some(count);
            report.scan_lanes = Some(pool_count(parallelism, count));
            report.workers_per_lane = Some(config.workers_per_pool);
        }
        Backend::Actor => report.queue_capacity = Some(config.queue_capacity),
        Backend::LockFree => {}
        Backend::OffHeap => report.cache_capacity_bytes = Some(config.cache_capacity_bytes),
    }

    Ok(report)
}

/// Runs the layout command.
pub fn run(config: &StoreConfig, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    check_format(format)?;
    let report = describe(config, hardware_parallelism())?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Backend:      {}", report.backend);
    println!("Parallelism:  {}", report.parallelism);
    println!("Threads:      {}", if report.background_threads { "yes" } else { "no" });
    if let Some(partitions) = report.partitions {
        println!(
            "Partitions:   {partitions} (requested {})",
            report.requested_partitions
        );
    }
    if let (Some(lanes), Some(workers)) = (report.scan_lanes, report.workers_per_lane) {
        println!("Scan lanes:   {lanes} x {workers} worker(s)");
    }
    if let Some(capacity) = report.queue_capacity {
        println!("Queue:        {capacity}");
    }
    if let Some(bytes) = report.cache_capacity_bytes {
        println!("Cache budget: {bytes} bytes");
    }
    Ok(())
}
