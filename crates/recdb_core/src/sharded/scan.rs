//! Scatter/gather scan workers.
//!
//! Every partition is served by exactly one lane. A lane is a job queue
//! drained by one or more long-lived threads. The plain sharded engine uses
//! one lane per partition; the affine variant folds partitions onto a smaller
//! set of core-pinned lanes with the same bitmask routing used for keys.
//!
//! ```text
//!  get_all ──┬─► lane 0 ─► snapshot(p0) ──┐
//!            ├─► lane 1 ─► snapshot(p1) ──┤
//!            │      ...                   ├─► result channel (cap = partitions)
//!            └─► lane n ─► snapshot(pn) ──┘
//! ```

use crate::error::{StoreError, StoreResult};
use crate::partition::Partition;
use crate::record::Record;
use core_affinity::CoreId;
use crossbeam_channel::{bounded, select, Receiver, Sender};
use parking_lot::RwLock;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Minimum queue depth of a lane.
const LANE_QUEUE_DEPTH: usize = 64;

/// Request to snapshot one partition.
struct ScanJob {
    partition: usize,
    reply: Sender<Vec<Record>>,
}

/// Threads and queues that exist until shutdown.
struct Running {
    lanes: Vec<Sender<ScanJob>>,
    // Never sent on; dropping it wakes every worker's select loop.
    stop: Sender<()>,
    handles: Vec<JoinHandle<()>>,
}

/// Layout of a scan pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LaneLayout {
    /// Number of lanes, a power of two.
    pub lanes: usize,
    /// Threads draining each lane.
    pub workers_per_lane: usize,
    /// Pin lane threads to cores.
    pub pinned: bool,
}

/// Fan-out/fan-in worker pool over a fixed partition array.
pub(crate) struct ScanPool {
    partitions: Arc<[Partition]>,
    mask: usize,
    layout: LaneLayout,
    state: RwLock<Option<Running>>,
}

impl ScanPool {
    /// Starts every worker thread described by `layout`.
    pub fn start(partitions: Arc<[Partition]>, layout: LaneLayout) -> StoreResult<Self> {
        debug_assert!(layout.lanes.is_power_of_two());
        debug_assert!(layout.lanes <= partitions.len());

        let (stop_tx, stop_rx) = bounded::<()>(0);
        let depth = LANE_QUEUE_DEPTH.max(partitions.len() / layout.lanes);
        let cores = if layout.pinned {
            core_affinity::get_core_ids().unwrap_or_default()
        } else {
            Vec::new()
        };

        let mut lanes = Vec::with_capacity(layout.lanes);
        let mut handles = Vec::with_capacity(layout.lanes * layout.workers_per_lane);

        for lane in 0..layout.lanes {
            let (job_tx, job_rx) = bounded::<ScanJob>(depth);
            let core = if cores.is_empty() {
                None
            } else {
                Some(cores[lane % cores.len()])
            };

            for worker in 0..layout.workers_per_lane {
                let partitions = Arc::clone(&partitions);
                let jobs = job_rx.clone();
                let stop = stop_rx.clone();
                let spawned = thread::Builder::new()
                    .name(format!("recdb-scan-{lane}.{worker}"))
                    .spawn(move || run_worker(partitions, jobs, stop, core));

                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(e) => {
                        // Tear down what was already started before failing.
                        drop(stop_tx);
                        drop(lanes);
                        join_all(handles);
                        return Err(StoreError::storage(format!(
                            "failed to spawn scan worker: {e}"
                        )));
                    }
                }
            }
            lanes.push(job_tx);
        }

        tracing::debug!(
            lanes = layout.lanes,
            workers_per_lane = layout.workers_per_lane,
            pinned = layout.pinned,
            cores = cores.len(),
            "scan workers started"
        );

        Ok(Self {
            mask: layout.lanes - 1,
            partitions,
            layout,
            state: RwLock::new(Some(Running {
                lanes,
                stop: stop_tx,
                handles,
            })),
        })
    }

    /// Lane serving `partition`.
    #[inline]
    pub fn lane_of(&self, partition: usize) -> usize {
        partition & self.mask
    }

    /// The layout this pool was started with.
    pub fn layout(&self) -> LaneLayout {
        self.layout
    }

    /// True until [`ScanPool::shutdown`] runs.
    pub fn is_running(&self) -> bool {
        self.state.read().is_some()
    }

    /// Snapshots every partition in parallel and concatenates the slices.
    ///
    /// The result channel holds exactly one slot per partition, so a worker
    /// never blocks on its reply even if this caller stops listening.
    pub fn scatter_gather(&self) -> StoreResult<Vec<Record>> {
        let count = self.partitions.len();
        let (reply_tx, reply_rx) = bounded(count);

        {
            let state = self.state.read();
            let running = state.as_ref().ok_or(StoreError::Closed)?;
            for partition in 0..count {
                let job = ScanJob {
                    partition,
                    reply: reply_tx.clone(),
                };
                running.lanes[self.lane_of(partition)]
                    .send(job)
                    .map_err(|_| StoreError::Closed)?;
            }
        }
        drop(reply_tx);

        let mut records = Vec::new();
        for _ in 0..count {
            // Disconnection means workers were stopped mid-scan.
            let slice = reply_rx.recv().map_err(|_| StoreError::Closed)?;
            records.extend(slice);
        }
        Ok(records)
    }

    /// Stops and joins every worker. Later calls do nothing.
    pub fn shutdown(&self) {
        let running = self.state.write().take();
        let Some(Running {
            lanes,
            stop,
            handles,
        }) = running
        else {
            return;
        };

        drop(stop);
        drop(lanes);
        let workers = handles.len();
        join_all(handles);
        tracing::debug!(workers, "scan workers stopped");
    }
}

impl Drop for ScanPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker(
    partitions: Arc<[Partition]>,
    jobs: Receiver<ScanJob>,
    stop: Receiver<()>,
    core: Option<CoreId>,
) {
    if let Some(core) = core {
        if !core_affinity::set_for_current(core) {
            tracing::warn!(core = core.id, "failed to pin scan worker, running unpinned");
        }
    }

    loop {
        select! {
            recv(stop) -> _ => break,
            recv(jobs) -> job => match job {
                Ok(job) => {
                    let slice = partitions[job.partition].snapshot();
                    // The caller may have given up; its slot is reserved either way.
                    let _ = job.reply.send(slice);
                }
                Err(_) => break,
            },
        }
    }
}

fn join_all(handles: Vec<JoinHandle<()>>) {
    for handle in handles {
        if handle.join().is_err() {
            tracing::warn!("scan worker panicked");
        }
    }
}
