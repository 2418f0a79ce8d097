use std::thread;
use std::time::{Duration, Instant};

use super::{head_of, local_bounds, normalize_in_place, Normalization, PartitionTable, Progress, RunReport, Stage};
use crate::comm::{ChannelComm, Communicator, ROOT};
use crate::error::{MinMaxError, Result};
use crate::generate::generate_partition;
use crate::types::{Bounds, Strategy};

/// What one distributed worker ends the run with
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerOutcome {
    pub rank: usize,
    pub bounds: Bounds,
    pub normalization: Normalization,
    pub elapsed: Duration,
    pub gather_elapsed: Duration,
    /// The result sequence; `Some` at the root only
    pub result: Option<Vec<f32>>,
    /// The un-normalized input, gathered at the root when requested
    pub original: Option<Vec<f32>>,
}

/// The per-worker distributed pipeline
///
/// `local` is this worker's partition and nothing else. The worker takes
/// part in two all-reduce exchanges (min, then max), normalizes its own
/// partition with the agreed global bounds and hands it to the root. With
/// `gather_original` the untouched partition is gathered first, before the
/// timed section starts.
///
/// # Errors
///
/// Returns [`MinMaxError::Config`] when the table does not match the group
/// or the partition, and any error of the underlying collectives
pub fn run_worker<C: Communicator>(
    comm: &C,
    mut local: Vec<f32>,
    table: &PartitionTable,
    gather_original: bool,
) -> Result<WorkerOutcome> {
    let rank = comm.rank();
    if table.worker_count() != comm.size() {
        return Err(MinMaxError::Config(format!(
            "partition table has {} workers but the group has {}",
            table.worker_count(),
            comm.size()
        )));
    }
    let partition = table
        .get(rank)
        .ok_or_else(|| MinMaxError::Config(format!("no partition for worker {rank}")))?;
    if partition.len != local.len() {
        return Err(MinMaxError::Config(format!(
            "worker {rank} holds {} samples, its partition has {}",
            local.len(),
            partition.len
        )));
    }

    let mut progress = Progress::new(rank);
    log::debug!("{partition}");
    progress.advance(Stage::Partitioned);

    let original = if gather_original {
        comm.gather_to_root(&local, table)?
    } else {
        None
    };

    comm.barrier()?;
    let start = Instant::now();

    let partition_bounds = local_bounds(&local);
    progress.advance(Stage::LocallyReduced);

    let bounds = Bounds::new(
        comm.all_reduce_min(partition_bounds.min)?,
        comm.all_reduce_max(partition_bounds.max)?,
    );
    progress.advance(Stage::GloballyReduced);

    let normalization = normalize_in_place(&mut local, bounds);
    progress.advance(Stage::Normalized);
    let elapsed = start.elapsed();

    let gather_start = Instant::now();
    let result = comm.gather_to_root(&local, table)?;
    let gather_elapsed = gather_start.elapsed();
    progress.advance(Stage::Collected);
    progress.advance(Stage::Done);

    Ok(WorkerOutcome {
        rank,
        bounds,
        normalization,
        elapsed,
        gather_elapsed,
        result,
        original,
    })
}

/// Result of a distributed run, as seen by the root
#[derive(Debug, Clone, PartialEq)]
pub struct DistributedRun {
    pub result: Vec<f32>,
    pub original: Option<Vec<f32>>,
    pub report: RunReport,
}

impl DistributedRun {
    fn from_root(root: WorkerOutcome, strategy: Strategy, workers: usize) -> Result<Self> {
        let result = root
            .result
            .ok_or_else(|| MinMaxError::Gather(format!("worker {} received no result sequence", root.rank)))?;

        let report = RunReport {
            strategy,
            workers,
            len: result.len(),
            bounds: root.bounds,
            normalization: root.normalization,
            elapsed: root.elapsed,
            gather_elapsed: root.gather_elapsed,
            head: head_of(&result),
        };

        Ok(Self {
            result,
            original: root.original,
            report,
        })
    }
}

/// Run `workers` message-passing workers over `n` generated samples
///
/// Each worker thread generates and owns only its own partition; the
/// threads share nothing and cooperate through a [`ChannelComm`] group.
///
/// # Errors
///
/// Returns the first worker error, or [`MinMaxError::Collective`] if a
/// worker thread panicked
pub fn run_distributed(n: usize, workers: usize, seed: u64, gather_original: bool) -> Result<DistributedRun> {
    let table = PartitionTable::new(n, workers)?;
    let endpoints = ChannelComm::cluster(workers)?;

    let outcomes: Vec<Result<WorkerOutcome>> = thread::scope(|s| {
        let handles: Vec<_> = endpoints
            .into_iter()
            .map(|comm| {
                let table = &table;
                thread::Builder::new()
                    .name(format!("minmax-rank-{}", comm.rank()))
                    .spawn_scoped(s, move || {
                        let partition = table
                            .get(comm.rank())
                            .ok_or_else(|| MinMaxError::Config(format!("no partition for worker {}", comm.rank())))?;
                        let local = generate_partition(partition, seed);
                        run_worker(&comm, local, table, gather_original).inspect_err(|e| {
                            log::debug!("worker {} failed: {e}", comm.rank());
                            comm.abort();
                        })
                    })
            })
            .collect();

        handles
            .into_iter()
            .enumerate()
            .map(|(rank, handle)| match handle {
                Ok(handle) => handle
                    .join()
                    .unwrap_or_else(|_| Err(MinMaxError::collective("run", rank, "worker thread panicked"))),
                Err(e) => Err(MinMaxError::Resource(format!("failed to start worker {rank}: {e}"))),
            })
            .collect()
    });

    let mut root = None;
    for outcome in outcomes {
        let outcome = outcome?;
        if outcome.rank == ROOT {
            root = Some(outcome);
        }
    }
    let root = root.ok_or_else(|| MinMaxError::Gather("root worker produced no outcome".to_string()))?;
    DistributedRun::from_root(root, Strategy::Distributed, workers)
}

/// Run this process as one rank of an MPI job over `n` samples
///
/// Returns `Some` at rank 0 and `None` everywhere else.
///
/// # Errors
///
/// Returns any worker or collective error of this rank
#[cfg(feature = "mpi")]
pub fn run_mpi(n: usize, seed: u64, gather_original: bool) -> Result<Option<DistributedRun>> {
    let comm = crate::comm::MpiComm::init()?;
    if comm.is_root() {
        log::info!("MPI world of {} ranks", comm.size());
    }
    let table = PartitionTable::new(n, comm.size())?;
    let partition = table
        .get(comm.rank())
        .ok_or_else(|| MinMaxError::Config(format!("no partition for rank {}", comm.rank())))?;
    let local = generate_partition(partition, seed);

    let outcome = run_worker(&comm, local, &table, gather_original)?;
    if comm.is_root() {
        DistributedRun::from_root(outcome, Strategy::Mpi, comm.size()).map(Some)
    } else {
        Ok(None)
    }
}
