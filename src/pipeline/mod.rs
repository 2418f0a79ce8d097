//! Partition, reduce, normalize and collect
//!
//! Every strategy walks the same linear state machine:
//!
//! ```text
//! Start -> Partitioned -> LocallyReduced -> GloballyReduced -> Normalized -> Collected -> Done
//! ```
//!
//! Only the scheduling differs: [`run_serial`] does it in one control flow,
//! [`run_threaded`] spreads the scans over a thread pool sharing one buffer,
//! and [`run_worker`] is the per-worker body of the distributed strategy.

mod collect;
mod distributed;
mod normalize;
mod partition;
mod reduce;
mod serial;
mod threaded;

pub use collect::{gather_into, Collector};
pub use distributed::{run_distributed, run_worker, DistributedRun, WorkerOutcome};
#[cfg(feature = "mpi")]
pub use distributed::run_mpi;
pub use normalize::{normalize_in_place, Normalization};
pub use partition::PartitionTable;
pub use reduce::{global_bounds, local_bounds, SharedBounds};
pub use serial::run_serial;
pub use threaded::run_threaded;

use std::fmt;
use std::time::Duration;

use crate::types::{Bounds, Strategy};

/// Number of leading result values exposed for reporting
pub const HEAD_LEN: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Start,
    Partitioned,
    LocallyReduced,
    GloballyReduced,
    Normalized,
    Collected,
    Done,
}

impl Stage {
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Start => Some(Self::Partitioned),
            Self::Partitioned => Some(Self::LocallyReduced),
            Self::LocallyReduced => Some(Self::GloballyReduced),
            Self::GloballyReduced => Some(Self::Normalized),
            Self::Normalized => Some(Self::Collected),
            Self::Collected => Some(Self::Done),
            Self::Done => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Position of one worker in the state machine
#[derive(Debug)]
pub(crate) struct Progress {
    worker: usize,
    stage: Stage,
}

impl Progress {
    pub(crate) fn new(worker: usize) -> Self {
        Self {
            worker,
            stage: Stage::Start,
        }
    }

    pub(crate) fn advance(&mut self, to: Stage) {
        debug_assert_eq!(self.stage.next(), Some(to), "worker {} skipped a stage", self.worker);
        log::debug!("worker {}: {} -> {}", self.worker, self.stage, to);
        self.stage = to;
    }

    #[cfg(test)]
    pub(crate) fn stage(&self) -> Stage {
        self.stage
    }
}

/// Observable outputs of one run
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub strategy: Strategy,
    pub workers: usize,
    pub len: usize,
    pub bounds: Bounds,
    pub normalization: Normalization,
    /// Reduction and normalization, excluding generation and gather
    pub elapsed: Duration,
    pub gather_elapsed: Duration,
    /// `result[0..5)`, or fewer for short inputs
    pub head: Vec<f32>,
}

impl RunReport {
    /// Samples per second over the timed section
    #[must_use]
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 { self.len as f64 / secs } else { 0.0 }
    }
}

pub(crate) fn head_of(values: &[f32]) -> Vec<f32> {
    values.iter().take(HEAD_LEN).copied().collect()
}
