//! Collective operations for the distributed-memory strategy
//!
//! Workers in this model own nothing but their partition; everything they
//! learn about the rest of the array arrives through a [`Communicator`].
//! Two transports implement it:
//!
//! - [`ChannelComm`]: one thread per worker inside this process, exchanging
//!   messages over channels. Nothing is shared between workers.
//! - `MpiComm` (feature `mpi`): one operating-system process per worker,
//!   launched by `mpirun`.

mod channel;
#[cfg(feature = "mpi")]
mod mpi_comm;

pub use channel::ChannelComm;
#[cfg(feature = "mpi")]
pub use mpi_comm::MpiComm;

use crate::error::Result;
use crate::pipeline::PartitionTable;

/// Rank of the worker that receives the gathered result sequence
pub const ROOT: usize = 0;

/// Message-passing collectives over a fixed group of workers
///
/// Every worker must call the same collectives in the same order. Each call
/// blocks until its exchange has completed for this worker; there is no
/// timeout, so a stalled peer stalls the whole group.
pub trait Communicator {
    /// Index of this worker in `0..size()`
    fn rank(&self) -> usize;

    /// Number of workers in the group
    fn size(&self) -> usize;

    /// Block until every worker has reached this point
    fn barrier(&self) -> Result<()>;

    /// Minimum of `value` over all workers, identical at every worker
    fn all_reduce_min(&self, value: f32) -> Result<f32>;

    /// Maximum of `value` over all workers, identical at every worker
    fn all_reduce_max(&self, value: f32) -> Result<f32>;

    /// Variable-count gather of every worker's partition at [`ROOT`]
    ///
    /// The root receives `Some(sequence)` laid out by `table`; every other
    /// worker hands its partition over and receives `None` without waiting
    /// for the rest of the group.
    fn gather_to_root(&self, local: &[f32], table: &PartitionTable) -> Result<Option<Vec<f32>>>;

    /// Tell peers this worker is leaving mid-run so they fail instead of waiting
    fn abort(&self) {}

    #[inline]
    fn is_root(&self) -> bool {
        self.rank() == ROOT
    }
}
