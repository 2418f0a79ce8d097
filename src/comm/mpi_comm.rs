use ::mpi::collective::SystemOperation;
use ::mpi::datatype::PartitionMut;
use ::mpi::environment::Universe;
use ::mpi::topology::SimpleCommunicator;
use ::mpi::traits::*;
use ::mpi::Count;

use super::{Communicator, ROOT};
use crate::error::{MinMaxError, Result};
use crate::pipeline::PartitionTable;

/// Communicator over `MPI_COMM_WORLD`
///
/// MPI stays initialised for as long as this value lives; dropping it
/// finalises the environment.
pub struct MpiComm {
    // Field order matters: the communicator must go before the universe
    world: SimpleCommunicator,
    _universe: Universe,
}

impl MpiComm {
    /// Initialise MPI and attach to the world communicator
    ///
    /// # Errors
    ///
    /// Returns [`MinMaxError::Collective`] if MPI was already initialised
    pub fn init() -> Result<Self> {
        let universe = ::mpi::initialize()
            .ok_or_else(|| MinMaxError::collective("init", ROOT, "MPI is already initialised"))?;
        let world = universe.world();
        Ok(Self {
            world,
            _universe: universe,
        })
    }

    fn counts(&self, table: &PartitionTable) -> Result<(Vec<Count>, Vec<Count>)> {
        let to_count = |v: usize| {
            Count::try_from(v).map_err(|_| {
                MinMaxError::collective("gather", self.rank(), format!("{v} exceeds the MPI count range"))
            })
        };
        let counts = table.counts().into_iter().map(to_count).collect::<Result<Vec<_>>>()?;
        let displs = table.displacements().into_iter().map(to_count).collect::<Result<Vec<_>>>()?;
        Ok((counts, displs))
    }
}

impl Communicator for MpiComm {
    fn rank(&self) -> usize {
        // MPI ranks are never negative
        self.world.rank() as usize
    }

    fn size(&self) -> usize {
        self.world.size() as usize
    }

    fn barrier(&self) -> Result<()> {
        self.world.barrier();
        Ok(())
    }

    fn all_reduce_min(&self, value: f32) -> Result<f32> {
        let mut global = f32::INFINITY;
        self.world.all_reduce_into(&value, &mut global, SystemOperation::min());
        Ok(global)
    }

    fn all_reduce_max(&self, value: f32) -> Result<f32> {
        let mut global = f32::NEG_INFINITY;
        self.world.all_reduce_into(&value, &mut global, SystemOperation::max());
        Ok(global)
    }

    fn gather_to_root(&self, local: &[f32], table: &PartitionTable) -> Result<Option<Vec<f32>>> {
        let root = self.world.process_at_rank(ROOT as i32);

        if !self.is_root() {
            root.gather_varcount_into(local);
            return Ok(None);
        }

        let (counts, displs) = self.counts(table)?;
        let mut sequence = vec![0.0_f32; table.total_len()];
        {
            let mut partition = PartitionMut::new(&mut sequence[..], counts, &displs[..]);
            root.gather_varcount_into_root(local, &mut partition);
        }
        Ok(Some(sequence))
    }
}
