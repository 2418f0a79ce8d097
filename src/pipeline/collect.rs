//! Reassembling normalized partitions at the designated worker

use crate::error::{MinMaxError, Result};
use crate::pipeline::PartitionTable;

/// Result sequence under assembly at the root
///
/// Contributions may arrive in any order; each one is written at the offset
/// the partition table assigns to its owner, so the final ordering matches
/// the logical array exactly.
#[derive(Debug)]
pub struct Collector<'t> {
    table: &'t PartitionTable,
    buffer: Vec<f32>,
    received: Vec<bool>,
    pending: usize,
}

impl<'t> Collector<'t> {
    #[must_use]
    pub fn new(table: &'t PartitionTable) -> Self {
        Self {
            table,
            buffer: vec![0.0; table.total_len()],
            received: vec![false; table.worker_count()],
            pending: table.worker_count(),
        }
    }

    /// Place one worker's contribution
    ///
    /// # Errors
    ///
    /// Returns [`MinMaxError::Gather`] for an unknown owner, a second
    /// contribution from the same owner, or a length that differs from the
    /// owner's partition
    pub fn accept(&mut self, owner: usize, values: &[f32]) -> Result<()> {
        let partition = self.table.get(owner).ok_or_else(|| {
            MinMaxError::Gather(format!(
                "contribution from worker {owner} but only {} workers exist",
                self.table.worker_count()
            ))
        })?;

        if self.received[owner] {
            return Err(MinMaxError::Gather(format!(
                "duplicate contribution from worker {owner}"
            )));
        }

        if values.len() != partition.len {
            return Err(MinMaxError::Gather(format!(
                "worker {owner} sent {} samples, partition holds {}",
                values.len(),
                partition.len
            )));
        }

        self.buffer[partition.range()].copy_from_slice(values);
        self.received[owner] = true;
        self.pending -= 1;
        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.pending == 0
    }

    /// Hand over the assembled result sequence
    ///
    /// # Errors
    ///
    /// Returns [`MinMaxError::Gather`] if any worker has not contributed
    pub fn finish(self) -> Result<Vec<f32>> {
        if let Some(missing) = self.received.iter().position(|&r| !r) {
            return Err(MinMaxError::Gather(format!(
                "{} contributions missing, first from worker {missing}",
                self.pending
            )));
        }
        Ok(self.buffer)
    }
}

/// Gather `(owner, values)` contributions, in any arrival order, into one sequence
///
/// # Errors
///
/// See [`Collector::accept`] and [`Collector::finish`]
pub fn gather_into<I, V>(table: &PartitionTable, contributions: I) -> Result<Vec<f32>>
where
    I: IntoIterator<Item = (usize, V)>,
    V: AsRef<[f32]>,
{
    let mut collector = Collector::new(table);
    for (owner, values) in contributions {
        collector.accept(owner, values.as_ref())?;
    }
    collector.finish()
}
