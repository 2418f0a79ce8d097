//! Splitting the logical array into near-equal contiguous partitions

use crate::error::{MinMaxError, Result};
use crate::types::Partition;

/// The `(offset, len)` cover of `total_len` samples by `worker_count` workers
///
/// The first `total_len % worker_count` workers receive one extra sample.
/// The collector reuses this table verbatim, so partition boundaries are
/// computed in exactly one place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionTable {
    total_len: usize,
    partitions: Vec<Partition>,
}

impl PartitionTable {
    /// # Errors
    ///
    /// Returns [`MinMaxError::Config`] when `worker_count` is zero
    pub fn new(total_len: usize, worker_count: usize) -> Result<Self> {
        if worker_count == 0 {
            return Err(MinMaxError::Config(
                "worker count must be at least 1".to_string(),
            ));
        }

        let base = total_len / worker_count;
        let extra = total_len % worker_count;

        let mut offset = 0;
        let partitions = (0..worker_count)
            .map(|owner| {
                let len = base + usize::from(owner < extra);
                let partition = Partition::new(owner, offset, len);
                offset += len;
                partition
            })
            .collect();

        Ok(Self {
            total_len,
            partitions,
        })
    }

    #[inline]
    #[must_use]
    pub fn total_len(&self) -> usize {
        self.total_len
    }

    #[inline]
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.partitions.len()
    }

    #[must_use]
    pub fn get(&self, owner: usize) -> Option<&Partition> {
        self.partitions.get(owner)
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Partition> {
        self.partitions.iter()
    }

    /// Per-worker sample counts, in owner order
    #[must_use]
    pub fn counts(&self) -> Vec<usize> {
        self.partitions.iter().map(|p| p.len).collect()
    }

    /// Per-worker start offsets, in owner order
    #[must_use]
    pub fn displacements(&self) -> Vec<usize> {
        self.partitions.iter().map(|p| p.offset).collect()
    }

    /// Carve `buffer` into one disjoint mutable view per partition
    ///
    /// # Errors
    ///
    /// Returns [`MinMaxError::Config`] when the buffer length differs from
    /// the table's total length
    pub fn split_mut<'a>(&self, buffer: &'a mut [f32]) -> Result<Vec<&'a mut [f32]>> {
        if buffer.len() != self.total_len {
            return Err(MinMaxError::Config(format!(
                "buffer holds {} samples but the partition table covers {}",
                buffer.len(),
                self.total_len
            )));
        }

        let mut rest = buffer;
        let mut views = Vec::with_capacity(self.partitions.len());
        for partition in &self.partitions {
            let (head, tail) = std::mem::take(&mut rest).split_at_mut(partition.len);
            views.push(head);
            rest = tail;
        }
        Ok(views)
    }
}

impl<'a> IntoIterator for &'a PartitionTable {
    type Item = &'a Partition;
    type IntoIter = std::slice::Iter<'a, Partition>;

    fn into_iter(self) -> Self::IntoIter {
        self.partitions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_ten_over_three() {
        let table = PartitionTable::new(10, 3).unwrap();
        assert_eq!(table.counts(), vec![4, 3, 3]);
        assert_eq!(table.displacements(), vec![0, 4, 7]);
        assert_eq!(table.worker_count(), 3);
        assert_eq!(table.total_len(), 10);
    }

    #[test]
    fn test_zero_workers_rejected() {
        assert_matches!(PartitionTable::new(10, 0), Err(MinMaxError::Config(_)));
    }

    #[test]
    fn test_fewer_samples_than_workers() {
        let table = PartitionTable::new(2, 5).unwrap();
        assert_eq!(table.counts(), vec![1, 1, 0, 0, 0]);
        assert_eq!(table.displacements(), vec![0, 1, 2, 2, 2]);
        assert!(table.get(4).unwrap().is_empty());
    }

    #[test]
    fn test_empty_array() {
        let table = PartitionTable::new(0, 4).unwrap();
        assert!(table.iter().all(Partition::is_empty));
    }

    #[test]
    fn test_cover_is_exact_and_balanced() {
        for n in 0..64 {
            for w in 1..12 {
                let table = PartitionTable::new(n, w).unwrap();
                let counts = table.counts();
                assert_eq!(counts.iter().sum::<usize>(), n, "n={n} w={w}");

                let max = *counts.iter().max().unwrap();
                let min = *counts.iter().min().unwrap();
                assert!(max - min <= 1, "n={n} w={w} counts={counts:?}");

                // Contiguous and ordered
                let mut expected_offset = 0;
                for p in &table {
                    assert_eq!(p.offset, expected_offset);
                    expected_offset = p.end();
                }
                assert_eq!(expected_offset, n);
            }
        }
    }

    #[test]
    fn test_split_mut_views() {
        let table = PartitionTable::new(5, 2).unwrap();
        let mut buffer = [1.0, 2.0, 3.0, 4.0, 5.0];
        let views = table.split_mut(&mut buffer).unwrap();
        assert_eq!(views.len(), 2);
        assert_eq!(&*views[0], &[1.0, 2.0, 3.0]);
        assert_eq!(&*views[1], &[4.0, 5.0]);
    }

    #[test]
    fn test_split_mut_length_mismatch() {
        let table = PartitionTable::new(5, 2).unwrap();
        let mut buffer = [0.0; 4];
        assert_matches!(table.split_mut(&mut buffer), Err(MinMaxError::Config(_)));
    }
}
