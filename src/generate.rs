//! Synthetic sample generation
//!
//! Values are uniform in `[0, 100)`. The pipeline treats their distribution
//! as opaque; only the range and the determinism for a given seed matter.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::types::Partition;

pub const SAMPLE_LOW: f32 = 0.0;
pub const SAMPLE_HIGH: f32 = 100.0;

/// Seed used when none is configured
#[must_use]
pub fn clock_seed() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}

/// Seed of one worker's stream, distinct per owner
#[inline]
#[must_use]
pub fn worker_seed(seed: u64, owner: usize) -> u64 {
    seed.wrapping_add(owner as u64)
}

fn fill(values: &mut [f32], seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    for v in values.iter_mut() {
        *v = rng.random_range(SAMPLE_LOW..SAMPLE_HIGH);
    }
}

/// `n` samples from a single stream
#[must_use]
pub fn generate(n: usize, seed: u64) -> Vec<f32> {
    let mut values = vec![0.0; n];
    fill(&mut values, seed);
    values
}

/// The samples one worker generates for its own partition
#[must_use]
pub fn generate_partition(partition: &Partition, seed: u64) -> Vec<f32> {
    generate(partition.len, worker_seed(seed, partition.owner))
}

/// Fill per-partition views in parallel, one stream per partition
///
/// For a given seed and partitioning the result equals concatenating
/// [`generate_partition`] over all owners.
pub fn generate_views(views: Vec<&mut [f32]>, seed: u64) {
    views
        .into_par_iter()
        .enumerate()
        .for_each(|(owner, view)| fill(view, worker_seed(seed, owner)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::PartitionTable;

    #[test]
    fn test_values_in_range() {
        let values = generate(10_000, 7);
        assert_eq!(values.len(), 10_000);
        assert!(values.iter().all(|&v| (SAMPLE_LOW..SAMPLE_HIGH).contains(&v)));
    }

    #[test]
    fn test_same_seed_same_values() {
        assert_eq!(generate(64, 42), generate(64, 42));
        assert_ne!(generate(64, 42), generate(64, 43));
    }

    #[test]
    fn test_parallel_views_match_per_partition_streams() {
        let table = PartitionTable::new(103, 4).unwrap();
        let mut buffer = vec![0.0; 103];
        generate_views(table.split_mut(&mut buffer).unwrap(), 9);

        let expected: Vec<f32> = table.iter().flat_map(|p| generate_partition(p, 9)).collect();
        assert_eq!(buffer, expected);
    }
}
