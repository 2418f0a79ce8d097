use std::time::{Duration, Instant};

use super::{head_of, local_bounds, normalize_in_place, Progress, RunReport, Stage};
use crate::types::Strategy;

/// Normalize `values` in place in a single control flow
///
/// The whole array is one partition, so the local bounds are the global
/// bounds and the buffer itself is the result sequence.
pub fn run_serial(values: &mut [f32]) -> RunReport {
    let mut progress = Progress::new(0);
    progress.advance(Stage::Partitioned);

    let start = Instant::now();
    let bounds = local_bounds(values);
    progress.advance(Stage::LocallyReduced);
    progress.advance(Stage::GloballyReduced);

    let normalization = normalize_in_place(values, bounds);
    progress.advance(Stage::Normalized);
    let elapsed = start.elapsed();

    progress.advance(Stage::Collected);
    progress.advance(Stage::Done);

    RunReport {
        strategy: Strategy::Serial,
        workers: 1,
        len: values.len(),
        bounds,
        normalization,
        elapsed,
        gather_elapsed: Duration::ZERO,
        head: head_of(values),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Normalization;
    use crate::types::Bounds;

    #[test]
    fn test_reference_scenario() {
        let mut values = vec![5.0, 1.0, 9.0, 3.0];
        let report = run_serial(&mut values);
        assert_eq!(report.bounds, Bounds::new(1.0, 9.0));
        assert_eq!(values, vec![0.5, 0.0, 1.0, 0.25]);
        assert_eq!(report.head, values);
        assert_eq!(report.normalization, Normalization::Rescaled);
        assert_eq!(report.workers, 1);
    }

    #[test]
    fn test_equal_values_untouched() {
        let mut values = vec![7.0, 7.0, 7.0];
        let report = run_serial(&mut values);
        assert_eq!(values, vec![7.0, 7.0, 7.0]);
        assert_eq!(report.normalization, Normalization::Unchanged);
    }

    #[test]
    fn test_empty_input() {
        let mut values: Vec<f32> = Vec::new();
        let report = run_serial(&mut values);
        assert!(report.bounds.is_identity());
        assert!(report.head.is_empty());
        assert_eq!(report.len, 0);
    }
}
