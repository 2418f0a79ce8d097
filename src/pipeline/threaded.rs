use std::time::{Duration, Instant};

use rayon::prelude::*;

use super::{head_of, local_bounds, normalize_in_place, Normalization, PartitionTable, Progress, RunReport, SharedBounds, Stage};
use crate::error::{MinMaxError, Result};
use crate::types::Strategy;

/// Normalize `values` in place on a pool of `workers` threads
///
/// Each thread owns one disjoint view of the buffer. The end of the reduce
/// pass is the join: no thread starts normalizing before every local bound
/// has been merged into the shared global bounds.
///
/// # Errors
///
/// Returns [`MinMaxError::Config`] for zero workers and
/// [`MinMaxError::Resource`] if the thread pool cannot be started
pub fn run_threaded(values: &mut [f32], workers: usize) -> Result<RunReport> {
    let table = PartitionTable::new(values.len(), workers)?;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("minmax-worker-{i}"))
        .build()
        .map_err(|e| MinMaxError::Resource(format!("failed to start {workers} worker threads: {e}")))?;

    let mut progress = Progress::new(0);
    let mut views = table.split_mut(values)?;
    progress.advance(Stage::Partitioned);

    let start = Instant::now();
    let shared = SharedBounds::new();
    pool.install(|| {
        views
            .par_iter()
            .filter(|view| !view.is_empty())
            .for_each(|view| shared.merge(local_bounds(view)));
    });
    progress.advance(Stage::LocallyReduced);

    let bounds = shared.into_inner();
    progress.advance(Stage::GloballyReduced);

    let normalization = Normalization::for_bounds(bounds);
    if normalization == Normalization::Rescaled {
        pool.install(|| {
            views.par_iter_mut().for_each(|view| {
                normalize_in_place(view, bounds);
            });
        });
    }
    progress.advance(Stage::Normalized);
    let elapsed = start.elapsed();

    // The views already sit in their final positions of the shared buffer
    drop(views);
    progress.advance(Stage::Collected);
    progress.advance(Stage::Done);

    log::debug!("threaded run over {} partitions finished in {elapsed:?}", table.worker_count());

    Ok(RunReport {
        strategy: Strategy::Threaded,
        workers,
        len: values.len(),
        bounds,
        normalization,
        elapsed,
        gather_elapsed: Duration::ZERO,
        head: head_of(values),
    })
}
