use anyhow::{Context, Result};
use clap::Parser;
use minmax::cli::{Args, Command};
use minmax::config::RunConfig;
use minmax::generate::{generate, generate_views};
use minmax::pipeline::{self, PartitionTable, RunReport};
use minmax::report::{self, SaveStatus};
use minmax::storage;
use minmax::types::Strategy;
use std::path::Path;

fn main() {
    env_logger::init();
    let args = Args::parse();

    match run(&args) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            println!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}

/// Execute one subcommand; `Ok(false)` means results were computed but not saved
fn run(args: &Args) -> Result<bool> {
    match &args.command {
        Command::Inspect { file, head } => {
            inspect(file, *head)?;
            Ok(true)
        }
        command => normalize(&RunConfig::from_command(command)?),
    }
}

fn normalize(config: &RunConfig) -> Result<bool> {
    log::info!("{config}");

    match config.strategy {
        Strategy::Serial => run_serial(config),
        Strategy::Threaded => run_threaded(config),
        Strategy::Distributed => run_distributed(config),
        Strategy::Mpi => run_mpi(config),
    }
}

fn run_serial(config: &RunConfig) -> Result<bool> {
    println!("Generating {} random float values...", config.data_size);
    let mut data = generate(config.data_size, config.seed);
    let original_saved = save_original(config, &data);

    println!("Performing serial Min-Max scaling...");
    let report = pipeline::run_serial(&mut data);

    Ok(finish(config, &report, &data) && original_saved)
}

fn run_threaded(config: &RunConfig) -> Result<bool> {
    println!(
        "Generating {} random values with {} threads...",
        config.data_size, config.workers
    );
    let table = PartitionTable::new(config.data_size, config.workers)?;
    let mut data = vec![0.0_f32; config.data_size];
    generate_views(table.split_mut(&mut data)?, config.seed);
    let original_saved = save_original(config, &data);

    println!("Performing threaded Min-Max scaling...");
    let report = pipeline::run_threaded(&mut data, config.workers)?;

    Ok(finish(config, &report, &data) && original_saved)
}

fn run_distributed(config: &RunConfig) -> Result<bool> {
    println!(
        "Performing distributed Min-Max scaling over {} workers...",
        config.workers
    );
    let run = pipeline::run_distributed(
        config.data_size,
        config.workers,
        config.seed,
        config.original.is_some(),
    )?;

    let original_saved = run
        .original
        .as_deref()
        .is_none_or(|original| save_original(config, original));

    Ok(finish(config, &run.report, &run.result) && original_saved)
}

#[cfg(feature = "mpi")]
fn run_mpi(config: &RunConfig) -> Result<bool> {
    let Some(run) = pipeline::run_mpi(config.data_size, config.seed, config.original.is_some())? else {
        // Only rank 0 reports and writes
        return Ok(true);
    };

    let original_saved = run
        .original
        .as_deref()
        .is_none_or(|original| save_original(config, original));

    Ok(finish(config, &run.report, &run.result) && original_saved)
}

#[cfg(not(feature = "mpi"))]
fn run_mpi(_config: &RunConfig) -> Result<bool> {
    anyhow::bail!("this build has no MPI support; rebuild with --features mpi")
}

/// Write the pre-normalization samples if requested; failure is not fatal
fn save_original(config: &RunConfig, data: &[f32]) -> bool {
    let Some(path) = &config.original else {
        return true;
    };

    match storage::write_samples(path, data) {
        Ok(()) => {
            log::info!("original samples saved to {}", path.display());
            true
        }
        Err(e) => {
            log::warn!("original samples not saved: {e}");
            println!("Warning: original samples not saved: {e}");
            false
        }
    }
}

/// Persist and report the result sequence
///
/// A failed write does not discard the computed results: they are still
/// reported, only the save guarantee is lost.
fn finish(config: &RunConfig, report: &RunReport, result: &[f32]) -> bool {
    let (save, saved) = match storage::write_samples(&config.output, result) {
        Ok(()) => (SaveStatus::Saved(&config.output), true),
        Err(e) => {
            log::warn!("results not saved: {e}");
            let status = SaveStatus::Failed {
                path: &config.output,
                error: e.to_string(),
            };
            (status, false)
        }
    };

    log::info!(
        "{} run finished: bounds {}, {:.6}s",
        report.strategy,
        report.bounds,
        report.elapsed.as_secs_f64()
    );
    if let Err(e) = report::print_report(report, &save) {
        log::warn!("report not printed: {e}");
    }
    saved
}

fn inspect(file: &Path, head: usize) -> Result<()> {
    let samples = storage::read_samples(file)
        .with_context(|| format!("Failed to read sample file: {}", file.display()))?;
    report::write_inspection(&mut std::io::stdout().lock(), file, &samples, head)
        .context("Failed to write inspection report")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use minmax::cli::RunOptions;
    use std::path::PathBuf;

    fn config(strategy: Strategy, workers: usize, dir: &Path) -> RunConfig {
        let options = RunOptions {
            seed: Some(17),
            original: Some(dir.join("original.bin")),
        };
        RunConfig::new(strategy, 200, workers, dir.join("out.bin"), &options).unwrap()
    }

    #[test]
    fn test_each_strategy_saves_identical_results() {
        let mut results = Vec::new();
        for (strategy, workers) in [
            (Strategy::Serial, 1),
            (Strategy::Threaded, 1),
            (Strategy::Distributed, 1),
        ] {
            let dir = tempfile::tempdir().unwrap();
            let config = config(strategy, workers, dir.path());
            let saved = match strategy {
                Strategy::Serial => run_serial(&config),
                Strategy::Threaded => run_threaded(&config),
                _ => run_distributed(&config),
            };
            assert!(saved.unwrap(), "{strategy}");
            results.push(storage::read_samples(&config.output).unwrap());
            assert_eq!(storage::read_samples(config.original.as_ref().unwrap()).unwrap().len(), 200);
        }
        // One worker means one generation stream, so every strategy sees the same input
        assert_eq!(results[0], results[1]);
        assert_eq!(results[0], results[2]);
    }

    #[test]
    fn test_unwritable_output_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(Strategy::Serial, 1, dir.path());
        config.output = PathBuf::from(dir.path()).join("missing-dir").join("out.bin");
        config.original = None;
        assert!(!run_serial(&config).unwrap());
    }

    #[test]
    fn test_run_dispatches_inspect() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("out.bin");
        storage::write_samples(&file, &[0.0, 1.0]).unwrap();

        let args = Args {
            command: Command::Inspect { file, head: 1 },
        };
        assert!(run(&args).unwrap());
    }

    #[test]
    fn test_inspect_missing_file() {
        let err = inspect(Path::new("does-not-exist.bin"), 5).unwrap_err();
        assert!(format!("{err:#}").contains("does-not-exist.bin"));
    }
}
