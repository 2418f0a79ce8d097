//! Validated run configuration

use anyhow::{Context, Result, bail};
use std::fmt;
use std::path::PathBuf;

use crate::cli::{Command, RunOptions};
use crate::generate::clock_seed;
use crate::types::Strategy;
use crate::validation::{validate_data_size, validate_workers};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub strategy: Strategy,
    pub data_size: usize,
    /// Threads or workers; for MPI runs the world size decides at startup
    pub workers: usize,
    pub output: PathBuf,
    pub original: Option<PathBuf>,
    pub seed: u64,
}

impl RunConfig {
    /// Validate raw command-line values
    ///
    /// # Errors
    ///
    /// Returns an error for a negative or oversized data size, or zero workers
    pub fn new(
        strategy: Strategy,
        data_size: i64,
        workers: usize,
        output: PathBuf,
        options: &RunOptions,
    ) -> Result<Self> {
        let data_size = validate_data_size(data_size).context("Invalid configuration")?;
        let workers = validate_workers(workers).context("Invalid configuration")?;

        Ok(Self {
            strategy,
            data_size,
            workers,
            output,
            original: options.original.clone(),
            seed: options.seed.unwrap_or_else(clock_seed),
        })
    }

    /// Configuration of a normalization subcommand
    ///
    /// # Errors
    ///
    /// See [`RunConfig::new`]; `inspect` does not describe a run and is
    /// rejected
    pub fn from_command(command: &Command) -> Result<Self> {
        match command {
            Command::Serial {
                data_size,
                output_file,
                options,
            } => Self::new(Strategy::Serial, *data_size, 1, output_file.clone(), options),
            Command::Threads {
                data_size,
                num_threads,
                output_file,
                options,
            } => Self::new(Strategy::Threaded, *data_size, *num_threads, output_file.clone(), options),
            Command::Distributed {
                data_size,
                num_workers,
                output_file,
                options,
            } => Self::new(Strategy::Distributed, *data_size, *num_workers, output_file.clone(), options),
            #[cfg(feature = "mpi")]
            Command::Mpi {
                data_size,
                output_file,
                options,
            } => Self::new(Strategy::Mpi, *data_size, 1, output_file.clone(), options),
            Command::Inspect { .. } => bail!("inspect reads a file and has no run configuration"),
        }
    }
}

impl fmt::Display for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} run: {} samples, ", self.strategy, self.data_size)?;
        // The MPI world size is only known once the job has started
        if self.strategy != Strategy::Mpi {
            write!(f, "{} workers, ", self.workers)?;
        }
        write!(f, "seed {}", self.seed)
    }
}
