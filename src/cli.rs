use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// Min-max normalization of generated samples, serial or parallel
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Normalize in a single thread
    Serial {
        /// Number of samples to generate
        #[arg(value_name = "DATA_SIZE", allow_negative_numbers = true)]
        data_size: i64,

        /// Where to write the normalized samples
        #[arg(value_name = "OUTPUT_FILE")]
        output_file: PathBuf,

        #[command(flatten)]
        options: RunOptions,
    },

    /// Normalize on a pool of threads sharing one buffer
    Threads {
        /// Number of samples to generate
        #[arg(value_name = "DATA_SIZE", allow_negative_numbers = true)]
        data_size: i64,

        /// Size of the thread pool
        #[arg(value_name = "NUM_THREADS")]
        num_threads: usize,

        /// Where to write the normalized samples
        #[arg(value_name = "OUTPUT_FILE")]
        output_file: PathBuf,

        #[command(flatten)]
        options: RunOptions,
    },

    /// Normalize with message-passing workers that share no memory
    Distributed {
        /// Number of samples to generate
        #[arg(value_name = "DATA_SIZE", allow_negative_numbers = true)]
        data_size: i64,

        /// Number of workers
        #[arg(value_name = "NUM_WORKERS")]
        num_workers: usize,

        /// Where rank 0 writes the normalized samples
        #[arg(value_name = "OUTPUT_FILE")]
        output_file: PathBuf,

        #[command(flatten)]
        options: RunOptions,
    },

    /// Normalize as one rank of an MPI job (mpirun -np <processes> minmax mpi ...)
    #[cfg(feature = "mpi")]
    Mpi {
        /// Number of samples to generate
        #[arg(value_name = "DATA_SIZE", allow_negative_numbers = true)]
        data_size: i64,

        /// Where rank 0 writes the normalized samples
        #[arg(value_name = "OUTPUT_FILE")]
        output_file: PathBuf,

        #[command(flatten)]
        options: RunOptions,
    },

    /// Summarize a previously written sample file
    Inspect {
        /// Sample file to read
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Number of leading values to print
        #[arg(long, default_value_t = 5)]
        head: usize,
    },
}

/// Options shared by every normalization run
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct RunOptions {
    /// Seed for sample generation (defaults to the current time)
    #[arg(long, env = "MINMAX_SEED")]
    pub seed: Option<u64>,

    /// Also write the samples before normalization to this file
    #[arg(long, value_name = "PATH")]
    pub original: Option<PathBuf>,
}
