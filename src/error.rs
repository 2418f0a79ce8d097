use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures of the normalization pipeline
///
/// Every variant is fatal to the run: there is no retry or rollback stage.
#[derive(Debug, Error)]
pub enum MinMaxError {
    /// Invalid data size or worker count; the pipeline never starts
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Worker threads or buffers could not be set up
    #[error("resource setup failed: {0}")]
    Resource(String),

    /// A collective exchange could not complete (peer vanished, MPI failure)
    #[error("collective {operation} failed on worker {rank}: {reason}")]
    Collective {
        operation: &'static str,
        rank: usize,
        reason: String,
    },

    /// Gathered contributions do not match the partition table
    #[error("gather failed: {0}")]
    Gather(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl MinMaxError {
    pub(crate) fn collective(operation: &'static str, rank: usize, reason: impl ToString) -> Self {
        Self::Collective {
            operation,
            rank,
            reason: reason.to_string(),
        }
    }
}

/// Failures reading or writing the `[i32 N][f32 x N]` result file
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Stream(#[from] io::Error),

    #[error("sample file is shorter than its 4-byte count header")]
    MissingHeader,

    #[error("truncated sample file: header announces {expected} samples, payload holds {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("corrupt sample file: negative sample count {0}")]
    NegativeCount(i32),

    #[error("{0} samples exceed the sample file format limits")]
    TooLarge(usize),
}

pub type Result<T, E = MinMaxError> = std::result::Result<T, E>;
