pub mod cli;
pub mod comm;
pub mod config;
pub mod error;
pub mod generate;
pub mod pipeline;
pub mod report;
pub mod storage;
pub mod types;
pub mod validation;

// Re-export commonly used items
pub use error::{MinMaxError, StorageError};
pub use pipeline::{run_distributed, run_serial, run_threaded, PartitionTable, RunReport};
pub use types::{Bounds, Partition, Strategy};
