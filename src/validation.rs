use anyhow::{bail, Result};

/// Largest sample count the `[i32 N]` file header can describe
pub const MAX_DATA_SIZE: i64 = i32::MAX as i64;

#[inline]
pub fn validate_data_size(data_size: i64) -> Result<usize> {
    if data_size < 0 {
        bail!("Invalid data size {data_size}: must not be negative");
    }

    if data_size > MAX_DATA_SIZE {
        bail!("Invalid data size {data_size}: at most {MAX_DATA_SIZE} samples fit the output format");
    }

    Ok(usize::try_from(data_size)?)
}

#[inline]
pub fn validate_workers(workers: usize) -> Result<usize> {
    if workers == 0 {
        bail!("Invalid worker count 0: at least one worker is required");
    }

    Ok(workers)
}
