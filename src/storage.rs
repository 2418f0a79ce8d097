//! Result file format
//!
//! ```text
//! [i32 N][f32 x N]
//! ```
//!
//! Little-endian, no magic number, no version field. A reader needs at least
//! `4 + 4 * N` bytes; anything shorter is a truncated file.

use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::StorageError;

const HEADER_LEN: usize = 4;
const SAMPLE_LEN: usize = 4;

/// Payload bytes of `count` samples
fn payload_len(count: usize) -> Result<usize, StorageError> {
    count.checked_mul(SAMPLE_LEN).ok_or(StorageError::TooLarge(count))
}

/// Serialize `samples` into `writer`
///
/// # Errors
///
/// Returns [`StorageError::TooLarge`] when the count does not fit an `i32`,
/// or [`StorageError::Stream`] when the writer fails
pub fn encode<W: Write>(writer: &mut W, samples: &[f32]) -> Result<(), StorageError> {
    let count = i32::try_from(samples.len()).map_err(|_| StorageError::TooLarge(samples.len()))?;
    writer.write_i32::<LittleEndian>(count)?;

    let mut payload = vec![0u8; payload_len(samples.len())?];
    LittleEndian::write_f32_into(samples, &mut payload);
    writer.write_all(&payload)?;
    Ok(())
}

/// Deserialize one sample sequence from `reader`
///
/// Bytes past the announced payload are ignored.
///
/// # Errors
///
/// Returns [`StorageError::MissingHeader`], [`StorageError::NegativeCount`]
/// or [`StorageError::Truncated`] for malformed input, and
/// [`StorageError::TooLarge`] when the payload size overflows `usize`
pub fn decode<R: Read>(reader: &mut R) -> Result<Vec<f32>, StorageError> {
    let count = match reader.read_i32::<LittleEndian>() {
        Ok(count) => count,
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Err(StorageError::MissingHeader),
        Err(e) => return Err(e.into()),
    };
    let expected = usize::try_from(count).map_err(|_| StorageError::NegativeCount(count))?;
    let expected_len = payload_len(expected)?;

    // Read what is actually there rather than trusting the header for the allocation
    let mut payload = Vec::new();
    reader
        .by_ref()
        .take(expected_len as u64)
        .read_to_end(&mut payload)?;

    if payload.len() < expected_len {
        return Err(StorageError::Truncated {
            expected,
            actual: payload.len() / SAMPLE_LEN,
        });
    }

    let mut samples = vec![0.0_f32; expected];
    LittleEndian::read_f32_into(&payload, &mut samples);
    Ok(samples)
}

/// Write `samples` to `path`, replacing any existing file
///
/// # Errors
///
/// Returns [`StorageError::Io`] naming the path on any I/O failure
pub fn write_samples(path: &Path, samples: &[f32]) -> Result<(), StorageError> {
    let with_path = |source: std::io::Error| StorageError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(with_path)?;
    let mut writer = BufWriter::new(file);
    encode(&mut writer, samples).map_err(|e| match e {
        StorageError::Stream(source) => with_path(source),
        other => other,
    })?;
    writer.flush().map_err(with_path)?;

    log::debug!(
        "wrote {} samples ({} bytes) to {}",
        samples.len(),
        HEADER_LEN + samples.len() * SAMPLE_LEN,
        path.display()
    );
    Ok(())
}

/// Read a sample file written by [`write_samples`]
///
/// # Errors
///
/// Returns [`StorageError::Io`] naming the path on I/O failure, or a format
/// error for malformed content
pub fn read_samples(path: &Path) -> Result<Vec<f32>, StorageError> {
    let with_path = |source: std::io::Error| StorageError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(with_path)?;
    decode(&mut BufReader::new(file)).map_err(|e| match e {
        StorageError::Stream(source) => with_path(source),
        other => other,
    })
}
