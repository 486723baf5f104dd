//! Per-entry payload extraction.
//!
//! Payloads are zlib-wrapped deflate streams of exactly `size` compressed
//! bytes starting at `offset + bias`, inflating to exactly `length` bytes.
//! Both the one-shot and the chunked paths validate those sizes strictly;
//! an archive that lies about either is reported, never silently accepted.

use flate2::{Decompress, FlushDecompress, Status};
use std::io::{self, Read, Seek, SeekFrom, Write};

use super::structures::LymeEntry;
use crate::error::DataError;

/// Output buffer size for the streaming decompressor.
const INFLATE_BUF: usize = 32 * 1024;

/// Position the cursor at the entry's true payload start.
fn seek_payload<R: Read + Seek>(
    reader: &mut R,
    entry: &LymeEntry,
    bias: i64,
) -> Result<(), DataError> {
    let start = u64::try_from(i64::from(entry.offset) + bias).map_err(|_| {
        DataError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            "payload position before the start of the stream",
        ))
    })?;
    reader.seek(SeekFrom::Start(start))?;
    Ok(())
}

/// Fill `buf` from the reader, reporting a short read as [`DataError::Truncated`].
fn read_compressed<R: Read>(
    reader: &mut R,
    buf: &mut [u8],
    entry: &LymeEntry,
) -> Result<(), DataError> {
    match reader.read_exact(buf) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(DataError::Truncated {
            path: entry.path.clone(),
        }),
        Err(e) => Err(e.into()),
    }
}

/// Extract one entry in a single pass and return the decompressed bytes.
///
/// # Errors
///
/// [`DataError::Truncated`] if the stream holds fewer than `size` compressed
/// bytes; [`DataError::SizeMismatch`] if the inflated data is not exactly
/// `length` bytes long.
pub fn extract<R: Read + Seek>(
    reader: &mut R,
    entry: &LymeEntry,
    bias: i64,
) -> Result<Vec<u8>, DataError> {
    seek_payload(reader, entry, bias)?;

    let mut raw = vec![0u8; entry.size as usize];
    read_compressed(reader, &mut raw, entry)?;

    // One spare byte of capacity so an oversized stream shows up as a size
    // mismatch instead of being cut off at `length`.
    let mut data = Vec::with_capacity(entry.length as usize + 1);
    let mut inflater = Decompress::new(true);
    inflater.decompress_vec(&raw, &mut data, FlushDecompress::Finish)?;

    if data.len() != entry.length as usize {
        return Err(DataError::SizeMismatch {
            expected: entry.length,
            actual: data.len() as u64,
        });
    }
    Ok(data)
}

/// Stream one entry into `sink` through a bounded buffer.
///
/// `step` caps the compressed bytes read per iteration; `None` (or zero)
/// reads the whole payload in one pass. A single decompression context
/// spans the entry, so after the declared compressed bytes are consumed it
/// can be checked for a clean end of stream.
///
/// # Errors
///
/// [`DataError::Truncated`] on a short read,
/// [`DataError::UnterminatedStream`] if the deflate stream does not finish
/// within the declared compressed bytes, and [`DataError::SizeMismatch`]
/// if the total produced differs from `length`.
pub fn write<R, W>(
    reader: &mut R,
    entry: &LymeEntry,
    bias: i64,
    sink: &mut W,
    step: Option<usize>,
) -> Result<(), DataError>
where
    R: Read + Seek,
    W: Write,
{
    seek_payload(reader, entry, bias)?;

    let step = match step {
        Some(s) if s > 0 => s,
        _ => entry.size as usize,
    };

    let mut inflater = Decompress::new(true);
    let mut out = vec![0u8; INFLATE_BUF];
    let mut buf = vec![0u8; step.min(entry.size as usize)];
    let mut remaining = entry.size as usize;
    let mut done = false;

    while remaining > 0 {
        let chunk = step.min(remaining);
        let raw = &mut buf[..chunk];
        read_compressed(reader, raw, entry)?;
        remaining -= chunk;

        // Bytes past the stream end still get consumed so the cursor lands
        // where the record says the payload stops.
        if done {
            continue;
        }

        let mut fed = 0;
        while fed < chunk {
            let before_in = inflater.total_in();
            let before_out = inflater.total_out();
            let status = inflater.decompress(&raw[fed..], &mut out, FlushDecompress::None)?;
            fed += (inflater.total_in() - before_in) as usize;
            let produced = (inflater.total_out() - before_out) as usize;
            if produced > 0 {
                sink.write_all(&out[..produced])?;
            }
            match status {
                Status::StreamEnd => {
                    done = true;
                    break;
                }
                // No progress in either direction means stalled input.
                _ if produced == 0 && inflater.total_in() == before_in => break,
                _ => {}
            }
        }
    }

    if !done {
        return Err(DataError::UnterminatedStream);
    }
    let total = inflater.total_out();
    if total != u64::from(entry.length) {
        return Err(DataError::SizeMismatch {
            expected: entry.length,
            actual: total,
        });
    }
    Ok(())
}
