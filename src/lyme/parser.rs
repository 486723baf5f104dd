//! Backward TOC parsing for Lyme archives.
//!
//! A Lyme file carries no forward index: the only fixed landmark is the
//! signature at the tail. Parsing therefore runs back to front:
//!
//! 1. Scan backward from the end of the stream for the signature
//! 2. Read the 4-byte entry count that closes the TOC
//! 3. Decode each record backward, locating its start from the trailing
//!    path-length field
//! 4. Measure the bias between recorded offsets and actual positions
//!
//! All functions here are pure over a seekable cursor; none of them keep
//! state between calls. The cursor is always left in a documented position
//! so the next backward decode can proceed.

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use std::io::{Read, Seek, SeekFrom};

use super::structures::{Endian, Endianness, Layout, LymeEntry, SIGNATURE, VERSION};
use crate::error::FormatError;

/// Scan window size: version tag plus signature.
const WINDOW: usize = VERSION.len() + SIGNATURE.len();

/// Decode a u32 with a runtime-selected byte order.
fn read_u32(buf: &[u8], endian: Endianness) -> u32 {
    match endian {
        Endianness::Big => BigEndian::read_u32(buf),
        Endianness::Little => LittleEndian::read_u32(buf),
    }
}

/// Choose the byte order for the raw entry count field.
///
/// With [`Endian::Auto`] the field is interpreted both ways and the smaller
/// value wins: a real archive holds few entries, while the wrong byte order
/// turns a small count into an enormous one. Ties go to big-endian.
fn resolve_endian(raw: [u8; 4], endian: Endian) -> (Endianness, u32) {
    match endian {
        Endian::Auto => {
            let big = BigEndian::read_u32(&raw);
            let little = LittleEndian::read_u32(&raw);
            if big <= little {
                (Endianness::Big, big)
            } else {
                (Endianness::Little, little)
            }
        }
        Endian::Big => (Endianness::Big, BigEndian::read_u32(&raw)),
        Endian::Little => (Endianness::Little, LittleEndian::read_u32(&raw)),
    }
}

/// Find the trailing signature by scanning backward from the end.
///
/// The signature usually sits at the very end of the stream, but installers
/// are commonly re-signed or annotated after creation, so the scan tolerates
/// appended bytes by moving the read window back one byte at a time.
///
/// # Returns
///
/// The suffix offset: the position right after the signature. Bytes from
/// there to the end of the stream are the archive's opaque trailing block.
/// The cursor is left at the TOC's end, just before the version tag.
///
/// # Errors
///
/// [`FormatError::TooShort`] if the stream cannot hold the version tag and
/// signature at all; [`FormatError::SignatureNotFound`] if the window would
/// move past the 4-byte entry count that even an empty TOC must have.
pub fn find_signature<R: Read + Seek>(reader: &mut R) -> Result<u64, FormatError> {
    let end = reader.seek(SeekFrom::End(0))?;
    if end < WINDOW as u64 {
        return Err(FormatError::TooShort);
    }

    let mut start = end - WINDOW as u64;
    let mut window = [0u8; WINDOW];
    loop {
        if start < 4 {
            return Err(FormatError::SignatureNotFound);
        }
        reader.seek(SeekFrom::Start(start))?;
        reader.read_exact(&mut window)?;
        if window.ends_with(SIGNATURE) {
            break;
        }
        start -= 1;
    }

    // Format drift is expected in the wild; a version mismatch is advisory.
    let version = &window[..VERSION.len()];
    if version != VERSION {
        log::warn!(
            "version mismatch: archive reports {:?}, expected {:?}",
            String::from_utf8_lossy(version),
            String::from_utf8_lossy(VERSION),
        );
    }

    reader.seek(SeekFrom::Start(start))?;
    Ok(start + WINDOW as u64)
}

/// Decode one TOC record ending at the current cursor position.
///
/// Records are stored in forward field order but discovered backward. The
/// trailer holds the path byte length (and, in the new layout, the
/// directory flag), which locates the start of the record:
///
/// ```text
/// offset:u32  length:u32  size:u32  path:[u8; n]  n:u32  [is_dir:u8]
/// ```
///
/// # Returns
///
/// The decoded entry. The cursor is left at the start of this record,
/// which is where the next backward decode ends.
///
/// # Errors
///
/// [`FormatError::TruncatedToc`] if the record would extend past the start
/// of the stream; [`FormatError::MalformedRecord`] if the path bytes are
/// not valid UTF-8.
pub fn decode_record<R: Read + Seek>(
    reader: &mut R,
    layout: Layout,
    endian: Endianness,
) -> Result<LymeEntry, FormatError> {
    let end = reader.stream_position()?;
    let trailer_len = layout.trailer_len();
    if end < trailer_len {
        return Err(FormatError::TruncatedToc);
    }

    reader.seek(SeekFrom::Start(end - trailer_len))?;
    let mut trailer = [0u8; 5];
    reader.read_exact(&mut trailer[..trailer_len as usize])?;
    let n = u64::from(read_u32(&trailer[..4], endian));
    let flag = match layout {
        Layout::Old => None,
        Layout::New => Some(trailer[4]),
    };

    // Full record: offset + length + size, the path bytes, the trailer.
    let record_len = 3 * 4 + n + trailer_len;
    if end < record_len {
        return Err(FormatError::TruncatedToc);
    }
    let start = end - record_len;

    // One pass over the dword fields and the path; the trailer is known.
    reader.seek(SeekFrom::Start(start))?;
    let mut body = vec![0u8; (3 * 4 + n) as usize];
    reader.read_exact(&mut body)?;

    let offset = read_u32(&body[0..4], endian);
    let length = read_u32(&body[4..8], endian);
    let size = read_u32(&body[8..12], endian);
    let path = std::str::from_utf8(&body[12..])
        .map_err(|e| FormatError::MalformedRecord {
            reason: e.to_string(),
        })?
        .to_string();

    // Ready for the next backward decode.
    reader.seek(SeekFrom::Start(start))?;

    let is_dir = match layout {
        Layout::Old => offset == 0 && size == 0,
        Layout::New => flag == Some(1),
    };

    Ok(LymeEntry {
        path,
        is_dir,
        offset,
        length,
        size,
    })
}

/// Read the complete TOC backward from the current cursor position.
///
/// The 4-byte entry count sits immediately before the cursor, followed
/// (going backward) by the records themselves.
///
/// # Returns
///
/// The entries in discovery order, so the physically last-written record
/// comes first, together with the bias: the signed difference between the
/// position where the stored payloads actually end and the highest
/// `offset + size` the records claim. Adding the bias to a recorded offset
/// yields the payload's true position in the current stream.
///
/// # Errors
///
/// [`FormatError::TruncatedToc`] if the count claims more records than the
/// stream region holds; any record-level error from [`decode_record`].
pub fn read_toc<R: Read + Seek>(
    reader: &mut R,
    layout: Layout,
    endian: Endian,
) -> Result<(Vec<LymeEntry>, i64), FormatError> {
    let end = reader.stream_position()?;
    if end < 4 {
        return Err(FormatError::TruncatedToc);
    }
    reader.seek(SeekFrom::Start(end - 4))?;
    let mut raw = [0u8; 4];
    reader.read_exact(&mut raw)?;
    let (endianness, count) = resolve_endian(raw, endian);

    // Back to just before the count field, at the tail of the last record.
    reader.seek(SeekFrom::Start(end - 4))?;

    let mut toc = Vec::new();
    let mut last_end = 0u64;
    for _ in 0..count {
        let entry = decode_record(reader, layout, endianness)?;
        if !entry.is_dir {
            last_end = last_end.max(u64::from(entry.offset) + u64::from(entry.size));
        }
        toc.push(entry);
    }

    // The cursor now sits where the last stored payload ends; the recorded
    // offsets may disagree if the stub changed size after creation.
    let bias = reader.stream_position()? as i64 - last_end as i64;
    Ok((toc, bias))
}
