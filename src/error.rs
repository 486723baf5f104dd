//! Error types for Lyme archive operations.
//!
//! Three separate taxonomies keep failures matchable by phase: opening and
//! TOC decoding ([`FormatError`]), per-entry payload extraction
//! ([`DataError`]) and member resolution ([`LookupError`]). The umbrella
//! [`Error`] is returned by compound archive operations that can fail in
//! more than one of those phases.

use std::io;
use thiserror::Error;

/// Errors raised while locating the signature and decoding the TOC.
///
/// All of these abort `open`; no partially-constructed archive is produced.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The stream cannot even hold the version tag and signature.
    #[error("file too short to be a Lyme archive")]
    TooShort,

    /// The backward scan ran out of room without finding the signature.
    #[error("not a Lyme archive [signature not found]")]
    SignatureNotFound,

    /// A TOC record could not be decoded.
    #[error("malformed TOC record: {reason}")]
    MalformedRecord {
        /// Description of the decode failure.
        reason: String,
    },

    /// A record would extend past the start of the stream, which means the
    /// entry count claims more records than the stream holds.
    #[error("truncated TOC: record extends past the start of the stream")]
    TruncatedToc,

    /// The TOC holds no file entries, so the end of the self-extractor
    /// block cannot be determined.
    #[error("TOC contains no file entries")]
    EmptyToc,

    /// I/O error from the underlying reader.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Errors raised while extracting a single entry's payload.
#[derive(Debug, Error)]
pub enum DataError {
    /// Fewer compressed bytes were available than the entry declares.
    #[error("too few source bytes reading {path}")]
    Truncated {
        /// Path of the entry being read.
        path: String,
    },

    /// The decompressed payload is not exactly the recorded length.
    #[error("incorrect extracted size: expected {expected}, got {actual}")]
    SizeMismatch {
        /// Length recorded in the TOC.
        expected: u32,
        /// Bytes actually produced.
        actual: u64,
    },

    /// All declared compressed bytes were consumed but the decompressor
    /// never reached a clean end of stream.
    #[error("unfinished deflate stream")]
    UnterminatedStream,

    /// The compressed bytes are not a valid deflate stream.
    #[error("invalid deflate data: {0}")]
    Inflate(#[from] flate2::DecompressError),

    /// I/O error from the reader or the output sink.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Errors raised while resolving a member to a TOC entry.
#[derive(Debug, Error)]
pub enum LookupError {
    /// No TOC entry matches the requested path.
    #[error("{0} not found")]
    NotFound(String),

    /// The supplied entry does not belong to this archive.
    #[error("the entry is not a member of the archive")]
    NotMember,
}

/// Any error the archive API can produce.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result alias for archive operations.
pub type Result<T> = std::result::Result<T, Error>;
