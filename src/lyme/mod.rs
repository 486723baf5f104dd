//! Lyme SFX archive parsing and extraction.
//!
//! ## Architecture
//!
//! The module is organized into four components:
//!
//! - [`structures`]: the TOC entry, layout/endianness selectors and the
//!   signature constants
//! - [`parser`]: backward parsing of the trailing signature and the TOC
//! - [`extractor`]: per-entry payload decompression, one-shot or streamed
//! - [`archive`]: the high-level [`LymeArchive`] API for end users
//!
//! ## Format overview
//!
//! A Lyme file consists of:
//! 1. A self-extracting executable stub
//! 2. One zlib-wrapped deflate block per stored file
//! 3. The TOC records, an entry count, a version tag and the `!LYME_SFX!`
//!    signature, possibly followed by foreign trailing bytes
//!
//! There is no forward index, so reading starts from the signature at the
//! tail and walks the TOC back to front. Offsets recorded at creation time
//! may have drifted if the stub was patched afterwards; the difference is
//! measured once at open time (the bias) and applied to every payload seek.
//!
//! ## Limitations
//!
//! - Read-only: no archive creation
//! - Deflate is the only payload compression
//! - Corrupted TOCs are reported, not repaired

mod archive;
mod extractor;
mod parser;
mod structures;

pub use archive::{LymeArchive, Member};
pub use parser::{decode_record, find_signature, read_toc};
pub use structures::*;
