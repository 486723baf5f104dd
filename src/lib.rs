//! # unlyme
//!
//! A reader for Lyme self-extracting archives.
//!
//! Lyme files are Windows self-extractors: an executable stub, the
//! deflate-compressed payload blocks, and a backward-ordered table of
//! contents terminated by a version tag and the `!LYME_SFX!` signature.
//! The format carries no forward index, so the reader locates the trailing
//! signature first and then walks the TOC records back to front. Offsets
//! recorded at creation time may have drifted if the stub was re-signed or
//! patched afterwards; the reader measures that drift once at open time
//! and corrects every payload seek with it.
//!
//! ## Features
//!
//! - Both record layouts: the old one without a directory flag and the new
//!   one with it
//! - Heuristic endianness detection, or an explicit byte order
//! - One-shot and bounded-memory streaming extraction with strict size
//!   validation
//! - Access to the embedded self-extractor stub and to foreign bytes
//!   appended after the signature
//!
//! ## Example
//!
//! ```no_run
//! use unlyme::{Endian, Layout, LymeArchive};
//!
//! fn main() -> unlyme::Result<()> {
//!     let mut archive = LymeArchive::open_path("driver.exe", Layout::New, Endian::Auto)?;
//!
//!     for (path, length) in archive.list(true) {
//!         println!("{path} {}", length.map_or(String::new(), |n| n.to_string()));
//!     }
//!
//!     if let Some(data) = archive.extract("docs/readme.txt")? {
//!         println!("{} bytes", data.len());
//!     }
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod error;
pub mod lyme;

pub use cli::Cli;
pub use error::{DataError, Error, FormatError, LookupError, Result};
pub use lyme::{Endian, Endianness, Layout, LymeArchive, LymeEntry, Member};
