//! High-level Lyme archive API.
//!
//! [`LymeArchive`] performs the whole open sequence once — locate the
//! signature, read the TOC, measure the bias, find the self-extractor
//! boundary — and then serves lookups, extraction, listings and access to
//! the stub and suffix blocks. Opening is all-or-nothing: any failure
//! leaves no archive behind.

use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use super::extractor;
use super::parser;
use super::structures::{Endian, Layout, LymeEntry};
use crate::error::{Error, FormatError, LookupError};

/// A member reference: either a path to resolve against the TOC or an
/// entry that must already belong to the archive.
#[derive(Debug, Clone, Copy)]
pub enum Member<'a> {
    Path(&'a str),
    Entry(&'a LymeEntry),
}

impl<'a> From<&'a str> for Member<'a> {
    fn from(path: &'a str) -> Self {
        Member::Path(path)
    }
}

impl<'a> From<&'a String> for Member<'a> {
    fn from(path: &'a String) -> Self {
        Member::Path(path)
    }
}

impl<'a> From<&'a LymeEntry> for Member<'a> {
    fn from(entry: &'a LymeEntry) -> Self {
        Member::Entry(entry)
    }
}

/// An opened Lyme self-extracting archive.
///
/// The TOC and the bias are computed once at open time; afterwards the
/// archive is immutable except for the reader's cursor, which every
/// operation repositions explicitly before use. Nothing here assumes the
/// cursor was left anywhere in particular by a previous call.
pub struct LymeArchive<R> {
    reader: R,
    toc: Vec<LymeEntry>,
    bias: i64,
    suffix_offset: u64,
    sfx_end: u64,
}

impl LymeArchive<File> {
    /// Open an archive from a filesystem path.
    pub fn open_path<P: AsRef<Path>>(
        path: P,
        layout: Layout,
        endian: Endian,
    ) -> Result<Self, FormatError> {
        let file = File::open(path)?;
        Self::open(file, layout, endian)
    }
}

impl<R: Read + Seek> LymeArchive<R> {
    /// Open an archive from any seekable reader.
    ///
    /// Runs the signature scan and the backward TOC read, then computes the
    /// end of the self-extractor block: the lowest payload offset among
    /// file entries, bias-corrected.
    ///
    /// # Errors
    ///
    /// Any [`FormatError`] from the scan or the TOC read, plus
    /// [`FormatError::EmptyToc`] when the TOC holds no file entries and the
    /// self-extractor boundary is therefore undefined.
    pub fn open(mut reader: R, layout: Layout, endian: Endian) -> Result<Self, FormatError> {
        let suffix_offset = parser::find_signature(&mut reader)?;
        let (toc, bias) = parser::read_toc(&mut reader, layout, endian)?;

        let first = toc
            .iter()
            .filter(|e| !e.is_dir)
            .map(|e| e.offset)
            .min()
            .ok_or(FormatError::EmptyToc)?;
        let sfx_end = (i64::from(first) + bias).max(0) as u64;

        Ok(Self {
            reader,
            toc,
            bias,
            suffix_offset,
            sfx_end,
        })
    }

    /// TOC entries in discovery order: physically last-written first.
    pub fn entries(&self) -> &[LymeEntry] {
        &self.toc
    }

    /// Signed correction added to recorded offsets before any payload seek.
    pub fn bias(&self) -> i64 {
        self.bias
    }

    /// Position just after the trailing signature.
    pub fn suffix_offset(&self) -> u64 {
        self.suffix_offset
    }

    /// Position just past the embedded self-extractor, bias-corrected.
    pub fn sfx_end(&self) -> u64 {
        self.sfx_end
    }

    /// Resolve a member to its TOC entry.
    ///
    /// Paths are compared in TOC order under Windows path equality, so of
    /// two entries sharing a path the physically last-written one wins.
    /// An entry is accepted only if the TOC holds an equal member.
    pub fn lookup<'a, M: Into<Member<'a>>>(&self, member: M) -> Result<&LymeEntry, LookupError> {
        match member.into() {
            Member::Entry(entry) => self
                .toc
                .iter()
                .find(|e| *e == entry)
                .ok_or(LookupError::NotMember),
            Member::Path(path) => self
                .toc
                .iter()
                .find(|e| e.path_matches(path))
                .ok_or_else(|| LookupError::NotFound(path.to_string())),
        }
    }

    /// Extract one member into memory.
    ///
    /// Directories carry no data and yield `None`; a genuinely empty file
    /// yields `Some` with an empty buffer.
    pub fn extract<'a, M: Into<Member<'a>>>(&mut self, member: M) -> Result<Option<Vec<u8>>, Error> {
        let entry = self.lookup(member)?.clone();
        if entry.is_dir {
            return Ok(None);
        }
        let data = extractor::extract(&mut self.reader, &entry, self.bias)?;
        Ok(Some(data))
    }

    /// Extract every entry under `dest`, creating directories as needed.
    ///
    /// File payloads stream through a bounded buffer of `step` compressed
    /// bytes (`None` reads each payload in one pass). Absolute paths cannot
    /// be reproduced under `dest`; they are flattened to a single file name
    /// with `_` in place of the separators, and an advisory names both
    /// forms. The first failing entry aborts the whole operation.
    pub fn extract_all<P: AsRef<Path>>(&mut self, dest: P, step: Option<usize>) -> Result<(), Error> {
        let dest = dest.as_ref();
        fs::create_dir_all(dest)?;

        for idx in 0..self.toc.len() {
            let entry = self.toc[idx].clone();

            let name = if entry.is_absolute() {
                let absolute = entry.posix_path();
                let flat = absolute.replace('/', "_");
                log::warn!("renaming {absolute} to {flat}");
                flat
            } else {
                entry.posix_path()
            };
            let target = dest.join(name);

            if entry.is_dir {
                fs::create_dir_all(&target)?;
                continue;
            }
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }

            let mut out = File::create(&target)?;
            extractor::write(&mut self.reader, &entry, self.bias, &mut out, step)?;
        }
        Ok(())
    }

    /// The embedded self-extractor program: every byte before the first
    /// stored payload.
    pub fn stub(&mut self) -> Result<Vec<u8>, Error> {
        self.reader.seek(SeekFrom::Start(0))?;
        let mut buf = Vec::with_capacity(self.sfx_end as usize);
        self.reader.by_ref().take(self.sfx_end).read_to_end(&mut buf)?;
        Ok(buf)
    }

    /// Bytes appended after the signature, outside the archive proper.
    pub fn suffix(&mut self) -> Result<Vec<u8>, Error> {
        self.reader.seek(SeekFrom::Start(self.suffix_offset))?;
        let mut buf = Vec::new();
        self.reader.read_to_end(&mut buf)?;
        Ok(buf)
    }

    /// Listing rows in TOC order: display path and decompressed length,
    /// `None` for directories.
    pub fn list(&self, posix: bool) -> Vec<(String, Option<u32>)> {
        self.toc
            .iter()
            .map(|e| {
                let path = if posix { e.posix_path() } else { e.windows_path() };
                let length = if e.is_dir { None } else { Some(e.length) };
                (path, length)
            })
            .collect()
    }
}
