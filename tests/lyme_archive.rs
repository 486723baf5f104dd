//! End-to-end tests over synthetic Lyme archives built in memory.

use std::fs;
use std::io::{Cursor, Write};

use flate2::Compression;
use flate2::write::ZlibEncoder;

use unlyme::lyme::{SIGNATURE, VERSION};
use unlyme::{Endian, Error, FormatError, Layout, LookupError, LymeArchive};

fn pack(data: &[u8]) -> Vec<u8> {
    let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
}

enum Item {
    Dir(String),
    File(String, Vec<u8>),
}

/// Builds a forward-written Lyme file: stub, payload blocks, TOC records,
/// entry count, version tag, signature, optional trailing bytes.
struct ArchiveBuilder {
    stub: Vec<u8>,
    items: Vec<Item>,
    little: bool,
    old: bool,
    version: Vec<u8>,
    suffix: Vec<u8>,
    // Pretend the stub had this many bytes more when offsets were recorded.
    stub_delta: i64,
}

impl ArchiveBuilder {
    fn new() -> Self {
        Self {
            stub: b"MZ\x90\x00fake sfx stub".to_vec(),
            items: Vec::new(),
            little: false,
            old: false,
            version: VERSION.to_vec(),
            suffix: Vec::new(),
            stub_delta: 0,
        }
    }

    fn stub(mut self, bytes: &[u8]) -> Self {
        self.stub = bytes.to_vec();
        self
    }

    fn dir(mut self, path: &str) -> Self {
        self.items.push(Item::Dir(path.to_string()));
        self
    }

    fn file(mut self, path: &str, data: &[u8]) -> Self {
        self.items.push(Item::File(path.to_string(), data.to_vec()));
        self
    }

    fn little(mut self) -> Self {
        self.little = true;
        self
    }

    fn old(mut self) -> Self {
        self.old = true;
        self
    }

    fn version(mut self, version: &[u8]) -> Self {
        self.version = version.to_vec();
        self
    }

    fn suffix(mut self, suffix: &[u8]) -> Self {
        self.suffix = suffix.to_vec();
        self
    }

    fn stub_delta(mut self, delta: i64) -> Self {
        self.stub_delta = delta;
        self
    }

    fn u32(&self, v: u32) -> [u8; 4] {
        if self.little {
            v.to_le_bytes()
        } else {
            v.to_be_bytes()
        }
    }

    fn record(&self, path: &str, offset: u32, length: u32, size: u32, dir: bool) -> Vec<u8> {
        let mut raw = Vec::new();
        raw.extend_from_slice(&self.u32(offset));
        raw.extend_from_slice(&self.u32(length));
        raw.extend_from_slice(&self.u32(size));
        raw.extend_from_slice(path.as_bytes());
        raw.extend_from_slice(&self.u32(path.len() as u32));
        if !self.old {
            raw.push(dir as u8);
        }
        raw
    }

    fn build(self) -> Cursor<Vec<u8>> {
        let mut out = self.stub.clone();
        let mut records = Vec::new();
        for item in &self.items {
            match item {
                Item::Dir(path) => records.push(self.record(path, 0, 0, 0, true)),
                Item::File(path, plain) => {
                    let packed = pack(plain);
                    let offset = (out.len() as i64 + self.stub_delta) as u32;
                    records.push(self.record(
                        path,
                        offset,
                        plain.len() as u32,
                        packed.len() as u32,
                        false,
                    ));
                    out.extend_from_slice(&packed);
                }
            }
        }
        for record in &records {
            out.extend_from_slice(record);
        }
        out.extend_from_slice(&self.u32(self.items.len() as u32));
        out.extend_from_slice(&self.version);
        out.extend_from_slice(SIGNATURE);
        out.extend_from_slice(&self.suffix);
        Cursor::new(out)
    }
}

#[test]
fn round_trip() {
    // Written order: the file first, the directory record last.
    let stream = ArchiveBuilder::new()
        .file("docs\\a.txt", b"hello")
        .dir("docs")
        .build();
    let mut archive = LymeArchive::open(stream, Layout::New, Endian::Auto).unwrap();

    assert_eq!(archive.entries().len(), 2);
    assert_eq!(
        archive.list(true),
        vec![
            (String::from("docs"), None),
            (String::from("docs/a.txt"), Some(5)),
        ]
    );

    let data = archive.extract("docs/a.txt").unwrap();
    assert_eq!(data.as_deref(), Some(&b"hello"[..]));

    // Directories carry no data.
    assert_eq!(archive.extract("docs").unwrap(), None);
}

#[test]
fn listing_defaults_to_windows_separators() {
    let stream = ArchiveBuilder::new().file("docs\\a.txt", b"hi").build();
    let archive = LymeArchive::open(stream, Layout::New, Endian::Auto).unwrap();

    assert_eq!(
        archive.list(false),
        vec![(String::from("docs\\a.txt"), Some(2))]
    );
}

#[test]
fn little_endian_autodetected() {
    let stream = ArchiveBuilder::new()
        .little()
        .file("a.txt", b"payload")
        .build();
    let mut archive = LymeArchive::open(stream, Layout::New, Endian::Auto).unwrap();
    assert_eq!(archive.extract("a.txt").unwrap().unwrap(), b"payload");
}

#[test]
fn explicit_endianness() {
    let stream = ArchiveBuilder::new().file("a.txt", b"payload").build();
    let mut archive = LymeArchive::open(stream, Layout::New, Endian::Big).unwrap();
    assert_eq!(archive.extract("a.txt").unwrap().unwrap(), b"payload");

    // Reading a big-endian archive as little-endian inflates the count
    // beyond what the stream can hold.
    let stream = ArchiveBuilder::new().file("a.txt", b"payload").build();
    assert!(matches!(
        LymeArchive::open(stream, Layout::New, Endian::Little),
        Err(FormatError::TruncatedToc)
    ));
}

#[test]
fn old_layout_round_trip() {
    let stream = ArchiveBuilder::new()
        .old()
        .little()
        .file("docs\\a.txt", b"old format")
        .dir("docs")
        .build();
    let mut archive = LymeArchive::open(stream, Layout::Old, Endian::Auto).unwrap();

    assert!(archive.entries()[0].is_dir);
    assert!(!archive.entries()[1].is_dir);
    assert_eq!(
        archive.extract("docs/a.txt").unwrap().unwrap(),
        b"old format"
    );
}

#[test]
fn bias_corrects_for_a_resized_stub() {
    // Offsets were recorded against a stub 3 bytes longer than the real
    // one, so the bias must come out as -(-3) ... the stub shrank by 3.
    let stream = ArchiveBuilder::new()
        .stub_delta(-3)
        .file("a.txt", b"shifted")
        .build();
    let mut archive = LymeArchive::open(stream, Layout::New, Endian::Auto).unwrap();

    assert_eq!(archive.bias(), 3);
    assert_eq!(archive.extract("a.txt").unwrap().unwrap(), b"shifted");
}

#[test]
fn duplicate_paths_resolve_to_the_last_written() {
    let stream = ArchiveBuilder::new()
        .file("a.txt", b"first written")
        .file("a.txt", b"second written")
        .build();
    let mut archive = LymeArchive::open(stream, Layout::New, Endian::Auto).unwrap();

    assert_eq!(
        archive.extract("a.txt").unwrap().unwrap(),
        b"second written"
    );
}

#[test]
fn lookup_is_case_insensitive() {
    let stream = ArchiveBuilder::new().file("Docs\\A.txt", b"x").build();
    let archive = LymeArchive::open(stream, Layout::New, Endian::Auto).unwrap();

    assert!(archive.lookup("docs/a.TXT").is_ok());
    assert!(matches!(
        archive.lookup("docs/b.txt"),
        Err(LookupError::NotFound(_))
    ));
}

#[test]
fn foreign_entries_are_rejected() {
    let a = ArchiveBuilder::new().file("a.txt", b"aaa").build();
    let b = ArchiveBuilder::new().file("b.txt", b"bbbb").build();
    let archive_a = LymeArchive::open(a, Layout::New, Endian::Auto).unwrap();
    let archive_b = LymeArchive::open(b, Layout::New, Endian::Auto).unwrap();

    let foreign = archive_b.entries()[0].clone();
    assert!(matches!(
        archive_a.lookup(&foreign),
        Err(LookupError::NotMember)
    ));

    // A copy of one of the archive's own entries is still a member.
    let own = archive_a.entries()[0].clone();
    assert!(archive_a.lookup(&own).is_ok());
}

#[test]
fn missing_member_fails_extraction() {
    let stream = ArchiveBuilder::new().file("a.txt", b"aaa").build();
    let mut archive = LymeArchive::open(stream, Layout::New, Endian::Auto).unwrap();

    assert!(matches!(
        archive.extract("nope.txt"),
        Err(Error::Lookup(LookupError::NotFound(_)))
    ));
}

#[test]
fn stub_and_suffix_are_returned_verbatim() {
    let stream = ArchiveBuilder::new()
        .stub(b"MZ self extractor")
        .file("a.txt", b"data")
        .suffix(b"authenticode blob")
        .build();
    let mut archive = LymeArchive::open(stream, Layout::New, Endian::Auto).unwrap();

    assert_eq!(archive.sfx_end(), 17);
    assert_eq!(archive.stub().unwrap(), b"MZ self extractor");
    assert_eq!(archive.suffix().unwrap(), b"authenticode blob");
}

#[test]
fn empty_suffix_is_empty() {
    let stream = ArchiveBuilder::new().file("a.txt", b"data").build();
    let mut archive = LymeArchive::open(stream, Layout::New, Endian::Auto).unwrap();
    assert_eq!(archive.suffix().unwrap(), b"");
}

#[test]
fn version_drift_still_opens() {
    let stream = ArchiveBuilder::new()
        .version(b"1.20")
        .file("a.txt", b"data")
        .build();
    assert!(LymeArchive::open(stream, Layout::New, Endian::Auto).is_ok());
}

#[test]
fn three_byte_stream_is_too_short() {
    let stream = Cursor::new(b"abc".to_vec());
    assert!(matches!(
        LymeArchive::open(stream, Layout::New, Endian::Auto),
        Err(FormatError::TooShort)
    ));
}

#[test]
fn overlong_count_is_a_truncated_toc() {
    // A plausible tail claiming nine entries with no records at all.
    let mut raw = vec![0u8; 2];
    raw.extend_from_slice(&9u32.to_be_bytes());
    raw.extend_from_slice(VERSION);
    raw.extend_from_slice(SIGNATURE);
    assert!(matches!(
        LymeArchive::open(Cursor::new(raw), Layout::New, Endian::Auto),
        Err(FormatError::TruncatedToc)
    ));
}

#[test]
fn directory_only_archives_have_no_boundary() {
    let stream = ArchiveBuilder::new().dir("docs").build();
    assert!(matches!(
        LymeArchive::open(stream, Layout::New, Endian::Auto),
        Err(FormatError::EmptyToc)
    ));
}

#[test]
fn extract_all_recreates_the_tree() {
    let stream = ArchiveBuilder::new()
        .dir("docs")
        .file("docs\\a.txt", b"hello")
        .file("top.bin", &[0u8, 1, 2, 3])
        .build();
    let mut archive = LymeArchive::open(stream, Layout::New, Endian::Auto).unwrap();

    let dest = tempfile::tempdir().unwrap();
    archive.extract_all(dest.path(), None).unwrap();

    assert!(dest.path().join("docs").is_dir());
    assert_eq!(fs::read(dest.path().join("docs/a.txt")).unwrap(), b"hello");
    assert_eq!(
        fs::read(dest.path().join("top.bin")).unwrap(),
        [0u8, 1, 2, 3]
    );
}

#[test]
fn extract_all_streams_in_small_chunks() {
    let plain: Vec<u8> = (0..10_000u32).map(|i| (i % 239) as u8).collect();
    let stream = ArchiveBuilder::new().file("big.bin", &plain).build();
    let mut archive = LymeArchive::open(stream, Layout::New, Endian::Auto).unwrap();

    let dest = tempfile::tempdir().unwrap();
    archive.extract_all(dest.path(), Some(3)).unwrap();

    assert_eq!(fs::read(dest.path().join("big.bin")).unwrap(), plain);
}

#[test]
fn absolute_paths_are_flattened() {
    let stream = ArchiveBuilder::new()
        .file("C:\\x\\y.txt", b"absolute")
        .file("plain.txt", b"relative")
        .build();
    let mut archive = LymeArchive::open(stream, Layout::New, Endian::Auto).unwrap();

    let dest = tempfile::tempdir().unwrap();
    archive.extract_all(dest.path(), None).unwrap();

    assert_eq!(
        fs::read(dest.path().join("C:_x_y.txt")).unwrap(),
        b"absolute"
    );
    assert_eq!(fs::read(dest.path().join("plain.txt")).unwrap(), b"relative");
}
