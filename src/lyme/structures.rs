/// Trailing magic signature of a Lyme archive.
pub const SIGNATURE: &[u8] = b"!LYME_SFX!";

/// Version tag stored immediately before the signature.
pub const VERSION: &[u8] = b"1.10";

/// On-disk TOC record layout variant.
///
/// The old layout carries no directory flag byte; directories are inferred
/// from a zero offset and a zero compressed size. The new layout stores an
/// explicit flag, which is authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Old,
    New,
}

impl Layout {
    /// Byte length of the record trailer: the path length field plus, in
    /// the new layout, the directory flag.
    pub(crate) fn trailer_len(self) -> u64 {
        match self {
            Layout::Old => 4,
            Layout::New => 5,
        }
    }
}

/// Byte order request for the TOC dword fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endian {
    /// Interpret the entry count both ways and keep the smaller value.
    #[default]
    Auto,
    Big,
    Little,
}

/// Resolved byte order, once the entry count has been interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Big,
    Little,
}

/// One table-of-contents record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LymeEntry {
    /// Windows-style path, case-preserving; may be absolute.
    pub path: String,
    /// Directory flag (stored in the new layout, inferred in the old one).
    pub is_dir: bool,
    /// Payload position as recorded at creation time. The archive bias must
    /// be added before seeking; the stub may have changed size since.
    pub offset: u32,
    /// Decompressed byte length (meaningless for directories).
    pub length: u32,
    /// Compressed byte length (meaningless for directories).
    pub size: u32,
}

impl LymeEntry {
    /// Path with separators normalized to `/`.
    pub fn posix_path(&self) -> String {
        self.path.replace('\\', "/")
    }

    /// Path with separators normalized to `\`.
    pub fn windows_path(&self) -> String {
        self.path.replace('/', "\\")
    }

    /// True when the path carries a drive prefix or a root separator.
    pub fn is_absolute(&self) -> bool {
        if self.path.starts_with(['\\', '/']) {
            return true;
        }
        let bytes = self.path.as_bytes();
        bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
    }

    /// Windows path equality: component-wise, accepting either separator,
    /// ASCII case-insensitive.
    pub fn path_matches(&self, other: &str) -> bool {
        let mut mine = self.path.split(['\\', '/']).filter(|c| !c.is_empty());
        let mut theirs = other.split(['\\', '/']).filter(|c| !c.is_empty());
        loop {
            match (mine.next(), theirs.next()) {
                (None, None) => return true,
                (Some(a), Some(b)) if a.eq_ignore_ascii_case(b) => {}
                _ => return false,
            }
        }
    }
}
