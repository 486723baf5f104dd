use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::lyme::{Endian, Layout};

#[derive(Parser, Debug)]
#[command(name = "unlyme")]
#[command(version)]
#[command(about = "Lyme self-extracting archive extractor", long_about = None)]
#[command(after_help = "Examples:\n  \
  unlyme setup.exe                list the contents of setup.exe\n  \
  unlyme -e -d out setup.exe      extract everything into out/\n  \
  unlyme -f old -b big image.bin  list an old-format big-endian archive")]
pub struct Cli {
    /// Lyme archive to read
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Record layout of the input file
    #[arg(short = 'f', long = "format", value_enum, default_value = "new")]
    pub format: LayoutArg,

    /// How the offsets and sizes are coded
    #[arg(short = 'b', long = "endian", value_enum, default_value = "auto")]
    pub endian: EndianArg,

    /// List the contents (default action)
    #[arg(short = 'l', long = "list", conflicts_with = "extract")]
    pub list: bool,

    /// Extract the contents
    #[arg(short = 'e', long = "extract")]
    pub extract: bool,

    /// Use POSIX paths in the listing instead of windows paths
    #[arg(short = 'p', long = "posix")]
    pub posix: bool,

    /// Directory to extract the data into
    #[arg(short = 'd', long = "output", value_name = "DIR", default_value = ".")]
    pub output: PathBuf,

    /// Read compressed payloads in chunks of this many bytes
    #[arg(long = "chunk", value_name = "BYTES")]
    pub chunk: Option<usize>,

    /// Write the embedded self-extractor stub to a file
    #[arg(long = "stub", value_name = "FILE")]
    pub dump_stub: Option<PathBuf>,

    /// Write the bytes trailing the signature to a file
    #[arg(long = "suffix", value_name = "FILE")]
    pub dump_suffix: Option<PathBuf>,
}

/// Record layout selector.
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum LayoutArg {
    New,
    Old,
}

/// Endianness selector.
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum EndianArg {
    Auto,
    Big,
    Little,
}

impl From<LayoutArg> for Layout {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::New => Layout::New,
            LayoutArg::Old => Layout::Old,
        }
    }
}

impl From<EndianArg> for Endian {
    fn from(arg: EndianArg) -> Self {
        match arg {
            EndianArg::Auto => Endian::Auto,
            EndianArg::Big => Endian::Big,
            EndianArg::Little => Endian::Little,
        }
    }
}
