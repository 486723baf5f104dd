//! Main entry point for the unlyme CLI.
//!
//! This binary lists or extracts Lyme self-extracting archives. All format
//! work happens in the library; this file only parses arguments, opens the
//! input file and renders the listing.

use anyhow::Result;
use clap::Parser;
use std::fs::{self, File};
use std::io::{Read, Seek};

use unlyme::{Cli, LymeArchive};

fn main() -> Result<()> {
    // Advisories (version drift, absolute-path renames) come through the
    // log facade; show them by default.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let file = File::open(&cli.file)?;
    let mut archive = LymeArchive::open(file, cli.format.into(), cli.endian.into())?;

    if let Some(ref path) = cli.dump_stub {
        fs::write(path, archive.stub()?)?;
    }
    if let Some(ref path) = cli.dump_suffix {
        fs::write(path, archive.suffix()?)?;
    }

    if cli.extract {
        archive.extract_all(&cli.output, cli.chunk)?;
    } else {
        list_entries(&archive, cli.posix);
    }

    Ok(())
}

/// Print the listing with the path column padded to the longest path.
fn list_entries<R: Read + Seek>(archive: &LymeArchive<R>, posix: bool) {
    let rows = archive.list(posix);
    let width = rows.iter().map(|(path, _)| path.len()).max().unwrap_or(0);
    for (path, length) in rows {
        let length = length.map_or(String::new(), |n| n.to_string());
        println!("{path:<width$} {length}");
    }
}
