//! Dump commands over AmigaOS hunk executables: `dumphunk` for the raw
//! container structure, `dumpdbg` for the decoded `DebugInfo`, plus the two
//! peripheral stubs the original tool shipped (`dumpaout`, `dumpar`) for
//! formats this system never parses.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use hunkdbg_core::hunk::{Hunk, HunkReader};
use hunkdbg_core::DebugInfo;

#[derive(Debug, Parser)]
#[command(name = "hunkdbg-dump", about = "Dump AmigaOS hunk and STABS debug structure")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Dump the raw hunk container structure of one or more executables.
    Dumphunk { files: Vec<PathBuf> },
    /// Parse and dump the decoded DebugInfo of one or more executables.
    Dumpdbg { files: Vec<PathBuf> },
    /// a.out/COFF structural dump — not part of this system.
    Dumpaout { files: Vec<PathBuf> },
    /// Archive member listing — not part of this system.
    Dumpar { files: Vec<PathBuf> },
}

fn main() {
    let cli = Cli::parse();
    match cli.command {
        Command::Dumphunk { files } => {
            for file in files {
                dumphunk(&file);
            }
        }
        Command::Dumpdbg { files } => {
            for file in files {
                dumpdbg(&file);
            }
        }
        Command::Dumpaout { files } => {
            for file in files {
                println!("{}: a.out/COFF dumping is not supported by this tool", file.display());
            }
        }
        Command::Dumpar { files } => {
            for file in files {
                println!("{}: archive member listing is not supported by this tool", file.display());
            }
        }
    }
}

fn dumphunk(path: &PathBuf) {
    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("{}: {e}", path.display());
            return;
        }
    };

    println!("{}:", path.display());
    for hunk in HunkReader::new(&data) {
        match hunk {
            Ok(Hunk::Header(info)) => {
                println!(
                    "  HUNK_HEADER: table_size={} first_hunk={} last_hunk={} sizes={:?}",
                    info.table_size, info.first_hunk, info.last_hunk, info.hunk_sizes
                );
            }
            Ok(Hunk::Code { size, mem }) => println!("  HUNK_CODE: {size} bytes ({mem:?})"),
            Ok(Hunk::Data { size, mem }) => println!("  HUNK_DATA: {size} bytes ({mem:?})"),
            Ok(Hunk::Bss { size, mem }) => println!("  HUNK_BSS: {size} bytes ({mem:?})"),
            Ok(Hunk::Symbol(symbols)) => {
                println!("  HUNK_SYMBOL: {} entries", symbols.len());
                for s in symbols {
                    println!("    {:08X}: {}", s.refs, s.name);
                }
            }
            Ok(Hunk::Debug { stabs, .. }) => {
                println!("  HUNK_DEBUG: {} stabs", stabs.len());
            }
            Ok(Hunk::Ignored(id)) => println!("  (ignored hunk {id:#x})"),
            Err(e) => {
                eprintln!("  error: {e}");
                break;
            }
        }
    }
}

fn dumpdbg(path: &PathBuf) {
    match DebugInfo::from_file(path) {
        Ok(info) => {
            println!("{}:", path.display());
            print!("{}", info.dump());
        }
        Err(e) => eprintln!("{}: {e}", path.display()),
    }
}
