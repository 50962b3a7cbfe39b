//! odz CLI - block-oriented LZ77 + Huffman compression.
//!
//! Compresses files into the odz container format and back.

mod commands;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use commands::{cmd_compress, cmd_decompress, cmd_info};
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "odz")]
#[command(author, version, about = "Block-oriented LZ77 + Huffman compressor")]
#[command(long_about = "
odz compresses byte streams into a self-describing container of
independently coded 1 MiB blocks.

Examples:
  odz compress data.bin
  odz compress -l best -o archive.odz data.bin
  odz decompress data.bin.odz
  odz info archive.odz
  odz info --json archive.odz
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a file
    #[command(alias = "c")]
    Compress {
        /// File to compress
        input: PathBuf,

        /// Output file (defaults to the input path plus ".odz")
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Compression level
        #[arg(short = 'l', long, value_enum, default_value = "normal")]
        level: CompressionLevelArg,

        /// Show a progress bar
        #[arg(short = 'P', long)]
        progress: bool,
    },

    /// Decompress an odz file
    #[command(alias = "d", alias = "x")]
    Decompress {
        /// File to decompress
        input: PathBuf,

        /// Output file (defaults to the input path without its ".odz" suffix)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Show a progress bar
        #[arg(short = 'P', long)]
        progress: bool,
    },

    /// Show information about an odz file
    #[command(alias = "i")]
    Info {
        /// File to inspect
        input: PathBuf,

        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,
    },

    /// Generate shell completion scripts
    #[command(hide = true)]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Compression level (for clap ValueEnum).
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
enum CompressionLevelArg {
    /// Store without compression
    Store,
    /// Fast compression
    Fast,
    /// Normal compression (default)
    #[default]
    Normal,
    /// Best compression
    Best,
}

impl CompressionLevelArg {
    fn level(self) -> u8 {
        match self {
            Self::Store => 0,
            Self::Fast => 1,
            Self::Normal => odz::DEFAULT_LEVEL,
            Self::Best => 9,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Compress {
            input,
            output,
            level,
            progress,
        } => cmd_compress(&input, output.as_deref(), level.level(), progress),
        Commands::Decompress {
            input,
            output,
            progress,
        } => cmd_decompress(&input, output.as_deref(), progress),
        Commands::Info { input, json } => cmd_info(&input, json),
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "odz", &mut io::stdout());
            return;
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
