//! Command implementations for the odz CLI.

use indicatif::{ProgressBar, ProgressStyle};
use odz::{BlockKind, Compressor, Decompressor, Result, read_block_header, read_stream_header};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// Create a progress bar with standard styling.
fn create_progress_bar(len: u64, enable: bool) -> ProgressBar {
    if !enable {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")
            .expect("progress bar template is valid")
            .progress_chars("█▓▒░ "),
    );
    pb
}

fn default_compressed_path(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_os_string();
    name.push(".odz");
    PathBuf::from(name)
}

fn default_decompressed_path(input: &Path) -> PathBuf {
    match input.extension() {
        Some(ext) if ext == "odz" => input.with_extension(""),
        _ => {
            let mut name = input.as_os_str().to_os_string();
            name.push(".out");
            PathBuf::from(name)
        }
    }
}

fn percent(compressed: u64, original: u64) -> f64 {
    if original == 0 {
        return 0.0;
    }
    compressed as f64 * 100.0 / original as f64
}

/// Compress `input` into the odz container format.
pub fn cmd_compress(
    input: &Path,
    output: Option<&Path>,
    level: u8,
    progress: bool,
) -> Result<()> {
    let out_path = output.map_or_else(|| default_compressed_path(input), Path::to_path_buf);

    let file = File::open(input)?;
    let original_size = file.metadata()?.len();
    let reader = BufReader::new(file);
    let mut writer = BufWriter::new(File::create(&out_path)?);

    let bar = create_progress_bar(original_size, progress);
    let mut update = |processed: u64, _total: u64| {
        bar.set_position(processed);
        true
    };

    let written =
        Compressor::new(level).compress(reader, original_size, &mut writer, Some(&mut update))?;
    writer.flush()?;
    bar.finish_and_clear();

    println!(
        "{} -> {} ({} -> {} bytes, {:.1}%)",
        input.display(),
        out_path.display(),
        original_size,
        written,
        percent(written, original_size),
    );
    Ok(())
}

/// Decompress an odz file.
pub fn cmd_decompress(input: &Path, output: Option<&Path>, progress: bool) -> Result<()> {
    let out_path = output.map_or_else(|| default_decompressed_path(input), Path::to_path_buf);

    let file = File::open(input)?;
    let compressed_size = file.metadata()?.len();
    let mut reader = BufReader::new(file);
    let mut writer = BufWriter::new(File::create(&out_path)?);

    // Peek the header for the progress total, then restart the stream for
    // the decoder proper.
    let header = read_stream_header(&mut reader)?;
    let file = File::open(input)?;
    let reader = BufReader::new(file);

    let bar = create_progress_bar(header.original_size, progress);
    let mut update = |processed: u64, _total: u64| {
        bar.set_position(processed);
        true
    };

    let produced = Decompressor::new().decompress(reader, &mut writer, Some(&mut update))?;
    writer.flush()?;
    bar.finish_and_clear();

    println!(
        "{} -> {} ({} -> {} bytes)",
        input.display(),
        out_path.display(),
        compressed_size,
        produced,
    );
    Ok(())
}

#[derive(Debug, Serialize)]
struct BlockReport {
    index: usize,
    kind: &'static str,
    raw_size: u32,
    payload_size: u32,
    last: bool,
}

#[derive(Debug, Serialize)]
struct StreamReport {
    path: String,
    version: u8,
    original_size: u64,
    compressed_size: u64,
    block_count: usize,
    blocks: Vec<BlockReport>,
}

/// Show header and per-block information without decoding any payload.
pub fn cmd_info(input: &Path, json: bool) -> Result<()> {
    let file = File::open(input)?;
    let compressed_size = file.metadata()?.len();
    let mut reader = BufReader::new(file);

    let header = read_stream_header(&mut reader)?;
    let mut blocks = Vec::new();
    loop {
        let (kind, last) = read_block_header(&mut reader)?;
        // Skip the payload; info never decodes.
        io::copy(
            &mut (&mut reader).take(u64::from(kind.payload_size())),
            &mut io::sink(),
        )?;
        blocks.push(BlockReport {
            index: blocks.len(),
            kind: match kind {
                BlockKind::Stored { .. } => "stored",
                BlockKind::Huffman { .. } => "huffman",
            },
            raw_size: kind.raw_size(),
            payload_size: kind.payload_size(),
            last,
        });
        if last {
            break;
        }
    }

    let report = StreamReport {
        path: input.display().to_string(),
        version: header.version,
        original_size: header.original_size,
        compressed_size,
        block_count: blocks.len(),
        blocks,
    };

    if json {
        let rendered = serde_json::to_string_pretty(&report).map_err(io::Error::other)?;
        println!("{rendered}");
        return Ok(());
    }

    println!("{}", report.path);
    println!("  format version:  {}", report.version);
    println!("  original size:   {} bytes", report.original_size);
    println!(
        "  compressed size: {} bytes ({:.1}%)",
        report.compressed_size,
        percent(report.compressed_size, report.original_size),
    );
    println!("  blocks:          {}", report.block_count);
    println!("{:>7} {:>9} {:>12} {:>12}", "block", "kind", "raw", "payload");
    for block in &report.blocks {
        println!(
            "{:>7} {:>9} {:>12} {:>12}{}",
            block.index,
            block.kind,
            block.raw_size,
            block.payload_size,
            if block.last { "  (last)" } else { "" },
        );
    }
    Ok(())
}
