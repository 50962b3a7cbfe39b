//! Stream framing: file header, block iteration, progress dispatch.
//!
//! An odz stream is a 12-byte header followed by one or more blocks, the
//! last of which carries the last-block flag. The header records the total
//! decompressed size up front, so the input length must be known before
//! compression starts; the sum of the blocks' raw sizes must equal it
//! exactly.
//!
//! All working state (block buffer, decode tables, match-finder arrays)
//! lives inside the [`Compressor`]/[`Decompressor`] values and is reused
//! across blocks and across calls. There is no global state.

use crate::block::{
    BLOCK_SIZE, BlockDecoder, BlockEncoder, BlockKind, FLAG_LAST, TYPE_HUFFMAN, TYPE_STORED,
};
use odz_core::error::{OdzError, Result};
use std::io::{Read, Write};

/// Stream magic bytes.
pub const MAGIC: [u8; 3] = *b"ODZ";

/// Format version this build reads and writes.
pub const FORMAT_VERSION: u8 = 2;

/// Size of the fixed stream header: magic, version, original size.
pub const HEADER_SIZE: usize = 12;

/// Default compression level.
pub const DEFAULT_LEVEL: u8 = 6;

/// Progress callback: invoked synchronously after each block with
/// `(processed, total)` byte counts. Returning `false` aborts the operation
/// with [`OdzError::Aborted`]. The callback must not reenter the codec.
pub type ProgressFn<'a> = &'a mut dyn FnMut(u64, u64) -> bool;

/// Parsed stream header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamHeader {
    /// Format version byte.
    pub version: u8,
    /// Total decompressed size of the stream.
    pub original_size: u64,
}

/// Read and validate the 12-byte stream header.
pub fn read_stream_header<R: Read>(source: &mut R) -> Result<StreamHeader> {
    let mut header = [0u8; HEADER_SIZE];
    source.read_exact(&mut header)?;
    if header[..3] != MAGIC {
        return Err(OdzError::invalid_magic([header[0], header[1], header[2]]));
    }
    if header[3] != FORMAT_VERSION {
        return Err(OdzError::unsupported_version(header[3], FORMAT_VERSION));
    }
    let mut size = [0u8; 8];
    size.copy_from_slice(&header[4..12]);
    Ok(StreamHeader {
        version: header[3],
        original_size: u64::from_le_bytes(size),
    })
}

/// Read one block header: the flags byte and the size fields its type
/// implies. Returns the parsed kind and the last-block flag.
pub fn read_block_header<R: Read>(source: &mut R) -> Result<(BlockKind, bool)> {
    let mut flags = [0u8; 1];
    source.read_exact(&mut flags)?;
    let last = flags[0] & FLAG_LAST != 0;
    let kind = match (flags[0] >> 1) & 0x03 {
        TYPE_STORED => BlockKind::Stored {
            raw_size: read_u32(source)?,
        },
        TYPE_HUFFMAN => {
            let raw_size = read_u32(source)?;
            let comp_size = read_u32(source)?;
            BlockKind::Huffman {
                raw_size,
                comp_size,
            }
        }
        value => return Err(OdzError::UnknownBlockType { value }),
    };
    Ok((kind, last))
}

fn read_u32<R: Read>(source: &mut R) -> Result<u32> {
    let mut bytes = [0u8; 4];
    source.read_exact(&mut bytes)?;
    Ok(u32::from_le_bytes(bytes))
}

fn report(progress: &mut Option<ProgressFn<'_>>, processed: u64, total: u64) -> Result<()> {
    if let Some(callback) = progress.as_mut() {
        if !callback(processed, total) {
            return Err(OdzError::Aborted);
        }
    }
    Ok(())
}

/// Streaming compressor.
///
/// Owns one block of scratch plus the encoder state; a single value can
/// compress any number of streams in sequence.
#[derive(Debug)]
pub struct Compressor {
    encoder: BlockEncoder,
    block: Vec<u8>,
}

impl Compressor {
    /// Create a compressor at the given effort level (0..=9; 0 stores
    /// blocks verbatim).
    pub fn new(level: u8) -> Self {
        Self {
            encoder: BlockEncoder::new(level),
            block: Vec::new(),
        }
    }

    /// Compress exactly `original_size` bytes from `source` into `sink`.
    ///
    /// The size goes into the stream header, so it must be known up front
    /// (for files, from metadata). Returns the total compressed bytes
    /// written. Empty input still produces one empty stored block.
    pub fn compress<R: Read, W: Write>(
        &mut self,
        mut source: R,
        original_size: u64,
        mut sink: W,
        mut progress: Option<ProgressFn<'_>>,
    ) -> Result<u64> {
        let mut header = [0u8; HEADER_SIZE];
        header[..3].copy_from_slice(&MAGIC);
        header[3] = FORMAT_VERSION;
        header[4..12].copy_from_slice(&original_size.to_le_bytes());
        sink.write_all(&header)?;

        let mut written = HEADER_SIZE as u64;
        let mut processed = 0u64;
        loop {
            let want = (original_size - processed).min(BLOCK_SIZE as u64) as usize;
            self.block.clear();
            self.block.resize(want, 0);
            source.read_exact(&mut self.block)?;
            processed += want as u64;

            let last = processed == original_size;
            written += self.encoder.encode(&self.block, last, &mut sink)?;
            report(&mut progress, processed, original_size)?;
            if last {
                break;
            }
        }

        Ok(written)
    }
}

impl Default for Compressor {
    fn default() -> Self {
        Self::new(DEFAULT_LEVEL)
    }
}

/// Streaming decompressor.
///
/// Owns the block buffer and the decode tables; both are reused across
/// blocks and across streams.
#[derive(Debug, Default)]
pub struct Decompressor {
    decoder: BlockDecoder,
    block: Vec<u8>,
}

impl Decompressor {
    /// Create a decompressor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decompress a stream from `source` into `sink`.
    ///
    /// Validates the header, decodes blocks until the last-block flag, and
    /// requires the cumulative decoded size to match the header exactly.
    /// Returns the decompressed byte count.
    pub fn decompress<R: Read, W: Write>(
        &mut self,
        mut source: R,
        mut sink: W,
        mut progress: Option<ProgressFn<'_>>,
    ) -> Result<u64> {
        let header = read_stream_header(&mut source)?;

        let mut produced = 0u64;
        loop {
            let (kind, last) = read_block_header(&mut source)?;
            self.decoder.decode(kind, &mut source, &mut self.block)?;
            produced += self.block.len() as u64;
            if produced > header.original_size {
                return Err(OdzError::size_mismatch(header.original_size, produced));
            }
            sink.write_all(&self.block)?;
            report(&mut progress, produced, header.original_size)?;
            if last {
                break;
            }
        }

        if produced != header.original_size {
            return Err(OdzError::size_mismatch(header.original_size, produced));
        }
        Ok(produced)
    }
}

/// Compress a byte slice at the default level.
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    compress_with_level(data, DEFAULT_LEVEL)
}

/// Compress a byte slice at the given level (0..=9).
pub fn compress_with_level(data: &[u8], level: u8) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    Compressor::new(level).compress(data, data.len() as u64, &mut out, None)?;
    Ok(out)
}

/// Decompress a byte slice.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    Decompressor::new().decompress(data, &mut out, None)?;
    Ok(out)
}
