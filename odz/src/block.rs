//! Block-level encoding and decoding.
//!
//! A block is the unit of independent decodability: one LZ77 token stream
//! with its own pair of Huffman trees, or the raw bytes verbatim when the
//! compressed form would not pay for itself. The encoder measures the exact
//! encoded size before emitting anything, so the stored fallback is taken
//! whenever Huffman coding loses.
//!
//! Wire layout per block: a flags byte (bit 0 = last block, bits 1-2 = type),
//! `raw_size` as u32 LE, and for Huffman blocks `comp_size` as u32 LE
//! followed by that many payload bytes. The payload bitstream carries the
//! two code-length tables (run-length encoded), the token codes with their
//! extra bits, and the end-of-block code, zero-padded to a byte boundary.

use crate::huffman::{
    DISTANCE_ALPHABET_SIZE, DecodeTable, EncodeTable, END_OF_BLOCK, LITLEN_ALPHABET_SIZE,
    MAX_CODE_LENGTH, build_code_lengths,
};
use crate::lz77::{MatchFinder, Token};
use crate::tables::{
    DISTANCE_BASE, DISTANCE_EXTRA_BITS, LENGTH_BASE, LENGTH_EXTRA_BITS, distance_to_code,
    length_to_code,
};
use odz_core::bitstream::{BitReader, BitWriter};
use odz_core::error::{OdzError, Result};
use std::io::{Read, Write};

/// Fixed upper bound on a block's decompressed size (1 MiB).
pub const BLOCK_SIZE: usize = 1 << 20;

/// Last-block bit in the flags byte.
pub(crate) const FLAG_LAST: u8 = 0x01;

/// Block type field values (flags bits 1-2).
pub(crate) const TYPE_STORED: u8 = 0;
pub(crate) const TYPE_HUFFMAN: u8 = 1;

pub(crate) fn pack_flags(block_type: u8, last: bool) -> u8 {
    (block_type << 1) | u8::from(last)
}

/// A parsed block header, past the flags byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Raw bytes, no compression.
    Stored {
        /// Decompressed (and payload) size of the block.
        raw_size: u32,
    },
    /// LZ77 tokens under per-block Huffman trees.
    Huffman {
        /// Decompressed size of the block.
        raw_size: u32,
        /// Byte length of the compressed payload.
        comp_size: u32,
    },
}

impl BlockKind {
    /// Decompressed size of the block.
    pub fn raw_size(&self) -> u32 {
        match *self {
            Self::Stored { raw_size } | Self::Huffman { raw_size, .. } => raw_size,
        }
    }

    /// Bytes of payload following the block header.
    pub fn payload_size(&self) -> u32 {
        match *self {
            Self::Stored { raw_size } => raw_size,
            Self::Huffman { comp_size, .. } => comp_size,
        }
    }
}

// Code-length run-length symbols: 0..=15 are literal lengths, the rest are
// runs with a fixed count of extra bits.
const REP_PREV: u8 = 16; // repeat previous length 3-6 times, 2 extra bits
const ZERO_SHORT: u8 = 17; // run of 3-10 zeros, 3 extra bits
const ZERO_LONG: u8 = 18; // run of 11-138 zeros, 7 extra bits

#[derive(Debug, Clone, Copy)]
struct RleItem {
    symbol: u8,
    extra: u8,
    extra_bits: u8,
}

/// Run-length encode one code-length array.
fn rle_encode(lengths: &[u8], items: &mut Vec<RleItem>) {
    let mut i = 0;
    while i < lengths.len() {
        let len = lengths[i];
        let mut run = 1;
        while i + run < lengths.len() && lengths[i + run] == len && run < 138 {
            run += 1;
        }

        if len == 0 {
            let mut left = run;
            while left > 0 {
                if left >= 11 {
                    items.push(RleItem {
                        symbol: ZERO_LONG,
                        extra: (left - 11) as u8,
                        extra_bits: 7,
                    });
                    left = 0;
                } else if left >= 3 {
                    items.push(RleItem {
                        symbol: ZERO_SHORT,
                        extra: (left - 3) as u8,
                        extra_bits: 3,
                    });
                    left = 0;
                } else {
                    items.push(RleItem {
                        symbol: 0,
                        extra: 0,
                        extra_bits: 0,
                    });
                    left -= 1;
                }
            }
        } else {
            items.push(RleItem {
                symbol: len,
                extra: 0,
                extra_bits: 0,
            });
            let mut left = run - 1;
            while left > 0 {
                if left >= 3 {
                    let take = left.min(6);
                    items.push(RleItem {
                        symbol: REP_PREV,
                        extra: (take - 3) as u8,
                        extra_bits: 2,
                    });
                    left -= take;
                } else {
                    items.push(RleItem {
                        symbol: len,
                        extra: 0,
                        extra_bits: 0,
                    });
                    left -= 1;
                }
            }
        }

        i += run;
    }
}

/// Fill `out` from the run-length encoded form in the bitstream.
fn rle_decode(reader: &mut BitReader, out: &mut [u8]) -> Result<()> {
    let mut i = 0;
    while i < out.len() {
        let symbol = reader.read_bits(5)? as u8;
        match symbol {
            0..=15 => {
                out[i] = symbol;
                i += 1;
            }
            REP_PREV => {
                if i == 0 {
                    return Err(OdzError::corrupted(
                        reader.byte_position(),
                        "length repeat with no previous length",
                    ));
                }
                let run = 3 + reader.read_bits(2)? as usize;
                if i + run > out.len() {
                    return Err(OdzError::corrupted(
                        reader.byte_position(),
                        "length run overflows table",
                    ));
                }
                let prev = out[i - 1];
                out[i..i + run].fill(prev);
                i += run;
            }
            ZERO_SHORT | ZERO_LONG => {
                let run = if symbol == ZERO_SHORT {
                    3 + reader.read_bits(3)? as usize
                } else {
                    11 + reader.read_bits(7)? as usize
                };
                if i + run > out.len() {
                    return Err(OdzError::corrupted(
                        reader.byte_position(),
                        "zero run overflows table",
                    ));
                }
                out[i..i + run].fill(0);
                i += run;
            }
            _ => {
                return Err(OdzError::corrupted(
                    reader.byte_position(),
                    format!("invalid length-table symbol {symbol}"),
                ));
            }
        }
    }
    Ok(())
}

/// Transmitted prefix of a length array: through the last nonzero entry,
/// never below `min`.
fn trimmed_count(lengths: &[u8], min: usize) -> usize {
    lengths
        .iter()
        .rposition(|&len| len > 0)
        .map_or(0, |i| i + 1)
        .max(min)
}

/// Read both code-length tables from the start of a Huffman payload.
fn read_code_lengths(
    reader: &mut BitReader,
) -> Result<([u8; LITLEN_ALPHABET_SIZE], [u8; DISTANCE_ALPHABET_SIZE])> {
    let mut litlen = [0u8; LITLEN_ALPHABET_SIZE];
    let n_litlen = reader.read_bits(9)? as usize;
    if n_litlen > LITLEN_ALPHABET_SIZE {
        return Err(OdzError::corrupted(
            reader.byte_position(),
            format!("literal-length code count {n_litlen} out of range"),
        ));
    }
    rle_decode(reader, &mut litlen[..n_litlen])?;

    let mut dist = [0u8; DISTANCE_ALPHABET_SIZE];
    let n_dist = reader.read_bits(5)? as usize;
    if n_dist > DISTANCE_ALPHABET_SIZE {
        return Err(OdzError::corrupted(
            reader.byte_position(),
            format!("distance code count {n_dist} out of range"),
        ));
    }
    rle_decode(reader, &mut dist[..n_dist])?;

    Ok((litlen, dist))
}

/// Tally literal-length and distance symbol frequencies over a token stream.
/// End-of-block is always counted once.
fn count_frequencies(
    tokens: &[Token],
) -> ([u32; LITLEN_ALPHABET_SIZE], [u32; DISTANCE_ALPHABET_SIZE]) {
    let mut litlen_freq = [0u32; LITLEN_ALPHABET_SIZE];
    let mut dist_freq = [0u32; DISTANCE_ALPHABET_SIZE];

    for token in tokens {
        match *token {
            Token::Literal(byte) => litlen_freq[usize::from(byte)] += 1,
            Token::Match { length, distance } => {
                let (code, _, _) = length_to_code(length);
                litlen_freq[usize::from(code)] += 1;
                let (code, _, _) = distance_to_code(distance);
                dist_freq[usize::from(code)] += 1;
            }
        }
    }
    litlen_freq[usize::from(END_OF_BLOCK)] += 1;

    (litlen_freq, dist_freq)
}

/// Serialize trees and tokens into a finished payload buffer.
fn build_payload(
    tokens: &[Token],
    litlen_lengths: &[u8],
    dist_lengths: &[u8],
    n_litlen: usize,
    n_dist: usize,
    litlen_items: &[RleItem],
    dist_items: &[RleItem],
    capacity: usize,
) -> Vec<u8> {
    let mut payload = BitWriter::with_capacity(capacity);

    payload.write_bits(n_litlen as u32, 9);
    for item in litlen_items {
        payload.write_bits(item.symbol.into(), 5);
        payload.write_bits(item.extra.into(), item.extra_bits.into());
    }
    payload.write_bits(n_dist as u32, 5);
    for item in dist_items {
        payload.write_bits(item.symbol.into(), 5);
        payload.write_bits(item.extra.into(), item.extra_bits.into());
    }

    let litlen_table = EncodeTable::from_lengths(litlen_lengths);
    let dist_table = EncodeTable::from_lengths(dist_lengths);
    for &token in tokens {
        match token {
            Token::Literal(byte) => litlen_table.write(&mut payload, byte.into()),
            Token::Match { length, distance } => {
                let (code, extra_bits, extra) = length_to_code(length);
                litlen_table.write(&mut payload, code);
                payload.write_bits(extra.into(), extra_bits.into());

                let (code, extra_bits, extra) = distance_to_code(distance);
                dist_table.write(&mut payload, code);
                payload.write_bits(extra.into(), extra_bits.into());
            }
        }
    }
    litlen_table.write(&mut payload, END_OF_BLOCK);

    payload.finish()
}

fn write_stored<W: Write>(data: &[u8], last: bool, sink: &mut W) -> Result<u64> {
    let mut header = [0u8; 5];
    header[0] = pack_flags(TYPE_STORED, last);
    header[1..5].copy_from_slice(&(data.len() as u32).to_le_bytes());
    sink.write_all(&header)?;
    sink.write_all(data)?;
    Ok((header.len() + data.len()) as u64)
}

/// Encoder for one block at a time.
///
/// Owns the match finder, the token buffer and the run-length scratch, all
/// reused across blocks.
#[derive(Debug)]
pub struct BlockEncoder {
    level: u8,
    finder: MatchFinder,
    tokens: Vec<Token>,
    litlen_items: Vec<RleItem>,
    dist_items: Vec<RleItem>,
}

impl BlockEncoder {
    /// Create an encoder for the given effort level (0..=9; 0 stores every
    /// block verbatim).
    pub fn new(level: u8) -> Self {
        let level = level.min(9);
        Self {
            level,
            finder: MatchFinder::new(BLOCK_SIZE, level.max(1)),
            tokens: Vec::new(),
            litlen_items: Vec::new(),
            dist_items: Vec::new(),
        }
    }

    /// Encode one raw block to the sink. Returns the bytes written.
    pub fn encode<W: Write>(&mut self, data: &[u8], last: bool, sink: &mut W) -> Result<u64> {
        debug_assert!(data.len() <= BLOCK_SIZE);

        if self.level == 0 {
            return write_stored(data, last, sink);
        }

        self.tokens.clear();
        self.finder.tokenize(data, &mut self.tokens);

        let (litlen_freq, dist_freq) = count_frequencies(&self.tokens);
        let litlen_lengths = build_code_lengths(&litlen_freq, MAX_CODE_LENGTH as u8);
        let dist_lengths = build_code_lengths(&dist_freq, MAX_CODE_LENGTH as u8);
        let n_litlen = trimmed_count(&litlen_lengths, usize::from(END_OF_BLOCK) + 1);
        let n_dist = trimmed_count(&dist_lengths, 0);

        self.litlen_items.clear();
        rle_encode(&litlen_lengths[..n_litlen], &mut self.litlen_items);
        self.dist_items.clear();
        rle_encode(&dist_lengths[..n_dist], &mut self.dist_items);

        let bits = self.encoded_bits(&litlen_freq, &dist_freq, &litlen_lengths, &dist_lengths);
        let comp_size = bits.div_ceil(8);

        // A Huffman block carries 4 more header bytes than a stored one;
        // fall back unless the payload beats the raw bytes by more than that.
        if comp_size + 4 >= data.len() as u64 {
            return write_stored(data, last, sink);
        }

        let payload = build_payload(
            &self.tokens,
            &litlen_lengths,
            &dist_lengths,
            n_litlen,
            n_dist,
            &self.litlen_items,
            &self.dist_items,
            comp_size as usize,
        );
        debug_assert_eq!(payload.len() as u64, comp_size);

        let mut header = [0u8; 9];
        header[0] = pack_flags(TYPE_HUFFMAN, last);
        header[1..5].copy_from_slice(&(data.len() as u32).to_le_bytes());
        header[5..9].copy_from_slice(&(payload.len() as u32).to_le_bytes());
        sink.write_all(&header)?;
        sink.write_all(&payload)?;
        Ok((header.len() + payload.len()) as u64)
    }

    /// Exact bit size of the payload the current tables would produce.
    fn encoded_bits(
        &self,
        litlen_freq: &[u32; LITLEN_ALPHABET_SIZE],
        dist_freq: &[u32; DISTANCE_ALPHABET_SIZE],
        litlen_lengths: &[u8],
        dist_lengths: &[u8],
    ) -> u64 {
        let mut bits = 9 + 5;
        for item in self.litlen_items.iter().chain(&self.dist_items) {
            bits += 5 + u64::from(item.extra_bits);
        }
        for (symbol, &freq) in litlen_freq.iter().enumerate() {
            if freq > 0 {
                bits += u64::from(freq) * u64::from(litlen_lengths[symbol]);
                if symbol > usize::from(END_OF_BLOCK) {
                    bits += u64::from(freq) * u64::from(LENGTH_EXTRA_BITS[symbol - 257]);
                }
            }
        }
        for (code, &freq) in dist_freq.iter().enumerate() {
            if freq > 0 {
                bits += u64::from(freq)
                    * (u64::from(dist_lengths[code]) + u64::from(DISTANCE_EXTRA_BITS[code]));
            }
        }
        bits
    }
}

/// Decoder for one block at a time.
///
/// The decode tables and the payload scratch are allocated once and reused
/// across blocks.
#[derive(Debug, Default)]
pub struct BlockDecoder {
    litlen: DecodeTable,
    dist: DecodeTable,
    payload: Vec<u8>,
}

impl BlockDecoder {
    /// Create a decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one block into `out` (cleared first).
    pub fn decode<R: Read>(
        &mut self,
        kind: BlockKind,
        source: &mut R,
        out: &mut Vec<u8>,
    ) -> Result<()> {
        out.clear();

        let raw_size = kind.raw_size() as usize;
        if raw_size > BLOCK_SIZE {
            return Err(OdzError::BlockTooLarge {
                size: kind.raw_size(),
                max: BLOCK_SIZE as u32,
            });
        }

        match kind {
            BlockKind::Stored { .. } => {
                out.resize(raw_size, 0);
                source.read_exact(out)?;
            }
            BlockKind::Huffman { comp_size, .. } => {
                // Reject before allocating: a real payload never outgrows
                // the block it encodes.
                if comp_size as usize > BLOCK_SIZE + 8 {
                    return Err(OdzError::BlockTooLarge {
                        size: comp_size,
                        max: (BLOCK_SIZE + 8) as u32,
                    });
                }
                self.payload.clear();
                self.payload.resize(comp_size as usize, 0);
                source.read_exact(&mut self.payload)?;

                let mut reader = BitReader::new(&self.payload);
                let (litlen_lengths, dist_lengths) = read_code_lengths(&mut reader)?;
                self.litlen.build(&litlen_lengths)?;
                self.dist.build(&dist_lengths)?;
                self.expand(&mut reader, raw_size, out)?;
            }
        }

        Ok(())
    }

    /// Replay the token stream of a Huffman payload.
    fn expand(&self, reader: &mut BitReader, raw_size: usize, out: &mut Vec<u8>) -> Result<()> {
        loop {
            let symbol = self.litlen.decode(reader)?;
            if symbol < END_OF_BLOCK {
                if out.len() >= raw_size {
                    return Err(OdzError::corrupted(
                        reader.byte_position(),
                        "literal overflows block size",
                    ));
                }
                out.push(symbol as u8);
            } else if symbol == END_OF_BLOCK {
                break;
            } else {
                let index = usize::from(symbol) - 257;
                if index >= LENGTH_BASE.len() {
                    return Err(OdzError::corrupted(
                        reader.byte_position(),
                        format!("invalid length symbol {symbol}"),
                    ));
                }
                let extra = reader.read_bits(LENGTH_EXTRA_BITS[index].into())?;
                let length = usize::from(LENGTH_BASE[index]) + extra as usize;

                let dist_code = usize::from(self.dist.decode(reader)?);
                if dist_code >= DISTANCE_BASE.len() {
                    return Err(OdzError::corrupted(
                        reader.byte_position(),
                        format!("invalid distance symbol {dist_code}"),
                    ));
                }
                let extra = reader.read_bits(DISTANCE_EXTRA_BITS[dist_code].into())?;
                let distance = usize::from(DISTANCE_BASE[dist_code]) + extra as usize;

                if distance > out.len() {
                    return Err(OdzError::invalid_distance(distance, out.len()));
                }
                if out.len() + length > raw_size {
                    return Err(OdzError::corrupted(
                        reader.byte_position(),
                        "match overflows block size",
                    ));
                }
                copy_match(out, distance, length);
            }
        }

        if out.len() != raw_size {
            return Err(OdzError::corrupted(
                reader.byte_position(),
                format!("block decoded to {} bytes, expected {raw_size}", out.len()),
            ));
        }
        Ok(())
    }
}

/// Append `length` bytes copied from `distance` back, with self-referential
/// matches allowed: `out[cur + k]` must equal `out[cur - distance + k]` for
/// every `k`, including bytes produced by this same copy.
fn copy_match(out: &mut Vec<u8>, distance: usize, length: usize) {
    let start = out.len() - distance;
    if distance >= length {
        out.extend_from_within(start..start + length);
    } else if distance == 1 {
        // Run of a single byte.
        let byte = out[out.len() - 1];
        out.resize(out.len() + length, byte);
    } else {
        // Overlapping: copy in chunks so bytes appended earlier in this
        // match become sources for the later ones.
        let mut remaining = length;
        let mut src = start;
        while remaining > 0 {
            let chunk = remaining.min(out.len() - src);
            out.extend_from_within(src..src + chunk);
            src += chunk;
            remaining -= chunk;
        }
    }
}
