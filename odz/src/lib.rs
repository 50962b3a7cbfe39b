//! # odz
//!
//! A block-oriented LZ77 + canonical Huffman compressor with its own
//! self-describing container format. Input bytes are split into independent
//! 1 MiB blocks; each block is factorized into literals and back-references
//! by a hash-chain match finder, then entropy-coded under per-block Huffman
//! trees, falling back to a stored block whenever compression would not pay.
//! The container decompresses bit-exactly to the original byte sequence.
//!
//! ## Modules
//!
//! - [`tables`]: static length/distance alphabet tables
//! - [`huffman`]: code-length construction, canonical codes, two-level
//!   decode tables
//! - [`lz77`]: the hash-chain match finder
//! - [`block`]: per-block encoding and decoding
//! - [`stream`]: file header, block iteration, progress reporting
//!
//! ## Example
//!
//! ```rust
//! use odz::{compress, decompress};
//!
//! let original = b"Hello, World! Hello, World!";
//! let packed = compress(original).unwrap();
//! let unpacked = decompress(&packed).unwrap();
//! assert_eq!(&unpacked, original);
//! ```
//!
//! ## Compression levels
//!
//! - Level 0: no compression (stored blocks)
//! - Level 1-4: increasing match-search depth, greedy parsing
//! - Level 5-9: lazy parsing with deeper searches (default is 6)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod block;
pub mod huffman;
pub mod lz77;
pub mod stream;
pub mod tables;

// Re-exports
pub use block::{BLOCK_SIZE, BlockDecoder, BlockEncoder, BlockKind};
pub use odz_core::error::{ErrorKind, OdzError, Result};
pub use stream::{
    Compressor, DEFAULT_LEVEL, Decompressor, FORMAT_VERSION, HEADER_SIZE, MAGIC, ProgressFn,
    StreamHeader, compress, compress_with_level, decompress, read_block_header, read_stream_header,
};
