//! Error types for odz operations.
//!
//! Every failure in the codec surfaces as an [`OdzError`]. Variants carry
//! enough context to diagnose a broken stream; [`OdzError::kind`] collapses
//! them into the coarse classes callers usually branch on.

use std::io;
use thiserror::Error;

/// The main error type for odz operations.
#[derive(Debug, Error)]
pub enum OdzError {
    /// I/O error from the underlying source or sink.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The progress callback requested an abort.
    #[error("operation aborted by progress callback")]
    Aborted,

    /// Invalid magic number in the stream header.
    #[error("invalid magic number: expected [4f, 44, 5a], found {found:02x?}")]
    InvalidMagic {
        /// Magic bytes actually found.
        found: [u8; 3],
    },

    /// Unsupported format version in the stream header.
    #[error("unsupported format version {found} (expected {expected})")]
    UnsupportedVersion {
        /// Version byte actually found.
        found: u8,
        /// Version this build understands.
        expected: u8,
    },

    /// Unknown block type in a block flags byte.
    #[error("unknown block type: {value}")]
    UnknownBlockType {
        /// The two-bit type field value.
        value: u8,
    },

    /// A block header claims a size beyond the format limit.
    #[error("block size {size} exceeds limit {max}")]
    BlockTooLarge {
        /// Size the header claims.
        size: u32,
        /// Maximum the format allows.
        max: u32,
    },

    /// Invalid Huffman code encountered during decoding.
    #[error("invalid Huffman code at bit position {bit_position}")]
    InvalidHuffmanCode {
        /// Bit position where the invalid code was found.
        bit_position: u64,
    },

    /// Invalid distance in an LZ77 back-reference.
    #[error("back-reference distance {distance} exceeds produced output {available}")]
    InvalidDistance {
        /// The invalid distance value.
        distance: usize,
        /// Bytes produced so far in the current block.
        available: usize,
    },

    /// Cumulative decoded size disagrees with the stream header.
    #[error("size mismatch: header says {expected} bytes, decoded {actual}")]
    SizeMismatch {
        /// Size recorded in the stream header.
        expected: u64,
        /// Size actually decoded.
        actual: u64,
    },

    /// Corrupted data in the stream.
    #[error("corrupted data at offset {offset}: {message}")]
    Corrupted {
        /// Byte offset where corruption was detected.
        offset: u64,
        /// Description of the corruption.
        message: String,
    },
}

/// Coarse classification of an [`OdzError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Source/sink failure, or an abort requested through progress.
    Io,
    /// The data is not an odz stream this build understands.
    Format,
    /// The data claims to be an odz stream but violates its invariants.
    Corrupt,
}

/// Result type alias for odz operations.
pub type Result<T> = std::result::Result<T, OdzError>;

impl OdzError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) | Self::Aborted => ErrorKind::Io,
            Self::InvalidMagic { .. }
            | Self::UnsupportedVersion { .. }
            | Self::UnknownBlockType { .. } => ErrorKind::Format,
            Self::BlockTooLarge { .. }
            | Self::InvalidHuffmanCode { .. }
            | Self::InvalidDistance { .. }
            | Self::SizeMismatch { .. }
            | Self::Corrupted { .. } => ErrorKind::Corrupt,
        }
    }

    /// Create an invalid magic error.
    pub fn invalid_magic(found: [u8; 3]) -> Self {
        Self::InvalidMagic { found }
    }

    /// Create an unsupported version error.
    pub fn unsupported_version(found: u8, expected: u8) -> Self {
        Self::UnsupportedVersion { found, expected }
    }

    /// Create an invalid Huffman code error.
    pub fn invalid_huffman(bit_position: u64) -> Self {
        Self::InvalidHuffmanCode { bit_position }
    }

    /// Create an invalid distance error.
    pub fn invalid_distance(distance: usize, available: usize) -> Self {
        Self::InvalidDistance {
            distance,
            available,
        }
    }

    /// Create a size mismatch error.
    pub fn size_mismatch(expected: u64, actual: u64) -> Self {
        Self::SizeMismatch { expected, actual }
    }

    /// Create a corrupted data error.
    pub fn corrupted(offset: u64, message: impl Into<String>) -> Self {
        Self::Corrupted {
            offset,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OdzError::invalid_magic([0x1f, 0x8b, 0x08]);
        assert!(err.to_string().contains("invalid magic"));

        let err = OdzError::size_mismatch(100, 99);
        assert!(err.to_string().contains("100"));
        assert!(err.to_string().contains("99"));

        let err = OdzError::corrupted(42, "bad token");
        assert!(err.to_string().contains("offset 42"));
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(OdzError::Aborted.kind(), ErrorKind::Io);
        assert_eq!(
            OdzError::unsupported_version(3, 2).kind(),
            ErrorKind::Format
        );
        assert_eq!(
            OdzError::UnknownBlockType { value: 3 }.kind(),
            ErrorKind::Format
        );
        assert_eq!(OdzError::invalid_huffman(17).kind(), ErrorKind::Corrupt);
        assert_eq!(OdzError::invalid_distance(5, 2).kind(), ErrorKind::Corrupt);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::UnexpectedEof, "short read");
        let err: OdzError = io_err.into();
        assert!(matches!(err, OdzError::Io(_)));
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
