//! # odz Core
//!
//! Core building blocks for the odz compressor:
//!
//! - [`bitstream`]: LSB-first bit-level I/O for prefix codes and extra bits
//! - [`error`]: Error types shared across the workspace
//!
//! The codec itself lives in the `odz` crate; this crate holds the layers it
//! is built on.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bitstream;
pub mod error;

// Re-exports for convenience
pub use bitstream::{BitReader, BitWriter};
pub use error::{ErrorKind, OdzError, Result};
