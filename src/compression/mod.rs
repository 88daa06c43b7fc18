//! The compression module holds the LZW codec for the Rust version of the
//! standard compress utility.
//!
//! Compression builds a dictionary of byte sequences as it reads the input
//! and writes variable-width codes for the longest known sequences:
//! - header: the three byte .Z file header.
//! - hash_dict: the compressor's dictionary, an open-addressed hash table.
//! - compress: the compressor main loop with the adaptive clear heuristic.
//! - decompress: the decompressor, which rebuilds the same dictionary from
//!   the code sequence alone.
//!
//! Decompression is the exact inverse, with one classical corner case: a
//! code may refer to the entry the compressor created on the very step that
//! emitted it. The decompressor reconstructs that entry from the previous
//! code and its own first byte.

pub mod compress;
pub mod decompress;
pub mod hash_dict;
pub mod header;

use std::io;
use thiserror::Error;

/// The code that clears the dictionary when block compression is on.
pub(crate) const CLEAR_CODE: u16 = 256;
/// First dictionary slot above the literals and the clear code.
pub(crate) const DICT_OFFSET: u16 = 257;

/// Everything that can go wrong inside the codec. Transport faults keep the
/// underlying error; malformed input carries a description of the defect.
/// Errors are surfaced to the caller, never retried, and after any of them
/// the state of the output stream is undefined.
#[derive(Debug, Error)]
pub enum LzwError {
    #[error("read error: {0}")]
    Read(#[source] io::Error),
    #[error("write error: {0}")]
    Write(#[source] io::Error),
    #[error("format error: {0}")]
    Format(&'static str),
}
