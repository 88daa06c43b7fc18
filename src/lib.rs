//! Rust version of the standard compress utility.
//!
//! - Produces and consumes the classical `.Z` file format created by the
//!   1984 compress implementation, byte for byte, including its historical
//!   quirks: the group padding at code width changes, the adaptive
//!   dictionary clear, and the 10 bit codes emitted when the maximum width
//!   is 9.
//! - Single-threaded and synchronous; one call compresses or expands one
//!   stream.
//!
//! Basic usage to compress a file:
//!
//! ```text
//! $> compress test.txt
//! ```
//! This compresses the file and creates test.txt.Z.
//!
//! Basic usage to decompress a file:
//!
//! ```text
//! $> compress -d test.txt.Z
//! ```
//!
//! Help is available by entering:
//!
//! ```text
//! $> compress --help
//! ```
pub mod bitstream;
pub mod compression;
pub mod tools;

pub use compression::compress::compress;
pub use compression::decompress::decompress;
pub use compression::header::probe;
pub use compression::LzwError;
