//! The bitstream module forms the I/O subsystem for the Rust version of the
//! standard compress utility.
//!
//! The .Z format packs variable-width codes least significant bit first. The
//! only subtlety is the group padding rule: whenever the code width changes,
//! the stream is padded with zero bytes so that the number of bytes written
//! at the old width is a multiple of that width. The padding carries no
//! data; it exists only for compatibility with historical implementations.
//!
//! Both halves of the subsystem keep the byte counts this rule depends on:
//! - bitwriter: packs codes and emits the padding at each width change.
//! - bitreader: unpacks codes and skips the same padding.
pub mod bitreader;
pub mod bitwriter;
