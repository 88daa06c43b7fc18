//! The tools module provides the plumbing around the codec for the Rust
//! version of the standard compress utility.
//!
//! The tools are:
//! - cli: command line interface, parsed into the options struct.
//! - suffix: derive output file names from the .Z and .taz suffixes.
pub mod cli;
pub mod suffix;
