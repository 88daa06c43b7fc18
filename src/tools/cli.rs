use std::fmt::{Display, Formatter};

use clap::Parser;
use log::LevelFilter;

/// Compress, expand, or just verify
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Zip,
    Unzip,
    Test,
}

impl Display for Mode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Define the two output channels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    File,
    Stdout,
}

/// Command line arguments - uses the external CLAP crate.
#[derive(Parser, Debug)]
#[command(
    name = "compress",
    version,
    about = "A compress/uncompress clone producing classical .Z files",
    long_about = None)]
pub struct Args {
    /// Files to process; standard input when none are given
    files: Vec<String>,

    /// Maximum code width in bits
    #[arg(short = 'b', long = "bits", default_value_t = 16,
          value_parser = clap::value_parser!(u8).range(9..=16))]
    bits: u8,

    /// Write to standard output, keep input files
    #[arg(short = 'c', long = "stdout")]
    stdout: bool,

    /// Decompress instead of compress
    #[arg(short = 'd', long = "decompress", visible_alias = "uncompress")]
    decompress: bool,

    /// Overwrite existing output files, keep output that did not shrink
    #[arg(short = 'f', long = "force")]
    force: bool,

    /// Keep (don't delete) input files
    #[arg(short = 'k', long = "keep")]
    keep: bool,

    /// Suppress noncritical messages
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,

    /// Check compressed file integrity
    #[arg(short = 't', long = "test")]
    test: bool,

    /// Be verbose; repeat for more detail
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

/// All settings the front-end acts on, assembled from the parsed arguments.
#[derive(Debug)]
pub struct ZOpts {
    /// Names of files to process, in command line order
    pub files: Vec<String>,
    /// Maximum code width handed to the compressor
    pub maxbits: u8,
    /// Compress/Decompress/Test
    pub op_mode: Mode,
    /// Location where output is sent
    pub output: Output,
    /// Silently overwrite existing files, keep unshrunk output
    pub force: bool,
    /// Don't remove input files after processing
    pub keep: bool,
    /// Log level matching the -v and -q flags
    pub level_filter: LevelFilter,
}

/// Parse the command line into a ZOpts. Exits with a usage message on
/// invalid arguments, courtesy of clap.
pub fn zopts_init() -> ZOpts {
    from_args(Args::parse())
}

fn from_args(args: Args) -> ZOpts {
    let op_mode = if args.test {
        Mode::Test
    } else if args.decompress {
        Mode::Unzip
    } else {
        Mode::Zip
    };

    let level_filter = if args.quiet {
        LevelFilter::Error
    } else {
        match args.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    ZOpts {
        files: args.files,
        maxbits: args.bits,
        op_mode,
        output: if args.stdout {
            Output::Stdout
        } else {
            Output::File
        },
        // Writing to stdout never touches the input files.
        keep: args.keep || args.stdout,
        force: args.force,
        level_filter,
    }
}
