//Enable more cargo lint tests
#![warn(rust_2018_idioms)]

use std::fs::{self, File};
use std::io::{self, Read};
use std::process::ExitCode;

use log::{error, info, warn};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use compress_rust::compression::LzwError;
use compress_rust::tools::cli::{zopts_init, Mode, Output, ZOpts};
use compress_rust::tools::suffix::{compressed_name, expanded_name};
use compress_rust::{compress, decompress, probe};

fn main() -> ExitCode {
    let opts = zopts_init();

    // Data may go to stdout, so all reporting goes to stderr.
    TermLogger::init(
        opts.level_filter,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )
    .unwrap();

    let result = if opts.files.is_empty() {
        process_stdin(&opts)
    } else {
        let mut ok = true;
        for file in &opts.files {
            if let Err(err) = process_file(&opts, file) {
                error!("{}: {}", file, err);
                ok = false;
            }
        }
        if ok {
            Ok(())
        } else {
            Err(Failure::Reported)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(Failure::Reported) => ExitCode::FAILURE,
        Err(Failure::Message(msg)) => {
            error!("{}", msg);
            ExitCode::FAILURE
        }
    }
}

enum Failure {
    /// Already logged per file.
    Reported,
    Message(String),
}

/// With no operands the utility is a pipe: stdin in, stdout out.
fn process_stdin(opts: &ZOpts) -> Result<(), Failure> {
    let stdin = io::stdin().lock();
    let mut stdout = io::stdout().lock();
    match opts.op_mode {
        Mode::Zip => {
            let ratio = compress(stdin, &mut stdout, opts.maxbits)
                .map_err(|err| Failure::Message(format!("stdin: {}", err)))?;
            info!("stdin: compression ratio {:.3}", ratio);
        }
        Mode::Unzip => {
            let mut stdin = stdin;
            let prefix = probe_stream(&mut stdin)
                .map_err(|err| Failure::Message(format!("stdin: {}", err)))?;
            // The probe consumed the header; hand it back to the codec.
            let ratio = decompress(stdin, &mut stdout, &prefix)
                .map_err(|err| Failure::Message(format!("stdin: {}", err)))?;
            info!("stdin: expansion ratio {:.3}", ratio);
        }
        Mode::Test => {
            let mut stdin = stdin;
            let prefix = probe_stream(&mut stdin)
                .map_err(|err| Failure::Message(format!("stdin: {}", err)))?;
            decompress(stdin, io::sink(), &prefix)
                .map_err(|err| Failure::Message(format!("stdin: {}", err)))?;
            info!("stdin: OK");
        }
    }
    Ok(())
}

fn process_file(opts: &ZOpts, name: &str) -> Result<(), String> {
    match opts.op_mode {
        Mode::Zip => compress_file(opts, name),
        Mode::Unzip => expand_file(opts, name),
        Mode::Test => test_file(name),
    }
}

fn compress_file(opts: &ZOpts, name: &str) -> Result<(), String> {
    let input = File::open(name).map_err(|err| format!("cannot open: {}", err))?;

    if opts.output == Output::Stdout {
        let mut stdout = io::stdout().lock();
        let ratio = compress(input, &mut stdout, opts.maxbits)
            .map_err(|err| err.to_string())?;
        info!("{}: compression ratio {:.3}", name, ratio);
        return Ok(());
    }

    let out_name = compressed_name(name);
    let output = create_output(&out_name, opts.force)?;
    let ratio = match compress(input, output, opts.maxbits) {
        Ok(ratio) => ratio,
        Err(err) => {
            // Whatever made it to disk is garbage now.
            let _ = fs::remove_file(&out_name);
            return Err(err.to_string());
        }
    };
    info!("{}: compression ratio {:.3}", name, ratio);

    // Classical behavior: a file that did not shrink is left alone unless
    // the user insists.
    if ratio <= 0.0 && !opts.force {
        let _ = fs::remove_file(&out_name);
        warn!("{}: no compression gain, file unchanged", name);
        return Ok(());
    }

    finish_file(opts, name)
}

fn expand_file(opts: &ZOpts, name: &str) -> Result<(), String> {
    let mut input = File::open(name).map_err(|err| format!("cannot open: {}", err))?;
    let prefix = probe_stream(&mut input).map_err(|err| err.to_string())?;

    if opts.output == Output::Stdout {
        let mut stdout = io::stdout().lock();
        let ratio = decompress(input, &mut stdout, &prefix)
            .map_err(|err| err.to_string())?;
        info!("{}: expansion ratio {:.3}", name, ratio);
        return Ok(());
    }

    let out_name = expanded_name(name).ok_or("unknown suffix, nothing to do")?;
    let output = create_output(&out_name, opts.force)?;
    let ratio = match decompress(input, output, &prefix) {
        Ok(ratio) => ratio,
        Err(err) => {
            let _ = fs::remove_file(&out_name);
            return Err(err.to_string());
        }
    };
    info!("{}: expansion ratio {:.3}", name, ratio);

    finish_file(opts, name)
}

fn test_file(name: &str) -> Result<(), String> {
    let mut input = File::open(name).map_err(|err| format!("cannot open: {}", err))?;
    let prefix = probe_stream(&mut input).map_err(|err| err.to_string())?;
    decompress(input, io::sink(), &prefix).map_err(|err| err.to_string())?;
    info!("{}: OK", name);
    Ok(())
}

/// Read the three byte header and confirm the .Z magic. The consumed bytes
/// are returned so they can be fed back to the codec as a prefix.
fn probe_stream(input: &mut impl Read) -> Result<Vec<u8>, LzwError> {
    let mut buffer = [0u8; 3];
    let mut have = 0;
    while have < buffer.len() {
        let amount = input
            .read(&mut buffer[have..])
            .map_err(LzwError::Read)?;
        if amount == 0 {
            return Err(LzwError::Format("file too short for a header"));
        }
        have += amount;
    }
    if !probe(&buffer) {
        return Err(LzwError::Format("not in compressed format"));
    }
    Ok(buffer.to_vec())
}

fn create_output(out_name: &str, force: bool) -> Result<File, String> {
    if !force && fs::metadata(out_name).is_ok() {
        return Err(format!("{} already exists; use --force", out_name));
    }
    File::create(out_name).map_err(|err| format!("cannot create {}: {}", out_name, err))
}

fn finish_file(opts: &ZOpts, name: &str) -> Result<(), String> {
    if !opts.keep {
        fs::remove_file(name).map_err(|err| format!("cannot remove: {}", err))?;
    }
    Ok(())
}
