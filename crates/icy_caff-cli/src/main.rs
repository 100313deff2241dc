//! caff - Inspect CAFF animations
//!
//! A command-line tool that prints the metadata of a CAFF file and optionally
//! exports an animated GIF preview.

mod preview;

use clap::{ArgAction, Parser};
use icy_caff::CaffAnimation;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

const USAGE: &str = "Usage: caff <input.caff> [output.gif]";

#[derive(Parser)]
#[command(name = "caff")]
#[command(author = "Mike Krüger <mkrueger@posteo.de>")]
#[command(version)]
#[command(about = "Inspect CAFF animations and export GIF previews", long_about = None)]
struct Cli {
    /// Input CAFF file
    input: PathBuf,

    /// Write an animated GIF preview to this file
    output: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            // --help and --version are not failures
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    if let Err(err) = init_tracing(cli.verbose) {
        eprintln!("{err}");
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("An error has occurred: {err}");
            eprintln!("{USAGE}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) -> Result<(), String> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|err| format!("failed to create log filter: {err}"))?;

    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|err| format!("tracing init error: {err}"))
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    info!("Parsing CAFF file '{}'", cli.input.display());
    let animation = CaffAnimation::open(&cli.input)
        .map_err(|e| format!("Failed to parse '{}': {}", cli.input.display(), e))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_report(&mut out, &animation)?;

    if let Some(output) = &cli.output {
        writeln!(out, "Creating gif preview...")?;
        preview::write_preview(&animation, output)
            .map_err(|e| format!("Failed to write '{}': {}", output.display(), e))?;
        writeln!(out, "Output written to file '{}'.", output.display())?;
    }

    Ok(())
}

fn write_report<W: Write>(out: &mut W, animation: &CaffAnimation) -> io::Result<()> {
    writeln!(out, "Author: {}", animation.creator())?;
    match animation.created_at() {
        Some(created_at) => writeln!(
            out,
            "Date of creation: {}",
            created_at.format("%a %b %e %H:%M:%S %Y")
        )?,
        None => writeln!(out, "Date of creation: unknown")?,
    }
    writeln!(
        out,
        "Resolution: {}x{}",
        animation.width(),
        animation.height()
    )?;

    writeln!(out, "Caption:")?;
    for (idx, caption) in animation.captions().iter().enumerate() {
        writeln!(out, "  Frame {idx}: {caption}")?;
    }

    writeln!(out, "Tags:")?;
    for (idx, tags) in animation.tags().iter().enumerate() {
        writeln!(out, "  Frame {idx}:")?;
        for (tag_idx, tag) in tags.iter().enumerate() {
            writeln!(out, "    Tag {tag_idx}: {tag}")?;
        }
    }

    // a decoded animation has passed every validation
    writeln!(out, "Valid: true")
}
