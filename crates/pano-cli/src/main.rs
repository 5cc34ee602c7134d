//! pano: normalize images into viewer-ready panoramas from the command
//! line.
//!
//! - `normalize`: stretch one image onto its canonical canvas, print the
//!   geometry and view limits, and per-stage diagnostics
//! - `compress`: apply the pre-upload size bound
//! - `thumbnail`: render the 100×50 scene thumbnail
//! - `tour`: normalize several images and write a saved tour JSON
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin pano -- normalize [OPTIONS] <IMAGE_PATH>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod args;
mod commands;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Normalize arbitrary images into equirectangular panoramas.
#[derive(Parser)]
#[command(name = "pano", version)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG`
    /// takes precedence when set.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Normalize one image and report geometry and diagnostics
    Normalize(commands::normalize::NormalizeArgs),
    /// Shrink an image to the pre-upload bounds
    Compress(commands::compress::CompressArgs),
    /// Render a scene thumbnail
    Thumbnail(commands::thumbnail::ThumbnailArgs),
    /// Build a saved tour from several images
    Tour(commands::tour::TourArgs),
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let outcome = match &cli.command {
        Command::Normalize(args) => commands::normalize::run(args),
        Command::Compress(args) => commands::compress::run(args),
        Command::Thumbnail(args) => commands::thumbnail::run(args),
        Command::Tour(args) => commands::tour::run(args),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
