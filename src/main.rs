//! queuecalc CLI - closed-form queueing characteristics
//!
//! Command-line interface for M/M/c/K and D/D/1/K analysis.

use std::process::ExitCode;

use queuecalc::cli::{run_cli, Args};
use tracing::Level;

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    run_cli(args)
}
