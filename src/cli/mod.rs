//! CLI module for queuecalc.
//!
//! All CLI logic lives here rather than in main.rs so it can be tested.
//! The entry point [`run_cli`] is called from main.rs with parsed arguments.

mod args;
mod commands;
mod output;

pub use args::{Args, Command};
pub use commands::{
    analyze_file, analyze_scenario, parse_count, run_cli, Analysis, ScenarioReport,
};
pub use output::{
    print_help, print_version, render_dd1k, render_fraction, render_mm, render_timeline,
    render_version,
};
