//! CLI command handlers.
//!
//! Each handler returns `QueueResult<()>`; [`run_cli`] turns an error into a
//! message on stderr and exit code 1.

use serde::Serialize;
use std::path::Path;
use std::process::ExitCode;
use tracing::{error, info};

use super::output::{
    print_dd1k, print_fraction, print_help, print_json, print_mm, print_scenario_header,
    print_version,
};
use super::{Args, Command};
use crate::config::{AnalysisConfig, Scenario, ScenarioFile, ScenarioModel};
use crate::domains::{
    build_dd1k_with, mm_with, parse_rate, to_proper_fraction, Dd1kCharacteristics,
    MmCharacteristics,
};
use crate::error::{QueueError, QueueResult};

/// Main CLI entry point.
///
/// Dispatches to the appropriate command handler based on parsed arguments.
#[must_use]
pub fn run_cli(args: Args) -> ExitCode {
    let json = args.json;
    let outcome = match args.command {
        Command::Mm {
            service_rate,
            arrival_rate,
            servers,
            capacity,
        } => run_mm(
            &service_rate,
            &arrival_rate,
            &servers,
            capacity.as_deref(),
            json,
        ),
        Command::Dd1k {
            arrival_rate,
            service_rate,
            capacity,
            initial_customers,
            timeline,
        } => run_dd1k(
            &arrival_rate,
            &service_rate,
            &capacity,
            initial_customers.as_deref(),
            timeline,
            json,
        ),
        Command::Fraction { decimal } => run_fraction(&decimal, json),
        Command::Run { scenario_path } => run_scenarios(&scenario_path, json),
        Command::Help => {
            print_help();
            Ok(())
        }
        Command::Version => {
            print_version();
            Ok(())
        }
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

/// Parse a strictly positive integer argument.
///
/// # Errors
///
/// Returns an invalid-input error naming `parameter`.
pub fn parse_count(parameter: &str, text: &str) -> QueueResult<u64> {
    match text.trim().parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(QueueError::invalid_input(parameter, "must be a positive integer")),
    }
}

fn parse_small_count(parameter: &str, text: &str) -> QueueResult<u32> {
    u32::try_from(parse_count(parameter, text)?)
        .map_err(|_| QueueError::invalid_input(parameter, "is too large"))
}

/// Run the 'mm' command.
///
/// # Errors
///
/// Returns an error for malformed inputs or a failed analysis.
pub fn run_mm(
    service_rate: &str,
    arrival_rate: &str,
    servers: &str,
    capacity: Option<&str>,
    json: bool,
) -> QueueResult<()> {
    let result = mm_with(
        parse_rate("μ", service_rate)?,
        parse_rate("λ", arrival_rate)?,
        parse_small_count("c", servers)?,
        capacity.map(|k| parse_small_count("K", k)).transpose()?,
        &AnalysisConfig::default(),
    )?;

    if json {
        print_json(&result)
    } else {
        print_mm(&result);
        Ok(())
    }
}

/// Run the 'dd1k' command.
///
/// # Errors
///
/// Returns an error for malformed inputs or a failed analysis.
pub fn run_dd1k(
    arrival_rate: &str,
    service_rate: &str,
    capacity: &str,
    initial_customers: Option<&str>,
    timeline: bool,
    json: bool,
) -> QueueResult<()> {
    let queue = build_dd1k_with(
        parse_rate("λ", arrival_rate)?,
        parse_rate("μ", service_rate)?,
        parse_count("K", capacity)?,
        initial_customers.map(|m| parse_count("M", m)).transpose()?,
        &AnalysisConfig::default(),
    )?;

    if json {
        print_json(&queue)
    } else {
        print_dd1k(&queue, timeline);
        Ok(())
    }
}

/// Run the 'fraction' command.
///
/// # Errors
///
/// Returns an error if the decimal is malformed or the expansion fails.
pub fn run_fraction(decimal: &str, json: bool) -> QueueResult<()> {
    let value = parse_rate("decimal", decimal)?;
    let fraction = to_proper_fraction(value)?;
    if json {
        print_json(&fraction)
    } else {
        print_fraction(value, &fraction);
        Ok(())
    }
}

/// Result of one scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "model", rename_all = "lowercase")]
pub enum Analysis {
    /// M/M/c/K result.
    Mmck(MmCharacteristics),
    /// D/D/1/K result.
    Dd1k(Dd1kCharacteristics),
}

/// Named outcome of one scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioReport {
    /// Scenario name (or its position when unnamed).
    pub name: String,
    /// The analysis, when it succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Analysis>,
    /// The error message, when it failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Analyze one scenario under a shared numeric policy.
///
/// # Errors
///
/// Returns the analysis error of the scenario.
pub fn analyze_scenario(scenario: &Scenario, config: &AnalysisConfig) -> QueueResult<Analysis> {
    match &scenario.model {
        ScenarioModel::Mmck {
            service_rate,
            arrival_rate,
            servers,
            capacity,
        } => mm_with(
            service_rate.value("μ")?,
            arrival_rate.value("λ")?,
            *servers,
            *capacity,
            config,
        )
        .map(Analysis::Mmck),
        ScenarioModel::Dd1k {
            arrival_rate,
            service_rate,
            capacity,
            initial_customers,
        } => build_dd1k_with(
            arrival_rate.value("λ")?,
            service_rate.value("μ")?,
            *capacity,
            *initial_customers,
            config,
        )
        .map(Analysis::Dd1k),
    }
}

/// Analyze every scenario of a file, in order.
#[must_use]
pub fn analyze_file(file: &ScenarioFile) -> Vec<ScenarioReport> {
    file.scenarios
        .iter()
        .enumerate()
        .map(|(index, scenario)| {
            let name = if scenario.name.is_empty() {
                format!("scenario {}", index + 1)
            } else {
                scenario.name.clone()
            };
            match analyze_scenario(scenario, &file.config) {
                Ok(analysis) => ScenarioReport {
                    name,
                    result: Some(analysis),
                    error: None,
                },
                Err(e) => {
                    error!(scenario = %name, error = %e, "scenario failed");
                    ScenarioReport {
                        name,
                        result: None,
                        error: Some(e.to_string()),
                    }
                }
            }
        })
        .collect()
}

/// Run the 'run' command.
///
/// # Errors
///
/// Returns an error if the file cannot be loaded or any scenario fails.
pub fn run_scenarios(path: &Path, json: bool) -> QueueResult<()> {
    let file = ScenarioFile::load(path)?;
    info!(
        path = %path.display(),
        scenarios = file.scenarios.len(),
        "running scenario file"
    );

    let reports = analyze_file(&file);
    if json {
        print_json(&reports)?;
    } else {
        for report in &reports {
            print_scenario_header(&report.name);
            match (&report.result, &report.error) {
                (Some(Analysis::Mmck(result)), _) => print_mm(result),
                (Some(Analysis::Dd1k(queue)), _) => print_dd1k(queue, false),
                (None, Some(message)) => println!("✗ {message}"),
                (None, None) => {}
            }
        }
    }

    let failed = reports.iter().filter(|r| r.error.is_some()).count();
    if failed == 0 {
        Ok(())
    } else {
        Err(QueueError::config(format!(
            "{failed} of {} scenarios failed",
            reports.len()
        )))
    }
}
