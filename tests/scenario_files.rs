//! Scenario files end to end: YAML on disk through both engines.

use std::path::PathBuf;

use queuecalc::cli::{analyze_file, Analysis};
use queuecalc::prelude::*;

fn textbook() -> ScenarioFile {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios/textbook.yaml");
    ScenarioFile::load(path).unwrap()
}

#[test]
fn test_textbook_scenarios_all_succeed() {
    let file = textbook();
    let reports = analyze_file(&file);
    assert_eq!(reports.len(), 6);
    for report in &reports {
        assert!(report.error.is_none(), "{}: {:?}", report.name, report.error);
    }
}

#[test]
fn test_textbook_ratio_rates() {
    let reports = analyze_file(&textbook());
    let clinic = reports.iter().find(|r| r.name == "slow clinic").unwrap();
    match &clinic.result {
        Some(Analysis::Mmck(result)) => {
            assert_eq!(result.notation(), "M/M/3/7");
            let lq = result.metrics.as_ref().unwrap().lq;
            assert!((lq - 504.0 / 163.0).abs() < 1e-6);
        }
        other => panic!("expected an M/M/c/K result, got {other:?}"),
    }
}

#[test]
fn test_textbook_dd1k_regimes() {
    let reports = analyze_file(&textbook());
    let regimes: Vec<Regime> = reports
        .iter()
        .filter_map(|r| match &r.result {
            Some(Analysis::Dd1k(queue)) => Some(queue.regime()),
            _ => None,
        })
        .collect();
    assert_eq!(regimes, vec![Regime::Draining, Regime::Oscillating]);
}

#[test]
fn test_config_block_changes_horizon() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("long.yaml");
    std::fs::write(
        &path,
        "config:\n  dd1k:\n    horizon_floor: 40\nscenarios:\n  - model: dd1k\n    arrival_rate: 1\n    service_rate: 2\n    capacity: 10\n    initial_customers: 5\n",
    )
    .unwrap();

    let file = ScenarioFile::load(&path).unwrap();
    let reports = analyze_file(&file);
    match &reports[0].result {
        Some(Analysis::Dd1k(queue)) => {
            assert_eq!(queue.base().graph_horizon, 40);
            assert_eq!(queue.base().timeline.last().map(|r| r.arrivals), Some(40));
        }
        other => panic!("expected a D/D/1/K result, got {other:?}"),
    }
}

#[test]
fn test_standalone_analysis_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("strict.yaml");
    std::fs::write(&path, "fraction:\n  max_iterations: 1\n").unwrap();

    let config = AnalysisConfig::load(&path).unwrap();
    assert!(mm_with(1.0, 0.5, 1, None, &config).is_ok());
    let err = build_dd1k_with(0.123_456_7, 1.0, 5, Some(2), &config).unwrap_err();
    assert!(matches!(err, QueueError::NoConvergence { .. }));
}
