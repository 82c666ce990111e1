//! CLI output formatting.
//!
//! Every report is rendered to a `String` first so tests can inspect it;
//! the `print_*` wrappers write it to stdout.

use serde::Serialize;
use std::fmt::Write as _;

use crate::domains::{
    to_proper_fraction, CustomerWait, Dd1kCharacteristics, DeterministicQueue, Fraction,
    MmCharacteristics, TimelineRecord, WaitingTime,
};
use crate::error::QueueResult;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Print version information.
pub fn print_version() {
    println!("{}", render_version());
}

/// Version line with the embedded git hash when available.
#[must_use]
pub fn render_version() -> String {
    let version = option_env!("QUEUECALC_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
    match option_env!("GIT_HASH").filter(|hash| !hash.is_empty()) {
        Some(hash) => format!("queuecalc {version} ({})", hash.get(..12).unwrap_or(hash)),
        None => format!("queuecalc {version}"),
    }
}

/// Print help message.
pub fn print_help() {
    println!(
        r#"queuecalc - Closed-form characteristics of M/M/c/K and D/D/1/K queues

USAGE:
    queuecalc [--json] [-v] <COMMAND> [OPTIONS]

COMMANDS:
    mm <μ> <λ> <c>              M/M/c/K steady state
        --capacity <K>          System capacity (default: infinite)

    dd1k <λ> <μ> <K>            D/D/1/K deterministic queue
        --initial <M>           Initial customers (required when λ < μ)
        --timeline              Print the event trace

    fraction <decimal>          Best rational approximation

    run <scenarios.yaml>        Run every scenario in a file

    help                        Show this help message
    version                     Show version information

GLOBAL OPTIONS:
    --json                      Emit JSON instead of text
    -v, --verbose               Debug logging on stderr

Rates accept decimals or ratios: 2.4, 1/6.

EXAMPLES:
    queuecalc mm 60 50 1
    queuecalc mm 1/6 1 3 --capacity 7
    queuecalc dd1k 1 2 10 --initial 5
    queuecalc dd1k 3 2 3 --timeline
    queuecalc fraction 0.8333333
"#
    );
}

/// Print any result as pretty JSON.
///
/// # Errors
///
/// Returns a serialization error if the value cannot be encoded.
pub fn print_json<T: Serialize>(value: &T) -> QueueResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// `0.833333 (5/6)`; the fraction is shown only when it is short.
fn format_value(value: f64) -> String {
    match to_proper_fraction(value) {
        Ok(fraction) if !fraction.is_integer() && fraction.denominator() <= 10_000 => {
            format!("{value:.6} ({fraction})")
        }
        _ => format!("{value:.6}"),
    }
}

fn format_wait(waiting_time: &WaitingTime) -> String {
    match waiting_time {
        WaitingTime::Exact { value } => format_value(*value),
        WaitingTime::Oscillating { upper, lower } => {
            format!("{} / {} (oscillating)", format_value(*upper), format_value(*lower))
        }
    }
}

/// Print an M/M/c/K report.
pub fn print_mm(result: &MmCharacteristics) {
    println!("{}", render_mm(result));
}

/// Render an M/M/c/K report.
#[must_use]
pub fn render_mm(result: &MmCharacteristics) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}  (μ = {}, λ = {})",
        result.notation(),
        result.service_rate,
        result.arrival_rate
    );
    let _ = writeln!(out, "{RULE}");

    let Some(metrics) = &result.metrics else {
        let reason = match result.capacity {
            Some(k) if k < result.servers => "capacity K is below the number of servers c",
            _ => "ρ ≥ 1 with infinite capacity; the queue grows without bound",
        };
        let _ = writeln!(out, "✗ Invalid system: {reason}");
        return out;
    };

    let rows = [
        ("ρ", metrics.rho),
        ("P0", metrics.p0),
        ("L", metrics.l),
        ("Lq", metrics.lq),
        ("W", metrics.w),
        ("Wq", metrics.wq),
    ];
    for (label, value) in rows {
        let _ = writeln!(out, "  {label:<6} = {}", format_value(value));
    }
    if result.capacity.is_some() {
        let _ = writeln!(out, "  {:<6} = {}", "λ_eff", format_value(metrics.effective_arrival_rate));
        let _ = writeln!(out, "  {:<6} = {}", "P(K)", format_value(metrics.blocking_probability));
    }
    out
}

/// Print a D/D/1/K report.
pub fn print_dd1k(queue: &Dd1kCharacteristics, timeline: bool) {
    println!("{}", render_dd1k(queue, timeline));
}

/// Render a D/D/1/K report, optionally with the event trace.
#[must_use]
pub fn render_dd1k(queue: &Dd1kCharacteristics, timeline: bool) -> String {
    let base = queue.base();
    let mut out = String::new();
    let _ = writeln!(out, "D/D/1/{}  {}  [{}]", base.capacity, base.description, base.regime);
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(
        out,
        "  t_i    = {} ({:.6})",
        base.transient_time,
        base.transient_time.to_f64()
    );
    let _ = writeln!(out, "  λ·t_i  = {:.6}  ⌊λ·t_i⌋ = {}", base.lambda_ti, base.lambda_ti_floored);
    let _ = writeln!(out, "  μ·t_i  = {:.6}  ⌊μ·t_i⌋ = {}", base.mu_ti, base.mu_ti_floored);

    match queue {
        Dd1kCharacteristics::Draining(draining) => {
            let _ = writeln!(out, "  M      = {}", draining.initial_customers);
            let _ = writeln!(
                out,
                "  Wq(initial cohort, average) = {}",
                format_value(draining.average_initial_wait)
            );
            let _ = writeln!(
                out,
                "  last initial departure      = {}",
                format_fraction_time(draining.last_initial_departure)
            );
        }
        Dd1kCharacteristics::Oscillating(balking) | Dd1kCharacteristics::Settled(balking) => {
            let _ = writeln!(out, "  n(t ≥ t_i) ≤ {}", balking.max_in_system());
            let _ = writeln!(out, "  1/μ − 1/λ  = {}", format_value(balking.waiting_time_step));
        }
    }

    let _ = writeln!(out, "\nWaiting time per customer:");
    for CustomerWait {
        customer,
        waiting_time,
    } in &base.customer_graph
    {
        let _ = writeln!(out, "  Wq({customer}) = {}", format_wait(waiting_time));
    }

    if timeline {
        let _ = writeln!(out, "\nEvent trace (horizon {}):", base.graph_horizon);
        out.push_str(&render_timeline(&base.timeline));
    }
    out
}

fn format_fraction_time(t: Fraction) -> String {
    if t.is_integer() {
        t.to_string()
    } else {
        format!("{t} ({:.6})", t.to_f64())
    }
}

/// Render the event trace as a fixed-width table.
#[must_use]
pub fn render_timeline(records: &[TimelineRecord]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "  {:>10}  {:<9}  {:>8}  {:>7}  {:>10}  {:>6}  {:>3}",
        "time", "event", "arrivals", "blocks", "departures", "served", "n"
    );
    for record in records {
        let event = match (record.departed, record.blocked) {
            (true, _) => "depart",
            (false, Some(true)) => "balk",
            (false, Some(false)) => "arrive",
            (false, None) => "start",
        };
        let _ = writeln!(
            out,
            "  {:>10.4}  {:<9}  {:>8}  {:>7}  {:>10}  {:>6}  {:>3}",
            record.time,
            event,
            record.arrivals,
            record.blocks,
            record.departures,
            record.service_entrances,
            record.number_of_customers
        );
    }
    out
}

/// Print a fraction report.
pub fn print_fraction(decimal: f64, fraction: &Fraction) {
    println!("{}", render_fraction(decimal, fraction));
}

/// Render a fraction report.
#[must_use]
pub fn render_fraction(decimal: f64, fraction: &Fraction) -> String {
    format!(
        "{decimal} ≈ {fraction}\n  LaTeX: {}\n  error: {:.3e}",
        fraction.to_latex(),
        (decimal - fraction.to_f64()).abs()
    )
}

/// Print a scenario heading.
pub fn print_scenario_header(name: &str) {
    println!("\n{name}");
}
