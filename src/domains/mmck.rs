//! M/M/c/K steady-state engine.
//!
//! # Governing Equations
//!
//! ```text
//! r = λ/μ,  ρ = λ/(cμ)
//!
//! Unnormalized state weights (birth-death balance):
//!   w(n) = rⁿ/n!                 n < c
//!   w(n) = r^c/c! · ρ^(n−c)      n ≥ c
//!
//! K = ∞:  P0 = 1 / (Σ_{n<c} w(n) + w(c)/(1−ρ))
//!         Lq = P0 · w(c) · ρ / (1−ρ)²
//!         λ_eff = λ
//!
//! K < ∞:  P(n) = w(n) / Σ_{m=0..K} w(m)
//!         Lq = Σ_{n=c..K} (n−c)·P(n)
//!         λ_eff = λ(1 − P(K))
//!
//! L = Lq + λ_eff/μ,  W = L/λ_eff,  Wq = Lq/λ_eff
//! ```
//!
//! Weights are built incrementally (`w(n) = w(n−1)·r/n`) so no factorial is
//! ever formed explicitly.

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::AnalysisConfig;
use crate::error::{QueueError, QueueResult};
use crate::jidoka::JidokaGuard;

/// Derived steady-state metrics of a valid system.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MmMetrics {
    /// Utilization λ/(cμ).
    pub rho: f64,
    /// Probability of an empty system.
    pub p0: f64,
    /// Expected number in system.
    pub l: f64,
    /// Expected number in queue.
    pub lq: f64,
    /// Expected time in system.
    pub w: f64,
    /// Expected time in queue.
    pub wq: f64,
    /// Arrival rate after blocking.
    pub effective_arrival_rate: f64,
    /// P(K); zero for infinite capacity.
    pub blocking_probability: f64,
    /// P(0..=K) for finite capacity; empty otherwise.
    pub state_probabilities: Vec<f64>,
}

/// Result of an M/M/c/K analysis.
///
/// `metrics` is `None` exactly when `valid_system` is false.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MmCharacteristics {
    /// Service rate μ per server.
    pub service_rate: f64,
    /// Arrival rate λ.
    pub arrival_rate: f64,
    /// Number of servers c.
    pub servers: u32,
    /// System capacity K (`None` = infinite).
    pub capacity: Option<u32>,
    /// False for K < c, or for ρ ≥ 1 without a capacity limit.
    pub valid_system: bool,
    /// Derived metrics of a valid system.
    pub metrics: Option<MmMetrics>,
}

impl MmCharacteristics {
    /// Short Kendall notation, e.g. `M/M/3/7` or `M/M/1`.
    #[must_use]
    pub fn notation(&self) -> String {
        match self.capacity {
            Some(k) => format!("M/M/{}/{k}", self.servers),
            None => format!("M/M/{}", self.servers),
        }
    }
}

/// Analyze an M/M/c/K system with the default numeric policy.
///
/// # Example
///
/// ```rust
/// use queuecalc::domains::mm;
///
/// let result = mm(60.0, 50.0, 1, None).unwrap();
/// let metrics = result.metrics.unwrap();
/// assert!((metrics.l - 5.0).abs() < 1e-9);
/// ```
///
/// # Errors
///
/// See [`mm_with`].
pub fn mm(
    service_rate: f64,
    arrival_rate: f64,
    servers: u32,
    capacity: Option<u32>,
) -> QueueResult<MmCharacteristics> {
    mm_with(
        service_rate,
        arrival_rate,
        servers,
        capacity,
        &AnalysisConfig::default(),
    )
}

/// Analyze an M/M/c/K system.
///
/// # Errors
///
/// - `InvalidInput` if a rate is not a positive finite number or `servers` is zero
/// - a Jidoka violation if a metric is non-finite or the state distribution
///   does not sum to one (overflow for extreme `c` or `K`)
pub fn mm_with(
    service_rate: f64,
    arrival_rate: f64,
    servers: u32,
    capacity: Option<u32>,
    config: &AnalysisConfig,
) -> QueueResult<MmCharacteristics> {
    check_rate("μ", service_rate)?;
    check_rate("λ", arrival_rate)?;
    if servers == 0 {
        return Err(QueueError::invalid_input("c", "must be a positive integer"));
    }

    let c = f64::from(servers);
    let rho = arrival_rate / (c * service_rate);

    let invalid = match capacity {
        Some(k) => k < servers,
        None => rho >= 1.0,
    };

    let mut result = MmCharacteristics {
        service_rate,
        arrival_rate,
        servers,
        capacity,
        valid_system: !invalid,
        metrics: None,
    };

    if invalid {
        warn!(
            system = %result.notation(),
            rho,
            "M/M/c/K system is invalid; no steady state"
        );
        return Ok(result);
    }
    check_state_space(servers, capacity, config.mmck.max_states)?;

    let metrics = match capacity {
        None => infinite_capacity(service_rate, arrival_rate, servers, rho),
        Some(k) => finite_capacity(service_rate, arrival_rate, servers, k, rho),
    };
    verify(&metrics, &JidokaGuard::new(config.jidoka))?;

    debug!(
        system = %result.notation(),
        rho = metrics.rho,
        p0 = metrics.p0,
        l = metrics.l,
        lq = metrics.lq,
        "M/M/c/K solved"
    );
    result.metrics = Some(metrics);
    Ok(result)
}

fn check_rate(parameter: &str, rate: f64) -> QueueResult<()> {
    if rate.is_finite() && rate > 0.0 {
        Ok(())
    } else {
        Err(QueueError::invalid_input(parameter, "must be a positive number"))
    }
}

/// The weight vector holds `K + 1` entries, or `c + 1` when `K` is infinite.
fn check_state_space(servers: u32, capacity: Option<u32>, max_states: u32) -> QueueResult<()> {
    let (parameter, states) = match capacity {
        Some(k) => ("K", k),
        None => ("c", servers),
    };
    if states > max_states {
        return Err(QueueError::invalid_input(
            parameter,
            format!("must not exceed {max_states} (state-space limit)"),
        ));
    }
    Ok(())
}

/// `w(n)` for `n = 0..=last` (see module docs).
fn state_weights(r: f64, rho: f64, servers: u32, last: u32) -> Vec<f64> {
    let mut weights = Vec::with_capacity(last as usize + 1);
    let mut weight = 1.0;
    weights.push(weight);
    for n in 1..=last {
        if n <= servers {
            weight *= r / f64::from(n);
        } else {
            weight *= rho;
        }
        weights.push(weight);
    }
    weights
}

fn infinite_capacity(service_rate: f64, arrival_rate: f64, servers: u32, rho: f64) -> MmMetrics {
    let r = arrival_rate / service_rate;
    let weights = state_weights(r, rho, servers, servers);
    let below_c: f64 = weights[..servers as usize].iter().sum();
    let at_c = weights[servers as usize];

    let p0 = 1.0 / (below_c + at_c / (1.0 - rho));
    let lq = p0 * at_c * rho / ((1.0 - rho) * (1.0 - rho));

    assemble(service_rate, arrival_rate, rho, p0, lq, 0.0, Vec::new())
}

fn finite_capacity(
    service_rate: f64,
    arrival_rate: f64,
    servers: u32,
    capacity: u32,
    rho: f64,
) -> MmMetrics {
    let r = arrival_rate / service_rate;
    let weights = state_weights(r, rho, servers, capacity);
    let total: f64 = weights.iter().sum();
    let probabilities: Vec<f64> = weights.iter().map(|w| w / total).collect();

    let lq = probabilities
        .iter()
        .enumerate()
        .skip(servers as usize)
        .map(|(n, p)| (n - servers as usize) as f64 * p)
        .sum();
    let blocking = probabilities[capacity as usize];

    assemble(
        service_rate,
        arrival_rate * (1.0 - blocking),
        rho,
        probabilities[0],
        lq,
        blocking,
        probabilities,
    )
}

fn assemble(
    service_rate: f64,
    effective_arrival_rate: f64,
    rho: f64,
    p0: f64,
    lq: f64,
    blocking_probability: f64,
    state_probabilities: Vec<f64>,
) -> MmMetrics {
    let l = lq + effective_arrival_rate / service_rate;
    MmMetrics {
        rho,
        p0,
        l,
        lq,
        w: l / effective_arrival_rate,
        wq: lq / effective_arrival_rate,
        effective_arrival_rate,
        blocking_probability,
        state_probabilities,
    }
}

fn verify(metrics: &MmMetrics, guard: &JidokaGuard) -> QueueResult<()> {
    guard.check_value("mmck.rho", metrics.rho)?;
    guard.check_probability("mmck.p0", metrics.p0)?;
    guard.check_value("mmck.l", metrics.l)?;
    guard.check_value("mmck.lq", metrics.lq)?;
    guard.check_value("mmck.w", metrics.w)?;
    guard.check_value("mmck.wq", metrics.wq)?;
    guard.check_value("mmck.effective_arrival_rate", metrics.effective_arrival_rate)?;
    if !metrics.state_probabilities.is_empty() {
        guard.check_distribution("mmck.P", &metrics.state_probabilities)?;
    }
    guard.check_littles_law("system", metrics.l, metrics.effective_arrival_rate, metrics.w)?;
    guard.check_littles_law("queue", metrics.lq, metrics.effective_arrival_rate, metrics.wq)
}
