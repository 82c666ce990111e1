//! D/D/1/K deterministic queue engine.
//!
//! # Regimes
//!
//! ```text
//! λ < μ              Draining     M initial customers drain to empty
//! λ > μ, λ/μ ∉ ℕ     Oscillating  n(t) alternates K−1 / K−2 after t_i
//! λ > μ, λ/μ ∈ ℕ     Settled      n(t) = K−1 after t_i
//! λ = μ              rejected
//! ```
//!
//! Rates are reduced to exact fractions `λ = a/b`, `μ = c/d` and every floor
//! (`⌊λt⌋`, `⌊μt⌋`, `⌊μt − μ/λ⌋`) is taken with integer division, so event
//! instants never suffer from floating-point rounding.

mod balking;
mod draining;
mod timeline;

pub use balking::BalkingQueue;
pub use draining::DrainingQueue;
pub use timeline::TimelineRecord;

use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

use crate::config::{AnalysisConfig, Dd1kConfig};
use crate::domains::fraction::{to_proper_fraction_with, Fraction};
use crate::error::{QueueError, QueueResult};

use timeline::ReplayPlan;

/// Qualitative long-run behaviour of a D/D/1/K queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Regime {
    /// λ < μ: an initial cohort drains and the queue empties.
    Draining,
    /// λ > μ with a non-integral ratio.
    Oscillating,
    /// λ > μ with λ an integer multiple of μ.
    Settled,
}

impl Regime {
    /// Classify from exact rates.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedRegime` for λ = μ.
    pub fn classify(lambda: Fraction, mu: Fraction) -> QueueResult<Self> {
        let rates = Rates::new(lambda, mu);
        let lambda_scaled = rates.a * rates.d;
        let mu_scaled = rates.c * rates.b;
        if lambda_scaled == mu_scaled {
            return Err(QueueError::UnsupportedRegime {
                description: format!("λ = μ = {lambda}; arrivals and departures never separate"),
            });
        }
        if lambda_scaled < mu_scaled {
            Ok(Self::Draining)
        } else if lambda_scaled % mu_scaled == 0 {
            Ok(Self::Settled)
        } else {
            Ok(Self::Oscillating)
        }
    }

    /// Human-readable description, e.g. `λ = 3/2 > μ = 1, λ mod μ ≠ 0`.
    #[must_use]
    pub fn describe(self, lambda: Fraction, mu: Fraction) -> String {
        match self {
            Self::Draining => format!("λ = {lambda} < μ = {mu}"),
            Self::Oscillating => format!("λ = {lambda} > μ = {mu}, λ mod μ ≠ 0"),
            Self::Settled => format!("λ = {lambda} > μ = {mu}, λ mod μ = 0"),
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draining => write!(f, "draining"),
            Self::Oscillating => write!(f, "oscillating"),
            Self::Settled => write!(f, "settled"),
        }
    }
}

/// Waiting time in queue of one customer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WaitingTime {
    /// A single value.
    Exact {
        /// Time in queue.
        value: f64,
    },
    /// Alternates between two values once the oscillating regime is reached.
    Oscillating {
        /// Larger of the two.
        upper: f64,
        /// Smaller of the two.
        lower: f64,
    },
}

impl WaitingTime {
    /// The larger (or only) value.
    #[must_use]
    pub const fn upper(&self) -> f64 {
        match *self {
            Self::Exact { value } => value,
            Self::Oscillating { upper, .. } => upper,
        }
    }

    /// Whether the customer waits no time at all.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.upper() <= 0.0
    }
}

/// One point of the per-customer waiting-time graph.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CustomerWait {
    /// 1-based customer index.
    pub customer: u64,
    /// Wq(customer).
    pub waiting_time: WaitingTime,
}

/// Fields shared by every regime.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dd1kBase {
    /// λ as entered.
    pub arrival_rate: f64,
    /// μ as entered.
    pub service_rate: f64,
    /// K.
    pub capacity: u64,
    /// λ as a reduced fraction.
    pub arrival_rate_fraction: Fraction,
    /// μ as a reduced fraction.
    pub service_rate_fraction: Fraction,
    /// Regime tag.
    pub regime: Regime,
    /// Regime rendered with the exact rates.
    pub description: String,
    /// t_i.
    pub transient_time: Fraction,
    /// λ·t_i.
    pub lambda_ti: f64,
    /// ⌊λ·t_i⌋.
    pub lambda_ti_floored: i64,
    /// μ·t_i.
    pub mu_ti: f64,
    /// ⌊μ·t_i⌋.
    pub mu_ti_floored: i64,
    /// Last instant of the event trace (whole time units).
    pub graph_horizon: u64,
    /// Event trace from t = 0 to the horizon.
    pub timeline: Vec<TimelineRecord>,
    /// Wq(n) for n = 1 until the long-run value is reached.
    pub customer_graph: Vec<CustomerWait>,
}

impl Dd1kBase {
    fn new(
        arrival_rate: f64,
        service_rate: f64,
        capacity: u64,
        rates: Rates,
        regime: Regime,
        transient_time: Fraction,
        config: &Dd1kConfig,
    ) -> QueueResult<Self> {
        let lambda_ti_floored = narrow(rates.arrivals_by(transient_time)?, "dd1k.lambda_ti")?;
        let mu_ti_floored = narrow(rates.services_by(transient_time)?, "dd1k.mu_ti")?;
        let graph_horizon = rates.graph_horizon(transient_time, config)?;

        Ok(Self {
            arrival_rate,
            service_rate,
            capacity,
            arrival_rate_fraction: rates.lambda,
            service_rate_fraction: rates.mu,
            regime,
            description: regime.describe(rates.lambda, rates.mu),
            transient_time,
            lambda_ti: rates.lambda.to_f64() * transient_time.to_f64(),
            lambda_ti_floored,
            mu_ti: rates.mu.to_f64() * transient_time.to_f64(),
            mu_ti_floored,
            graph_horizon,
            timeline: Vec::new(),
            customer_graph: Vec::new(),
        })
    }

    pub(crate) fn rates(&self) -> Rates {
        Rates::new(self.arrival_rate_fraction, self.service_rate_fraction)
    }
}

/// Closed-form behaviour of a deterministic queue.
pub trait DeterministicQueue {
    /// Shared fields.
    fn base(&self) -> &Dd1kBase;

    /// n(t): customers in system at time `t`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for negative `t` or `ArithmeticOverflow`.
    fn number_in_system(&self, t: Fraction) -> QueueResult<u64>;

    /// Wq(n) for the 1-based customer index `n`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for `n = 0` or `ArithmeticOverflow`.
    fn waiting_time(&self, customer: u64) -> QueueResult<WaitingTime>;

    /// Whether a customer arriving at `t` would be admitted.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for negative `t` or `ArithmeticOverflow`.
    fn can_customer_enter(&self, t: Fraction) -> QueueResult<bool>;

    /// t_i.
    fn transient_time(&self) -> Fraction {
        self.base().transient_time
    }
}

/// A D/D/1/K analysis tagged by regime.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Dd1kCharacteristics {
    /// λ < μ.
    Draining(DrainingQueue),
    /// λ > μ, λ mod μ ≠ 0.
    Oscillating(BalkingQueue),
    /// λ > μ, λ mod μ = 0.
    Settled(BalkingQueue),
}

impl Dd1kCharacteristics {
    /// Regime tag.
    #[must_use]
    pub fn regime(&self) -> Regime {
        self.base().regime
    }

    fn queue(&self) -> &dyn DeterministicQueue {
        match self {
            Self::Draining(queue) => queue as &dyn DeterministicQueue,
            Self::Oscillating(queue) | Self::Settled(queue) => queue,
        }
    }

    fn base_mut(&mut self) -> &mut Dd1kBase {
        match self {
            Self::Draining(queue) => &mut queue.base,
            Self::Oscillating(queue) | Self::Settled(queue) => &mut queue.base,
        }
    }

    fn replay_plan(&self) -> QueueResult<ReplayPlan> {
        let base = self.base();
        let rates = base.rates();
        let horizon_ticks = i128::from(base.graph_horizon)
            .checked_mul(rates.ticks_per_unit()?)
            .ok_or_else(|| QueueError::overflow("dd1k.horizon_ticks"))?;
        let initial_customers = match self {
            Self::Draining(queue) => queue.initial_customers,
            Self::Oscillating(_) | Self::Settled(_) => 0,
        };
        Ok(ReplayPlan {
            rates,
            initial_customers,
            horizon_ticks,
        })
    }

    fn customer_graph(&self) -> QueueResult<Vec<CustomerWait>> {
        match self {
            Self::Draining(queue) => queue.customer_graph(),
            Self::Oscillating(queue) | Self::Settled(queue) => queue.customer_graph(),
        }
    }

    /// Rejects analyses whose trace or customer graph would exceed `max_events`.
    fn check_trace_size(&self, plan: &ReplayPlan, max_events: u64) -> QueueResult<()> {
        let rates = plan.rates;
        let events = plan.horizon_ticks / rates.arrival_period()?
            + plan.horizon_ticks / rates.service_period()?
            + i128::from(plan.initial_customers)
            + 1;
        let customers = i128::from(self.base().lambda_ti_floored) + 1;
        let limit = i128::from(max_events);
        if events > limit {
            return Err(QueueError::invalid_input(
                "λ",
                format!("trace would hold about {events} events, above the limit of {max_events}"),
            ));
        }
        if customers > limit {
            return Err(QueueError::invalid_input(
                "λ",
                format!("{customers} customers before t_i, above the limit of {max_events}"),
            ));
        }
        Ok(())
    }

    fn populate(&mut self, config: &Dd1kConfig) -> QueueResult<()> {
        let plan = self.replay_plan()?;
        self.check_trace_size(&plan, config.max_trace_events)?;
        let customer_graph = self.customer_graph()?;
        let timeline = timeline::replay(&plan, |t| self.can_customer_enter(t))?;
        debug!(
            regime = %self.regime(),
            events = timeline.len(),
            customers = customer_graph.len(),
            horizon = self.base().graph_horizon,
            "D/D/1/K trace generated"
        );
        let base = self.base_mut();
        base.customer_graph = customer_graph;
        base.timeline = timeline;
        Ok(())
    }
}

impl DeterministicQueue for Dd1kCharacteristics {
    fn base(&self) -> &Dd1kBase {
        match self {
            Self::Draining(queue) => &queue.base,
            Self::Oscillating(queue) | Self::Settled(queue) => &queue.base,
        }
    }

    fn number_in_system(&self, t: Fraction) -> QueueResult<u64> {
        self.queue().number_in_system(t)
    }

    fn waiting_time(&self, customer: u64) -> QueueResult<WaitingTime> {
        self.queue().waiting_time(customer)
    }

    fn can_customer_enter(&self, t: Fraction) -> QueueResult<bool> {
        self.queue().can_customer_enter(t)
    }
}

/// Build a D/D/1/K analysis with the default numeric policy.
///
/// # Example
///
/// ```rust
/// use queuecalc::domains::{build_dd1k, DeterministicQueue, Fraction, Regime};
///
/// let queue = build_dd1k(1.0, 2.0, 10, Some(5)).unwrap();
/// assert_eq!(queue.regime(), Regime::Draining);
/// assert_eq!(queue.transient_time(), Fraction::from_integer(5));
/// ```
///
/// # Errors
///
/// See [`build_dd1k_with`].
pub fn build_dd1k(
    arrival_rate: f64,
    service_rate: f64,
    capacity: u64,
    initial_customers: Option<u64>,
) -> QueueResult<Dd1kCharacteristics> {
    build_dd1k_with(
        arrival_rate,
        service_rate,
        capacity,
        initial_customers,
        &AnalysisConfig::default(),
    )
}

/// Build a D/D/1/K analysis, selecting the regime from the exact rates.
///
/// # Errors
///
/// - `InvalidInput` for non-positive rates, `K = 0`, a missing or zero `M`
///   when λ < μ, or a capacity too small for the λ > μ regimes
/// - `UnsupportedRegime` for λ = μ
/// - `NoConvergence` when the transient-time search hits its cap
/// - `ArithmeticOverflow` when the exact bookkeeping leaves `i128`
pub fn build_dd1k_with(
    arrival_rate: f64,
    service_rate: f64,
    capacity: u64,
    initial_customers: Option<u64>,
    config: &AnalysisConfig,
) -> QueueResult<Dd1kCharacteristics> {
    check_rate("λ", arrival_rate)?;
    check_rate("μ", service_rate)?;
    if capacity == 0 {
        return Err(QueueError::invalid_input("K", "must be a positive integer"));
    }

    let lambda = to_proper_fraction_with(arrival_rate, &config.fraction)?;
    let mu = to_proper_fraction_with(service_rate, &config.fraction)?;
    if !lambda.is_positive() {
        return Err(QueueError::invalid_input("λ", "is too small to represent exactly"));
    }
    if !mu.is_positive() {
        return Err(QueueError::invalid_input("μ", "is too small to represent exactly"));
    }

    let regime = Regime::classify(lambda, mu)?;
    debug!(%lambda, %mu, %regime, capacity, "D/D/1/K regime classified");

    let mut characteristics = match regime {
        Regime::Draining => {
            let initial = initial_customers
                .filter(|&m| m > 0)
                .ok_or_else(|| QueueError::invalid_input("M", "must be a positive integer"))?;
            Dd1kCharacteristics::Draining(DrainingQueue::new(
                arrival_rate,
                service_rate,
                capacity,
                Rates::new(lambda, mu),
                initial,
                &config.dd1k,
            )?)
        }
        Regime::Oscillating | Regime::Settled => {
            if let Some(m) = initial_customers {
                warn!(initial_customers = m, "M is ignored when λ > μ");
            }
            let queue = BalkingQueue::new(
                arrival_rate,
                service_rate,
                capacity,
                Rates::new(lambda, mu),
                regime,
                &config.dd1k,
            )?;
            if regime == Regime::Settled {
                Dd1kCharacteristics::Settled(queue)
            } else {
                Dd1kCharacteristics::Oscillating(queue)
            }
        }
    };

    debug!(
        transient_time = %characteristics.transient_time(),
        "D/D/1/K transient time found"
    );
    characteristics.populate(&config.dd1k)?;
    Ok(characteristics)
}

fn check_rate(parameter: &str, rate: f64) -> QueueResult<()> {
    if rate.is_finite() && rate > 0.0 {
        Ok(())
    } else {
        Err(QueueError::invalid_input(parameter, "must be a positive number"))
    }
}

fn check_time(t: Fraction) -> QueueResult<()> {
    if t.numerator() < 0 {
        Err(QueueError::invalid_input("t", "must not be negative"))
    } else {
        Ok(())
    }
}

fn check_customer(customer: u64) -> QueueResult<()> {
    if customer == 0 {
        Err(QueueError::invalid_input("n", "must be a positive integer"))
    } else {
        Ok(())
    }
}

fn narrow(value: i128, location: &str) -> QueueResult<i64> {
    i64::try_from(value).map_err(|_| QueueError::overflow(location))
}

fn to_count(value: i128, location: &str) -> QueueResult<u64> {
    u64::try_from(value.max(0)).map_err(|_| QueueError::overflow(location))
}

fn iteration_cap(steps: u64) -> usize {
    usize::try_from(steps).unwrap_or(usize::MAX)
}

/// Exact rate arithmetic with `λ = a/b`, `μ = c/d`.
///
/// Ticks: one tick is `1/(a·c)` time units, so arrivals fall every `b·c`
/// ticks and services take `a·d` ticks.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Rates {
    lambda: Fraction,
    mu: Fraction,
    a: i128,
    b: i128,
    c: i128,
    d: i128,
}

fn product(location: &str, factors: &[i128]) -> QueueResult<i128> {
    factors
        .iter()
        .try_fold(1i128, |acc, &f| acc.checked_mul(f))
        .ok_or_else(|| QueueError::overflow(location))
}

impl Rates {
    pub(crate) fn new(lambda: Fraction, mu: Fraction) -> Self {
        Self {
            lambda,
            mu,
            a: i128::from(lambda.numerator()),
            b: i128::from(lambda.denominator()),
            c: i128::from(mu.numerator()),
            d: i128::from(mu.denominator()),
        }
    }

    /// ⌊λt⌋
    pub(crate) fn arrivals_by(&self, t: Fraction) -> QueueResult<i128> {
        let (p, q) = (i128::from(t.numerator()), i128::from(t.denominator()));
        Ok(product("dd1k.λt", &[self.a, p])?.div_euclid(product("dd1k.λt", &[self.b, q])?))
    }

    /// ⌈λt⌉
    pub(crate) fn arrivals_ceil(&self, t: Fraction) -> QueueResult<i128> {
        let (p, q) = (i128::from(t.numerator()), i128::from(t.denominator()));
        let numerator = product("dd1k.λt", &[self.a, p])?;
        let denominator = product("dd1k.λt", &[self.b, q])?;
        Ok(-(-numerator).div_euclid(denominator))
    }

    /// ⌊μt⌋
    pub(crate) fn services_by(&self, t: Fraction) -> QueueResult<i128> {
        let (p, q) = (i128::from(t.numerator()), i128::from(t.denominator()));
        Ok(product("dd1k.μt", &[self.c, p])?.div_euclid(product("dd1k.μt", &[self.d, q])?))
    }

    /// ⌊μt − μ/λ⌋: departures by `t` when service starts at the first arrival.
    pub(crate) fn departures_after_first(&self, t: Fraction) -> QueueResult<i128> {
        let (p, q) = (i128::from(t.numerator()), i128::from(t.denominator()));
        let shifted = product("dd1k.μt", &[p, self.a])?
            .checked_sub(product("dd1k.μt", &[self.b, q])?)
            .ok_or_else(|| QueueError::overflow("dd1k.μt"))?;
        let numerator = product("dd1k.μt", &[self.c, shifted])?;
        let denominator = product("dd1k.μt", &[self.d, q, self.a])?;
        Ok(numerator.div_euclid(denominator))
    }

    pub(crate) fn ticks_per_unit(&self) -> QueueResult<i128> {
        product("dd1k.ticks", &[self.a, self.c])
    }

    pub(crate) fn arrival_period(&self) -> QueueResult<i128> {
        product("dd1k.ticks", &[self.b, self.c])
    }

    pub(crate) fn service_period(&self) -> QueueResult<i128> {
        product("dd1k.ticks", &[self.a, self.d])
    }

    /// `1/μ − 1/λ` as a float.
    pub(crate) fn waiting_step(&self) -> QueueResult<f64> {
        let numerator = product("dd1k.δ", &[self.d, self.a])? - product("dd1k.δ", &[self.b, self.c])?;
        let denominator = product("dd1k.δ", &[self.c, self.a])?;
        Ok(numerator as f64 / denominator as f64)
    }

    /// `ceil(max(t_i + n/λ, floor))` in whole time units.
    fn graph_horizon(&self, transient_time: Fraction, config: &Dd1kConfig) -> QueueResult<u64> {
        let (p, q) = (
            i128::from(transient_time.numerator()),
            i128::from(transient_time.denominator()),
        );
        let extra = product(
            "dd1k.horizon",
            &[i128::from(config.horizon_interarrivals), self.b, q],
        )?;
        let numerator = product("dd1k.horizon", &[p, self.a])?
            .checked_add(extra)
            .ok_or_else(|| QueueError::overflow("dd1k.horizon"))?;
        let denominator = product("dd1k.horizon", &[q, self.a])?;
        let after_transient = -(-numerator).div_euclid(denominator);
        to_count(
            after_transient.max(i128::from(config.horizon_floor)),
            "dd1k.horizon",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frac(n: i64, d: i64) -> Fraction {
        Fraction::new(n, d).expect("valid fraction")
    }

    #[test]
    fn test_classify_regimes() {
        assert_eq!(
            Regime::classify(frac(1, 1), frac(2, 1)).expect("classify"),
            Regime::Draining
        );
        assert_eq!(
            Regime::classify(frac(3, 1), frac(2, 1)).expect("classify"),
            Regime::Oscillating
        );
        assert_eq!(
            Regime::classify(frac(2, 1), frac(1, 1)).expect("classify"),
            Regime::Settled
        );
        // 1/2 is an exact multiple (3×) of 1/6.
        assert_eq!(
            Regime::classify(frac(1, 2), frac(1, 6)).expect("classify"),
            Regime::Settled
        );
        assert_eq!(
            Regime::classify(frac(1, 2), frac(1, 3)).expect("classify"),
            Regime::Oscillating
        );
    }

    #[test]
    fn test_classify_rejects_equal_rates() {
        let err = Regime::classify(frac(2, 3), frac(4, 6)).unwrap_err();
        assert!(matches!(err, QueueError::UnsupportedRegime { .. }));
    }

    #[test]
    fn test_describe_uses_exact_fractions() {
        assert_eq!(
            Regime::Oscillating.describe(frac(3, 2), frac(1, 1)),
            "λ = 3/2 > μ = 1, λ mod μ ≠ 0"
        );
        assert_eq!(Regime::Draining.describe(frac(1, 3), frac(1, 1)), "λ = 1/3 < μ = 1");
    }

    #[test]
    fn test_rates_floors_are_exact() {
        let rates = Rates::new(frac(3, 1), frac(2, 1));
        assert_eq!(rates.arrivals_by(frac(4, 3)).expect("floor"), 4);
        assert_eq!(rates.arrivals_ceil(frac(7, 4)).expect("ceil"), 6);
        assert_eq!(rates.services_by(frac(4, 3)).expect("floor"), 2);
        // ⌊2·(4/3) − 2/3⌋ = 2
        assert_eq!(rates.departures_after_first(frac(4, 3)).expect("floor"), 2);
        assert_eq!(rates.departures_after_first(frac(1, 3)).expect("floor"), 0);
    }

    #[test]
    fn test_rates_tick_grid() {
        let rates = Rates::new(frac(3, 1), frac(2, 1));
        assert_eq!(rates.ticks_per_unit().expect("ticks"), 6);
        assert_eq!(rates.arrival_period().expect("ticks"), 2);
        assert_eq!(rates.service_period().expect("ticks"), 3);
    }

    #[test]
    fn test_graph_horizon() {
        let rates = Rates::new(frac(1, 1), frac(2, 1));
        let config = Dd1kConfig::default();
        // max(5 + 5, 10) = 10
        assert_eq!(rates.graph_horizon(frac(5, 1), &config).expect("horizon"), 10);
        // max(8 + 5, 10) = 13
        assert_eq!(rates.graph_horizon(frac(8, 1), &config).expect("horizon"), 13);

        let slow = Rates::new(frac(1, 3), frac(1, 1));
        // 1 + 15 = 16
        assert_eq!(slow.graph_horizon(frac(1, 1), &config).expect("horizon"), 16);
    }

    #[test]
    fn test_build_rejects_bad_inputs() {
        let err = build_dd1k(0.0, 1.0, 3, None).unwrap_err();
        assert_eq!(err.to_string(), "λ: must be a positive number");
        let err = build_dd1k(1.0, -2.0, 3, None).unwrap_err();
        assert_eq!(err.to_string(), "μ: must be a positive number");
        let err = build_dd1k(1.0, 2.0, 0, Some(3)).unwrap_err();
        assert_eq!(err.to_string(), "K: must be a positive integer");
    }

    #[test]
    fn test_build_requires_initial_customers_when_draining() {
        let err = build_dd1k(1.0, 2.0, 3, None).unwrap_err();
        assert_eq!(err.to_string(), "M: must be a positive integer");
        assert!(build_dd1k(1.0, 2.0, 3, Some(0)).is_err());
    }

    #[test]
    fn test_build_rejects_equal_rates() {
        let err = build_dd1k(2.0, 2.0, 5, Some(3)).unwrap_err();
        assert!(matches!(err, QueueError::UnsupportedRegime { .. }));
        assert!(err.is_input_error());
    }

    #[test]
    fn test_build_selects_variant() {
        let queue = build_dd1k(1.0, 2.0, 10, Some(5)).expect("draining");
        assert!(matches!(queue, Dd1kCharacteristics::Draining(_)));

        let queue = build_dd1k(3.0, 2.0, 3, None).expect("oscillating");
        assert!(matches!(queue, Dd1kCharacteristics::Oscillating(_)));

        let queue = build_dd1k(2.0, 1.0, 3, Some(4)).expect("settled, M ignored");
        assert!(matches!(queue, Dd1kCharacteristics::Settled(_)));
    }

    #[test]
    fn test_build_populates_base() {
        let queue = build_dd1k(1.0, 2.0, 10, Some(5)).expect("draining");
        let base = queue.base();
        assert_eq!(base.arrival_rate_fraction, Fraction::ONE);
        assert_eq!(base.service_rate_fraction, Fraction::from_integer(2));
        assert_eq!(base.lambda_ti_floored, 5);
        assert_eq!(base.mu_ti_floored, 10);
        assert!((base.lambda_ti - 5.0).abs() < 1e-12);
        assert!((base.mu_ti - 10.0).abs() < 1e-12);
        assert_eq!(base.graph_horizon, 10);
        assert!(!base.timeline.is_empty());
        assert!(!base.customer_graph.is_empty());
    }

    #[test]
    fn test_build_with_custom_horizon() {
        let config = AnalysisConfig::builder().horizon_floor(40).build();
        let queue = build_dd1k_with(1.0, 2.0, 10, Some(5), &config).expect("draining");
        assert_eq!(queue.base().graph_horizon, 40);
    }

    #[test]
    fn test_build_transient_search_cap() {
        let config = AnalysisConfig::builder().max_transient_steps(2).build();
        let err = build_dd1k_with(1.0, 2.0, 10, Some(5), &config).unwrap_err();
        assert!(matches!(err, QueueError::NoConvergence { iterations: 2, .. }));
    }

    #[test]
    fn test_high_rates_rejected_before_replay() {
        // 10 time units at λ = 1e5, μ = 2e5 is three million events.
        let err = build_dd1k(1.0e5, 2.0e5, 10, Some(1)).unwrap_err();
        assert!(err.is_input_error());
        assert!(err.to_string().contains("above the limit of 1000000"));

        let queue = build_dd1k(1.0e3, 2.0e3, 10, Some(1)).expect("within limit");
        assert!(queue.base().timeline.len() <= 1_000_000);
    }

    #[test]
    fn test_trace_limit_is_configurable() {
        // λ = 1, μ = 2, M = 5, horizon 10: 10 arrivals, at most 20 departures.
        let config = AnalysisConfig::builder().max_trace_events(36).build();
        assert!(build_dd1k_with(1.0, 2.0, 10, Some(5), &config).is_ok());

        let config = AnalysisConfig::builder().max_trace_events(20).build();
        let err = build_dd1k_with(1.0, 2.0, 10, Some(5), &config).unwrap_err();
        assert!(matches!(err, QueueError::InvalidInput { .. }));
    }

    #[test]
    fn test_waiting_time_upper() {
        assert!((WaitingTime::Exact { value: 0.5 }.upper() - 0.5).abs() < 1e-12);
        let w = WaitingTime::Oscillating {
            upper: 0.5,
            lower: 1.0 / 3.0,
        };
        assert!((w.upper() - 0.5).abs() < 1e-12);
        assert!(WaitingTime::Exact { value: 0.0 }.is_zero());
        assert!(!w.is_zero());
    }

    #[test]
    fn test_serializes_with_regime_tag() {
        let queue = build_dd1k(3.0, 2.0, 3, None).expect("oscillating");
        let json = serde_json::to_value(&queue).expect("json");
        assert_eq!(json["type"], "oscillating");
        assert_eq!(json["regime"], "oscillating");
        assert_eq!(json["transient_time"]["numerator"], 5);
        assert_eq!(json["transient_time"]["denominator"], 3);
        assert!(json["timeline"].as_array().is_some_and(|t| !t.is_empty()));
    }
}
