//! λ < μ: an initial cohort of M customers drains while new customers arrive.
//!
//! ```text
//! t_i      = min { t ∈ ℕ⁺ : M + ⌊λt⌋ − ⌊μt⌋ ≤ 0 }
//! n(t)     = M + ⌊λt⌋ − ⌊μt⌋            t < t_i
//!          = 0                          t ≥ t_i
//! Wq(n)    = (M − 1 + n)/μ − n/λ        n < ⌊λ·t_i⌋
//!          = 0                          otherwise
//! ```

use serde::Serialize;

use super::{
    check_customer, check_time, iteration_cap, product, to_count, CustomerWait, Dd1kBase,
    DeterministicQueue, Rates, Regime, WaitingTime,
};
use crate::config::Dd1kConfig;
use crate::domains::fraction::Fraction;
use crate::error::{QueueError, QueueResult};

/// Draining regime (λ < μ).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrainingQueue {
    /// Shared fields.
    #[serde(flatten)]
    pub base: Dd1kBase,
    /// M.
    pub initial_customers: u64,
    /// Average wait of the initial cohort, (M−1)/(2μ).
    pub average_initial_wait: f64,
    /// Departure of the last initial customer, M/μ.
    pub last_initial_departure: Fraction,
}

impl DrainingQueue {
    pub(crate) fn new(
        arrival_rate: f64,
        service_rate: f64,
        capacity: u64,
        rates: Rates,
        initial_customers: u64,
        config: &Dd1kConfig,
    ) -> QueueResult<Self> {
        let transient_time = find_transient_time(&rates, initial_customers, config.max_transient_steps)?;
        let base = Dd1kBase::new(
            arrival_rate,
            service_rate,
            capacity,
            rates,
            Regime::Draining,
            transient_time,
            config,
        )?;
        let m = i128::from(initial_customers);
        let last_initial_departure = Fraction::from_i128(
            product("dd1k.M/μ", &[m, rates.d])?,
            rates.c,
        )?;
        let average_initial_wait = (initial_customers as f64 - 1.0) / (2.0 * rates.mu.to_f64());

        Ok(Self {
            base,
            initial_customers,
            average_initial_wait,
            last_initial_departure,
        })
    }

    /// Initial-cohort customers still in the system at `t`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for negative `t` or `ArithmeticOverflow`.
    pub fn initial_remaining(&self, t: Fraction) -> QueueResult<u64> {
        check_time(t)?;
        if t >= self.last_initial_departure {
            return Ok(0);
        }
        let served = self.base.rates().services_by(t)?;
        to_count(i128::from(self.initial_customers) - served, "dd1k.initial_remaining")
    }

    /// Customers in the system at `t` that were not part of the initial cohort.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for negative `t` or `ArithmeticOverflow`.
    pub fn new_customers(&self, t: Fraction) -> QueueResult<u64> {
        Ok(self
            .number_in_system(t)?
            .saturating_sub(self.initial_remaining(t)?))
    }

    pub(crate) fn customer_graph(&self) -> QueueResult<Vec<CustomerWait>> {
        let mut graph = Vec::new();
        for customer in 1.. {
            let waiting_time = self.waiting_time(customer)?;
            graph.push(CustomerWait {
                customer,
                waiting_time,
            });
            if waiting_time.is_zero() {
                break;
            }
        }
        Ok(graph)
    }
}

impl DeterministicQueue for DrainingQueue {
    fn base(&self) -> &Dd1kBase {
        &self.base
    }

    fn number_in_system(&self, t: Fraction) -> QueueResult<u64> {
        check_time(t)?;
        if t >= self.base.transient_time {
            return Ok(0);
        }
        let rates = self.base.rates();
        to_count(
            i128::from(self.initial_customers) + rates.arrivals_by(t)? - rates.services_by(t)?,
            "dd1k.n(t)",
        )
    }

    fn waiting_time(&self, customer: u64) -> QueueResult<WaitingTime> {
        check_customer(customer)?;
        let n = i128::from(customer);
        if n >= i128::from(self.base.lambda_ti_floored) {
            return Ok(WaitingTime::Exact { value: 0.0 });
        }
        let rates = self.base.rates();
        let ahead = i128::from(self.initial_customers) - 1 + n;
        let numerator = product("dd1k.Wq", &[ahead, rates.d, rates.a])?
            - product("dd1k.Wq", &[n, rates.b, rates.c])?;
        let denominator = product("dd1k.Wq", &[rates.c, rates.a])?;
        Ok(WaitingTime::Exact {
            value: (numerator.max(0) as f64) / denominator as f64,
        })
    }

    fn can_customer_enter(&self, t: Fraction) -> QueueResult<bool> {
        if t >= self.base.transient_time {
            return Ok(true);
        }
        Ok(self.new_customers(t)? < self.base.capacity)
    }
}

fn find_transient_time(rates: &Rates, initial_customers: u64, max_steps: u64) -> QueueResult<Fraction> {
    let m = i128::from(initial_customers);
    for step in 1..=max_steps {
        let t = Fraction::from_integer(
            i64::try_from(step).map_err(|_| QueueError::overflow("dd1k.t_i"))?,
        );
        if m + rates.arrivals_by(t)? - rates.services_by(t)? <= 0 {
            return Ok(t);
        }
    }
    Err(QueueError::no_convergence(
        "transient time search (λ < μ)",
        iteration_cap(max_steps),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::dd1k::{build_dd1k, Dd1kCharacteristics};

    fn frac(n: i64, d: i64) -> Fraction {
        Fraction::new(n, d).expect("valid fraction")
    }

    fn draining(lambda: f64, mu: f64, capacity: u64, m: u64) -> DrainingQueue {
        match build_dd1k(lambda, mu, capacity, Some(m)).expect("build") {
            Dd1kCharacteristics::Draining(queue) => queue,
            other => panic!("expected draining regime, got {}", other.regime()),
        }
    }

    #[test]
    fn test_transient_time_is_smallest_integer() {
        let queue = draining(1.0, 2.0, 10, 5);
        assert_eq!(queue.transient_time(), Fraction::from_integer(5));
        for t in 1..5 {
            assert!(5 + t - 2 * t > 0, "t = {t} already drained");
        }
    }

    #[test]
    fn test_number_in_system() {
        let queue = draining(1.0, 2.0, 10, 5);
        assert_eq!(queue.number_in_system(Fraction::ZERO).expect("n"), 5);
        assert_eq!(queue.number_in_system(frac(1, 1)).expect("n"), 4);
        assert_eq!(queue.number_in_system(frac(5, 2)).expect("n"), 2);
        assert_eq!(queue.number_in_system(frac(5, 1)).expect("n"), 0);
        assert_eq!(queue.number_in_system(frac(47, 3)).expect("n"), 0);
        assert!(queue.number_in_system(frac(-1, 2)).is_err());
    }

    #[test]
    fn test_waiting_times() {
        let queue = draining(1.0, 2.0, 10, 5);
        let expected = [1.5, 1.0, 0.5, 0.0, 0.0];
        for (i, want) in expected.iter().enumerate() {
            let got = queue.waiting_time(i as u64 + 1).expect("wq").upper();
            assert!((got - want).abs() < 1e-12, "Wq({}) = {got}", i + 1);
        }
        assert!(queue.waiting_time(0).is_err());
    }

    #[test]
    fn test_customer_graph_stops_at_first_zero() {
        let queue = draining(1.0, 2.0, 10, 5);
        let graph = &queue.base.customer_graph;
        assert_eq!(graph.len(), 4);
        assert_eq!(graph[0].customer, 1);
        assert!(graph.last().is_some_and(|point| point.waiting_time.is_zero()));
    }

    #[test]
    fn test_initial_cohort() {
        let queue = draining(1.0, 2.0, 10, 5);
        assert!((queue.average_initial_wait - 1.0).abs() < 1e-12);
        assert_eq!(queue.last_initial_departure, frac(5, 2));
        assert_eq!(queue.initial_remaining(Fraction::ZERO).expect("rem"), 5);
        assert_eq!(queue.initial_remaining(frac(1, 1)).expect("rem"), 3);
        assert_eq!(queue.initial_remaining(frac(5, 2)).expect("rem"), 0);
        assert_eq!(queue.new_customers(frac(1, 1)).expect("new"), 1);
        assert_eq!(queue.new_customers(frac(2, 1)).expect("new"), 2);
    }

    #[test]
    fn test_blocking_with_small_capacity() {
        let queue = draining(1.0, 2.0, 2, 5);
        assert!(queue.can_customer_enter(frac(1, 1)).expect("enter"));
        assert!(!queue.can_customer_enter(frac(2, 1)).expect("enter"));
        assert!(!queue.can_customer_enter(frac(3, 1)).expect("enter"));
        assert!(queue.can_customer_enter(frac(4, 1)).expect("enter"));
        assert!(queue.can_customer_enter(frac(5, 1)).expect("enter"));
        assert!(queue.can_customer_enter(frac(100, 1)).expect("enter"));
    }

    #[test]
    fn test_fractional_rates() {
        // λ = 1/3, μ = 1/2, M = 3: 3 + ⌊t/3⌋ − ⌊t/2⌋ ≤ 0 first at t = 14.
        let queue = draining(1.0 / 3.0, 0.5, 4, 3);
        assert_eq!(queue.base.arrival_rate_fraction, frac(1, 3));
        assert_eq!(queue.transient_time(), Fraction::from_integer(14));
        assert_eq!(queue.base.lambda_ti_floored, 4);
        assert_eq!(queue.base.mu_ti_floored, 7);
    }
}
