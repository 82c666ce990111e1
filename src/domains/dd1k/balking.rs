//! λ > μ: the queue fills until arrivals start to balk.
//!
//! The first customer arrives at `1/λ` and the server is busy from then on,
//! so departures fall at `1/λ + j/μ`. Arrival `k` finds
//! `(k − 1) − ⌊μ(k − 1)/λ⌋` customers; it balks once that reaches `K − 1`.
//!
//! ```text
//! t_i   = k/λ, first k with k − ⌊μ(k−1)/λ⌋ ≥ K
//! n(t)  = 0                          t < 1/λ
//!       = ⌊λt⌋ − ⌊μt − μ/λ⌋          1/λ ≤ t < t_i
//!       = K − 1                      settled, t ≥ t_i
//!       = K − 1 or K − 2             oscillating, t ≥ t_i
//! Wq(n) = (n − 1)·δ                  n < λt_i,   δ = 1/μ − 1/λ
//!       = (λt_i − 2)·δ               settled
//!       = {(λt_i − 2)·δ, (λt_i − 3)·δ}  oscillating
//! ```

use serde::Serialize;

use super::{
    check_customer, check_time, iteration_cap, product, to_count, CustomerWait, Dd1kBase,
    DeterministicQueue, Rates, Regime, WaitingTime,
};
use crate::config::Dd1kConfig;
use crate::domains::fraction::Fraction;
use crate::error::{QueueError, QueueResult};

/// Balking regimes (λ > μ), settled or oscillating.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalkingQueue {
    /// Shared fields.
    #[serde(flatten)]
    pub base: Dd1kBase,
    /// Arrival instant of the first customer, 1/λ.
    pub first_arrival: Fraction,
    /// Extra wait each successive customer accumulates, 1/μ − 1/λ.
    pub waiting_time_step: f64,
}

impl BalkingQueue {
    pub(crate) fn new(
        arrival_rate: f64,
        service_rate: f64,
        capacity: u64,
        rates: Rates,
        regime: Regime,
        config: &Dd1kConfig,
    ) -> QueueResult<Self> {
        let minimum = if regime == Regime::Settled { 2 } else { 3 };
        if capacity < minimum {
            return Err(QueueError::invalid_input(
                "K",
                format!("must be at least {minimum} when {}", regime.describe(rates.lambda, rates.mu)),
            ));
        }

        let first_balk = find_first_balk(&rates, capacity, config.max_transient_steps)?;
        let transient_time = Fraction::from_i128(product("dd1k.t_i", &[first_balk, rates.b])?, rates.a)?;
        let base = Dd1kBase::new(
            arrival_rate,
            service_rate,
            capacity,
            rates,
            regime,
            transient_time,
            config,
        )?;

        Ok(Self {
            base,
            first_arrival: rates.lambda.recip()?,
            waiting_time_step: rates.waiting_step()?,
        })
    }

    /// `K − 1`: the most customers the queue ever holds.
    #[must_use]
    pub const fn max_in_system(&self) -> u64 {
        self.base.capacity - 1
    }

    pub(crate) fn customer_graph(&self) -> QueueResult<Vec<CustomerWait>> {
        let last = to_count(i128::from(self.base.lambda_ti_floored), "dd1k.λt_i")?;
        (1..=last)
            .map(|customer| -> QueueResult<CustomerWait> {
                Ok(CustomerWait {
                    customer,
                    waiting_time: self.waiting_time(customer)?,
                })
            })
            .collect()
    }

    /// Whether the last departure at or before `t` came after the last arrival `arrival`.
    fn departed_since(&self, t: Fraction, arrival: i128) -> QueueResult<bool> {
        let rates = self.base.rates();
        let departures = rates.departures_after_first(t)?;
        if departures < 1 {
            return Ok(false);
        }
        let arrival_period = rates.arrival_period()?;
        let departure_tick = product("dd1k.ticks", &[departures, rates.service_period()?])?
            .checked_add(arrival_period)
            .ok_or_else(|| QueueError::overflow("dd1k.ticks"))?;
        Ok(departure_tick > product("dd1k.ticks", &[arrival, arrival_period])?)
    }
}

impl DeterministicQueue for BalkingQueue {
    fn base(&self) -> &Dd1kBase {
        &self.base
    }

    fn number_in_system(&self, t: Fraction) -> QueueResult<u64> {
        check_time(t)?;
        if t < self.first_arrival {
            return Ok(0);
        }
        let rates = self.base.rates();
        if t < self.base.transient_time {
            return to_count(
                rates.arrivals_by(t)? - rates.departures_after_first(t)?,
                "dd1k.n(t)",
            );
        }
        let full = self.max_in_system();
        if self.base.regime == Regime::Oscillating && self.departed_since(t, rates.arrivals_by(t)?)? {
            Ok(full - 1)
        } else {
            Ok(full)
        }
    }

    fn waiting_time(&self, customer: u64) -> QueueResult<WaitingTime> {
        check_customer(customer)?;
        let step = self.waiting_time_step;
        let first_balk = self.base.lambda_ti_floored as f64;
        if (customer as f64) < first_balk {
            return Ok(WaitingTime::Exact {
                value: (customer as f64 - 1.0) * step,
            });
        }
        Ok(match self.base.regime {
            Regime::Oscillating => WaitingTime::Oscillating {
                upper: (first_balk - 2.0) * step,
                lower: (first_balk - 3.0) * step,
            },
            _ => WaitingTime::Exact {
                value: (first_balk - 2.0) * step,
            },
        })
    }

    fn can_customer_enter(&self, t: Fraction) -> QueueResult<bool> {
        check_time(t)?;
        let t_i = self.base.transient_time;
        if t < t_i {
            return Ok(true);
        }
        if t == t_i {
            return Ok(false);
        }
        let previous_arrival = self.base.rates().arrivals_ceil(t)? - 1;
        self.departed_since(t, previous_arrival)
    }
}

/// First arrival index `k` that balks.
fn find_first_balk(rates: &Rates, capacity: u64, max_steps: u64) -> QueueResult<i128> {
    let k_cap = i128::from(capacity);
    let served_numerator = product("dd1k.t_i", &[rates.c, rates.b])?;
    let served_denominator = product("dd1k.t_i", &[rates.d, rates.a])?;
    for step in 1..=max_steps {
        let k = i128::from(step);
        let departed = product("dd1k.t_i", &[served_numerator, k - 1])?.div_euclid(served_denominator);
        if k - departed >= k_cap {
            return Ok(k);
        }
    }
    Err(QueueError::no_convergence(
        "transient time search (λ > μ)",
        iteration_cap(max_steps),
    ))
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::domains::dd1k::{build_dd1k, Dd1kCharacteristics};
    use proptest::prelude::*;

    proptest! {
        /// The queue never holds more than K − 1 and settles at K − 1 or K − 2.
        #[test]
        fn prop_bounded_by_capacity(
            lambda_num in 2i64..12,
            mu_num in 1i64..12,
            capacity in 3u64..10,
            sixth in 0i64..600,
        ) {
            prop_assume!(lambda_num > mu_num);
            let queue = match build_dd1k(lambda_num as f64, mu_num as f64, capacity, None).expect("build") {
                Dd1kCharacteristics::Oscillating(queue) | Dd1kCharacteristics::Settled(queue) => queue,
                Dd1kCharacteristics::Draining(_) => return Err(TestCaseError::fail("draining")),
            };
            let t = Fraction::new(sixth, 6).expect("valid");
            let n = queue.number_in_system(t).expect("n");
            prop_assert!(n < capacity);
            if t >= queue.transient_time() {
                prop_assert!(n + 2 >= capacity);
            }
        }
    }
}
