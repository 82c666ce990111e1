//! Event trace for charting.
//!
//! The queue is replayed event by event on the integer tick grid of
//! [`Rates`](super::Rates), from t = 0 to the graph horizon. Departures at an
//! instant are processed before arrivals at the same instant.

use serde::Serialize;

use super::Rates;
use crate::domains::fraction::Fraction;
use crate::error::{QueueError, QueueResult};

/// One arrival or departure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineRecord {
    /// Event time.
    pub time: f64,
    /// An arrival happened.
    pub arrived: bool,
    /// For arrivals, whether the customer balked.
    pub blocked: Option<bool>,
    /// Blocked arrivals so far.
    pub blocks: u64,
    /// Arrivals so far.
    pub arrivals: u64,
    /// A customer started service.
    pub entered_service: bool,
    /// Service starts so far.
    pub service_entrances: u64,
    /// A departure happened.
    pub departed: bool,
    /// Departures so far.
    pub departures: u64,
    /// Customers in system after the event.
    pub number_of_customers: u64,
    /// Position in the trace.
    pub key: usize,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ReplayPlan {
    pub(crate) rates: Rates,
    pub(crate) initial_customers: u64,
    pub(crate) horizon_ticks: i128,
}

#[derive(Debug, Default)]
struct Replay {
    records: Vec<TimelineRecord>,
    ticks_per_unit: i128,
    service_period: i128,
    in_system: u64,
    busy_until: Option<i128>,
    arrivals: u64,
    blocks: u64,
    departures: u64,
    service_entrances: u64,
}

impl Replay {
    fn record(&mut self, tick: i128, arrived: Option<bool>, entered_service: bool, departed: bool) {
        let key = self.records.len();
        self.records.push(TimelineRecord {
            time: tick as f64 / self.ticks_per_unit as f64,
            arrived: arrived.is_some(),
            blocked: arrived.map(|admitted| !admitted),
            blocks: self.blocks,
            arrivals: self.arrivals,
            entered_service,
            service_entrances: self.service_entrances,
            departed,
            departures: self.departures,
            number_of_customers: self.in_system,
            key,
        });
    }

    fn start_service(&mut self, tick: i128) -> QueueResult<()> {
        let done = tick
            .checked_add(self.service_period)
            .ok_or_else(|| QueueError::overflow("dd1k.timeline"))?;
        self.busy_until = Some(done);
        self.service_entrances += 1;
        Ok(())
    }

    fn depart(&mut self, tick: i128) -> QueueResult<()> {
        self.in_system = self.in_system.saturating_sub(1);
        self.departures += 1;
        let entered = self.in_system > 0;
        if entered {
            self.start_service(tick)?;
        } else {
            self.busy_until = None;
        }
        self.record(tick, None, entered, true);
        Ok(())
    }

    fn arrive(&mut self, tick: i128, admitted: bool) -> QueueResult<()> {
        self.arrivals += 1;
        let mut entered = false;
        if admitted {
            self.in_system += 1;
            if self.busy_until.is_none() {
                self.start_service(tick)?;
                entered = true;
            }
        } else {
            self.blocks += 1;
        }
        self.record(tick, Some(admitted), entered, false);
        Ok(())
    }
}

/// Replay the queue and return the initial state plus one record per event.
///
/// `admit` decides each arrival from its exact arrival time.
pub(crate) fn replay<F>(plan: &ReplayPlan, mut admit: F) -> QueueResult<Vec<TimelineRecord>>
where
    F: FnMut(Fraction) -> QueueResult<bool>,
{
    let rates = plan.rates;
    let arrival_period = rates.arrival_period()?;
    let mut state = Replay {
        ticks_per_unit: rates.ticks_per_unit()?,
        service_period: rates.service_period()?,
        in_system: plan.initial_customers,
        ..Replay::default()
    };

    let entered = plan.initial_customers > 0;
    if entered {
        state.start_service(0)?;
    }
    state.record(0, None, entered, false);

    let mut next_arrival = arrival_period;
    loop {
        let tick = state
            .busy_until
            .map_or(next_arrival, |done| done.min(next_arrival));
        if tick > plan.horizon_ticks {
            break;
        }
        if state.busy_until == Some(tick) {
            state.depart(tick)?;
        }
        if next_arrival == tick {
            let admitted = admit(Fraction::from_i128(tick, state.ticks_per_unit)?)?;
            state.arrive(tick, admitted)?;
            next_arrival += arrival_period;
        }
    }
    Ok(state.records)
}
