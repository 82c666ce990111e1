//! Analytical queueing engines.
//!
//! - Fraction: continued-fraction rational approximation of rates
//! - M/M/c/K: steady-state characteristics of Markovian queues
//! - D/D/1/K: transient and long-run behaviour of deterministic queues

pub mod dd1k;
pub mod fraction;
pub mod mmck;

pub use dd1k::{
    build_dd1k, build_dd1k_with, BalkingQueue, CustomerWait, Dd1kBase, Dd1kCharacteristics,
    DeterministicQueue, DrainingQueue, Regime, TimelineRecord, WaitingTime,
};
pub use fraction::{parse_rate, to_proper_fraction, to_proper_fraction_with, Fraction};
pub use mmck::{mm, mm_with, MmCharacteristics, MmMetrics};
