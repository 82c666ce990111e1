//! # queuecalc
//!
//! Closed-form performance characteristics of two queueing families:
//!
//! - **M/M/c/K**: Poisson arrivals, exponential service, `c` servers and an
//!   optional capacity `K`. Steady-state ρ, P0, L, Lq, W and Wq.
//! - **D/D/1/K**: deterministic arrivals and service with one server. Exact
//!   rational transient time, number in system at any instant, per-customer
//!   waiting times and a replayed event trace.
//!
//! Rates are approximated by small rationals ([`domains::to_proper_fraction`])
//! so the deterministic analysis runs in exact integer arithmetic.
//!
//! ## Example
//!
//! ```rust
//! use queuecalc::prelude::*;
//!
//! let bank = mm(60.0, 50.0, 1, None).unwrap();
//! assert!(bank.valid_system);
//!
//! let line = build_dd1k(3.0, 2.0, 3, None).unwrap();
//! assert_eq!(line.regime(), Regime::Oscillating);
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::suboptimal_flops,
    clippy::imprecise_flops,
    clippy::too_many_lines,
    clippy::missing_const_for_fn,
    clippy::many_single_char_names,  // λ/μ bookkeeping reads as a, b, c, d
)]

pub mod cli;
pub mod config;
pub mod domains;
pub mod error;
pub mod jidoka;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::{AnalysisConfig, AnalysisConfigBuilder, ScenarioFile};
    pub use crate::domains::{
        build_dd1k, build_dd1k_with, mm, mm_with, to_proper_fraction, Dd1kCharacteristics,
        DeterministicQueue, Fraction, MmCharacteristics, Regime, WaitingTime,
    };
    pub use crate::error::{QueueError, QueueResult};
    pub use crate::jidoka::{JidokaConfig, JidokaGuard};
}

/// Re-export for public API
pub use error::{QueueError, QueueResult};
