//! Jidoka (自働化) - Stop-on-error guards for computed characteristics.
//!
//! Every analysis result is inspected before it is handed back. A result that
//! carries a NaN, an infinity, a probability outside `[0, 1]`, a state
//! distribution that does not sum to one, or a Little's Law mismatch stops
//! the line instead of reaching a report or a chart.
//!
//! # Anomaly Types
//!
//! 1. **Non-finite values**: factorial/power overflow for very large `c` or `K`
//! 2. **Probability violations**: `P(n)` outside `[0, 1]` or `ΣP(n) ≠ 1`
//! 3. **Little's Law violations**: `L ≠ λ_eff · W`

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{QueueError, QueueResult};

/// Jidoka guard configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct JidokaConfig {
    /// NaN/Inf detection enabled.
    #[serde(default = "default_true")]
    pub check_finite: bool,
    /// Allowed deviation of `ΣP(n)` from one and of `P(n)` outside `[0, 1]`.
    #[validate(range(min = 0.0, max = 1e-3))]
    #[serde(default = "default_probability_tolerance")]
    pub probability_tolerance: f64,
    /// Allowed relative deviation in `L = λ_eff · W`.
    #[validate(range(min = 0.0, max = 1e-3))]
    #[serde(default = "default_littles_law_tolerance")]
    pub littles_law_tolerance: f64,
}

const fn default_true() -> bool {
    true
}

const fn default_probability_tolerance() -> f64 {
    1e-9
}

const fn default_littles_law_tolerance() -> f64 {
    1e-9
}

impl Default for JidokaConfig {
    fn default() -> Self {
        Self {
            check_finite: true,
            probability_tolerance: default_probability_tolerance(),
            littles_law_tolerance: default_littles_law_tolerance(),
        }
    }
}

/// Jidoka guard for computed outputs.
///
/// # Example
///
/// ```rust
/// use queuecalc::jidoka::{JidokaConfig, JidokaGuard};
///
/// let guard = JidokaGuard::new(JidokaConfig::default());
/// assert!(guard.check_value("rho", 0.5).is_ok());
/// assert!(guard.check_value("rho", f64::NAN).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct JidokaGuard {
    config: JidokaConfig,
}

impl Default for JidokaGuard {
    fn default() -> Self {
        Self::new(JidokaConfig::default())
    }
}

impl JidokaGuard {
    /// Create a new Jidoka guard with given configuration.
    #[must_use]
    pub const fn new(config: JidokaConfig) -> Self {
        Self { config }
    }

    /// Check a single value for NaN/Inf.
    ///
    /// # Errors
    ///
    /// Returns `NonFiniteValue` naming `location`.
    pub fn check_value(&self, location: &str, value: f64) -> QueueResult<f64> {
        if self.config.check_finite && !value.is_finite() {
            return Err(QueueError::NonFiniteValue {
                location: location.to_string(),
            });
        }
        Ok(value)
    }

    /// Check that a value is a probability.
    ///
    /// # Errors
    ///
    /// Returns `NonFiniteValue` or `ConstraintViolation`.
    pub fn check_probability(&self, location: &str, p: f64) -> QueueResult<f64> {
        self.check_value(location, p)?;
        let tolerance = self.config.probability_tolerance;
        let violation = if p < 0.0 {
            -p
        } else if p > 1.0 {
            p - 1.0
        } else {
            0.0
        };
        if violation > tolerance {
            return Err(QueueError::ConstraintViolation {
                name: format!("{location} in [0, 1]"),
                violation,
                tolerance,
            });
        }
        Ok(p)
    }

    /// Check that a state distribution sums to one.
    ///
    /// # Errors
    ///
    /// Returns `ConstraintViolation` if `|ΣP(n) − 1|` exceeds the tolerance.
    pub fn check_distribution(&self, location: &str, probabilities: &[f64]) -> QueueResult<()> {
        for (n, &p) in probabilities.iter().enumerate() {
            self.check_probability(&format!("{location}[{n}]"), p)?;
        }
        let total: f64 = probabilities.iter().sum();
        let violation = (total - 1.0).abs();
        if violation > self.config.probability_tolerance * probabilities.len().max(1) as f64 {
            return Err(QueueError::ConstraintViolation {
                name: format!("sum({location}) = 1"),
                violation,
                tolerance: self.config.probability_tolerance,
            });
        }
        Ok(())
    }

    /// Check Little's Law `L = λ·W` for a named pair.
    ///
    /// # Errors
    ///
    /// Returns `ConstraintViolation` if the relative mismatch exceeds the
    /// tolerance.
    pub fn check_littles_law(&self, name: &str, l: f64, lambda: f64, w: f64) -> QueueResult<()> {
        let expected = lambda * w;
        let scale = l.abs().max(expected.abs()).max(1.0);
        let violation = (l - expected).abs() / scale;
        if violation > self.config.littles_law_tolerance {
            return Err(QueueError::ConstraintViolation {
                name: format!("Little's Law ({name})"),
                violation,
                tolerance: self.config.littles_law_tolerance,
            });
        }
        Ok(())
    }
}
