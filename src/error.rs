//! Error types for queuecalc.
//!
//! Every computation returns `Result<T, QueueError>` instead of panicking.
//! A computation either fully succeeds or fully fails; no partial results
//! are ever handed back to the caller.

use thiserror::Error;

/// Result type alias for queuecalc operations.
pub type QueueResult<T> = Result<T, QueueError>;

/// Unified error type for all queuecalc operations.
///
/// # Design
///
/// Errors are:
/// 1. Immediately detectable (type-safe)
/// 2. Self-documenting (descriptive variants)
/// 3. Displayable as-is to an end user (`"M: must be a positive integer"`)
#[derive(Debug, Error)]
pub enum QueueError {
    // ===== Input Errors =====
    /// A model parameter is non-numeric, non-positive, or otherwise malformed.
    #[error("{parameter}: {message}")]
    InvalidInput {
        /// Short parameter name as shown to users (`λ`, `μ`, `c`, `K`, `M`).
        parameter: String,
        /// What is wrong with it.
        message: String,
    },

    /// The D/D/1/K regime is not supported (λ = μ).
    #[error("Unsupported regime: {description}")]
    UnsupportedRegime {
        /// Human-readable description of the rejected configuration.
        description: String,
    },

    // ===== Search Errors =====
    /// A bounded search or expansion hit its iteration cap.
    #[error("Could not converge: {operation} exceeded {iterations} iterations")]
    NoConvergence {
        /// The search that failed.
        operation: String,
        /// Iteration cap that was reached.
        iterations: usize,
    },

    /// Exact integer bookkeeping no longer fits in machine integers.
    #[error("Arithmetic overflow in {location}")]
    ArithmeticOverflow {
        /// Where the overflow happened.
        location: String,
    },

    // ===== Jidoka Violations =====
    /// Numerical instability detected (NaN or Inf).
    #[error("Jidoka: non-finite value detected at {location}")]
    NonFiniteValue {
        /// Location where the non-finite value was detected.
        location: String,
    },

    /// Constraint violation detected.
    #[error("Jidoka: constraint '{name}' violated by {violation:.6e} (tolerance: {tolerance:.6e})")]
    ConstraintViolation {
        /// Name of the violated constraint.
        name: String,
        /// Amount of violation.
        violation: f64,
        /// Configured tolerance.
        tolerance: f64,
    },

    // ===== Configuration Errors =====
    /// Invalid configuration parameter.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// YAML parsing error.
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    // ===== I/O Errors =====
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl QueueError {
    /// Create an invalid-input error for a named parameter.
    #[must_use]
    pub fn invalid_input(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error with a message.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a non-convergence error.
    #[must_use]
    pub fn no_convergence(operation: impl Into<String>, iterations: usize) -> Self {
        Self::NoConvergence {
            operation: operation.into(),
            iterations,
        }
    }

    /// Create an arithmetic overflow error.
    #[must_use]
    pub fn overflow(location: impl Into<String>) -> Self {
        Self::ArithmeticOverflow {
            location: location.into(),
        }
    }

    /// Create a serialization error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    /// Check if this error was caused by the caller's inputs rather than
    /// by the computation itself.
    #[must_use]
    pub const fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput { .. } | Self::UnsupportedRegime { .. }
        )
    }

    /// Check if this error is a Jidoka violation (requires immediate stop).
    #[must_use]
    pub const fn is_jidoka_violation(&self) -> bool {
        matches!(
            self,
            Self::NonFiniteValue { .. } | Self::ConstraintViolation { .. }
        )
    }
}

impl From<serde_json::Error> for QueueError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
