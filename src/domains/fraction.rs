//! Exact rational numbers and continued-fraction approximation.
//!
//! # Governing Algorithm
//!
//! ```text
//! Convergent recurrence:
//!
//!   a_i = ⌊b_i⌋
//!   h_i = a_i·h_{i-1} + h_{i-2}      h_{-1} = 1, h_{-2} = 0
//!   k_i = a_i·k_{i-1} + k_{i-2}      k_{-1} = 0, k_{-2} = 1
//!   b_{i+1} = 1 / (b_i − a_i)
//!
//! Stop when |x − h_i/k_i| ≤ |x| · tolerance.
//! ```
//!
//! Rates entered by users (`2.4`, `1/6`, `0.333…`) are turned into reduced
//! fractions so the D/D/1/K engine can reason with integers only.

use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::config::FractionConfig;
use crate::error::{QueueError, QueueResult};

/// A reduced fraction with a positive denominator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Fraction {
    numerator: i64,
    denominator: i64,
}

const fn gcd(mut a: i128, mut b: i128) -> i128 {
    if a < 0 {
        a = -a;
    }
    if b < 0 {
        b = -b;
    }
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

impl Fraction {
    /// Zero.
    pub const ZERO: Self = Self {
        numerator: 0,
        denominator: 1,
    };

    /// One.
    pub const ONE: Self = Self {
        numerator: 1,
        denominator: 1,
    };

    /// Create a reduced fraction.
    ///
    /// # Errors
    ///
    /// Returns an invalid-input error if `denominator` is zero.
    pub fn new(numerator: i64, denominator: i64) -> QueueResult<Self> {
        Self::from_i128(i128::from(numerator), i128::from(denominator))
    }

    /// Create a reduced fraction from wide integers.
    ///
    /// # Errors
    ///
    /// Returns an error if `denominator` is zero or the reduced terms do not
    /// fit in `i64`.
    pub fn from_i128(numerator: i128, denominator: i128) -> QueueResult<Self> {
        if denominator == 0 {
            return Err(QueueError::invalid_input(
                "denominator",
                "must not be zero",
            ));
        }
        let sign = if denominator < 0 { -1 } else { 1 };
        let divisor = gcd(numerator, denominator).max(1);
        let numerator = i64::try_from(sign * numerator / divisor)
            .map_err(|_| QueueError::overflow("fraction numerator"))?;
        let denominator = i64::try_from(sign * denominator / divisor)
            .map_err(|_| QueueError::overflow("fraction denominator"))?;
        Ok(Self {
            numerator,
            denominator,
        })
    }

    /// Create a whole-number fraction.
    #[must_use]
    pub const fn from_integer(value: i64) -> Self {
        Self {
            numerator: value,
            denominator: 1,
        }
    }

    /// Numerator (carries the sign).
    #[must_use]
    pub const fn numerator(&self) -> i64 {
        self.numerator
    }

    /// Denominator (always positive).
    #[must_use]
    pub const fn denominator(&self) -> i64 {
        self.denominator
    }

    /// Convert to floating point.
    #[must_use]
    pub fn to_f64(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    /// Largest integer not above the value.
    #[must_use]
    pub const fn floor(&self) -> i64 {
        self.numerator.div_euclid(self.denominator)
    }

    /// Smallest integer not below the value.
    #[must_use]
    pub const fn ceil(&self) -> i64 {
        let floor = self.floor();
        if self.numerator.rem_euclid(self.denominator) == 0 {
            floor
        } else {
            floor + 1
        }
    }

    /// Whether the fraction is a whole number.
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        self.denominator == 1
    }

    /// Whether the value is strictly positive.
    #[must_use]
    pub const fn is_positive(&self) -> bool {
        self.numerator > 0
    }

    /// Reciprocal `q/p`.
    ///
    /// # Errors
    ///
    /// Returns an error for zero.
    pub fn recip(&self) -> QueueResult<Self> {
        Self::new(self.denominator, self.numerator)
    }

    /// LaTeX rendering: `p` when integral, `\frac{p}{q}` otherwise.
    #[must_use]
    pub fn to_latex(&self) -> String {
        if self.is_integer() {
            self.numerator.to_string()
        } else {
            format!("\\frac{{{}}}{{{}}}", self.numerator, self.denominator)
        }
    }
}

impl PartialOrd for Fraction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Fraction {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = i128::from(self.numerator) * i128::from(other.denominator);
        let rhs = i128::from(other.numerator) * i128::from(self.denominator);
        lhs.cmp(&rhs)
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_integer() {
            write!(f, "{}", self.numerator)
        } else {
            write!(f, "{}/{}", self.numerator, self.denominator)
        }
    }
}

impl FromStr for Fraction {
    type Err = QueueError;

    /// Parse `"p/q"`, `"n"` or a decimal such as `"2.4"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if let Some((num, den)) = text.split_once('/') {
            if let (Ok(num), Ok(den)) = (num.trim().parse::<i64>(), den.trim().parse::<i64>()) {
                return Self::new(num, den);
            }
        } else if let Ok(value) = text.parse::<i64>() {
            return Ok(Self::from_integer(value));
        }
        let value = parse_rate("value", text)?;
        to_proper_fraction(value)
    }
}

/// Evaluate a user-entered rate: a decimal (`2.4`) or a ratio (`1/6`).
///
/// # Errors
///
/// Returns an invalid-input error naming `parameter` when the text is not a
/// finite number or ratio.
pub fn parse_rate(parameter: &str, text: &str) -> QueueResult<f64> {
    let invalid = || QueueError::invalid_input(parameter, "must be a number or a ratio such as 1/6");
    let text = text.trim();
    let value = match text.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().map_err(|_| invalid())?;
            let den: f64 = den.trim().parse().map_err(|_| invalid())?;
            if den == 0.0 {
                return Err(invalid());
            }
            num / den
        }
        None => text.parse().map_err(|_| invalid())?,
    };
    if value.is_finite() {
        Ok(value)
    } else {
        Err(invalid())
    }
}

/// Best rational approximation of `decimal` with the default tolerance
/// (1e-6 relative) and depth cap.
///
/// # Errors
///
/// See [`to_proper_fraction_with`].
pub fn to_proper_fraction(decimal: f64) -> QueueResult<Fraction> {
    to_proper_fraction_with(decimal, &FractionConfig::default())
}

/// Best rational approximation of `decimal` by continued-fraction
/// convergents.
///
/// # Errors
///
/// - `InvalidInput` for NaN or infinite input
/// - `ArithmeticOverflow` when a convergent no longer fits in `i64`
/// - `NoConvergence` when `config.max_iterations` convergents are not enough
pub fn to_proper_fraction_with(decimal: f64, config: &FractionConfig) -> QueueResult<Fraction> {
    if !decimal.is_finite() {
        return Err(QueueError::invalid_input("decimal", "must be a finite number"));
    }
    if decimal == 0.0 {
        return Ok(Fraction::ZERO);
    }

    let target = decimal.abs() * config.tolerance;
    let (mut h1, mut h2): (i64, i64) = (1, 0);
    let (mut k1, mut k2): (i64, i64) = (0, 1);
    let mut b = decimal;

    for depth in 1..=config.max_iterations {
        let a = b.floor();
        if a.abs() >= i64::MAX as f64 {
            return Err(QueueError::overflow("continued fraction term"));
        }
        let a = a as i64;

        let h = a
            .checked_mul(h1)
            .and_then(|v| v.checked_add(h2))
            .ok_or_else(|| QueueError::overflow("continued fraction numerator"))?;
        let k = a
            .checked_mul(k1)
            .and_then(|v| v.checked_add(k2))
            .ok_or_else(|| QueueError::overflow("continued fraction denominator"))?;
        h2 = h1;
        h1 = h;
        k2 = k1;
        k1 = k;

        let remainder = b - a as f64;
        if (decimal - h1 as f64 / k1 as f64).abs() <= target || remainder <= f64::EPSILON {
            debug!(decimal, depth, numerator = h1, denominator = k1, "fraction converged");
            return Fraction::new(h1, k1);
        }
        b = 1.0 / remainder;
    }

    Err(QueueError::no_convergence(
        format!("continued fraction of {decimal}"),
        config.max_iterations,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frac(n: i64, d: i64) -> Fraction {
        Fraction::new(n, d).expect("valid fraction")
    }

    #[test]
    fn test_new_reduces_and_normalizes_sign() {
        let f = frac(6, -8);
        assert_eq!(f.numerator(), -3);
        assert_eq!(f.denominator(), 4);
        assert_eq!(frac(10, 5), Fraction::from_integer(2));
    }

    #[test]
    fn test_new_rejects_zero_denominator() {
        assert!(Fraction::new(1, 0).is_err());
        assert!(Fraction::ZERO.recip().is_err());
    }

    #[test]
    fn test_floor_and_ceil() {
        assert_eq!(frac(7, 2).floor(), 3);
        assert_eq!(frac(7, 2).ceil(), 4);
        assert_eq!(frac(-7, 2).floor(), -4);
        assert_eq!(frac(-7, 2).ceil(), -3);
        assert_eq!(frac(6, 2).ceil(), 3);
    }

    #[test]
    fn test_ordering_is_exact() {
        assert!(frac(1, 3) < frac(334, 1000));
        assert!(frac(2, 3) > frac(666_666, 1_000_000));
        assert_eq!(frac(2, 4).cmp(&frac(1, 2)), Ordering::Equal);
    }

    #[test]
    fn test_display_and_latex() {
        assert_eq!(frac(5, 6).to_string(), "5/6");
        assert_eq!(frac(12, 4).to_string(), "3");
        assert_eq!(frac(5, 6).to_latex(), "\\frac{5}{6}");
        assert_eq!(frac(4, 1).to_latex(), "4");
    }

    #[test]
    fn test_from_str_variants() {
        assert_eq!("1/6".parse::<Fraction>().expect("ratio"), frac(1, 6));
        assert_eq!(" 4 / 8 ".parse::<Fraction>().expect("ratio"), frac(1, 2));
        assert_eq!("60".parse::<Fraction>().expect("int"), Fraction::from_integer(60));
        assert_eq!("2.4".parse::<Fraction>().expect("decimal"), frac(12, 5));
        assert!("abc".parse::<Fraction>().is_err());
        assert!("1/0".parse::<Fraction>().is_err());
    }

    #[test]
    fn test_parse_rate() {
        assert!((parse_rate("μ", "1/6").expect("ratio") - 1.0 / 6.0).abs() < 1e-15);
        assert!((parse_rate("μ", "2.5/5").expect("ratio") - 0.5).abs() < 1e-15);
        assert!((parse_rate("μ", " 2.4 ").expect("decimal") - 2.4).abs() < 1e-15);

        let err = parse_rate("μ", "x").unwrap_err();
        assert!(err.to_string().starts_with("μ:"));
        assert!(parse_rate("μ", "1/0").is_err());
        assert!(parse_rate("μ", "inf").is_err());
    }

    #[test]
    fn test_to_proper_fraction_integers() {
        assert_eq!(to_proper_fraction(50.0).expect("int"), Fraction::from_integer(50));
        assert_eq!(to_proper_fraction(1.0).expect("int"), Fraction::ONE);
        assert_eq!(to_proper_fraction(0.0).expect("zero"), Fraction::ZERO);
    }

    #[test]
    fn test_to_proper_fraction_known_ratios() {
        assert_eq!(to_proper_fraction(2.4).expect("2.4"), frac(12, 5));
        assert_eq!(to_proper_fraction(1.0 / 6.0).expect("1/6"), frac(1, 6));
        assert_eq!(to_proper_fraction(5.0 / 6.0).expect("5/6"), frac(5, 6));
        assert_eq!(to_proper_fraction(0.125).expect("1/8"), frac(1, 8));
        assert_eq!(to_proper_fraction(1.5).expect("3/2"), frac(3, 2));
    }

    #[test]
    fn test_to_proper_fraction_negative() {
        assert_eq!(to_proper_fraction(-0.75).expect("-3/4"), frac(-3, 4));
    }

    #[test]
    fn test_to_proper_fraction_pi_within_tolerance() {
        let pi = to_proper_fraction(std::f64::consts::PI).expect("pi");
        let error = (pi.to_f64() - std::f64::consts::PI).abs();
        assert!(error <= std::f64::consts::PI * 1e-6, "error {error}");
        // 355/113 is the first convergent inside 1e-6.
        assert_eq!(pi, frac(355, 113));
    }

    #[test]
    fn test_to_proper_fraction_near_integer_terminates() {
        let f = to_proper_fraction(3.000_000_000_000_000_4).expect("near integer");
        assert_eq!(f, Fraction::from_integer(3));
    }

    #[test]
    fn test_to_proper_fraction_rejects_non_finite() {
        assert!(to_proper_fraction(f64::NAN).is_err());
        assert!(to_proper_fraction(f64::INFINITY).is_err());
    }

    #[test]
    fn test_to_proper_fraction_depth_cap() {
        let config = FractionConfig {
            tolerance: 1e-12,
            max_iterations: 2,
        };
        let err = to_proper_fraction_with(std::f64::consts::PI, &config).unwrap_err();
        assert!(matches!(err, QueueError::NoConvergence { iterations: 2, .. }));
    }

    #[test]
    fn test_to_proper_fraction_loose_tolerance() {
        let config = FractionConfig {
            tolerance: 1e-2,
            max_iterations: 64,
        };
        assert_eq!(
            to_proper_fraction_with(std::f64::consts::PI, &config).expect("pi"),
            frac(22, 7)
        );
    }
}
