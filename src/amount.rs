//! Signed monetary amount.
//!
//! Wraps `rust_decimal::Decimal` so sums are exact and independent of
//! floating-point rounding. The sign is the only thing that tells a debit
//! from a credit; zero is neither.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

/// A signed decimal amount.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use ledger_ingest::Amount;
///
/// let amount = Amount::from_str("-10.5").unwrap();
/// assert!(amount.is_debit());
/// assert_eq!(amount.to_string(), "-10.5");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    /// Zero value.
    pub const ZERO: Self = Amount(Decimal::ZERO);

    /// Creates an amount from a `Decimal`.
    pub fn new(value: Decimal) -> Self {
        Amount(value)
    }

    /// Returns the underlying decimal.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Strictly negative.
    pub fn is_debit(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Strictly positive.
    pub fn is_credit(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// `None` when the sum leaves the representable range.
    pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_add(rhs.0).map(Amount)
    }

    /// Arithmetic mean of `values`, or zero when there are none.
    ///
    /// When the plain sum would overflow, each value is divided first so the
    /// partial sums stay in range.
    pub fn mean(values: &[Amount]) -> Amount {
        if values.is_empty() {
            return Amount::ZERO;
        }
        let count = Decimal::from(values.len());
        match values
            .iter()
            .try_fold(Decimal::ZERO, |acc, amount| acc.checked_add(amount.0))
        {
            Some(total) => Amount(total / count),
            None => Amount(
                values
                    .iter()
                    .fold(Decimal::ZERO, |acc, amount| acc.saturating_add(amount.0 / count)),
            ),
        }
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount(value)
    }
}

impl FromStr for Amount {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Decimal::from_str(s.trim()).map(Amount)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Amount(self.0 + rhs.0)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sum for Amount {
    /// Folds left to right, so the result only depends on input order.
    ///
    /// Saturates at the decimal bounds. Parsed files never get there: the
    /// parser rejects rows that push the running balance out of range.
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, |acc, amount| Amount(acc.0.saturating_add(amount.0)))
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        rust_decimal::serde::float::deserialize(deserializer).map(Amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amount(s: &str) -> Amount {
        Amount::from_str(s).unwrap()
    }

    #[test]
    fn test_sign_classification() {
        assert!(amount("-0.01").is_debit());
        assert!(!amount("-0.01").is_credit());
        assert!(amount("12").is_credit());
        assert!(!amount("0").is_debit());
        assert!(!amount("0").is_credit());
        assert!(!amount("-0.00").is_debit());
        assert!(amount("-0.00").is_zero());
    }

    #[test]
    fn test_mean() {
        assert_eq!(Amount::mean(&[]), Amount::ZERO);
        assert_eq!(Amount::mean(&[amount("-150"), amount("-50")]), amount("-100"));
        assert_eq!(Amount::mean(&[amount("900.5"), amount("99.5")]), amount("500"));
    }

    #[test]
    fn test_mean_of_huge_values_does_not_overflow() {
        let max = Amount::new(Decimal::MAX);
        let mean = Amount::mean(&[max, max, max]);
        assert!(mean.is_credit());
        assert!((Decimal::MAX - mean.as_decimal()).abs() <= Decimal::ONE);

        let min = Amount::new(Decimal::MIN);
        let mean = Amount::mean(&[min, min]);
        assert!((mean.as_decimal() - Decimal::MIN).abs() <= Decimal::ONE);
    }

    #[test]
    fn test_checked_add() {
        let max = Amount::new(Decimal::MAX);
        assert_eq!(max.checked_add(amount("1")), None);
        assert_eq!(max.checked_add(amount("-1")), Some(Amount::new(Decimal::MAX - Decimal::ONE)));
    }

    #[test]
    fn test_sum_is_exact() {
        let total: Amount = ["0.1", "0.2", "-0.3"].iter().map(|s| amount(s)).sum();
        assert!(total.is_zero());
    }

    #[test]
    fn test_display_normalizes() {
        assert_eq!(amount("500.00").to_string(), "500");
        assert_eq!(amount("-100.50").to_string(), "-100.5");
    }

    #[test]
    fn test_serializes_as_number() {
        let json = serde_json::to_string(&amount("-150.25")).unwrap();
        assert_eq!(json, "-150.25");
    }
}
