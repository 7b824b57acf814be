//! Money in integer minor units.
//!
//! Amounts are parsed from decimal text and kept as whole cents from then on, so
//! summing a month of entries never accumulates floating point drift.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};

/// A signed amount of cents.
///
/// Negative amounts are outflows ("spent"), positive amounts inflows ("received").
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Zero cents.
    pub const ZERO: Self = Self(0);

    /// Create an amount from a number of cents.
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Convert a dollar amount to cents, rounding half away from zero.
    ///
    /// The value is rounded on its shortest decimal representation rather than on
    /// the binary product `value * 100`, so `1.005` becomes 101 cents.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidAmount` for non-finite values or values that
    /// overflow `i64` cents.
    pub fn from_f64(value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(ValidationError::InvalidAmount(value.to_string()));
        }
        parse_decimal(&value.to_string())
    }

    /// The amount in cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// The amount in dollars, for display and ratios only.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn in_dollars(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Scale the amount by `factor`, rounding to the nearest cent.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn times(self, factor: f64) -> Self {
        Self((self.0 as f64 * factor).round() as i64)
    }

    /// The absolute amount.
    /// Sum of two amounts, or `None` if it does not fit in cents.
    #[must_use]
    pub const fn checked_add(self, rhs: Self) -> Option<Self> {
        match self.0.checked_add(rhs.0) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }

    #[must_use]
    pub const fn abs(self) -> Self {
        Self(self.0.saturating_abs())
    }

    /// Whether this amount is money leaving the ledger.
    #[must_use]
    pub const fn is_outflow(self) -> bool {
        self.0 < 0
    }

    /// The verb used when reporting this amount.
    #[must_use]
    pub const fn action(self) -> &'static str {
        if self.is_outflow() {
            "spent"
        } else {
            "received"
        }
    }
}

impl FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        // The sign may sit on either side of the dollar sign: "-$5" and "$-5".
        let (sign, unsigned) = if let Some(rest) = trimmed.strip_prefix('-') {
            ("-", rest)
        } else if let Some(rest) = trimmed.strip_prefix('+') {
            ("+", rest)
        } else {
            ("", trimmed)
        };
        let body = format!("{sign}{}", unsigned.strip_prefix('$').unwrap_or(unsigned));
        if body.contains(['e', 'E']) {
            let value: f64 = body
                .parse()
                .map_err(|_| ValidationError::InvalidAmount(s.to_string()))?;
            return Self::from_f64(value);
        }
        parse_decimal(&body).map_err(|_| ValidationError::InvalidAmount(s.to_string()))
    }
}

/// Parse `[-+]digits[.digits]` into cents, rounding half away from zero at the
/// third fractional digit.
fn parse_decimal(s: &str) -> Result<Money> {
    let invalid = || ValidationError::InvalidAmount(s.to_string());

    let (negative, unsigned) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    if !whole.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let mut cents: i64 = 0;
    for digit in whole.bytes().chain(fraction.bytes().chain(std::iter::repeat(b'0')).take(2)) {
        cents = cents
            .checked_mul(10)
            .and_then(|c| c.checked_add(i64::from(digit - b'0')))
            .ok_or_else(invalid)?;
    }
    if fraction.as_bytes().get(2).is_some_and(|d| *d >= b'5') {
        cents = cents.checked_add(1).ok_or_else(invalid)?;
    }

    Ok(Money(if negative { -cents } else { cents }))
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.is_outflow() { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}${}.{:02}", abs / 100, abs % 100)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        Self(self.0.saturating_neg())
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_f64_rounds_half_up() {
        assert_eq!(Money::from_f64(1.005).unwrap().cents(), 101);
        assert_eq!(Money::from_f64(1.23).unwrap().cents(), 123);
        assert_eq!(Money::from_f64(1.345).unwrap().cents(), 135);
        assert_eq!(Money::from_f64(1.004).unwrap().cents(), 100);
        assert_eq!(Money::from_f64(-1.005).unwrap().cents(), -101);
        assert_eq!(Money::from_f64(0.0).unwrap(), Money::ZERO);
    }

    #[test]
    fn from_f64_rejects_non_finite() {
        assert!(Money::from_f64(f64::NAN).is_err());
        assert!(Money::from_f64(f64::INFINITY).is_err());
    }

    #[test]
    fn parse_decimal_strings() {
        assert_eq!("5".parse::<Money>().unwrap().cents(), 500);
        assert_eq!("5.5".parse::<Money>().unwrap().cents(), 550);
        assert_eq!("100.00".parse::<Money>().unwrap().cents(), 10_000);
        assert_eq!(".25".parse::<Money>().unwrap().cents(), 25);
        assert_eq!("-3.10".parse::<Money>().unwrap().cents(), -310);
        assert_eq!("$12.999".parse::<Money>().unwrap().cents(), 1300);
        assert_eq!("1e2".parse::<Money>().unwrap().cents(), 10_000);
    }

    #[test]
    fn parse_rejects_garbage() {
        for input in ["", ".", "abc", "1.2.3", "--1", "1,00", "99999999999999999999"] {
            assert!(input.parse::<Money>().is_err(), "accepted {input:?}");
        }
    }

    #[test]
    fn display_formats_dollars() {
        assert_eq!(Money::from_cents(123).to_string(), "$1.23");
        assert_eq!(Money::from_cents(-120_800).to_string(), "-$1208.00");
        assert_eq!(Money::from_cents(5).to_string(), "$0.05");
    }

    #[test]
    fn arithmetic_stays_in_cents() {
        let total: Money = [-500, -300, -120_000]
            .into_iter()
            .map(Money::from_cents)
            .sum();
        assert_eq!(total.cents(), -120_800);
        assert_eq!(total.abs().cents(), 120_800);
        assert_eq!((-total).cents(), 120_800);
        assert_eq!(Money::from_cents(-1000).times(2.5).cents(), -2500);
        assert_eq!(Money::from_cents(333).times(0.5).cents(), 167);
    }

    #[test]
    fn dollar_sign_after_minus() {
        assert_eq!("-$5".parse::<Money>().unwrap().cents(), -500);
        assert_eq!("$-5".parse::<Money>().unwrap().cents(), -500);
        assert_eq!("+$1.50".parse::<Money>().unwrap().cents(), 150);
        assert!("-$-5".parse::<Money>().is_err());
        assert!("+-5".parse::<Money>().is_err());

        let shown = Money::from_cents(-120_800).to_string();
        assert_eq!(shown.parse::<Money>().unwrap().cents(), -120_800);
    }

    #[test]
    fn overflow_never_panics() {
        let max = Money::from_cents(i64::MAX);
        assert_eq!(max.checked_add(Money::from_cents(1)), None);
        assert_eq!(
            max.checked_add(Money::from_cents(-1)),
            Some(Money::from_cents(i64::MAX - 1))
        );
        assert_eq!((max + max).cents(), i64::MAX);
        assert_eq!((Money::from_cents(i64::MIN) - max).cents(), i64::MIN);
        assert_eq!((-Money::from_cents(i64::MIN)).cents(), i64::MAX);

        let mut total = max;
        total += max;
        assert_eq!(total, max);
        assert_eq!("92233720368547758.07".parse::<Money>().unwrap(), max);
    }

    #[test]
    fn sign_selects_action() {
        assert_eq!(Money::from_cents(-1).action(), "spent");
        assert_eq!(Money::from_cents(1).action(), "received");
        assert!(!Money::ZERO.is_outflow());
    }

    #[test]
    fn serializes_as_integer_cents() {
        let json = serde_json::to_string(&Money::from_cents(-250)).unwrap();
        assert_eq!(json, "-250");
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(back.cents(), -250);
    }
}
