//! Decimal token amounts.
//!
//! Balances, fees and stake values are non-negative decimal strings on the
//! wire. `Amount` wraps `rust_decimal::Decimal`, which serializes as a
//! string, giving exact decimal arithmetic for debits, credits and the
//! proposal-fee split.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::str::FromStr;

/// An exact decimal token amount.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(Decimal);

impl Amount {
    /// The zero amount.
    pub fn zero() -> Self {
        Amount(Decimal::ZERO)
    }

    pub fn new(d: Decimal) -> Self {
        Amount(d)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Lossy conversion for the float-based proposal tallies.
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(0.0)
    }

    /// Lossy construction from a float tally or split fraction.
    pub fn from_f64_lossy(v: f64) -> Self {
        Amount(Decimal::from_f64(v).unwrap_or_default())
    }

    /// Multiplies by a float fraction, used for the proposal-fee split.
    pub fn mul_f64(&self, f: f64) -> Amount {
        Amount(self.0 * Decimal::from_f64(f).unwrap_or_default())
    }

    pub fn inner(&self) -> Decimal {
        self.0
    }
}

impl From<u64> for Amount {
    fn from(v: u64) -> Self {
        Amount(Decimal::from(v))
    }
}

impl FromStr for Amount {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s).map(Amount)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Add for Amount {
    type Output = Amount;
    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0 + rhs.0)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Amount) {
        self.0 += rhs.0;
    }
}

impl Sub for Amount {
    type Output = Amount;
    fn sub(self, rhs: Amount) -> Amount {
        Amount(self.0 - rhs.0)
    }
}

impl SubAssign for Amount {
    fn sub_assign(&mut self, rhs: Amount) {
        self.0 -= rhs.0;
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Amount {
        iter.fold(Amount::zero(), |acc, a| acc + a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_prints_decimal_strings() {
        let a: Amount = "10.5".parse().unwrap();
        assert_eq!(a.to_string(), "10.5");
        assert!(!a.is_negative());
        assert!("abc".parse::<Amount>().is_err());
    }

    #[test]
    fn exact_arithmetic() {
        let a: Amount = "0.1".parse().unwrap();
        let b: Amount = "0.2".parse().unwrap();
        assert_eq!((a + b).to_string(), "0.3");
        let c: Amount = "100".parse().unwrap();
        assert_eq!((c - a).to_string(), "99.9");
    }

    #[test]
    fn serializes_as_string() {
        let a: Amount = "3.25".parse().unwrap();
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, "\"3.25\"");
        let back: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(back, a);
    }
}
