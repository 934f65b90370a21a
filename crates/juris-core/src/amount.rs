//! # Token Amounts
//!
//! `Amount` is a non-negative count of the smallest token unit. All
//! arithmetic is checked; an operation that would wrap returns an
//! [`ArithmeticError`] naming the operation instead.
//!
//! Amounts serialize as decimal strings (`"1000000000000000000"`) so values
//! above 2^53 survive JSON consumers that parse numbers as doubles.
//! Deserialization accepts either a string or a bare integer.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ArithmeticError, ValidationError};

/// A token amount in base units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(u128);

impl Amount {
    /// Zero tokens.
    pub const ZERO: Amount = Amount(0);

    /// Wrap a raw base-unit count.
    pub const fn new(units: u128) -> Self {
        Self(units)
    }

    /// The raw base-unit count.
    pub const fn units(self) -> u128 {
        self.0
    }

    /// Whether this amount is zero.
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// `self + rhs`.
    pub fn checked_add(self, rhs: Amount) -> Result<Amount, ArithmeticError> {
        self.0
            .checked_add(rhs.0)
            .map(Amount)
            .ok_or(ArithmeticError::Overflow { op: "amount add" })
    }

    /// `self - rhs`.
    pub fn checked_sub(self, rhs: Amount) -> Result<Amount, ArithmeticError> {
        self.0
            .checked_sub(rhs.0)
            .map(Amount)
            .ok_or(ArithmeticError::Underflow { op: "amount sub" })
    }

    /// `self + rhs`, clamped at the maximum.
    pub fn saturating_add(self, rhs: Amount) -> Amount {
        Amount(self.0.saturating_add(rhs.0))
    }

    /// `self - rhs`, clamped at zero.
    pub fn saturating_sub(self, rhs: Amount) -> Amount {
        Amount(self.0.saturating_sub(rhs.0))
    }

    /// `self * factor`.
    pub fn checked_mul(self, factor: u128) -> Result<Amount, ArithmeticError> {
        self.0
            .checked_mul(factor)
            .map(Amount)
            .ok_or(ArithmeticError::Overflow { op: "amount mul" })
    }

    /// `self / divisor`, rounding down.
    pub fn checked_div(self, divisor: u128) -> Result<Amount, ArithmeticError> {
        self.0
            .checked_div(divisor)
            .map(Amount)
            .ok_or(ArithmeticError::DivisionByZero { op: "amount div" })
    }

    /// `self * numerator / denominator`, rounding down.
    ///
    /// Used for every pro-rata share (reward splits, percentages, yields).
    pub fn mul_div(self, numerator: u128, denominator: u128) -> Result<Amount, ArithmeticError> {
        if denominator == 0 {
            return Err(ArithmeticError::DivisionByZero { op: "amount mul_div" });
        }
        let product = self
            .0
            .checked_mul(numerator)
            .ok_or(ArithmeticError::Overflow { op: "amount mul_div" })?;
        Ok(Amount(product / denominator))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u128>()
            .map(Amount)
            .map_err(|e| ValidationError::InvalidAmount {
                value: s.to_string(),
                reason: e.to_string(),
            })
    }
}

impl From<u64> for Amount {
    fn from(units: u64) -> Self {
        Amount(u128::from(units))
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AmountVisitor;

        impl<'de> Visitor<'de> for AmountVisitor {
            type Value = Amount;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative integer or decimal string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
                Ok(Amount::from(v))
            }

            fn visit_u128<E: de::Error>(self, v: u128) -> Result<Amount, E> {
                Ok(Amount(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
                u128::try_from(v)
                    .map(Amount)
                    .map_err(|_| E::custom(format!("negative amount: {v}")))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
                v.parse::<Amount>().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(AmountVisitor)
    }
}
