//! # Error Types — Structured Error Hierarchy
//!
//! Errors shared by every Juris crate. All errors use `thiserror`.
//!
//! ## Design
//!
//! - Validation errors name the offending value and the rule it broke.
//! - Arithmetic errors name the operation that would have overflowed, so a
//!   failed fee computation can be traced back to its formula.

use thiserror::Error;

/// A domain primitive was constructed from an invalid value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Account identifier is empty, too long, or uses forbidden characters.
    #[error("invalid account id {value:?}: {reason}")]
    InvalidAccountId {
        /// The rejected input.
        value: String,
        /// Which rule the input broke.
        reason: &'static str,
    },

    /// Unix timestamp is outside the range chrono can represent.
    #[error("invalid unix timestamp: {0}")]
    InvalidTimestamp(i64),

    /// Decimal amount string could not be parsed.
    #[error("invalid amount {value:?}: {reason}")]
    InvalidAmount {
        /// The rejected input.
        value: String,
        /// Parser diagnostic.
        reason: String,
    },
}

/// Checked arithmetic failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArithmeticError {
    /// Result exceeds the representable maximum.
    #[error("overflow in {op}")]
    Overflow {
        /// Operation that overflowed.
        op: &'static str,
    },

    /// Result would be negative.
    #[error("underflow in {op}")]
    Underflow {
        /// Operation that underflowed.
        op: &'static str,
    },

    /// Divisor was zero.
    #[error("division by zero in {op}")]
    DivisionByZero {
        /// Operation with the zero divisor.
        op: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_names_the_value() {
        let err = ValidationError::InvalidTimestamp(-1);
        assert!(err.to_string().contains("-1"));
    }

    #[test]
    fn arithmetic_error_names_the_operation() {
        let err = ArithmeticError::Overflow { op: "draft deposit" };
        assert_eq!(err.to_string(), "overflow in draft deposit");
    }
}
