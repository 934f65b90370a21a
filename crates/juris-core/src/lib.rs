//! # juris-core — Foundational Types for the Juris Court
//!
//! This crate defines the primitives every other Juris crate builds on.
//! It depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** `AccountId`, `TermId`,
//!    `DisputeId`, `RoundId`, `VoteId`, `BlockNumber`. A term id cannot be
//!    passed where a dispute id is expected.
//!
//! 2. **Checked token arithmetic.** `Amount` wraps `u128` and only exposes
//!    checked operations returning [`ArithmeticError`]. Amounts serialize as
//!    decimal strings so JSON consumers never round them through floats.
//!
//! 3. **UTC-only timestamps.** `Timestamp` is second-precision UTC, matching
//!    the granularity at which the court clock counts terms.
//!
//! 4. **One hash function.** Randomness derivation and vote commitments all
//!    go through SHA-256 via [`Sha256Accumulator`].
//!
//! ## Crate Policy
//!
//! - No dependencies on other `juris-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod amount;
pub mod digest;
pub mod error;
pub mod identity;
pub mod temporal;

pub use amount::Amount;
pub use digest::{Randomness, Sha256Accumulator};
pub use error::{ArithmeticError, ValidationError};
pub use identity::{AccountId, DisputeId, RoundId, TermId, VoteId};
pub use temporal::{BlockNumber, Timestamp};
