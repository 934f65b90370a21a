//! # juris-court — Stake-Weighted Dispute Resolution
//!
//! Implements the court lifecycle:
//!
//! - **Clock** (`clock.rs`): Fixed-duration terms created lazily by
//!   heartbeats, each carrying a stake-supply snapshot and a randomness seed
//!   taken from the hash of the block after its creation.
//!
//! - **Draft** (`draft.rs`): Stake-weighted sortition over a term's active
//!   stake snapshot, seeded by the draft term's randomness.
//!
//! - **Disputes** (`dispute.rs`, `court.rs`): Dispute and round model; round
//!   phases (commit, reveal, appeal, confirm) derived from term ids; appeals
//!   that escalate panel size up to an open final round.
//!
//! - **Fees** (`fees.rs`): Deposits, locks and final-round weights.
//!
//! - **Settlement** (`settlement.rs`): Ordered penalty settlement, coherent
//!   juror rewards and appeal-deposit distribution.
//!
//! - **Drip** (`drip.rs`): Periodic donations into the subscriptions pool.
//!
//! - **Collaborators** (`collaborators.rs`, `memory.rs`): Traits for the
//!   chain, juror registry, voting, accounting and subscriptions, with
//!   in-memory implementations.
//!
//! ## Crate Policy
//!
//! - Depends on `juris-core` only internally.
//! - Every amount goes through checked arithmetic.
//! - A failed operation leaves court state unchanged.
//! - Every observable state change emits a [`CourtEvent`] and a `tracing` record.

pub mod access;
pub mod clock;
pub mod collaborators;
pub mod config;
pub mod court;
pub mod dispute;
pub mod draft;
pub mod drip;
pub mod error;
pub mod events;
pub mod fees;
pub mod memory;
pub mod settlement;

pub use access::{Capability, Operation};
pub use clock::{CourtClock, Term};
pub use collaborators::{Accounting, Chain, Environment, JurorRegistry, Subscriptions, Voting};
pub use config::{CourtConfig, FeeSchedule, RoundDurations, UnconfirmedAppealPolicy};
pub use court::{Court, NextRoundPlan};
pub use dispute::{
    AdjudicationRound, AdjudicationState, Appeal, Dispute, DisputeState, Outcome, RoundJuror,
    RoundKind,
};
pub use drip::DonatedFeesDrip;
pub use error::{CollaboratorError, ConfigError, CourtError, ErrorClass};
pub use events::{CourtEvent, EventLog};
pub use fees::{FeeEconomics, RoundFees};
pub use memory::{commitment_for, InMemoryEnvironment};
pub use settlement::JurorReward;
