//! # External Collaborators
//!
//! The court owns time, disputes and settlement. Everything else it consumes
//! through these traits:
//!
//! | Trait | Provides |
//! |-------|----------|
//! | [`Chain`] | block timestamp, block number, recent block hashes |
//! | [`JurorRegistry`] | per-term active stake, stake locks, slashing |
//! | [`Voting`] | commit/reveal storage and tallying |
//! | [`Accounting`] | token balances and court custody |
//! | [`Subscriptions`] | fee subscription status and the donation pool |
//!
//! ## Design Choice
//!
//! Dependencies point one way. The court holds its collaborators through
//! an [`Environment`] handed over at construction; collaborators never hold
//! a reference back to the court. Votes reach the voting component through
//! the court, which checks round state and juror weight before forwarding.
//!
//! Deterministic in-memory implementations live in [`crate::memory`].

use juris_core::{AccountId, Amount, BlockNumber, TermId, Timestamp, VoteId};

use crate::dispute::Outcome;
use crate::error::CollaboratorError;

/// Read access to the underlying chain.
pub trait Chain {
    /// Timestamp of the current block.
    fn now(&self) -> Timestamp;

    /// Height of the current block.
    fn block_number(&self) -> BlockNumber;

    /// Hash of a past block, or `None` if `block` is not mined yet or too
    /// old to retrieve.
    fn block_hash(&self, block: BlockNumber) -> Option<[u8; 32]>;
}

/// Juror stake bookkeeping.
pub trait JurorRegistry {
    /// Stake `juror` has active at `term`.
    fn active_stake_of(&self, juror: &AccountId, term: TermId) -> Amount;

    /// Sum of every juror's active stake at `term`.
    fn total_active_stake_at(&self, term: TermId) -> Amount;

    /// Every juror with non-zero active stake at `term`, sorted by account.
    fn stake_snapshot(&self, term: TermId) -> Vec<(AccountId, Amount)>;

    /// Total staked token supply right now.
    fn stake_supply(&self) -> Amount;

    /// Part of `juror`'s active stake at `term` not held by any lock.
    fn unlocked_stake_of(&self, juror: &AccountId, term: TermId) -> Amount;

    /// Lock `amount` of `juror`'s active stake at `term`.
    ///
    /// Fails with [`CollaboratorError::InsufficientStake`], locking nothing,
    /// when the juror's unlocked stake cannot cover all of it.
    fn lock_stake(
        &mut self,
        juror: &AccountId,
        amount: Amount,
        term: TermId,
    ) -> Result<(), CollaboratorError>;

    /// Release previously locked stake.
    fn unlock_stake(&mut self, juror: &AccountId, amount: Amount) -> Result<(), CollaboratorError>;

    /// Remove locked stake from `juror` from `effective_term` onwards. The
    /// tokens move to the court.
    fn slash_locked(
        &mut self,
        juror: &AccountId,
        amount: Amount,
        effective_term: TermId,
    ) -> Result<(), CollaboratorError>;

    /// Credit `amount` of court-held tokens to `juror`'s available balance.
    fn reward(&mut self, juror: &AccountId, amount: Amount) -> Result<(), CollaboratorError>;

    /// Destroy `amount` of court-held tokens.
    fn burn(&mut self, amount: Amount) -> Result<(), CollaboratorError>;
}

/// Commit-reveal vote storage.
pub trait Voting {
    /// Open a vote with `possible_rulings` real rulings.
    fn create(&mut self, vote: VoteId, possible_rulings: u8) -> Result<(), CollaboratorError>;

    /// Record a voter's sealed commitment.
    fn commit(
        &mut self,
        vote: VoteId,
        voter: &AccountId,
        commitment: [u8; 32],
    ) -> Result<(), CollaboratorError>;

    /// Open a commitment and count it with `weight`.
    fn reveal(
        &mut self,
        vote: VoteId,
        voter: &AccountId,
        outcome: Outcome,
        salt: &[u8; 32],
        weight: u64,
    ) -> Result<(), CollaboratorError>;

    /// Outcome with the most revealed weight; [`Outcome::REFUSED`] when
    /// nobody revealed. Ties go to the lower outcome.
    fn winning_outcome(&self, vote: VoteId) -> Result<Outcome, CollaboratorError>;

    /// What `voter` revealed, or [`Outcome::MISSING`].
    fn voter_outcome(&self, vote: VoteId, voter: &AccountId) -> Result<Outcome, CollaboratorError>;
}

/// Token ledger with a court custody account.
pub trait Accounting {
    /// Move `amount` from `from` into court custody.
    fn collect(&mut self, from: &AccountId, amount: Amount) -> Result<(), CollaboratorError>;

    /// Pay `amount` out of court custody to `to`.
    fn assign(&mut self, to: &AccountId, amount: Amount) -> Result<(), CollaboratorError>;

    /// Move `amount` between two accounts.
    fn transfer(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), CollaboratorError>;

    /// Current balance of `account`.
    fn balance_of(&self, account: &AccountId) -> Amount;

    /// Tokens held in court custody.
    fn custody_balance(&self) -> Amount;
}

/// Fee subscription registry and its donation pool.
pub trait Subscriptions {
    /// Whether `subject` has paid its subscription fees.
    fn is_up_to_date(&self, subject: &AccountId) -> bool;

    /// Subscription period containing `term`.
    fn current_period_id(&self, term: TermId) -> u64;

    /// Account holding the subscriptions pool.
    fn account(&self) -> &AccountId;

    /// Record that `amount` was transferred to the pool as a donation.
    fn deposit_donation(&mut self, amount: Amount) -> Result<(), CollaboratorError>;
}

/// Bundle of collaborators a court runs against.
pub trait Environment {
    /// Chain access.
    type Chain: Chain;
    /// Stake registry.
    type Registry: JurorRegistry;
    /// Vote storage.
    type Voting: Voting;
    /// Token ledger.
    type Accounting: Accounting;
    /// Subscription registry.
    type Subscriptions: Subscriptions;

    /// Chain access.
    fn chain(&self) -> &Self::Chain;
    /// Stake registry.
    fn registry(&self) -> &Self::Registry;
    /// Mutable stake registry.
    fn registry_mut(&mut self) -> &mut Self::Registry;
    /// Vote storage.
    fn voting(&self) -> &Self::Voting;
    /// Mutable vote storage.
    fn voting_mut(&mut self) -> &mut Self::Voting;
    /// Token ledger.
    fn accounting(&self) -> &Self::Accounting;
    /// Mutable token ledger.
    fn accounting_mut(&mut self) -> &mut Self::Accounting;
    /// Subscription registry.
    fn subscriptions(&self) -> &Self::Subscriptions;
    /// Mutable subscription registry.
    fn subscriptions_mut(&mut self) -> &mut Self::Subscriptions;
}
