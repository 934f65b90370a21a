//! # In-Memory Collaborators
//!
//! Deterministic implementations of every collaborator trait, used by the
//! test suites and by embedders that want to simulate a court without a
//! chain.
//!
//! - [`MockChain`]: settable clock and block height; block hashes are
//!   SHA-256 of the block number and expire after 256 blocks.
//! - [`InMemoryJurorRegistry`]: per-juror stake checkpoints keyed by term.
//! - [`InMemoryVoting`]: commitments are `sha256(outcome || salt)`.
//! - [`InMemoryAccounting`]: balances plus a single court custody pot.
//! - [`InMemorySubscriptions`]: fixed-length periods and an up-to-date set.
//!
//! None of these model token transfer rules, activation delays, or
//! subscription billing. They exist so the court can be exercised end to end.

use std::collections::{BTreeMap, BTreeSet};

use juris_core::{
    AccountId, Amount, BlockNumber, Sha256Accumulator, TermId, Timestamp, ValidationError, VoteId,
};

use crate::collaborators::{Accounting, Chain, Environment, JurorRegistry, Subscriptions, Voting};
use crate::dispute::Outcome;
use crate::error::CollaboratorError;

/// How many past block hashes the chain keeps retrievable.
pub const BLOCK_HASH_WINDOW: u64 = 256;

// ── Chain ──────────────────────────────────────────────────────────────

/// Manually driven chain clock.
#[derive(Debug, Clone)]
pub struct MockChain {
    now: Timestamp,
    block: BlockNumber,
}

impl MockChain {
    /// A chain at block 1 and timestamp `now`.
    pub fn new(now: Timestamp) -> Self {
        Self {
            now,
            block: BlockNumber(1),
        }
    }

    /// Set the block timestamp.
    pub fn set_timestamp(&mut self, now: Timestamp) {
        self.now = now;
    }

    /// Move the block timestamp forward.
    pub fn increase_time(&mut self, secs: u64) -> Result<(), ValidationError> {
        self.now = self.now.checked_add_secs(secs)?;
        Ok(())
    }

    /// Mine `count` blocks.
    pub fn advance_blocks(&mut self, count: u64) {
        self.block = BlockNumber(self.block.0.saturating_add(count));
    }
}

impl Chain for MockChain {
    fn now(&self) -> Timestamp {
        self.now
    }

    fn block_number(&self) -> BlockNumber {
        self.block
    }

    fn block_hash(&self, block: BlockNumber) -> Option<[u8; 32]> {
        if block >= self.block || self.block.0 - block.0 > BLOCK_HASH_WINDOW {
            return None;
        }
        Some(Sha256Accumulator::new().bytes(b"block").u64(block.0).finish())
    }
}

// ── Registry ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
struct JurorAccount {
    /// `(from_term, active_stake)`, ascending by term.
    checkpoints: Vec<(TermId, Amount)>,
    locked: Amount,
    available: Amount,
}

impl JurorAccount {
    fn active_at(&self, term: TermId) -> Amount {
        self.checkpoints
            .iter()
            .rev()
            .find(|(from, _)| *from <= term)
            .map_or(Amount::ZERO, |(_, stake)| *stake)
    }
}

/// Stake registry keeping a checkpoint history per juror.
#[derive(Debug, Clone, Default)]
pub struct InMemoryJurorRegistry {
    jurors: BTreeMap<AccountId, JurorAccount>,
    supply: Amount,
    burned: Amount,
}

impl InMemoryJurorRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `amount` to `juror`'s active stake from `from_term` onwards.
    ///
    /// # Errors
    ///
    /// Returns [`CollaboratorError::CheckpointOutOfOrder`] if the juror
    /// already has a checkpoint after `from_term`.
    pub fn activate(
        &mut self,
        juror: &AccountId,
        amount: Amount,
        from_term: TermId,
    ) -> Result<(), CollaboratorError> {
        let account = self.jurors.entry(juror.clone()).or_default();
        if let Some(&(latest, _)) = account.checkpoints.last() {
            if from_term < latest {
                return Err(CollaboratorError::CheckpointOutOfOrder {
                    juror: juror.to_string(),
                    term: from_term,
                    latest,
                });
            }
        }
        let updated = account.active_at(from_term).checked_add(amount)?;
        let supply = self.supply.checked_add(amount)?;
        match account.checkpoints.last_mut() {
            Some((latest, stake)) if *latest == from_term => *stake = updated,
            _ => account.checkpoints.push((from_term, updated)),
        }
        self.supply = supply;
        Ok(())
    }

    /// Stake currently locked for `juror`.
    pub fn locked_of(&self, juror: &AccountId) -> Amount {
        self.jurors.get(juror).map_or(Amount::ZERO, |a| a.locked)
    }

    /// Rewards credited to `juror`.
    pub fn available_balance_of(&self, juror: &AccountId) -> Amount {
        self.jurors.get(juror).map_or(Amount::ZERO, |a| a.available)
    }

    /// Total tokens burned.
    pub fn burned(&self) -> Amount {
        self.burned
    }

    fn account_mut(&mut self, juror: &AccountId) -> Result<&mut JurorAccount, CollaboratorError> {
        self.jurors
            .get_mut(juror)
            .ok_or_else(|| CollaboratorError::UnknownJuror(juror.to_string()))
    }
}

impl JurorRegistry for InMemoryJurorRegistry {
    fn active_stake_of(&self, juror: &AccountId, term: TermId) -> Amount {
        self.jurors.get(juror).map_or(Amount::ZERO, |a| a.active_at(term))
    }

    fn total_active_stake_at(&self, term: TermId) -> Amount {
        self.jurors
            .values()
            .fold(Amount::ZERO, |sum, a| sum.saturating_add(a.active_at(term)))
    }

    fn stake_snapshot(&self, term: TermId) -> Vec<(AccountId, Amount)> {
        self.jurors
            .iter()
            .map(|(id, a)| (id.clone(), a.active_at(term)))
            .filter(|(_, stake)| !stake.is_zero())
            .collect()
    }

    fn stake_supply(&self) -> Amount {
        self.supply
    }

    fn unlocked_stake_of(&self, juror: &AccountId, term: TermId) -> Amount {
        self.jurors
            .get(juror)
            .map_or(Amount::ZERO, |a| a.active_at(term).saturating_sub(a.locked))
    }

    fn lock_stake(
        &mut self,
        juror: &AccountId,
        amount: Amount,
        term: TermId,
    ) -> Result<(), CollaboratorError> {
        let account = self.account_mut(juror)?;
        let free = account.active_at(term).saturating_sub(account.locked);
        if free < amount {
            return Err(CollaboratorError::InsufficientStake {
                juror: juror.to_string(),
                needed: amount,
                available: free,
            });
        }
        account.locked = account.locked.checked_add(amount)?;
        Ok(())
    }

    fn unlock_stake(&mut self, juror: &AccountId, amount: Amount) -> Result<(), CollaboratorError> {
        let account = self.account_mut(juror)?;
        account.locked = account.locked.saturating_sub(amount);
        Ok(())
    }

    fn slash_locked(
        &mut self,
        juror: &AccountId,
        amount: Amount,
        effective_term: TermId,
    ) -> Result<(), CollaboratorError> {
        let account = self.account_mut(juror)?;
        account.locked = account.locked.saturating_sub(amount);
        let at = account
            .checkpoints
            .partition_point(|(from, _)| *from < effective_term);
        if account.checkpoints.get(at).map(|(from, _)| *from) != Some(effective_term) {
            let stake = account.active_at(effective_term);
            account.checkpoints.insert(at, (effective_term, stake));
        }
        for (_, stake) in account.checkpoints.iter_mut().skip(at) {
            *stake = stake.saturating_sub(amount);
        }
        self.supply = self.supply.saturating_sub(amount);
        Ok(())
    }

    fn reward(&mut self, juror: &AccountId, amount: Amount) -> Result<(), CollaboratorError> {
        let account = self.account_mut(juror)?;
        account.available = account.available.checked_add(amount)?;
        Ok(())
    }

    fn burn(&mut self, amount: Amount) -> Result<(), CollaboratorError> {
        self.burned = self.burned.checked_add(amount)?;
        Ok(())
    }
}

// ── Voting ─────────────────────────────────────────────────────────────

/// Commitment a voter seals before revealing `outcome` with `salt`.
pub fn commitment_for(outcome: Outcome, salt: &[u8; 32]) -> [u8; 32] {
    Sha256Accumulator::new().u8(outcome.0).bytes(salt).finish()
}

#[derive(Debug, Clone, Default)]
struct VoteRecord {
    possible_rulings: u8,
    commitments: BTreeMap<AccountId, [u8; 32]>,
    revealed: BTreeMap<AccountId, Outcome>,
    tally: BTreeMap<Outcome, u64>,
}

/// Commit-reveal vote store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryVoting {
    votes: BTreeMap<VoteId, VoteRecord>,
}

impl InMemoryVoting {
    /// Empty vote store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Revealed weight for `outcome`.
    pub fn tally_of(&self, vote: VoteId, outcome: Outcome) -> u64 {
        self.votes
            .get(&vote)
            .and_then(|v| v.tally.get(&outcome).copied())
            .unwrap_or(0)
    }

    fn record(&self, vote: VoteId) -> Result<&VoteRecord, CollaboratorError> {
        self.votes
            .get(&vote)
            .ok_or_else(|| CollaboratorError::UnknownVote(vote.to_string()))
    }

    fn record_mut(&mut self, vote: VoteId) -> Result<&mut VoteRecord, CollaboratorError> {
        self.votes
            .get_mut(&vote)
            .ok_or_else(|| CollaboratorError::UnknownVote(vote.to_string()))
    }
}

impl Voting for InMemoryVoting {
    fn create(&mut self, vote: VoteId, possible_rulings: u8) -> Result<(), CollaboratorError> {
        if self.votes.contains_key(&vote) {
            return Err(CollaboratorError::DuplicateVote(vote.to_string()));
        }
        self.votes.insert(
            vote,
            VoteRecord {
                possible_rulings,
                ..VoteRecord::default()
            },
        );
        Ok(())
    }

    fn commit(
        &mut self,
        vote: VoteId,
        voter: &AccountId,
        commitment: [u8; 32],
    ) -> Result<(), CollaboratorError> {
        let record = self.record_mut(vote)?;
        if record.commitments.contains_key(voter) {
            return Err(CollaboratorError::AlreadyCommitted {
                vote: vote.to_string(),
                voter: voter.to_string(),
            });
        }
        record.commitments.insert(voter.clone(), commitment);
        Ok(())
    }

    fn reveal(
        &mut self,
        vote: VoteId,
        voter: &AccountId,
        outcome: Outcome,
        salt: &[u8; 32],
        weight: u64,
    ) -> Result<(), CollaboratorError> {
        let record = self.record_mut(vote)?;
        let Some(commitment) = record.commitments.get(voter) else {
            return Err(CollaboratorError::NotCommitted {
                vote: vote.to_string(),
                voter: voter.to_string(),
            });
        };
        if record.revealed.contains_key(voter) {
            return Err(CollaboratorError::AlreadyRevealed {
                vote: vote.to_string(),
                voter: voter.to_string(),
            });
        }
        if !outcome.is_castable(record.possible_rulings) {
            return Err(CollaboratorError::InvalidOutcome {
                vote: vote.to_string(),
                outcome: outcome.0,
            });
        }
        if commitment_for(outcome, salt) != *commitment {
            return Err(CollaboratorError::CommitmentMismatch {
                vote: vote.to_string(),
                voter: voter.to_string(),
            });
        }
        record.revealed.insert(voter.clone(), outcome);
        let tally = record.tally.entry(outcome).or_insert(0);
        *tally = tally.saturating_add(weight);
        Ok(())
    }

    fn winning_outcome(&self, vote: VoteId) -> Result<Outcome, CollaboratorError> {
        let record = self.record(vote)?;
        let mut winner = Outcome::REFUSED;
        let mut best = 0u64;
        for (&outcome, &weight) in &record.tally {
            if weight > best {
                winner = outcome;
                best = weight;
            }
        }
        Ok(winner)
    }

    fn voter_outcome(&self, vote: VoteId, voter: &AccountId) -> Result<Outcome, CollaboratorError> {
        let record = self.record(vote)?;
        Ok(record
            .revealed
            .get(voter)
            .copied()
            .unwrap_or(Outcome::MISSING))
    }
}

// ── Accounting ─────────────────────────────────────────────────────────

/// Token ledger with one custody pot for the court.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAccounting {
    balances: BTreeMap<AccountId, Amount>,
    custody: Amount,
}

impl InMemoryAccounting {
    /// Empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `amount` tokens for `to`.
    pub fn mint(&mut self, to: &AccountId, amount: Amount) -> Result<(), CollaboratorError> {
        let balance = self.balances.entry(to.clone()).or_default();
        *balance = balance.checked_add(amount)?;
        Ok(())
    }

    /// Tokens held by the court.
    pub fn custody(&self) -> Amount {
        self.custody
    }

    fn debit(&mut self, from: &AccountId, amount: Amount) -> Result<(), CollaboratorError> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(CollaboratorError::InsufficientBalance {
                account: from.to_string(),
                needed: amount,
                available,
            });
        }
        self.balances.insert(from.clone(), available.checked_sub(amount)?);
        Ok(())
    }
}

impl Accounting for InMemoryAccounting {
    fn collect(&mut self, from: &AccountId, amount: Amount) -> Result<(), CollaboratorError> {
        let custody = self.custody.checked_add(amount)?;
        self.debit(from, amount)?;
        self.custody = custody;
        Ok(())
    }

    fn assign(&mut self, to: &AccountId, amount: Amount) -> Result<(), CollaboratorError> {
        if self.custody < amount {
            return Err(CollaboratorError::InsufficientCustody {
                needed: amount,
                available: self.custody,
            });
        }
        self.custody = self.custody.checked_sub(amount)?;
        self.mint(to, amount)
    }

    fn transfer(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), CollaboratorError> {
        self.debit(from, amount)?;
        self.mint(to, amount)
    }

    fn balance_of(&self, account: &AccountId) -> Amount {
        self.balances.get(account).copied().unwrap_or_default()
    }

    fn custody_balance(&self) -> Amount {
        self.custody
    }
}

// ── Subscriptions ──────────────────────────────────────────────────────

/// Subscription registry with fixed-length periods.
#[derive(Debug, Clone)]
pub struct InMemorySubscriptions {
    account: AccountId,
    period_duration_terms: u64,
    up_to_date: BTreeSet<AccountId>,
    donations: Amount,
}

impl InMemorySubscriptions {
    /// Registry whose pool lives at `account`, with periods of
    /// `period_duration_terms` terms.
    ///
    /// # Errors
    ///
    /// Returns [`CollaboratorError::ZeroPeriodDuration`] if the period is 0.
    pub fn new(account: AccountId, period_duration_terms: u64) -> Result<Self, CollaboratorError> {
        if period_duration_terms == 0 {
            return Err(CollaboratorError::ZeroPeriodDuration);
        }
        Ok(Self {
            account,
            period_duration_terms,
            up_to_date: BTreeSet::new(),
            donations: Amount::ZERO,
        })
    }

    /// Mark `subject` as paid up (or not).
    pub fn set_up_to_date(&mut self, subject: &AccountId, up_to_date: bool) {
        if up_to_date {
            self.up_to_date.insert(subject.clone());
        } else {
            self.up_to_date.remove(subject);
        }
    }

    /// Total donations received.
    pub fn donations(&self) -> Amount {
        self.donations
    }
}

impl Subscriptions for InMemorySubscriptions {
    fn is_up_to_date(&self, subject: &AccountId) -> bool {
        self.up_to_date.contains(subject)
    }

    fn current_period_id(&self, term: TermId) -> u64 {
        term.0 / self.period_duration_terms
    }

    fn account(&self) -> &AccountId {
        &self.account
    }

    fn deposit_donation(&mut self, amount: Amount) -> Result<(), CollaboratorError> {
        self.donations = self.donations.checked_add(amount)?;
        Ok(())
    }
}

// ── Environment ────────────────────────────────────────────────────────

/// All in-memory collaborators bundled for a [`Court`](crate::Court).
#[derive(Debug, Clone)]
pub struct InMemoryEnvironment {
    /// Chain clock.
    pub chain: MockChain,
    /// Stake registry.
    pub registry: InMemoryJurorRegistry,
    /// Vote store.
    pub voting: InMemoryVoting,
    /// Token ledger.
    pub accounting: InMemoryAccounting,
    /// Subscription registry.
    pub subscriptions: InMemorySubscriptions,
}

impl InMemoryEnvironment {
    /// Fresh environment at `now` with a subscriptions pool at
    /// `subscriptions_account`.
    pub fn new(
        now: Timestamp,
        subscriptions_account: AccountId,
        period_duration_terms: u64,
    ) -> Result<Self, CollaboratorError> {
        Ok(Self {
            chain: MockChain::new(now),
            registry: InMemoryJurorRegistry::new(),
            voting: InMemoryVoting::new(),
            accounting: InMemoryAccounting::new(),
            subscriptions: InMemorySubscriptions::new(subscriptions_account, period_duration_terms)?,
        })
    }
}

impl Environment for InMemoryEnvironment {
    type Chain = MockChain;
    type Registry = InMemoryJurorRegistry;
    type Voting = InMemoryVoting;
    type Accounting = InMemoryAccounting;
    type Subscriptions = InMemorySubscriptions;

    fn chain(&self) -> &MockChain {
        &self.chain
    }
    fn registry(&self) -> &InMemoryJurorRegistry {
        &self.registry
    }
    fn registry_mut(&mut self) -> &mut InMemoryJurorRegistry {
        &mut self.registry
    }
    fn voting(&self) -> &InMemoryVoting {
        &self.voting
    }
    fn voting_mut(&mut self) -> &mut InMemoryVoting {
        &mut self.voting
    }
    fn accounting(&self) -> &InMemoryAccounting {
        &self.accounting
    }
    fn accounting_mut(&mut self) -> &mut InMemoryAccounting {
        &mut self.accounting
    }
    fn subscriptions(&self) -> &InMemorySubscriptions {
        &self.subscriptions
    }
    fn subscriptions_mut(&mut self) -> &mut InMemorySubscriptions {
        &mut self.subscriptions
    }
}
