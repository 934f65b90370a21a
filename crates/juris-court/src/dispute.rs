//! # Disputes and Adjudication Rounds
//!
//! The data model behind the court: a [`Dispute`] owns an ordered list of
//! [`AdjudicationRound`]s, each of which may carry one [`Appeal`].
//!
//! ## States
//!
//! Dispute: `PRE_DRAFT → ADJUDICATING → EXECUTED`, never reversed. An appeal
//! round does not send the dispute back to `PRE_DRAFT`; the new round simply
//! reports `INVALID` until it is drafted.
//!
//! Round (computed from term ids, never stored):
//!
//! ```text
//! INVALID → COMMITTING → REVEALING → APPEALING → ENDED
//!                                        │
//!                                        └─(appealed)→ CONFIRMING_APPEAL → ENDED
//! ```
//!
//! Final rounds skip the appeal phases and end right after revealing.
//!
//! ## Design Choice
//!
//! Round state is a pure function of the current term and the round's
//! recorded terms. Nothing has to "tick" a round forward, so a round that
//! nobody touches for a month is still in the right state when next read.

use std::collections::BTreeMap;

use juris_core::{AccountId, Amount, DisputeId, RoundId, TermId, VoteId};
use serde::{Deserialize, Serialize};

use crate::config::RoundDurations;
use crate::fees::RoundFees;

// ── Outcomes ───────────────────────────────────────────────────────────

/// A vote outcome.
///
/// `0`, `1` and `2` are reserved; real rulings start at `3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Outcome(pub u8);

impl Outcome {
    /// Juror never revealed.
    pub const MISSING: Outcome = Outcome(0);
    /// Juror's vote was leaked before reveal.
    pub const LEAKED: Outcome = Outcome(1);
    /// Juror refused to rule, or nobody voted.
    pub const REFUSED: Outcome = Outcome(2);

    /// Smallest possible ruling count.
    pub const MIN_POSSIBLE_RULINGS: u8 = 2;
    /// Largest possible ruling count (`3 + 252 = 255`).
    pub const MAX_POSSIBLE_RULINGS: u8 = 253;

    /// The `index`-th ruling (0-based), e.g. `ruling(0) == Outcome(3)`.
    pub fn ruling(index: u8) -> Outcome {
        Outcome(index.saturating_add(3))
    }

    /// Whether this outcome is one of the `possible_rulings` real rulings.
    pub fn is_ruling_of(self, possible_rulings: u8) -> bool {
        self.0 >= 3 && u16::from(self.0) < 3 + u16::from(possible_rulings)
    }

    /// Whether a juror may cast this outcome: refusal or a real ruling.
    pub fn is_castable(self, possible_rulings: u8) -> bool {
        self == Self::REFUSED || self.is_ruling_of(possible_rulings)
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::MISSING => f.write_str("missing"),
            Self::LEAKED => f.write_str("leaked"),
            Self::REFUSED => f.write_str("refused"),
            Outcome(n) => write!(f, "ruling:{}", n.saturating_sub(3)),
        }
    }
}

// ── Dispute State ──────────────────────────────────────────────────────

/// Lifecycle state of a dispute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisputeState {
    /// Round 0 is not fully drafted yet.
    PreDraft,
    /// At least one round has been drafted.
    Adjudicating,
    /// Final ruling recorded. Terminal.
    Executed,
}

impl DisputeState {
    /// Whether this state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Executed)
    }

    /// The canonical string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PreDraft => "PRE_DRAFT",
            Self::Adjudicating => "ADJUDICATING",
            Self::Executed => "EXECUTED",
        }
    }
}

impl std::fmt::Display for DisputeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ── Adjudication State ─────────────────────────────────────────────────

/// Phase of a round at a given term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdjudicationState {
    /// Not drafted, or voting has not started.
    Invalid,
    /// Jurors may commit.
    Committing,
    /// Jurors may reveal.
    Revealing,
    /// Anyone may appeal the winning outcome.
    Appealing,
    /// Anyone may confirm the posted appeal.
    ConfirmingAppeal,
    /// Nothing more can happen in this round.
    Ended,
}

impl AdjudicationState {
    /// The canonical string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Invalid => "INVALID",
            Self::Committing => "COMMITTING",
            Self::Revealing => "REVEALING",
            Self::Appealing => "APPEALING",
            Self::ConfirmingAppeal => "CONFIRMING_APPEAL",
            Self::Ended => "ENDED",
        }
    }
}

impl std::fmt::Display for AdjudicationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ── Rounds ─────────────────────────────────────────────────────────────

/// Whether a round drafts a fixed panel or lets any eligible juror vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoundKind {
    /// Fixed panel drafted by stake-weighted sortition.
    Regular,
    /// Open to every juror above the minimum stake; cannot be appealed.
    Final,
}

/// A juror's participation in one round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundJuror {
    /// Voting weight (draft count, or stake-proportional in final rounds).
    pub weight: u64,
    /// Stake locked against a possible penalty.
    pub locked: Amount,
    /// Penalty settlement has processed this juror.
    pub penalty_settled: bool,
    /// Reward has been paid.
    pub rewarded: bool,
}

/// An appeal against a round's winning outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appeal {
    /// Account that posted the appeal deposit.
    pub appealer: AccountId,
    /// Ruling the appealer argues for.
    pub appealed_ruling: Outcome,
    /// Deposit held for the appealer.
    pub appeal_deposit: Amount,
    /// Account that confirmed, once confirmed.
    pub confirmer: Option<AccountId>,
    /// Ruling the confirmer argues for.
    pub opposed_ruling: Option<Outcome>,
    /// Deposit held for the confirmer.
    pub confirm_deposit: Amount,
    /// Deposits have been distributed.
    pub settled: bool,
}

impl Appeal {
    /// Whether someone confirmed the appeal.
    pub fn is_confirmed(&self) -> bool {
        self.confirmer.is_some()
    }
}

/// One adjudication attempt within a dispute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjudicationRound {
    /// Index within the dispute.
    pub id: RoundId,
    /// Regular panel or final round.
    pub kind: RoundKind,
    /// First term at which the round may be drafted.
    pub draft_term: TermId,
    /// Terms between `draft_term` and the term drafting completed.
    pub delayed_terms: u64,
    /// Requested jurors, or total available weight for final rounds.
    pub juror_count: u64,
    /// Weight drafted so far, or committed weight in final rounds.
    pub selected_weight: u64,
    /// Next draw index. Runs ahead of `selected_weight` when candidates
    /// without enough unlocked stake were passed over.
    pub draft_cursor: u64,
    /// Participating jurors.
    pub jurors: BTreeMap<AccountId, RoundJuror>,
    /// Jurors in first-selection order; settlement walks this list.
    pub juror_order: Vec<AccountId>,
    /// Account whose deposit paid this round's fees.
    pub triggered_by: AccountId,
    /// Fees this round was charged.
    pub fees: RoundFees,
    /// Settle fees not yet paid out.
    pub settle_fees_remaining: Amount,
    /// Next index of `juror_order` to settle.
    pub settle_cursor: usize,
    /// Every juror's penalty has been processed.
    pub penalties_settled: bool,
    /// Penalties collected from incoherent jurors.
    pub collected_tokens: Amount,
    /// Total weight of coherent jurors.
    pub coherent_weight: u64,
    /// Appeal against this round, if any.
    pub appeal: Option<Appeal>,
}

impl AdjudicationRound {
    /// A new undrafted round.
    pub fn new(
        id: RoundId,
        kind: RoundKind,
        draft_term: TermId,
        juror_count: u64,
        triggered_by: AccountId,
        fees: RoundFees,
    ) -> Self {
        Self {
            id,
            kind,
            draft_term,
            delayed_terms: 0,
            juror_count,
            selected_weight: 0,
            draft_cursor: 0,
            jurors: BTreeMap::new(),
            juror_order: Vec::new(),
            triggered_by,
            settle_fees_remaining: fees.settle_fees,
            fees,
            settle_cursor: 0,
            penalties_settled: false,
            collected_tokens: Amount::ZERO,
            coherent_weight: 0,
            appeal: None,
        }
    }

    /// Whether the round is ready for voting. Final rounds need no draft.
    pub fn is_drafted(&self) -> bool {
        match self.kind {
            RoundKind::Regular => self.selected_weight >= self.juror_count,
            RoundKind::Final => true,
        }
    }

    /// Weight still to draft.
    pub fn remaining_to_draft(&self) -> u64 {
        match self.kind {
            RoundKind::Regular => self.juror_count.saturating_sub(self.selected_weight),
            RoundKind::Final => 0,
        }
    }

    /// Term at which committing opens.
    pub fn voting_start_term(&self) -> TermId {
        TermId(self.draft_term.0.saturating_add(self.delayed_terms))
    }

    /// Term at which the appeal window closes (or voting ends, for final rounds).
    pub fn appeal_end_term(&self, durations: &RoundDurations) -> TermId {
        let start = self.voting_start_term().0;
        let voting = durations.commit_terms.saturating_add(durations.reveal_terms);
        match self.kind {
            RoundKind::Regular => TermId(start.saturating_add(voting).saturating_add(durations.appeal_terms)),
            RoundKind::Final => TermId(start.saturating_add(voting)),
        }
    }

    /// Term at which the confirm window closes; also the next round's draft term.
    pub fn confirm_end_term(&self, durations: &RoundDurations) -> TermId {
        TermId(
            self.appeal_end_term(durations)
                .0
                .saturating_add(durations.appeal_confirm_terms),
        )
    }

    /// Phase of this round at `term`.
    pub fn state_at(&self, term: TermId, durations: &RoundDurations) -> AdjudicationState {
        if !self.is_drafted() {
            return AdjudicationState::Invalid;
        }
        let start = self.voting_start_term().0;
        let term = term.0;
        if term < start {
            return AdjudicationState::Invalid;
        }
        let commit_end = start.saturating_add(durations.commit_terms);
        if term < commit_end {
            return AdjudicationState::Committing;
        }
        let reveal_end = commit_end.saturating_add(durations.reveal_terms);
        if term < reveal_end {
            return AdjudicationState::Revealing;
        }
        if self.kind == RoundKind::Final {
            return AdjudicationState::Ended;
        }
        let appeal_end = reveal_end.saturating_add(durations.appeal_terms);
        if term < appeal_end {
            return AdjudicationState::Appealing;
        }
        match &self.appeal {
            Some(appeal) if !appeal.is_confirmed() => {
                let confirm_end = appeal_end.saturating_add(durations.appeal_confirm_terms);
                if term < confirm_end {
                    AdjudicationState::ConfirmingAppeal
                } else {
                    AdjudicationState::Ended
                }
            }
            _ => AdjudicationState::Ended,
        }
    }

    /// Add `weight` to a juror, recording first-selection order.
    pub fn add_juror_weight(&mut self, juror: &AccountId, weight: u64, locked: Amount) {
        if !self.jurors.contains_key(juror) {
            self.juror_order.push(juror.clone());
        }
        let entry = self.jurors.entry(juror.clone()).or_default();
        entry.weight = entry.weight.saturating_add(weight);
        entry.locked = entry.locked.saturating_add(locked);
        self.selected_weight = self.selected_weight.saturating_add(weight);
    }

    /// Weight of `juror` in this round, or 0.
    pub fn juror_weight(&self, juror: &AccountId) -> u64 {
        self.jurors.get(juror).map_or(0, |j| j.weight)
    }
}

// ── Disputes ───────────────────────────────────────────────────────────

/// A dispute raised by an external agreement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dispute {
    /// Sequential identifier.
    pub id: DisputeId,
    /// Agreement that raised the dispute and paid its first round.
    pub subject: AccountId,
    /// Number of real rulings jurors may pick from.
    pub possible_rulings: u8,
    /// Lifecycle state.
    pub state: DisputeState,
    /// Ruling recorded on execution.
    pub final_ruling: Option<Outcome>,
    /// Rounds, contiguous from 0.
    pub rounds: Vec<AdjudicationRound>,
}

impl Dispute {
    /// The most recent round.
    pub fn last_round(&self) -> Option<&AdjudicationRound> {
        self.rounds.last()
    }

    /// Round by id.
    pub fn round(&self, id: RoundId) -> Option<&AdjudicationRound> {
        usize::try_from(id.0).ok().and_then(|i| self.rounds.get(i))
    }

    /// Mutable round by id.
    pub fn round_mut(&mut self, id: RoundId) -> Option<&mut AdjudicationRound> {
        usize::try_from(id.0).ok().and_then(|i| self.rounds.get_mut(i))
    }

    /// Vote id for one of this dispute's rounds.
    pub fn vote_id(&self, round: RoundId) -> VoteId {
        VoteId::for_round(self.id, round)
    }
}

/// Juror count for the round after one with `previous` jurors: multiply by
/// `step_factor`, then add one if the product is even so that no regular
/// round can tie.
pub fn next_round_juror_count(previous: u64, step_factor: u64) -> u64 {
    let next = previous.saturating_mul(step_factor);
    if next % 2 == 0 {
        next.saturating_add(1)
    } else {
        next
    }
}
