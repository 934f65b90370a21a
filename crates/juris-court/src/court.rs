//! # Court
//!
//! [`Court`] ties the term clock, juror selection, fee economics and the
//! dispute model together behind the operations external parties call.
//!
//! ## Operation shape
//!
//! Every state-changing operation runs in three phases:
//!
//! 1. **Check.** Authorize the caller, work out the term the call runs at
//!    (performing due transitions only if at most
//!    `max_auto_term_transitions` are pending), validate every precondition
//!    and compute every amount with checked arithmetic.
//! 2. **Collaborators.** Make the fallible external calls that move funds or
//!    record votes.
//! 3. **Commit.** Perform due term transitions and mutate court state.
//!
//! A failure in phase 1 or 2 leaves court state exactly as it was.
//!
//! Penalty settlement and reward payout live in [`crate::settlement`].

use std::collections::BTreeMap;

use juris_core::{AccountId, Amount, ArithmeticError, DisputeId, RoundId, TermId, Timestamp, VoteId};

use crate::access::{authorize, Operation};
use crate::clock::{CourtClock, Term};
use crate::collaborators::{Accounting, Chain, Environment, JurorRegistry, Subscriptions, Voting};
use crate::config::{CourtConfig, UnconfirmedAppealPolicy};
use crate::dispute::{
    next_round_juror_count, AdjudicationRound, AdjudicationState, Appeal, Dispute, DisputeState,
    Outcome, RoundKind,
};
use crate::draft::{candidates, draft_seed, StakeSnapshot, MAX_DRAW_ATTEMPTS_PER_JUROR};
use crate::error::{CollaboratorError, CourtError};
use crate::events::{CourtEvent, EventLog};
use crate::fees::{FeeEconomics, RoundFees};

/// Size and cost of the round an appeal would create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextRoundPlan {
    /// Id of the next round.
    pub round_id: RoundId,
    /// Regular or final.
    pub kind: RoundKind,
    /// Juror count (weight units for final rounds).
    pub juror_count: u64,
    /// Fees the next round will cost.
    pub fees: RoundFees,
}

/// The arbitration court.
#[derive(Debug)]
pub struct Court<E: Environment> {
    pub(crate) config: CourtConfig,
    pub(crate) economics: FeeEconomics,
    pub(crate) clock: CourtClock,
    pub(crate) disputes: Vec<Dispute>,
    /// Heartbeat fees owed to whoever transitions into each term.
    pub(crate) heartbeat_pots: BTreeMap<TermId, Amount>,
    pub(crate) env: E,
    pub(crate) events: EventLog,
}

impl<E: Environment> Court<E> {
    /// Create a court at the environment's current time.
    ///
    /// # Errors
    ///
    /// Returns [`CourtError::Config`] for an invalid configuration and
    /// [`CourtError::BadFirstTermStartTime`] if the first term starts less
    /// than one term from now.
    pub fn new(config: CourtConfig, env: E) -> Result<Self, CourtError> {
        config.validate()?;
        let supply = config
            .stake_supply_override
            .unwrap_or_else(|| env.registry().stake_supply());
        let clock = CourtClock::new(
            config.term_duration_secs,
            config.first_term_start_time,
            env.chain().now(),
            supply,
        )?;
        tracing::info!(
            governor = %config.governor,
            first_term_start = %config.first_term_start_time,
            term_duration_secs = config.term_duration_secs,
            "court created"
        );
        Ok(Self {
            economics: FeeEconomics::from_config(&config),
            config,
            clock,
            disputes: Vec::new(),
            heartbeat_pots: BTreeMap::new(),
            env,
            events: EventLog::new(),
        })
    }

    // ── Queries ─────────────────────────────────────────────────────

    /// Active configuration.
    pub fn config(&self) -> &CourtConfig {
        &self.config
    }

    /// Current governor.
    pub fn governor(&self) -> &AccountId {
        &self.config.governor
    }

    /// Fee calculator.
    pub fn economics(&self) -> &FeeEconomics {
        &self.economics
    }

    /// Term table.
    pub fn clock(&self) -> &CourtClock {
        &self.clock
    }

    /// Last created term. Does not force a transition.
    pub fn current_term_id(&self) -> TermId {
        self.clock.current_term_id()
    }

    /// Transitions currently due.
    pub fn needed_term_transitions(&self) -> u64 {
        self.clock.needed_term_transitions(self.env.chain().now())
    }

    /// A created term.
    pub fn term(&self, id: TermId) -> Option<&Term> {
        self.clock.term(id)
    }

    /// A dispute.
    pub fn dispute(&self, id: DisputeId) -> Result<&Dispute, CourtError> {
        self.disputes
            .get(self.dispute_index(id)?)
            .ok_or(CourtError::UnknownDispute(id))
    }

    /// A round of a dispute.
    pub fn round(&self, dispute_id: DisputeId, round_id: RoundId) -> Result<&AdjudicationRound, CourtError> {
        self.dispute(dispute_id)?
            .round(round_id)
            .ok_or(CourtError::UnknownRound { dispute_id, round_id })
    }

    /// Phase of a round at the term wall-clock time has reached.
    pub fn adjudication_state(
        &self,
        dispute_id: DisputeId,
        round_id: RoundId,
    ) -> Result<AdjudicationState, CourtError> {
        let term = self.time_term();
        Ok(self
            .round(dispute_id, round_id)?
            .state_at(term, &self.config.round_durations))
    }

    /// Number of disputes raised.
    pub fn dispute_count(&self) -> u64 {
        self.disputes.len() as u64
    }

    /// Cost and size of the round an appeal of `round_id` would create.
    pub fn next_round_plan(
        &self,
        dispute_id: DisputeId,
        round_id: RoundId,
    ) -> Result<NextRoundPlan, CourtError> {
        let round = self.round(dispute_id, round_id)?;
        self.plan_next_round(round, self.time_term())
    }

    /// Collaborators.
    pub fn env(&self) -> &E {
        &self.env
    }

    /// Mutable collaborators.
    pub fn env_mut(&mut self) -> &mut E {
        &mut self.env
    }

    /// Events recorded since the last drain.
    pub fn events(&self) -> &[CourtEvent] {
        self.events.events()
    }

    /// Take the recorded events.
    pub fn drain_events(&mut self) -> Vec<CourtEvent> {
        self.events.drain()
    }

    // ── Term transitions ────────────────────────────────────────────

    /// Perform up to `max` due term transitions and pay the caller the
    /// heartbeat fees parked on the new terms. Returns transitions performed.
    ///
    /// # Errors
    ///
    /// Returns [`CourtError::InvalidTransitionCount`] if this would perform
    /// no transition, either because `max` is 0 or nothing is due.
    pub fn heartbeat(&mut self, caller: &AccountId, max: u64) -> Result<u64, CourtError> {
        self.authorize(Operation::Heartbeat, caller)?;
        let needed = self.needed_term_transitions();
        if needed.min(max) == 0 {
            return Err(CourtError::InvalidTransitionCount {
                requested: max,
                needed,
            });
        }
        self.perform_transitions(caller, max)
    }

    /// Perform up to `max` due transitions; a no-op when nothing is due.
    ///
    /// # Errors
    ///
    /// Returns [`CourtError::InvalidTransitionCount`] if `max` is 0 while
    /// transitions are due.
    pub fn ensure_term_transitions(&mut self, caller: &AccountId, max: u64) -> Result<u64, CourtError> {
        self.authorize(Operation::Heartbeat, caller)?;
        let needed = self.needed_term_transitions();
        if needed == 0 {
            return Ok(0);
        }
        if max == 0 {
            return Err(CourtError::InvalidTransitionCount {
                requested: max,
                needed,
            });
        }
        self.perform_transitions(caller, max)
    }

    /// Term reached by wall-clock time, whether or not its transition ran.
    pub(crate) fn time_term(&self) -> TermId {
        TermId(
            self.clock
                .current_term_id()
                .0
                .saturating_add(self.needed_term_transitions()),
        )
    }

    /// Term an ordinary operation runs at, refusing if too many
    /// transitions would have to be performed implicitly.
    pub(crate) fn pending_term(&self) -> Result<TermId, CourtError> {
        let needed = self.needed_term_transitions();
        let max = self.config.max_auto_term_transitions;
        if needed > max {
            tracing::warn!(needed, max, "too many term transitions due for implicit heartbeat");
            return Err(CourtError::TooManyTransitionsNeeded { needed, max });
        }
        Ok(self.time_term())
    }

    /// Perform every due transition on behalf of `caller`.
    pub(crate) fn apply_due_transitions(&mut self, caller: &AccountId) -> Result<(), CourtError> {
        let needed = self.needed_term_transitions();
        if needed > 0 {
            self.perform_transitions(caller, needed)?;
        }
        Ok(())
    }

    fn perform_transitions(&mut self, caller: &AccountId, max: u64) -> Result<u64, CourtError> {
        let now = self.env.chain().now();
        let block = self.env.chain().block_number();
        let count = self.clock.needed_term_transitions(now).min(max);
        if count == 0 {
            return Ok(0);
        }
        let previous = self.clock.current_term_id();
        let first_new = previous
            .next()
            .ok_or(ArithmeticError::Overflow { op: "term id" })?;
        let last_new = previous
            .checked_add(count)
            .ok_or(ArithmeticError::Overflow { op: "term id" })?;
        let paid_terms: Vec<TermId> = self
            .heartbeat_pots
            .range(first_new..=last_new)
            .map(|(term, _)| *term)
            .collect();
        let reward = paid_terms
            .iter()
            .filter_map(|term| self.heartbeat_pots.get(term))
            .try_fold(Amount::ZERO, |sum, pot| sum.checked_add(*pot))?;
        let supply = self
            .config
            .stake_supply_override
            .unwrap_or_else(|| self.env.registry().stake_supply());

        if !reward.is_zero() {
            self.env.accounting_mut().assign(caller, reward)?;
        }
        self.clock.transition(count, now, block, supply)?;
        for term in paid_terms {
            self.heartbeat_pots.remove(&term);
        }
        self.events.emit(CourtEvent::Heartbeat {
            previous_term: previous,
            current_term: self.clock.current_term_id(),
        });
        Ok(count)
    }

    // ── Governance ──────────────────────────────────────────────────

    /// Move the first term start later.
    ///
    /// # Errors
    ///
    /// - [`CourtError::SenderNotGovernor`] for anyone but the governor.
    /// - [`CourtError::CannotDelayStartedCourt`] once term 1 has begun.
    /// - [`CourtError::CannotDelayPastStartTime`] unless `new_start` is later
    ///   than the current first term start.
    pub fn delay_start_time(&mut self, caller: &AccountId, new_start: Timestamp) -> Result<(), CourtError> {
        self.authorize(Operation::DelayStartTime, caller)?;
        let now = self.env.chain().now();
        let previous = self.clock.delay_start_time(new_start, now)?;
        self.config.first_term_start_time = new_start;
        self.events.emit(CourtEvent::StartTimeDelayed {
            previous_start: previous,
            current_start: new_start,
        });
        Ok(())
    }

    /// Hand the governor role to `new_governor`.
    pub fn transfer_governor(&mut self, caller: &AccountId, new_governor: AccountId) -> Result<(), CourtError> {
        self.authorize(Operation::TransferGovernor, caller)?;
        let previous = std::mem::replace(&mut self.config.governor, new_governor.clone());
        self.events.emit(CourtEvent::GovernorTransferred {
            previous,
            current: new_governor,
        });
        Ok(())
    }

    // ── Disputes ────────────────────────────────────────────────────

    /// Raise a dispute on behalf of `subject`, which pays the full draft
    /// deposit up front.
    ///
    /// # Errors
    ///
    /// - [`CourtError::InvalidRulingOptions`] unless `possible_rulings` is in `[2, 253]`.
    /// - [`CourtError::InvalidJurorCount`] for zero jurors.
    /// - [`CourtError::BadDraftTerm`] unless `draft_term` is after the current term.
    /// - [`CourtError::SubjectNotUpToDate`] if the subject's subscription lapsed.
    /// - [`CourtError::Collaborator`] if the deposit cannot be collected.
    pub fn create_dispute(
        &mut self,
        subject: &AccountId,
        possible_rulings: u8,
        juror_count: u64,
        draft_term: TermId,
    ) -> Result<DisputeId, CourtError> {
        self.authorize(Operation::CreateDispute, subject)?;
        let current = self.pending_term()?;
        if !(Outcome::MIN_POSSIBLE_RULINGS..=Outcome::MAX_POSSIBLE_RULINGS).contains(&possible_rulings) {
            return Err(CourtError::InvalidRulingOptions {
                count: possible_rulings,
            });
        }
        if juror_count == 0 {
            return Err(CourtError::InvalidJurorCount);
        }
        if draft_term <= current {
            return Err(CourtError::BadDraftTerm {
                requested: draft_term,
                current,
            });
        }
        if !self.env.subscriptions().is_up_to_date(subject) {
            tracing::warn!(subject = %subject, "dispute refused: subscription not up to date");
            return Err(CourtError::SubjectNotUpToDate {
                subject: subject.clone(),
            });
        }
        let fees = self.economics.regular_round_fees(juror_count)?;
        let pot = self.pot_with(draft_term, fees.heartbeat_fee)?;
        let dispute_id = DisputeId(self.disputes.len() as u64);
        let round = AdjudicationRound::new(
            RoundId(0),
            RoundKind::Regular,
            draft_term,
            juror_count,
            subject.clone(),
            fees,
        );
        let dispute = Dispute {
            id: dispute_id,
            subject: subject.clone(),
            possible_rulings,
            state: DisputeState::PreDraft,
            final_ruling: None,
            rounds: vec![round],
        };

        self.env.accounting_mut().collect(subject, fees.total)?;
        self.env
            .voting_mut()
            .create(dispute.vote_id(RoundId(0)), possible_rulings)?;

        self.apply_due_transitions(subject)?;
        self.heartbeat_pots.insert(draft_term, pot);
        self.disputes.push(dispute);
        self.events.emit(CourtEvent::NewDispute {
            dispute_id,
            subject: subject.clone(),
            draft_term,
            juror_count,
        });
        Ok(dispute_id)
    }

    /// Draft up to `max_jurors` jurors into the dispute's last round and pay
    /// the caller the draft fee per juror drafted. Returns jurors drafted.
    ///
    /// Every drafted unit of weight locks one penalty share of the juror's
    /// stake. Candidates whose unlocked stake cannot cover another share are
    /// passed over.
    ///
    /// Completing the draft records how many terms late it finished (voting
    /// starts then) and moves a `PRE_DRAFT` dispute to `ADJUDICATING`.
    ///
    /// # Errors
    ///
    /// - [`CourtError::BadBatchSize`] if `max_jurors` is 0.
    /// - [`CourtError::RoundAlreadyDrafted`] if nothing is left to draft.
    /// - [`CourtError::DraftTermNotReached`] before the round's draft term.
    /// - [`CourtError::TermRandomnessNotYetComputed`] until the draft term's
    ///   randomness block is mined.
    /// - [`CourtError::NoActiveJurors`] if no juror meets the minimum stake,
    ///   or too few hold enough unlocked stake to fill the batch.
    /// - [`CourtError::Collaborator`] if custody cannot cover the draft fees.
    pub fn draft(&mut self, caller: &AccountId, dispute_id: DisputeId, max_jurors: u64) -> Result<u64, CourtError> {
        self.authorize(Operation::Draft, caller)?;
        if max_jurors == 0 {
            return Err(CourtError::BadBatchSize);
        }
        let current = self.pending_term()?;
        let index = self.dispute_index(dispute_id)?;
        let dispute = &self.disputes[index];
        if dispute.state.is_terminal() {
            return Err(CourtError::AlreadyExecuted(dispute_id));
        }
        let round = dispute
            .last_round()
            .ok_or(CourtError::UnknownDispute(dispute_id))?;
        let round_id = round.id;
        if round.is_drafted() {
            return Err(CourtError::RoundAlreadyDrafted { dispute_id, round_id });
        }
        let draft_term = round.draft_term;
        if current < draft_term {
            return Err(CourtError::DraftTermNotReached { draft_term, current });
        }
        if draft_term > self.clock.current_term_id() {
            // the draft term is created by this very call, so its block is unmined
            let randomness_block = self.env.chain().block_number().successor();
            tracing::warn!(dispute_id = %dispute_id, term = %draft_term, "draft before term randomness exists");
            return Err(CourtError::TermRandomnessNotYetComputed {
                term: draft_term,
                randomness_block,
            });
        }
        let randomness = self
            .clock
            .randomness_of(draft_term, self.env.chain())
            .map_err(|err| {
                tracing::warn!(dispute_id = %dispute_id, term = %draft_term, error = %err, "term randomness unavailable");
                err
            })?;
        let batch = max_jurors
            .min(round.remaining_to_draft())
            .min(self.config.max_jurors_per_draft_batch.unwrap_or(u64::MAX));
        let snapshot = StakeSnapshot::new(
            self.env.registry().stake_snapshot(draft_term),
            self.config.min_active_balance,
        );
        if snapshot.is_empty() {
            return Err(CourtError::NoActiveJurors(draft_term));
        }
        let seed = draft_seed(&randomness, dispute_id, round_id);
        let lock = self.economics.lock_per_draft()?;
        let attempts = usize::try_from(batch.saturating_mul(MAX_DRAW_ATTEMPTS_PER_JUROR)).unwrap_or(usize::MAX);
        let mut reserved: BTreeMap<&AccountId, Amount> = BTreeMap::new();
        let mut picks = Vec::new();
        let mut cursor = round.draft_cursor;
        for (draw_index, juror) in candidates(&seed, &snapshot, round.draft_cursor).take(attempts) {
            cursor = draw_index.saturating_add(1);
            let held = reserved.get(juror).copied().unwrap_or_default();
            let free = self
                .env
                .registry()
                .unlocked_stake_of(juror, draft_term)
                .saturating_sub(held);
            if free < lock {
                tracing::debug!(dispute_id = %dispute_id, juror = %juror, draw_index, "candidate lacks unlocked stake");
                continue;
            }
            reserved.insert(juror, held.checked_add(lock)?);
            picks.push(juror.clone());
            if picks.len() as u64 == batch {
                break;
            }
        }
        if (picks.len() as u64) < batch {
            tracing::warn!(
                dispute_id = %dispute_id,
                round_id = %round_id,
                wanted = batch,
                found = picks.len(),
                "not enough unlocked stake to fill draft batch"
            );
            return Err(CourtError::NoActiveJurors(draft_term));
        }
        let payout = self
            .economics
            .schedule()
            .draft_fee
            .checked_mul(u128::from(batch))?;
        let custody = self.env.accounting().custody_balance();
        if custody < payout {
            return Err(CollaboratorError::InsufficientCustody {
                needed: payout,
                available: custody,
            }
            .into());
        }
        let completes = batch == round.remaining_to_draft();
        tracing::debug!(
            dispute_id = %dispute_id,
            round_id = %round_id,
            eligible = snapshot.len(),
            picks = ?picks,
            "drafting jurors"
        );

        for juror in &picks {
            self.env.registry_mut().lock_stake(juror, lock, draft_term)?;
        }
        if !payout.is_zero() {
            self.env.accounting_mut().assign(caller, payout)?;
        }

        self.apply_due_transitions(caller)?;
        self.clock.ensure_term_randomness(draft_term, self.env.chain())?;
        let dispute = &mut self.disputes[index];
        let Some(round) = dispute.rounds.last_mut() else {
            return Err(CourtError::UnknownDispute(dispute_id));
        };
        round.draft_cursor = cursor;
        for juror in &picks {
            round.add_juror_weight(juror, 1, lock);
            self.events.emit(CourtEvent::JurorDrafted {
                dispute_id,
                round_id,
                juror: juror.clone(),
            });
        }
        if completes {
            round.delayed_terms = current.saturating_since(draft_term);
            if dispute.state == DisputeState::PreDraft {
                dispute.state = DisputeState::Adjudicating;
            }
            tracing::info!(
                dispute_id = %dispute_id,
                round_id = %round_id,
                voting_starts = %round.voting_start_term(),
                "round drafted"
            );
        }
        Ok(batch)
    }

    /// Seal a vote. Regular rounds accept drafted jurors only; final rounds
    /// accept any juror with at least the minimum active stake at the draft
    /// term. A final-round voter's weight is capped at the round's available
    /// weight, and the stake locked is the penalty share of the stake that
    /// capped weight stands for.
    ///
    /// # Errors
    ///
    /// - [`CourtError::InvalidAdjudicationState`] outside the commit window.
    /// - [`CourtError::JurorNotDrafted`] for undrafted jurors in regular rounds.
    /// - [`CourtError::JurorWeightZero`] below the minimum stake in final rounds.
    /// - [`CourtError::Collaborator`] if the voter already committed, or
    ///   lacks the unlocked stake a final-round lock needs.
    pub fn commit_vote(
        &mut self,
        juror: &AccountId,
        dispute_id: DisputeId,
        round_id: RoundId,
        commitment: [u8; 32],
    ) -> Result<(), CourtError> {
        self.authorize(Operation::CommitVote, juror)?;
        let current = self.pending_term()?;
        let round = self.round(dispute_id, round_id)?;
        self.require_state(round, dispute_id, current, AdjudicationState::Committing)?;
        let draft_term = round.draft_term;
        let kind = round.kind;
        let (weight, lock) = match kind {
            RoundKind::Regular => {
                if round.juror_weight(juror) == 0 {
                    return Err(CourtError::JurorNotDrafted {
                        dispute_id,
                        round_id,
                        juror: juror.clone(),
                    });
                }
                (0, Amount::ZERO)
            }
            RoundKind::Final => {
                let stake = self.env.registry().active_stake_of(juror, draft_term);
                let weight = self
                    .economics
                    .final_round_weight(stake)?
                    .min(round.juror_count);
                if weight == 0 {
                    return Err(CourtError::JurorWeightZero {
                        juror: juror.clone(),
                        term: draft_term,
                    });
                }
                let lock = self.economics.final_round_lock(weight)?;
                let available = self.env.registry().unlocked_stake_of(juror, draft_term);
                if available < lock {
                    return Err(CollaboratorError::InsufficientStake {
                        juror: juror.to_string(),
                        needed: lock,
                        available,
                    }
                    .into());
                }
                (weight, lock)
            }
        };
        let vote = VoteId::for_round(dispute_id, round_id);

        self.env.voting_mut().commit(vote, juror, commitment)?;
        if kind == RoundKind::Final && !lock.is_zero() {
            self.env.registry_mut().lock_stake(juror, lock, draft_term)?;
        }

        self.apply_due_transitions(juror)?;
        if kind == RoundKind::Final {
            let round = self.round_mut(dispute_id, round_id)?;
            round.add_juror_weight(juror, weight, lock);
        }
        tracing::debug!(dispute_id = %dispute_id, round_id = %round_id, juror = %juror, "vote committed");
        Ok(())
    }

    /// Open a sealed vote; it counts with the juror's round weight.
    ///
    /// # Errors
    ///
    /// - [`CourtError::InvalidAdjudicationState`] outside the reveal window.
    /// - [`CourtError::JurorNotDrafted`] if the juror holds no weight.
    /// - [`CourtError::Collaborator`] if the reveal does not match the commitment.
    pub fn reveal_vote(
        &mut self,
        juror: &AccountId,
        dispute_id: DisputeId,
        round_id: RoundId,
        outcome: Outcome,
        salt: &[u8; 32],
    ) -> Result<(), CourtError> {
        self.authorize(Operation::RevealVote, juror)?;
        let current = self.pending_term()?;
        let round = self.round(dispute_id, round_id)?;
        self.require_state(round, dispute_id, current, AdjudicationState::Revealing)?;
        let weight = round.juror_weight(juror);
        if weight == 0 {
            return Err(CourtError::JurorNotDrafted {
                dispute_id,
                round_id,
                juror: juror.clone(),
            });
        }
        let vote = VoteId::for_round(dispute_id, round_id);

        self.env
            .voting_mut()
            .reveal(vote, juror, outcome, salt, weight)?;

        self.apply_due_transitions(juror)?;
        tracing::debug!(dispute_id = %dispute_id, round_id = %round_id, juror = %juror, "vote revealed");
        Ok(())
    }

    /// Appeal a round's winning outcome in favour of `ruling`, posting the
    /// appeal deposit sized on the next round's fees.
    ///
    /// # Errors
    ///
    /// - [`CourtError::InvalidAdjudicationState`] outside the appeal window.
    /// - [`CourtError::AppealAlreadyMade`] if someone already appealed.
    /// - [`CourtError::InvalidAppealRuling`] if `ruling` is not a ruling of
    ///   this dispute or equals the current winning outcome.
    pub fn appeal(
        &mut self,
        appealer: &AccountId,
        dispute_id: DisputeId,
        round_id: RoundId,
        ruling: Outcome,
    ) -> Result<(), CourtError> {
        self.authorize(Operation::Appeal, appealer)?;
        let current = self.pending_term()?;
        let dispute = self.dispute(dispute_id)?;
        let possible_rulings = dispute.possible_rulings;
        let round = self.round(dispute_id, round_id)?;
        self.require_state(round, dispute_id, current, AdjudicationState::Appealing)?;
        if round.appeal.is_some() {
            return Err(CourtError::AppealAlreadyMade { dispute_id, round_id });
        }
        let vote = VoteId::for_round(dispute_id, round_id);
        let winning = self.env.voting().winning_outcome(vote)?;
        if !ruling.is_ruling_of(possible_rulings) || ruling == winning {
            return Err(CourtError::InvalidAppealRuling {
                dispute_id,
                ruling: ruling.0,
            });
        }
        let plan = self.plan_next_round(round, current)?;
        let deposit = self.economics.appeal_deposit(&plan.fees)?;

        self.env.accounting_mut().collect(appealer, deposit)?;

        self.apply_due_transitions(appealer)?;
        let round = self.round_mut(dispute_id, round_id)?;
        round.appeal = Some(Appeal {
            appealer: appealer.clone(),
            appealed_ruling: ruling,
            appeal_deposit: deposit,
            confirmer: None,
            opposed_ruling: None,
            confirm_deposit: Amount::ZERO,
            settled: false,
        });
        self.events.emit(CourtEvent::RulingAppealed {
            dispute_id,
            round_id,
            ruling,
        });
        Ok(())
    }

    /// Confirm a posted appeal with an opposing `ruling`, posting the
    /// confirmation deposit and creating the next round. The next round is
    /// drafted from the term the confirm window closes.
    ///
    /// # Errors
    ///
    /// - [`CourtError::InvalidAdjudicationState`] outside the confirm window.
    /// - [`CourtError::InvalidConfirmRuling`] if `ruling` is not a ruling of
    ///   this dispute or equals the appealed ruling.
    pub fn confirm_appeal(
        &mut self,
        confirmer: &AccountId,
        dispute_id: DisputeId,
        round_id: RoundId,
        ruling: Outcome,
    ) -> Result<RoundId, CourtError> {
        self.authorize(Operation::ConfirmAppeal, confirmer)?;
        let current = self.pending_term()?;
        let dispute = self.dispute(dispute_id)?;
        let possible_rulings = dispute.possible_rulings;
        let round = self.round(dispute_id, round_id)?;
        self.require_state(round, dispute_id, current, AdjudicationState::ConfirmingAppeal)?;
        let appeal = round
            .appeal
            .as_ref()
            .ok_or(CourtError::NoAppeal { dispute_id, round_id })?;
        if !ruling.is_ruling_of(possible_rulings) || ruling == appeal.appealed_ruling {
            return Err(CourtError::InvalidConfirmRuling {
                dispute_id,
                ruling: ruling.0,
            });
        }
        let plan = self.plan_next_round(round, current)?;
        let deposit = self.economics.confirm_appeal_deposit(&plan.fees)?;
        let next_draft_term = round.confirm_end_term(&self.config.round_durations);
        let pot = self.pot_with(next_draft_term, plan.fees.heartbeat_fee)?;
        let next_round = AdjudicationRound::new(
            plan.round_id,
            plan.kind,
            next_draft_term,
            plan.juror_count,
            confirmer.clone(),
            plan.fees,
        );

        self.env.accounting_mut().collect(confirmer, deposit)?;
        self.env.voting_mut().create(
            VoteId::for_round(dispute_id, plan.round_id),
            possible_rulings,
        )?;

        self.apply_due_transitions(confirmer)?;
        let round = self.round_mut(dispute_id, round_id)?;
        if let Some(appeal) = round.appeal.as_mut() {
            appeal.confirmer = Some(confirmer.clone());
            appeal.opposed_ruling = Some(ruling);
            appeal.confirm_deposit = deposit;
        }
        self.heartbeat_pots.insert(next_draft_term, pot);
        let index = self.dispute_index(dispute_id)?;
        self.disputes[index].rounds.push(next_round);
        self.events.emit(CourtEvent::RulingAppealConfirmed {
            dispute_id,
            round_id: plan.round_id,
            draft_term: next_draft_term,
            juror_count: plan.juror_count,
        });
        Ok(plan.round_id)
    }

    /// Record the final ruling once the last round has ended.
    ///
    /// The ruling is the last round's winning outcome ([`Outcome::REFUSED`]
    /// if nobody voted), or the appealed ruling when an unconfirmed appeal
    /// stands under the `appealed_ruling_prevails` policy.
    ///
    /// # Errors
    ///
    /// - [`CourtError::AlreadyExecuted`] on every call after the first.
    /// - [`CourtError::InvalidAdjudicationState`] until the last round ends.
    pub fn execute_ruling(&mut self, caller: &AccountId, dispute_id: DisputeId) -> Result<Outcome, CourtError> {
        self.authorize(Operation::ExecuteRuling, caller)?;
        let current = self.pending_term()?;
        let dispute = self.dispute(dispute_id)?;
        if dispute.state == DisputeState::Executed {
            return Err(CourtError::AlreadyExecuted(dispute_id));
        }
        let last = dispute
            .last_round()
            .ok_or(CourtError::UnknownDispute(dispute_id))?;
        self.require_state(last, dispute_id, current, AdjudicationState::Ended)?;
        let ruling = self.final_ruling_of(dispute)?;

        self.apply_due_transitions(caller)?;
        let index = self.dispute_index(dispute_id)?;
        let dispute = &mut self.disputes[index];
        dispute.state = DisputeState::Executed;
        dispute.final_ruling = Some(ruling);
        self.events.emit(CourtEvent::RulingExecuted { dispute_id, ruling });
        Ok(ruling)
    }

    // ── Internals ───────────────────────────────────────────────────

    pub(crate) fn authorize(&self, operation: Operation, caller: &AccountId) -> Result<(), CourtError> {
        authorize(operation, caller, &self.config.governor)
    }

    pub(crate) fn dispute_index(&self, id: DisputeId) -> Result<usize, CourtError> {
        usize::try_from(id.0)
            .ok()
            .filter(|&i| i < self.disputes.len())
            .ok_or(CourtError::UnknownDispute(id))
    }

    pub(crate) fn round_mut(
        &mut self,
        dispute_id: DisputeId,
        round_id: RoundId,
    ) -> Result<&mut AdjudicationRound, CourtError> {
        let index = self.dispute_index(dispute_id)?;
        self.disputes[index]
            .round_mut(round_id)
            .ok_or(CourtError::UnknownRound { dispute_id, round_id })
    }

    pub(crate) fn emit(&mut self, event: CourtEvent) {
        self.events.emit(event);
    }

    fn require_state(
        &self,
        round: &AdjudicationRound,
        dispute_id: DisputeId,
        term: TermId,
        expected: AdjudicationState,
    ) -> Result<(), CourtError> {
        let actual = round.state_at(term, &self.config.round_durations);
        if actual != expected {
            return Err(CourtError::InvalidAdjudicationState {
                dispute_id,
                round_id: round.id,
                expected,
                actual,
            });
        }
        Ok(())
    }

    fn pot_with(&self, term: TermId, fee: Amount) -> Result<Amount, CourtError> {
        let existing = self.heartbeat_pots.get(&term).copied().unwrap_or_default();
        Ok(existing.checked_add(fee)?)
    }

    fn plan_next_round(&self, round: &AdjudicationRound, term: TermId) -> Result<NextRoundPlan, CourtError> {
        let round_id = round
            .id
            .next()
            .ok_or(ArithmeticError::Overflow { op: "round id" })?;
        if round_id.0 >= self.config.max_regular_appeal_rounds {
            let total = self.env.registry().total_active_stake_at(term);
            let juror_count = self.economics.final_round_juror_count(total)?;
            Ok(NextRoundPlan {
                round_id,
                kind: RoundKind::Final,
                juror_count,
                fees: self.economics.final_round_fees(juror_count)?,
            })
        } else {
            let juror_count = next_round_juror_count(round.juror_count, self.config.appeal_step_factor);
            Ok(NextRoundPlan {
                round_id,
                kind: RoundKind::Regular,
                juror_count,
                fees: self.economics.regular_round_fees(juror_count)?,
            })
        }
    }

    pub(crate) fn final_ruling_of(&self, dispute: &Dispute) -> Result<Outcome, CourtError> {
        let last = dispute
            .last_round()
            .ok_or(CourtError::UnknownDispute(dispute.id))?;
        match &last.appeal {
            Some(appeal)
                if !appeal.is_confirmed()
                    && self.config.unconfirmed_appeal_policy
                        == UnconfirmedAppealPolicy::AppealedRulingPrevails =>
            {
                Ok(appeal.appealed_ruling)
            }
            _ => Ok(self
                .env
                .voting()
                .winning_outcome(dispute.vote_id(last.id))?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{commitment_for, InMemoryEnvironment};

    const START: i64 = 1_700_000_000;
    const DAY: u64 = 86_400;

    fn id(s: &str) -> AccountId {
        AccountId::new(s).unwrap()
    }

    fn start() -> Timestamp {
        Timestamp::from_epoch_secs(START).unwrap()
    }

    fn court() -> Court<InMemoryEnvironment> {
        court_with(&[("alice", 1_000), ("bob", 1_000), ("carol", 1_000)], |_| {})
    }

    fn court_with(
        jurors: &[(&str, u128)],
        configure: impl FnOnce(&mut CourtConfig),
    ) -> Court<InMemoryEnvironment> {
        let mut env = InMemoryEnvironment::new(start(), id("pool"), 30).unwrap();
        for (juror, stake) in jurors {
            env.registry.activate(&id(juror), Amount::new(*stake), TermId(1)).unwrap();
        }
        env.accounting.mint(&id("subject"), Amount::new(10_000)).unwrap();
        env.subscriptions.set_up_to_date(&id("subject"), true);
        let mut config = CourtConfig::new(id("gov"), start().checked_add_secs(DAY).unwrap());
        configure(&mut config);
        Court::new(config, env).unwrap()
    }

    fn total_locked(court: &Court<InMemoryEnvironment>) -> Amount {
        ["alice", "bob", "carol"]
            .iter()
            .fold(Amount::ZERO, |sum, j| sum.saturating_add(court.env().registry.locked_of(&id(j))))
    }

    fn next_term(court: &mut Court<InMemoryEnvironment>) {
        court.env_mut().chain.increase_time(DAY).unwrap();
        court.heartbeat(&id("keeper"), 1).unwrap();
        court.env_mut().chain.advance_blocks(2);
    }

    fn raise(court: &mut Court<InMemoryEnvironment>, draft_term: u64) -> DisputeId {
        court
            .create_dispute(&id("subject"), 2, 3, TermId(draft_term))
            .unwrap()
    }

    #[test]
    fn new_rejects_first_term_within_one_term() {
        let env = InMemoryEnvironment::new(start(), id("pool"), 30).unwrap();
        let config = CourtConfig::new(id("gov"), start().checked_add_secs(DAY - 1).unwrap());
        let err = Court::new(config, env).unwrap_err();
        assert!(matches!(err, CourtError::BadFirstTermStartTime { .. }));
    }

    #[test]
    fn heartbeat_requires_a_due_transition() {
        let mut court = court();
        let err = court.heartbeat(&id("keeper"), 1).unwrap_err();
        assert!(matches!(
            err,
            CourtError::InvalidTransitionCount { requested: 1, needed: 0 }
        ));
        assert_eq!(court.ensure_term_transitions(&id("keeper"), 1).unwrap(), 0);

        court.env_mut().chain.increase_time(DAY).unwrap();
        assert!(court.heartbeat(&id("keeper"), 0).is_err());
        assert!(court.ensure_term_transitions(&id("keeper"), 0).is_err());
        assert_eq!(court.heartbeat(&id("keeper"), 5).unwrap(), 1);
        assert_eq!(court.current_term_id(), TermId(1));
        assert_eq!(court.term(TermId(1)).unwrap().stake_supply_snapshot, Amount::new(3_000));
    }

    #[test]
    fn heartbeat_collects_fees_parked_on_new_terms() {
        let mut court = court();
        raise(&mut court, 1);
        raise(&mut court, 1);
        next_term(&mut court);
        assert_eq!(court.env().accounting.balance_of(&id("keeper")), Amount::new(40));
        assert!(court.heartbeat_pots.is_empty());
        assert!(matches!(court.events().last(), Some(CourtEvent::Heartbeat { .. })));
    }

    #[test]
    fn operations_refuse_too_many_implicit_transitions() {
        let mut court = court();
        court.env_mut().chain.increase_time(3 * DAY).unwrap();
        let err = court
            .create_dispute(&id("subject"), 2, 3, TermId(5))
            .unwrap_err();
        assert!(matches!(err, CourtError::TooManyTransitionsNeeded { needed: 3, max: 1 }));
        assert_eq!(court.dispute_count(), 0);

        assert_eq!(court.heartbeat(&id("keeper"), 2).unwrap(), 2);
        court.create_dispute(&id("subject"), 2, 3, TermId(5)).unwrap();
        assert_eq!(court.current_term_id(), TermId(3));
    }

    #[test]
    fn delay_start_time_is_governed_and_pre_start_only() {
        let mut court = court();
        let later = start().checked_add_secs(2 * DAY).unwrap();
        assert!(matches!(
            court.delay_start_time(&id("mallory"), later),
            Err(CourtError::SenderNotGovernor { .. })
        ));
        assert!(matches!(
            court.delay_start_time(&id("gov"), start()),
            Err(CourtError::CannotDelayPastStartTime { .. })
        ));
        court.delay_start_time(&id("gov"), later).unwrap();
        assert_eq!(court.config().first_term_start_time, later);

        court.env_mut().chain.increase_time(DAY).unwrap();
        assert_eq!(court.needed_term_transitions(), 0);
        court.env_mut().chain.increase_time(DAY).unwrap();
        assert_eq!(court.needed_term_transitions(), 1);
        let even_later = later.checked_add_secs(DAY).unwrap();
        assert!(matches!(
            court.delay_start_time(&id("gov"), even_later),
            Err(CourtError::CannotDelayStartedCourt)
        ));
    }

    #[test]
    fn governor_can_be_transferred() {
        let mut court = court();
        court.transfer_governor(&id("gov"), id("council")).unwrap();
        assert_eq!(court.governor(), &id("council"));
        assert!(court.transfer_governor(&id("gov"), id("gov")).is_err());
        assert!(matches!(
            court.events().last(),
            Some(CourtEvent::GovernorTransferred { .. })
        ));
    }

    #[test]
    fn create_dispute_validates_before_charging() {
        let mut court = court();
        let subject = id("subject");
        assert!(matches!(
            court.create_dispute(&subject, 1, 3, TermId(1)),
            Err(CourtError::InvalidRulingOptions { count: 1 })
        ));
        assert!(matches!(
            court.create_dispute(&subject, 254, 3, TermId(1)),
            Err(CourtError::InvalidRulingOptions { count: 254 })
        ));
        assert!(matches!(
            court.create_dispute(&subject, 2, 0, TermId(1)),
            Err(CourtError::InvalidJurorCount)
        ));
        assert!(matches!(
            court.create_dispute(&subject, 2, 3, TermId(0)),
            Err(CourtError::BadDraftTerm { .. })
        ));
        court.env_mut().subscriptions.set_up_to_date(&subject, false);
        assert!(matches!(
            court.create_dispute(&subject, 2, 3, TermId(1)),
            Err(CourtError::SubjectNotUpToDate { .. })
        ));

        let broke = id("broke");
        court.env_mut().subscriptions.set_up_to_date(&broke, true);
        let err = court.create_dispute(&broke, 2, 3, TermId(1)).unwrap_err();
        assert_eq!(err.class(), crate::error::ErrorClass::Economic);

        assert_eq!(court.dispute_count(), 0);
        assert!(court.heartbeat_pots.is_empty());
        assert_eq!(court.env().accounting.balance_of(&subject), Amount::new(10_000));
    }

    #[test]
    fn create_dispute_charges_the_draft_deposit() {
        let mut court = court();
        let dispute_id = raise(&mut court, 1);
        assert_eq!(dispute_id, DisputeId(0));
        assert_eq!(court.env().accounting.balance_of(&id("subject")), Amount::new(9_740));
        assert_eq!(court.env().accounting.custody(), Amount::new(260));

        let dispute = court.dispute(dispute_id).unwrap();
        assert_eq!(dispute.state, DisputeState::PreDraft);
        assert_eq!(dispute.rounds.len(), 1);
        assert_eq!(dispute.rounds[0].triggered_by, id("subject"));
        assert_eq!(
            court.adjudication_state(dispute_id, RoundId(0)).unwrap(),
            AdjudicationState::Invalid
        );
        assert!(matches!(
            court.dispute(DisputeId(7)),
            Err(CourtError::UnknownDispute(DisputeId(7)))
        ));
    }

    #[test]
    fn draft_waits_for_term_and_randomness() {
        let mut court = court();
        let dispute_id = raise(&mut court, 2);
        next_term(&mut court);
        assert!(matches!(
            court.draft(&id("keeper"), dispute_id, 3),
            Err(CourtError::DraftTermNotReached { .. })
        ));

        court.env_mut().chain.increase_time(DAY).unwrap();
        assert!(matches!(
            court.draft(&id("keeper"), dispute_id, 3),
            Err(CourtError::TermRandomnessNotYetComputed { .. })
        ));
        court.heartbeat(&id("keeper"), 1).unwrap();
        court.env_mut().chain.advance_blocks(1);
        assert!(matches!(
            court.draft(&id("keeper"), dispute_id, 3),
            Err(CourtError::TermRandomnessNotYetComputed { .. })
        ));
        court.env_mut().chain.advance_blocks(1);
        assert_eq!(court.draft(&id("keeper"), dispute_id, 3).unwrap(), 3);
        assert!(!court.term(TermId(2)).unwrap().randomness.is_empty());
    }

    #[test]
    fn draft_runs_in_batches() {
        let mut court = court();
        let dispute_id = raise(&mut court, 1);
        next_term(&mut court);

        assert!(matches!(
            court.draft(&id("keeper"), dispute_id, 0),
            Err(CourtError::BadBatchSize)
        ));
        assert_eq!(court.draft(&id("keeper"), dispute_id, 2).unwrap(), 2);
        assert_eq!(court.dispute(dispute_id).unwrap().state, DisputeState::PreDraft);
        assert_eq!(court.draft(&id("keeper"), dispute_id, 5).unwrap(), 1);
        assert_eq!(court.dispute(dispute_id).unwrap().state, DisputeState::Adjudicating);
        assert!(matches!(
            court.draft(&id("keeper"), dispute_id, 1),
            Err(CourtError::RoundAlreadyDrafted { .. })
        ));

        let round = court.round(dispute_id, RoundId(0)).unwrap();
        assert_eq!(round.selected_weight, 3);
        let total: u64 = round.jurors.values().map(|j| j.weight).sum();
        assert_eq!(total, 3);
        let locked: u128 = round.jurors.values().map(|j| j.locked.units()).sum();
        assert_eq!(locked, 3);
        assert_eq!(total_locked(&court), Amount::new(3));
        // heartbeat 20 plus draft fees 3 * 30
        assert_eq!(court.env().accounting.balance_of(&id("keeper")), Amount::new(110));
        let drafted = court
            .events()
            .iter()
            .filter(|e| matches!(e, CourtEvent::JurorDrafted { .. }))
            .count();
        assert_eq!(drafted, 3);
    }

    #[test]
    fn draft_batches_respect_the_configured_cap() {
        let mut court = court_with(
            &[("alice", 1_000), ("bob", 1_000), ("carol", 1_000)],
            |config| config.max_jurors_per_draft_batch = Some(2),
        );
        let dispute_id = court
            .create_dispute(&id("subject"), 2, 5, TermId(1))
            .unwrap();
        next_term(&mut court);

        assert_eq!(court.draft(&id("keeper"), dispute_id, 5).unwrap(), 2);
        assert_eq!(court.round(dispute_id, RoundId(0)).unwrap().selected_weight, 2);
        assert_eq!(court.dispute(dispute_id).unwrap().state, DisputeState::PreDraft);
        assert_eq!(court.draft(&id("keeper"), dispute_id, 5).unwrap(), 2);
        assert_eq!(court.draft(&id("keeper"), dispute_id, 5).unwrap(), 1);
        assert_eq!(court.round(dispute_id, RoundId(0)).unwrap().selected_weight, 5);
        assert_eq!(court.dispute(dispute_id).unwrap().state, DisputeState::Adjudicating);
    }

    #[test]
    fn draft_passes_over_jurors_without_unlocked_stake() {
        let mut court = court_with(&[("solo", 100)], |_| {});
        let first = court
            .create_dispute(&id("subject"), 2, 101, TermId(1))
            .unwrap();
        let second = court
            .create_dispute(&id("subject"), 2, 5, TermId(1))
            .unwrap();
        next_term(&mut court);
        let solo = id("solo");

        // a stake of 100 backs 100 units at 1 each, not 101
        assert!(matches!(
            court.draft(&id("keeper"), first, 101),
            Err(CourtError::NoActiveJurors(TermId(1)))
        ));
        assert_eq!(court.env().registry.locked_of(&solo), Amount::ZERO);
        assert_eq!(court.round(first, RoundId(0)).unwrap().selected_weight, 0);

        assert_eq!(court.draft(&id("keeper"), first, 100).unwrap(), 100);
        let round = court.round(first, RoundId(0)).unwrap();
        assert_eq!(round.juror_weight(&solo), 100);
        assert_eq!(round.jurors[&solo].locked, Amount::new(100));
        assert_eq!(round.draft_cursor, 100);
        assert_eq!(court.env().registry.locked_of(&solo), Amount::new(100));

        // fully locked, so no further seat anywhere
        assert!(matches!(
            court.draft(&id("keeper"), first, 1),
            Err(CourtError::NoActiveJurors(_))
        ));
        assert!(matches!(
            court.draft(&id("keeper"), second, 5),
            Err(CourtError::NoActiveJurors(_))
        ));
        assert_eq!(court.round(second, RoundId(0)).unwrap().selected_weight, 0);
        assert_eq!(court.env().registry.locked_of(&solo), Amount::new(100));
    }

    #[test]
    fn draft_without_custody_for_fees_locks_nothing() {
        let mut court = court();
        let dispute_id = raise(&mut court, 1);
        next_term(&mut court);
        let held = court.env().accounting.custody();
        court.env_mut().accounting.assign(&id("elsewhere"), held).unwrap();

        let err = court.draft(&id("keeper"), dispute_id, 3).unwrap_err();
        assert!(matches!(
            err,
            CourtError::Collaborator(CollaboratorError::InsufficientCustody { .. })
        ));
        assert_eq!(total_locked(&court), Amount::ZERO);
        let round = court.round(dispute_id, RoundId(0)).unwrap();
        assert_eq!(round.selected_weight, 0);
        assert_eq!(round.draft_cursor, 0);
        assert!(!court
            .events()
            .iter()
            .any(|e| matches!(e, CourtEvent::JurorDrafted { .. })));
    }

    #[test]
    fn late_draft_delays_voting() {
        let mut court = court();
        let dispute_id = raise(&mut court, 1);
        next_term(&mut court);
        next_term(&mut court);
        court.draft(&id("keeper"), dispute_id, 3).unwrap();
        let round = court.round(dispute_id, RoundId(0)).unwrap();
        assert_eq!(round.delayed_terms, 1);
        assert_eq!(round.voting_start_term(), TermId(2));
        assert_eq!(
            court.adjudication_state(dispute_id, RoundId(0)).unwrap(),
            AdjudicationState::Committing
        );
    }

    #[test]
    fn only_drafted_jurors_commit_in_the_commit_window() {
        let mut court = court();
        let dispute_id = raise(&mut court, 1);
        next_term(&mut court);
        court.draft(&id("keeper"), dispute_id, 3).unwrap();
        let drafted = court.round(dispute_id, RoundId(0)).unwrap().juror_order[0].clone();
        let salt = [1u8; 32];
        let commitment = commitment_for(Outcome::ruling(0), &salt);

        assert!(matches!(
            court.commit_vote(&id("outsider"), dispute_id, RoundId(0), commitment),
            Err(CourtError::JurorNotDrafted { .. })
        ));
        court.commit_vote(&drafted, dispute_id, RoundId(0), commitment).unwrap();
        assert!(court.commit_vote(&drafted, dispute_id, RoundId(0), commitment).is_err());

        assert!(matches!(
            court.reveal_vote(&drafted, dispute_id, RoundId(0), Outcome::ruling(0), &salt),
            Err(CourtError::InvalidAdjudicationState {
                expected: AdjudicationState::Revealing,
                actual: AdjudicationState::Committing,
                ..
            })
        ));
        next_term(&mut court);
        court
            .reveal_vote(&drafted, dispute_id, RoundId(0), Outcome::ruling(0), &salt)
            .unwrap();
    }

    #[test]
    fn appeal_rulings_are_validated() {
        let mut court = court();
        let dispute_id = raise(&mut court, 1);
        next_term(&mut court);
        court.draft(&id("keeper"), dispute_id, 3).unwrap();
        next_term(&mut court);
        next_term(&mut court);
        assert_eq!(
            court.adjudication_state(dispute_id, RoundId(0)).unwrap(),
            AdjudicationState::Appealing
        );
        court.env_mut().accounting.mint(&id("appealer"), Amount::new(10_000)).unwrap();

        // nobody voted, so the winning outcome is REFUSED
        for ruling in [Outcome::REFUSED, Outcome::MISSING, Outcome::ruling(2)] {
            assert!(matches!(
                court.appeal(&id("appealer"), dispute_id, RoundId(0), ruling),
                Err(CourtError::InvalidAppealRuling { .. })
            ));
        }
        let plan = court.next_round_plan(dispute_id, RoundId(0)).unwrap();
        assert_eq!(plan.juror_count, 9);
        court
            .appeal(&id("appealer"), dispute_id, RoundId(0), Outcome::ruling(0))
            .unwrap();
        assert_eq!(
            court.env().accounting.balance_of(&id("appealer")),
            Amount::new(10_000 - 2_220)
        );
        assert!(matches!(
            court.appeal(&id("appealer"), dispute_id, RoundId(0), Outcome::ruling(1)),
            Err(CourtError::AppealAlreadyMade { .. })
        ));
    }

    #[test]
    fn execute_ruling_waits_for_the_last_round_to_end() {
        let mut court = court();
        let dispute_id = raise(&mut court, 1);
        next_term(&mut court);
        court.draft(&id("keeper"), dispute_id, 3).unwrap();
        assert!(matches!(
            court.execute_ruling(&id("keeper"), dispute_id),
            Err(CourtError::InvalidAdjudicationState { .. })
        ));
        for _ in 0..3 {
            next_term(&mut court);
        }
        assert_eq!(court.execute_ruling(&id("keeper"), dispute_id).unwrap(), Outcome::REFUSED);
        assert_eq!(court.dispute(dispute_id).unwrap().final_ruling, Some(Outcome::REFUSED));
        assert!(matches!(
            court.execute_ruling(&id("keeper"), dispute_id),
            Err(CourtError::AlreadyExecuted(_))
        ));
    }
}
