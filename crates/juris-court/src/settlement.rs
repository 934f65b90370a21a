//! # Settlement
//!
//! Once a ruling is executed each round is settled in order:
//!
//! 1. [`Court::settle_penalties`] walks the round's jurors in draft order,
//!    slashing the locked stake of every juror whose revealed outcome
//!    differs from the final ruling and paying the caller settle fees. It
//!    may run in batches; the batch that completes the round collects the
//!    settle fees still unpaid, including those of final-round weight that
//!    never voted.
//! 2. [`Court::settle_reward`] pays each coherent juror a weight-proportional
//!    share of the collected penalties and of the round's juror fees, and
//!    releases their lock.
//! 3. [`Court::settle_appeal_deposit`] distributes the appeal and
//!    confirmation deposits held against the round.
//!
//! A round with no coherent juror refunds its juror fees to the account that
//! paid for the round and burns the collected penalties.

use juris_core::{AccountId, Amount, DisputeId, RoundId};
use serde::{Deserialize, Serialize};

use crate::access::Operation;
use crate::collaborators::{Accounting, Environment, JurorRegistry, Subscriptions, Voting};
use crate::config::UnconfirmedAppealPolicy;
use crate::court::Court;
use crate::dispute::{DisputeState, Outcome};
use crate::error::CourtError;
use crate::events::CourtEvent;

/// What a coherent juror received from [`Court::settle_reward`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JurorReward {
    /// Share of the round's collected penalties.
    pub tokens: Amount,
    /// Share of the round's juror fees.
    pub fees: Amount,
}

struct PenaltyLine {
    juror: AccountId,
    weight: u64,
    locked: Amount,
    coherent: bool,
}

impl<E: Environment> Court<E> {
    /// Settle penalties for up to `max_jurors` jurors of a round (0 settles
    /// every remaining juror). Returns the number of jurors processed.
    ///
    /// # Errors
    ///
    /// - [`CourtError::RulingNotExecuted`] before the ruling is executed.
    /// - [`CourtError::PenaltiesAlreadySettled`] once the round is done.
    /// - [`CourtError::PreviousRoundNotSettled`] while an earlier round is pending.
    pub fn settle_penalties(
        &mut self,
        caller: &AccountId,
        dispute_id: DisputeId,
        round_id: RoundId,
        max_jurors: u64,
    ) -> Result<u64, CourtError> {
        self.authorize(Operation::SettlePenalties, caller)?;
        let term = self.pending_term()?;
        let dispute = self.dispute(dispute_id)?;
        let final_ruling = executed_ruling(dispute.state, dispute.final_ruling, dispute_id)?;
        let round = self.round(dispute_id, round_id)?;
        if round.penalties_settled {
            return Err(CourtError::PenaltiesAlreadySettled { dispute_id, round_id });
        }
        if let Some(previous) = round_id.previous() {
            if !self.round(dispute_id, previous)?.penalties_settled {
                return Err(CourtError::PreviousRoundNotSettled {
                    dispute_id,
                    round_id: previous,
                });
            }
        }

        let vote = dispute.vote_id(round_id);
        let remaining = round.juror_order.len().saturating_sub(round.settle_cursor);
        let batch = match usize::try_from(max_jurors) {
            Ok(0) | Err(_) => remaining,
            Ok(max) => max.min(remaining),
        };
        let start = round.settle_cursor;
        let mut lines = Vec::with_capacity(batch);
        for juror in &round.juror_order[start..start + batch] {
            let Some(participation) = round.jurors.get(juror) else {
                continue;
            };
            let outcome = self.env.voting().voter_outcome(vote, juror)?;
            tracing::debug!(
                dispute_id = %dispute_id,
                round_id = %round_id,
                juror = %juror,
                outcome = %outcome,
                weight = participation.weight,
                "settling juror penalty"
            );
            lines.push(PenaltyLine {
                juror: juror.clone(),
                weight: participation.weight,
                locked: participation.locked,
                coherent: outcome == final_ruling,
            });
        }

        let completes = start + batch == round.juror_order.len();
        let settled_weight = lines.iter().map(|l| l.weight).sum::<u64>();
        // the closing batch also takes the share of weight nobody used
        let payout = if completes {
            round.settle_fees_remaining
        } else if round.juror_count == 0 {
            Amount::ZERO
        } else {
            round
                .fees
                .settle_fees
                .mul_div(u128::from(settled_weight), u128::from(round.juror_count))?
                .min(round.settle_fees_remaining)
        };
        let mut collected = round.collected_tokens;
        let mut coherent_weight = round.coherent_weight;
        for line in &lines {
            if line.coherent {
                coherent_weight = coherent_weight.saturating_add(line.weight);
            } else {
                collected = collected.checked_add(line.locked)?;
            }
        }
        let no_coherent = completes && coherent_weight == 0;
        let refund = if no_coherent { round.fees.juror_fees } else { Amount::ZERO };
        let triggered_by = round.triggered_by.clone();
        let settle_fees_remaining = round.settle_fees_remaining.saturating_sub(payout);

        for line in lines.iter().filter(|l| !l.coherent && !l.locked.is_zero()) {
            self.env
                .registry_mut()
                .slash_locked(&line.juror, line.locked, term)?;
        }
        if !payout.is_zero() {
            self.env.accounting_mut().assign(caller, payout)?;
        }
        if no_coherent {
            if !refund.is_zero() {
                self.env.accounting_mut().assign(&triggered_by, refund)?;
            }
            if !collected.is_zero() {
                self.env.registry_mut().burn(collected)?;
            }
            tracing::info!(
                dispute_id = %dispute_id,
                round_id = %round_id,
                refunded = %refund,
                burned = %collected,
                "no coherent jurors in round"
            );
        }

        self.apply_due_transitions(caller)?;
        let round = self.round_mut(dispute_id, round_id)?;
        for line in &lines {
            if let Some(participation) = round.jurors.get_mut(&line.juror) {
                participation.penalty_settled = true;
            }
        }
        round.settle_cursor = start + batch;
        round.collected_tokens = collected;
        round.coherent_weight = coherent_weight;
        round.settle_fees_remaining = settle_fees_remaining;
        round.penalties_settled = completes;
        if completes {
            self.emit(CourtEvent::PenaltiesSettled {
                dispute_id,
                round_id,
                collected_tokens: collected,
            });
        }
        Ok(batch as u64)
    }

    /// Pay a coherent juror their share of a settled round and unlock their stake.
    ///
    /// # Errors
    ///
    /// - [`CourtError::PenaltiesNotSettled`] until the round's penalties are settled.
    /// - [`CourtError::JurorNotDrafted`] if the juror took no part in the round.
    /// - [`CourtError::AlreadySettled`] on a second call for the same juror.
    /// - [`CourtError::WontRewardIncoherentJuror`] if the juror voted otherwise.
    pub fn settle_reward(
        &mut self,
        caller: &AccountId,
        dispute_id: DisputeId,
        round_id: RoundId,
        juror: &AccountId,
    ) -> Result<JurorReward, CourtError> {
        self.authorize(Operation::SettleReward, caller)?;
        self.pending_term()?;
        let dispute = self.dispute(dispute_id)?;
        let final_ruling = executed_ruling(dispute.state, dispute.final_ruling, dispute_id)?;
        let round = self.round(dispute_id, round_id)?;
        if !round.penalties_settled {
            return Err(CourtError::PenaltiesNotSettled { dispute_id, round_id });
        }
        let participation = round.jurors.get(juror).ok_or_else(|| CourtError::JurorNotDrafted {
            dispute_id,
            round_id,
            juror: juror.clone(),
        })?;
        if participation.rewarded {
            return Err(CourtError::AlreadySettled {
                dispute_id,
                round_id,
                juror: juror.clone(),
            });
        }
        let outcome = self
            .env
            .voting()
            .voter_outcome(dispute.vote_id(round_id), juror)?;
        if outcome != final_ruling || round.coherent_weight == 0 {
            return Err(CourtError::WontRewardIncoherentJuror {
                dispute_id,
                juror: juror.clone(),
            });
        }
        let weight = u128::from(participation.weight);
        let coherent = u128::from(round.coherent_weight);
        let reward = JurorReward {
            tokens: round.collected_tokens.mul_div(weight, coherent)?,
            fees: round.fees.juror_fees.mul_div(weight, coherent)?,
        };
        let locked = participation.locked;

        if !locked.is_zero() {
            self.env.registry_mut().unlock_stake(juror, locked)?;
        }
        if !reward.tokens.is_zero() {
            self.env.registry_mut().reward(juror, reward.tokens)?;
        }
        if !reward.fees.is_zero() {
            self.env.accounting_mut().assign(juror, reward.fees)?;
        }

        self.apply_due_transitions(caller)?;
        let round = self.round_mut(dispute_id, round_id)?;
        if let Some(participation) = round.jurors.get_mut(juror) {
            participation.rewarded = true;
        }
        self.emit(CourtEvent::RewardSettled {
            dispute_id,
            round_id,
            juror: juror.clone(),
            tokens: reward.tokens,
            fees: reward.fees,
        });
        Ok(reward)
    }

    /// Distribute the deposits posted against a round's appeal.
    ///
    /// An unconfirmed appeal's deposit follows the configured
    /// [`UnconfirmedAppealPolicy`]. For a confirmed appeal the next round's
    /// fees are deducted from the pooled deposits; the side whose ruling won
    /// takes the rest, and if neither did each side gets its own deposit back
    /// minus half the fees.
    ///
    /// # Errors
    ///
    /// - [`CourtError::PenaltiesNotSettled`] until the round's penalties are settled.
    /// - [`CourtError::NoAppeal`] if the round was not appealed.
    /// - [`CourtError::AppealDepositAlreadySettled`] on a second call.
    pub fn settle_appeal_deposit(
        &mut self,
        caller: &AccountId,
        dispute_id: DisputeId,
        round_id: RoundId,
    ) -> Result<(), CourtError> {
        self.authorize(Operation::SettleAppealDeposit, caller)?;
        self.pending_term()?;
        let dispute = self.dispute(dispute_id)?;
        let final_ruling = executed_ruling(dispute.state, dispute.final_ruling, dispute_id)?;
        let round = self.round(dispute_id, round_id)?;
        if !round.penalties_settled {
            return Err(CourtError::PenaltiesNotSettled { dispute_id, round_id });
        }
        let appeal = round
            .appeal
            .as_ref()
            .ok_or(CourtError::NoAppeal { dispute_id, round_id })?;
        if appeal.settled {
            return Err(CourtError::AppealDepositAlreadySettled { dispute_id, round_id });
        }

        let mut payouts: Vec<(AccountId, Amount)> = Vec::with_capacity(2);
        let mut donation = Amount::ZERO;
        match (&appeal.confirmer, appeal.opposed_ruling) {
            (Some(confirmer), Some(opposed_ruling)) => {
                let next_fees = round_id
                    .next()
                    .and_then(|next| dispute.round(next))
                    .map(|next| next.fees.total)
                    .ok_or(CourtError::UnknownRound { dispute_id, round_id })?;
                let pooled = appeal
                    .appeal_deposit
                    .checked_add(appeal.confirm_deposit)?
                    .checked_sub(next_fees)?;
                if final_ruling == appeal.appealed_ruling {
                    payouts.push((appeal.appealer.clone(), pooled));
                } else if final_ruling == opposed_ruling {
                    payouts.push((confirmer.clone(), pooled));
                } else {
                    let half = next_fees.checked_div(2)?;
                    payouts.push((appeal.appealer.clone(), appeal.appeal_deposit.saturating_sub(half)));
                    payouts.push((confirmer.clone(), appeal.confirm_deposit.saturating_sub(half)));
                }
            }
            _ => match self.config.unconfirmed_appeal_policy {
                UnconfirmedAppealPolicy::RefundAppealer | UnconfirmedAppealPolicy::AppealedRulingPrevails => {
                    payouts.push((appeal.appealer.clone(), appeal.appeal_deposit));
                }
                UnconfirmedAppealPolicy::DonateToSubscriptions => {
                    payouts.push((self.env.subscriptions().account().clone(), appeal.appeal_deposit));
                    donation = appeal.appeal_deposit;
                }
            },
        }

        for (account, amount) in payouts.iter().filter(|(_, amount)| !amount.is_zero()) {
            self.env.accounting_mut().assign(account, *amount)?;
        }
        if !donation.is_zero() {
            self.env.subscriptions_mut().deposit_donation(donation)?;
        }

        self.apply_due_transitions(caller)?;
        let round = self.round_mut(dispute_id, round_id)?;
        if let Some(appeal) = round.appeal.as_mut() {
            appeal.settled = true;
        }
        self.emit(CourtEvent::AppealDepositSettled { dispute_id, round_id });
        Ok(())
    }
}

fn executed_ruling(
    state: DisputeState,
    final_ruling: Option<Outcome>,
    dispute_id: DisputeId,
) -> Result<Outcome, CourtError> {
    match (state, final_ruling) {
        (DisputeState::Executed, Some(ruling)) => Ok(ruling),
        _ => Err(CourtError::RulingNotExecuted(dispute_id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CourtConfig;
    use crate::memory::InMemoryEnvironment;
    use juris_core::{TermId, Timestamp};

    const DAY: u64 = 86_400;

    fn id(s: &str) -> AccountId {
        AccountId::new(s).unwrap()
    }

    fn next_term(court: &mut Court<InMemoryEnvironment>) {
        court.env_mut().chain.increase_time(DAY).unwrap();
        court.heartbeat(&id("keeper"), 1).unwrap();
        court.env_mut().chain.advance_blocks(2);
    }

    /// Executed dispute whose single juror never voted.
    fn executed_silent_dispute() -> (Court<InMemoryEnvironment>, DisputeId) {
        let now = Timestamp::from_epoch_secs(1_700_000_000).unwrap();
        let mut env = InMemoryEnvironment::new(now, id("pool"), 30).unwrap();
        env.registry.activate(&id("alice"), Amount::new(1_000), TermId(1)).unwrap();
        env.accounting.mint(&id("subject"), Amount::new(1_000)).unwrap();
        env.subscriptions.set_up_to_date(&id("subject"), true);
        let config = CourtConfig::new(id("gov"), now.checked_add_secs(DAY).unwrap());
        let mut court = Court::new(config, env).unwrap();
        let dispute_id = court.create_dispute(&id("subject"), 2, 1, TermId(1)).unwrap();
        next_term(&mut court);
        court.draft(&id("keeper"), dispute_id, 1).unwrap();
        for _ in 0..3 {
            next_term(&mut court);
        }
        court.execute_ruling(&id("keeper"), dispute_id).unwrap();
        (court, dispute_id)
    }

    #[test]
    fn executed_ruling_requires_both_state_and_ruling() {
        let dispute_id = DisputeId(4);
        assert_eq!(
            executed_ruling(DisputeState::Executed, Some(Outcome::REFUSED), dispute_id).unwrap(),
            Outcome::REFUSED
        );
        assert!(executed_ruling(DisputeState::Adjudicating, Some(Outcome::REFUSED), dispute_id).is_err());
        assert!(executed_ruling(DisputeState::Executed, None, dispute_id).is_err());
    }

    #[test]
    fn silent_juror_is_slashed_and_fees_refunded() {
        let (mut court, dispute_id) = executed_silent_dispute();
        let subject_before = court.env().accounting.balance_of(&id("subject"));
        assert_eq!(
            court
                .settle_penalties(&id("keeper"), dispute_id, RoundId(0), 0)
                .unwrap(),
            1
        );
        let round = court.round(dispute_id, RoundId(0)).unwrap();
        assert_eq!(round.settle_cursor, 1);
        assert_eq!(round.coherent_weight, 0);
        assert_eq!(round.collected_tokens, Amount::new(1));
        assert!(round.jurors[&id("alice")].penalty_settled);
        assert_eq!(
            court.env().accounting.balance_of(&id("subject")),
            subject_before.checked_add(Amount::new(10)).unwrap()
        );
        assert_eq!(court.env().registry.burned(), Amount::new(1));
        assert_eq!(court.env().registry.locked_of(&id("alice")), Amount::ZERO);

        assert!(matches!(
            court.settle_reward(&id("keeper"), dispute_id, RoundId(0), &id("alice")),
            Err(CourtError::WontRewardIncoherentJuror { .. })
        ));
        assert!(matches!(
            court.settle_penalties(&id("keeper"), dispute_id, RoundId(1), 0),
            Err(CourtError::UnknownRound { .. })
        ));
    }

    #[test]
    fn reward_serializes_amounts_as_strings() {
        let reward = JurorReward {
            tokens: Amount::new(5),
            fees: Amount::new(15),
        };
        let json = serde_json::to_value(reward).unwrap();
        assert_eq!(json["tokens"], "5");
        assert_eq!(json["fees"], "15");
    }
}
