//! # Court Notifications
//!
//! Every state change observable from outside the court is recorded as a
//! [`CourtEvent`] in emission order. Each event is also logged through
//! `tracing` at `info` level with structured fields. Embedders drain the log
//! after each call to forward events to watchers.

use juris_core::{AccountId, Amount, DisputeId, RoundId, TermId, Timestamp};
use serde::{Deserialize, Serialize};

use crate::dispute::Outcome;

/// Observable court notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CourtEvent {
    /// Terms were created.
    Heartbeat {
        /// Term before the transition.
        previous_term: TermId,
        /// Term after the transition.
        current_term: TermId,
    },
    /// Governor moved the first term start.
    StartTimeDelayed {
        /// Old first term start.
        previous_start: Timestamp,
        /// New first term start.
        current_start: Timestamp,
    },
    /// Dispute raised.
    NewDispute {
        /// New dispute.
        dispute_id: DisputeId,
        /// Raising agreement.
        subject: AccountId,
        /// Round 0 draft term.
        draft_term: TermId,
        /// Round 0 juror count.
        juror_count: u64,
    },
    /// One unit of weight drafted to a juror.
    JurorDrafted {
        /// Dispute.
        dispute_id: DisputeId,
        /// Round.
        round_id: RoundId,
        /// Drafted juror.
        juror: AccountId,
    },
    /// Appeal posted.
    RulingAppealed {
        /// Dispute.
        dispute_id: DisputeId,
        /// Appealed round.
        round_id: RoundId,
        /// Ruling argued for.
        ruling: Outcome,
    },
    /// Appeal confirmed; next round created.
    RulingAppealConfirmed {
        /// Dispute.
        dispute_id: DisputeId,
        /// New round.
        round_id: RoundId,
        /// New round draft term.
        draft_term: TermId,
        /// New round juror count.
        juror_count: u64,
    },
    /// Final ruling recorded.
    RulingExecuted {
        /// Dispute.
        dispute_id: DisputeId,
        /// Final ruling.
        ruling: Outcome,
    },
    /// Every juror of a round processed.
    PenaltiesSettled {
        /// Dispute.
        dispute_id: DisputeId,
        /// Round.
        round_id: RoundId,
        /// Total penalties collected.
        collected_tokens: Amount,
    },
    /// Coherent juror paid.
    RewardSettled {
        /// Dispute.
        dispute_id: DisputeId,
        /// Round.
        round_id: RoundId,
        /// Paid juror.
        juror: AccountId,
        /// Share of collected penalties.
        tokens: Amount,
        /// Share of juror fees.
        fees: Amount,
    },
    /// Appeal deposits distributed.
    AppealDepositSettled {
        /// Dispute.
        dispute_id: DisputeId,
        /// Appealed round.
        round_id: RoundId,
    },
    /// Governor role handed over.
    GovernorTransferred {
        /// Previous governor.
        previous: AccountId,
        /// New governor.
        current: AccountId,
    },
    /// Drip topped up the subscriptions pool.
    FeesDripped {
        /// Subscription period.
        period_id: u64,
        /// Amount donated.
        amount: Amount,
    },
}

impl CourtEvent {
    /// Short snake_case name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Heartbeat { .. } => "heartbeat",
            Self::StartTimeDelayed { .. } => "start_time_delayed",
            Self::NewDispute { .. } => "new_dispute",
            Self::JurorDrafted { .. } => "juror_drafted",
            Self::RulingAppealed { .. } => "ruling_appealed",
            Self::RulingAppealConfirmed { .. } => "ruling_appeal_confirmed",
            Self::RulingExecuted { .. } => "ruling_executed",
            Self::PenaltiesSettled { .. } => "penalties_settled",
            Self::RewardSettled { .. } => "reward_settled",
            Self::AppealDepositSettled { .. } => "appeal_deposit_settled",
            Self::GovernorTransferred { .. } => "governor_transferred",
            Self::FeesDripped { .. } => "fees_dripped",
        }
    }
}

/// Ordered event buffer.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<CourtEvent>,
}

impl EventLog {
    /// Empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record and log an event.
    pub fn emit(&mut self, event: CourtEvent) {
        match &event {
            CourtEvent::Heartbeat { previous_term, current_term } => {
                tracing::info!(previous = %previous_term, current = %current_term, "heartbeat");
            }
            CourtEvent::JurorDrafted { dispute_id, round_id, juror } => {
                tracing::debug!(dispute_id = %dispute_id, round_id = %round_id, juror = %juror, "juror drafted");
            }
            other => {
                tracing::info!(event = other.name(), detail = ?other, "court event");
            }
        }
        self.events.push(event);
    }

    /// Events recorded so far.
    pub fn events(&self) -> &[CourtEvent] {
        &self.events
    }

    /// Take every recorded event, leaving the log empty.
    pub fn drain(&mut self) -> Vec<CourtEvent> {
        std::mem::take(&mut self.events)
    }
}
