//! # Court Error Types
//!
//! Structured error hierarchy for the court. Every failure is synchronous and
//! leaves court state untouched; variants carry the identifiers and terms an
//! operator needs to decide whether to fix inputs, retry later, or stop.
//!
//! [`CourtError::class`] sorts every variant into one of five
//! [`ErrorClass`]es, which tells a caller what kind of remedy applies.

use std::path::PathBuf;

use juris_core::{
    AccountId, Amount, ArithmeticError, BlockNumber, DisputeId, RoundId, TermId, Timestamp,
    ValidationError,
};
use thiserror::Error;

use crate::dispute::AdjudicationState;

/// Broad category of a court failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Bad construction parameters or call arguments. Fix the inputs.
    Configuration,
    /// Called at the wrong term or block. Retry later.
    Temporal,
    /// Caller lacks the required role.
    Authorization,
    /// Missing funds or an already-consumed payout.
    Economic,
    /// Reference to something that does not exist or an invalid value.
    Validation,
}

/// Failures raised by external collaborators (registry, voting, ledger,
/// subscriptions).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    /// Account balance cannot cover the requested amount.
    #[error("insufficient balance for {account}: need {needed}, have {available}")]
    InsufficientBalance {
        /// Account being debited.
        account: String,
        /// Amount requested.
        needed: Amount,
        /// Amount actually available.
        available: Amount,
    },

    /// Court custody cannot cover a payout.
    #[error("insufficient custody: need {needed}, have {available}")]
    InsufficientCustody {
        /// Amount requested.
        needed: Amount,
        /// Amount held in custody.
        available: Amount,
    },

    /// A juror's unlocked active stake cannot cover a lock.
    #[error("insufficient unlocked stake for {juror}: need {needed}, have {available}")]
    InsufficientStake {
        /// Juror whose stake would be locked.
        juror: String,
        /// Amount requested.
        needed: Amount,
        /// Unlocked active stake.
        available: Amount,
    },

    /// The voting component has no record of this vote.
    #[error("unknown vote {0}")]
    UnknownVote(String),

    /// The vote already exists.
    #[error("vote {0} already exists")]
    DuplicateVote(String),

    /// The voter already committed to this vote.
    #[error("voter {voter} already committed to vote {vote}")]
    AlreadyCommitted {
        /// Vote identifier.
        vote: String,
        /// Committing voter.
        voter: String,
    },

    /// Reveal attempted without a prior commitment.
    #[error("voter {voter} has no commitment for vote {vote}")]
    NotCommitted {
        /// Vote identifier.
        vote: String,
        /// Revealing voter.
        voter: String,
    },

    /// The voter already revealed.
    #[error("voter {voter} already revealed vote {vote}")]
    AlreadyRevealed {
        /// Vote identifier.
        vote: String,
        /// Revealing voter.
        voter: String,
    },

    /// Revealed outcome and salt do not hash to the commitment.
    #[error("reveal for vote {vote} by {voter} does not match commitment")]
    CommitmentMismatch {
        /// Vote identifier.
        vote: String,
        /// Revealing voter.
        voter: String,
    },

    /// Outcome is outside the vote's valid range.
    #[error("outcome {outcome} is not valid for vote {vote}")]
    InvalidOutcome {
        /// Vote identifier.
        vote: String,
        /// The rejected outcome.
        outcome: u8,
    },

    /// The registry has no record of this juror.
    #[error("unknown juror {0}")]
    UnknownJuror(String),

    /// Subscription period duration must be positive.
    #[error("subscription period duration must be greater than zero")]
    ZeroPeriodDuration,

    /// Stake checkpoint written out of term order.
    #[error("checkpoint for {juror} at {term} precedes latest checkpoint at {latest}")]
    CheckpointOutOfOrder {
        /// Juror whose history would be rewritten.
        juror: String,
        /// Requested checkpoint term.
        term: TermId,
        /// Latest recorded checkpoint term.
        latest: TermId,
    },

    /// Collaborator arithmetic overflowed.
    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),
}

/// Failures while loading or validating a [`CourtConfig`](crate::config::CourtConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config at {path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying IO failure.
        source: std::io::Error,
    },

    /// YAML parsing failed.
    #[error("failed to parse config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A field holds a value outside its allowed range.
    #[error("invalid config field {field}: {reason}")]
    InvalidField {
        /// Field name as written in YAML.
        field: &'static str,
        /// Which rule the value broke.
        reason: &'static str,
    },
}

/// Errors arising from court operations.
#[derive(Error, Debug)]
pub enum CourtError {
    // ── Configuration ───────────────────────────────────────────────
    /// Court configuration rejected.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Term duration must be positive.
    #[error("term duration must be greater than zero")]
    ZeroTermDuration,

    /// First term would start too early.
    #[error("first term start {first} is earlier than {earliest} (now plus one term)")]
    BadFirstTermStartTime {
        /// Requested first term start.
        first: Timestamp,
        /// Earliest acceptable first term start.
        earliest: Timestamp,
    },

    /// Transition count would result in zero transitions while some are due,
    /// or an explicit heartbeat had nothing to do.
    #[error("invalid transition count {requested} with {needed} transitions due")]
    InvalidTransitionCount {
        /// Requested maximum transitions.
        requested: u64,
        /// Transitions currently due.
        needed: u64,
    },

    /// Too many term transitions are due for an operation to perform them
    /// implicitly. Call a heartbeat first.
    #[error("{needed} term transitions due, at most {max} performed implicitly")]
    TooManyTransitionsNeeded {
        /// Transitions currently due.
        needed: u64,
        /// Implicit transition allowance.
        max: u64,
    },

    /// Number of possible rulings outside `[2, 253]`.
    #[error("possible ruling count {count} outside [2, 253]")]
    InvalidRulingOptions {
        /// Requested ruling count.
        count: u8,
    },

    /// A dispute must request at least one juror.
    #[error("juror count must be greater than zero")]
    InvalidJurorCount,

    /// A batch operation was asked to process nothing.
    #[error("batch size must be greater than zero")]
    BadBatchSize,

    // ── Temporal ────────────────────────────────────────────────────
    /// Court has already started counting terms.
    #[error("cannot delay start time: court started")]
    CannotDelayStartedCourt,

    /// New start time is not later than the current one.
    #[error("cannot delay start time from {current} to {requested}")]
    CannotDelayPastStartTime {
        /// Current first term start.
        current: Timestamp,
        /// Requested first term start.
        requested: Timestamp,
    },

    /// Dispute draft term must be in the future.
    #[error("draft {requested} must be after current {current}")]
    BadDraftTerm {
        /// Requested draft term.
        requested: TermId,
        /// Current term.
        current: TermId,
    },

    /// Round cannot be drafted before its draft term.
    #[error("draft {draft_term} not reached, current {current}")]
    DraftTermNotReached {
        /// Round draft term.
        draft_term: TermId,
        /// Current term.
        current: TermId,
    },

    /// Term has not been created yet.
    #[error("{0} has not been reached")]
    TermNotReached(TermId),

    /// Randomness block not mined yet.
    #[error("randomness for {term} not yet computed: block {randomness_block} not mined")]
    TermRandomnessNotYetComputed {
        /// Term whose randomness was requested.
        term: TermId,
        /// Block whose hash seeds the term.
        randomness_block: BlockNumber,
    },

    /// Randomness block is too old for its hash to be retrieved.
    #[error("randomness for {term} unavailable: hash of block {randomness_block} expired")]
    TermRandomnessUnavailable {
        /// Term whose randomness was requested.
        term: TermId,
        /// Block whose hash seeds the term.
        randomness_block: BlockNumber,
    },

    /// Round is not in the state the operation requires.
    #[error("{dispute_id} {round_id} is {actual}, expected {expected}")]
    InvalidAdjudicationState {
        /// Dispute identifier.
        dispute_id: DisputeId,
        /// Round identifier.
        round_id: RoundId,
        /// Required state.
        expected: AdjudicationState,
        /// Actual state at the current term.
        actual: AdjudicationState,
    },

    /// Round already has its full panel.
    #[error("{dispute_id} {round_id} already drafted")]
    RoundAlreadyDrafted {
        /// Dispute identifier.
        dispute_id: DisputeId,
        /// Round identifier.
        round_id: RoundId,
    },

    /// Ruling has already been executed.
    #[error("{0} ruling already executed")]
    AlreadyExecuted(DisputeId),

    /// Ruling has not been executed yet.
    #[error("{0} ruling not executed")]
    RulingNotExecuted(DisputeId),

    /// Previous round penalties must be settled first.
    #[error("{dispute_id}: previous round of {round_id} not settled")]
    PreviousRoundNotSettled {
        /// Dispute identifier.
        dispute_id: DisputeId,
        /// Round whose predecessor is unsettled.
        round_id: RoundId,
    },

    /// Round penalties have not been settled yet.
    #[error("{dispute_id} {round_id} penalties not settled")]
    PenaltiesNotSettled {
        /// Dispute identifier.
        dispute_id: DisputeId,
        /// Round identifier.
        round_id: RoundId,
    },

    /// Drip already ran in this subscription period.
    #[error("not a new period: current {period}, last dripped {last}")]
    NotNewPeriod {
        /// Current subscription period.
        period: u64,
        /// Last period that received a drip.
        last: u64,
    },

    // ── Authorization ───────────────────────────────────────────────
    /// Governance operation called by someone other than the governor.
    #[error("sender {caller} is not the governor")]
    SenderNotGovernor {
        /// Rejected caller.
        caller: AccountId,
    },

    /// Owner-only drip operation called by someone else.
    #[error("sender {caller} is not the owner")]
    NotOwner {
        /// Rejected caller.
        caller: AccountId,
    },

    // ── Economic ────────────────────────────────────────────────────
    /// Subject is not up to date on its subscription fees.
    #[error("subject {subject} is not up to date on subscriptions")]
    SubjectNotUpToDate {
        /// Subject that tried to raise a dispute.
        subject: AccountId,
    },

    /// Drip balance cannot cover the amount due.
    #[error("not enough funds: need {needed}, have {available}")]
    NotEnoughFunds {
        /// Amount due.
        needed: Amount,
        /// Amount held.
        available: Amount,
    },

    /// Juror reward already paid.
    #[error("reward for {juror} in {dispute_id} {round_id} already settled")]
    AlreadySettled {
        /// Dispute identifier.
        dispute_id: DisputeId,
        /// Round identifier.
        round_id: RoundId,
        /// Juror whose reward was paid.
        juror: AccountId,
    },

    /// Round penalties already fully settled.
    #[error("{dispute_id} {round_id} penalties already settled")]
    PenaltiesAlreadySettled {
        /// Dispute identifier.
        dispute_id: DisputeId,
        /// Round identifier.
        round_id: RoundId,
    },

    /// Appeal deposits of this round were already distributed.
    #[error("{dispute_id} {round_id} appeal deposit already settled")]
    AppealDepositAlreadySettled {
        /// Dispute identifier.
        dispute_id: DisputeId,
        /// Round identifier.
        round_id: RoundId,
    },

    /// Only coherent jurors are rewarded.
    #[error("juror {juror} voted against the final ruling of {dispute_id}")]
    WontRewardIncoherentJuror {
        /// Dispute identifier.
        dispute_id: DisputeId,
        /// Incoherent juror.
        juror: AccountId,
    },

    /// Nobody holds enough active stake to be drafted.
    #[error("no active jurors at {0}")]
    NoActiveJurors(TermId),

    // ── Validation ──────────────────────────────────────────────────
    /// No dispute with this id.
    #[error("unknown {0}")]
    UnknownDispute(DisputeId),

    /// No round with this id in the dispute.
    #[error("unknown {round_id} in {dispute_id}")]
    UnknownRound {
        /// Dispute identifier.
        dispute_id: DisputeId,
        /// Round identifier.
        round_id: RoundId,
    },

    /// Appealed ruling is invalid or equals the current winning outcome.
    #[error("invalid appeal ruling {ruling} for {dispute_id}")]
    InvalidAppealRuling {
        /// Dispute identifier.
        dispute_id: DisputeId,
        /// Rejected ruling.
        ruling: u8,
    },

    /// Confirming ruling is invalid or equals the appealed ruling.
    #[error("invalid appeal confirmation ruling {ruling} for {dispute_id}")]
    InvalidConfirmRuling {
        /// Dispute identifier.
        dispute_id: DisputeId,
        /// Rejected ruling.
        ruling: u8,
    },

    /// Round already carries an appeal.
    #[error("{dispute_id} {round_id} already appealed")]
    AppealAlreadyMade {
        /// Dispute identifier.
        dispute_id: DisputeId,
        /// Round identifier.
        round_id: RoundId,
    },

    /// Round was never appealed.
    #[error("{dispute_id} {round_id} has no appeal")]
    NoAppeal {
        /// Dispute identifier.
        dispute_id: DisputeId,
        /// Round identifier.
        round_id: RoundId,
    },

    /// Juror holds no weight in this round.
    #[error("juror {juror} not drafted in {dispute_id} {round_id}")]
    JurorNotDrafted {
        /// Dispute identifier.
        dispute_id: DisputeId,
        /// Round identifier.
        round_id: RoundId,
        /// Rejected juror.
        juror: AccountId,
    },

    /// Juror's stake is below the minimum for final-round voting.
    #[error("juror {juror} has no voting weight at {term}")]
    JurorWeightZero {
        /// Rejected juror.
        juror: AccountId,
        /// Draft term of the final round.
        term: TermId,
    },

    /// External collaborator failed.
    #[error("collaborator error: {0}")]
    Collaborator(#[from] CollaboratorError),

    /// Amount arithmetic left its range.
    #[error("arithmetic error: {0}")]
    Arithmetic(#[from] ArithmeticError),

    /// Timestamp or identifier validation failed.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CourtError {
    /// Category of this failure.
    pub fn class(&self) -> ErrorClass {
        use CourtError::*;
        match self {
            Config(_)
            | ZeroTermDuration
            | BadFirstTermStartTime { .. }
            | InvalidTransitionCount { .. }
            | TooManyTransitionsNeeded { .. }
            | InvalidRulingOptions { .. }
            | InvalidJurorCount
            | BadBatchSize => ErrorClass::Configuration,

            CannotDelayStartedCourt
            | CannotDelayPastStartTime { .. }
            | BadDraftTerm { .. }
            | DraftTermNotReached { .. }
            | TermNotReached(_)
            | TermRandomnessNotYetComputed { .. }
            | TermRandomnessUnavailable { .. }
            | InvalidAdjudicationState { .. }
            | RoundAlreadyDrafted { .. }
            | AlreadyExecuted(_)
            | RulingNotExecuted(_)
            | PreviousRoundNotSettled { .. }
            | PenaltiesNotSettled { .. }
            | NotNewPeriod { .. } => ErrorClass::Temporal,

            SenderNotGovernor { .. } | NotOwner { .. } => ErrorClass::Authorization,

            SubjectNotUpToDate { .. }
            | NotEnoughFunds { .. }
            | AlreadySettled { .. }
            | PenaltiesAlreadySettled { .. }
            | AppealDepositAlreadySettled { .. }
            | WontRewardIncoherentJuror { .. }
            | NoActiveJurors(_) => ErrorClass::Economic,

            Collaborator(CollaboratorError::InsufficientBalance { .. })
            | Collaborator(CollaboratorError::InsufficientCustody { .. })
            | Collaborator(CollaboratorError::InsufficientStake { .. }) => ErrorClass::Economic,
            Collaborator(CollaboratorError::ZeroPeriodDuration) => ErrorClass::Configuration,

            UnknownDispute(_)
            | UnknownRound { .. }
            | InvalidAppealRuling { .. }
            | InvalidConfirmRuling { .. }
            | AppealAlreadyMade { .. }
            | NoAppeal { .. }
            | JurorNotDrafted { .. }
            | JurorWeightZero { .. }
            | Collaborator(_)
            | Arithmetic(_)
            | Validation(_) => ErrorClass::Validation,
        }
    }
}
