//! # Role Table
//!
//! Every court operation falls into one capability class, checked once at
//! the top of the operation:
//!
//! | Capability | Who may call |
//! |------------|--------------|
//! | `Governor` | the configured governor only |
//! | `Anyone` | any account; the operation is safe to trigger by anybody |
//! | `Participant` | any account, but the operation itself checks that the caller plays a role in the dispute (drafted juror, subscribed subject, deposit poster) |

use juris_core::AccountId;

use crate::error::CourtError;

/// Who may invoke an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Governor only.
    Governor,
    /// Open to all.
    Anyone,
    /// Open to parties with a role in the dispute.
    Participant,
}

/// Court operations subject to the role table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Explicit term transitions.
    Heartbeat,
    /// Move the first term start.
    DelayStartTime,
    /// Hand over the governor role.
    TransferGovernor,
    /// Raise a dispute.
    CreateDispute,
    /// Draft jurors.
    Draft,
    /// Commit a vote.
    CommitVote,
    /// Reveal a vote.
    RevealVote,
    /// Appeal a ruling.
    Appeal,
    /// Confirm an appeal.
    ConfirmAppeal,
    /// Execute a final ruling.
    ExecuteRuling,
    /// Settle a round's penalties.
    SettlePenalties,
    /// Pay a coherent juror.
    SettleReward,
    /// Distribute appeal deposits.
    SettleAppealDeposit,
}

impl Operation {
    /// Capability class of this operation.
    pub fn capability(self) -> Capability {
        match self {
            Self::DelayStartTime | Self::TransferGovernor => Capability::Governor,
            Self::CreateDispute | Self::CommitVote | Self::RevealVote => Capability::Participant,
            Self::Heartbeat
            | Self::Draft
            | Self::Appeal
            | Self::ConfirmAppeal
            | Self::ExecuteRuling
            | Self::SettlePenalties
            | Self::SettleReward
            | Self::SettleAppealDeposit => Capability::Anyone,
        }
    }
}

/// Check `caller` against the capability of `operation`.
///
/// # Errors
///
/// Returns [`CourtError::SenderNotGovernor`] when a governor-only operation
/// is called by anyone else.
pub fn authorize(
    operation: Operation,
    caller: &AccountId,
    governor: &AccountId,
) -> Result<(), CourtError> {
    match operation.capability() {
        Capability::Governor if caller != governor => {
            tracing::warn!(caller = %caller, ?operation, "governor-only operation refused");
            Err(CourtError::SenderNotGovernor {
                caller: caller.clone(),
            })
        }
        _ => Ok(()),
    }
}
