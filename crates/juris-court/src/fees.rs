//! # Fee Economics
//!
//! Pure functions sizing every amount the court charges or locks. Nothing
//! here reads state; the same inputs always give the same outputs,
//! whatever order the calls arrive in.
//!
//! Regular round, `n` jurors:
//!
//! ```text
//! draft deposit   = heartbeat + n * (juror + draft + settle)
//! appeal deposit  = fees(next round) * appeal_collateral_factor
//! confirm deposit = fees(next round) * appeal_confirm_collateral_factor
//! lock per weight = min_active_balance * penalty_pct / 10000
//! ```
//!
//! Final round, `w` weight units (1000 units per minimum active balance):
//! juror and settle fees scale with `w / 1000` and are reduced by
//! `final_round_reduction`; nothing is drafted so there is no draft fee.

use juris_core::{Amount, ArithmeticError};
use serde::{Deserialize, Serialize};

use crate::config::{CourtConfig, FeeSchedule, PCT_BASE};

/// Weight units per minimum active balance in final rounds.
pub const FINAL_ROUND_WEIGHT_PRECISION: u64 = 1_000;

/// Fees charged for one round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundFees {
    /// Paid to whoever transitions into the round's draft term.
    pub heartbeat_fee: Amount,
    /// Shared among coherent jurors.
    pub juror_fees: Amount,
    /// Paid to drafters.
    pub draft_fees: Amount,
    /// Paid to penalty settlers.
    pub settle_fees: Amount,
    /// Sum of the above.
    pub total: Amount,
}

impl RoundFees {
    fn new(
        heartbeat_fee: Amount,
        juror_fees: Amount,
        draft_fees: Amount,
        settle_fees: Amount,
    ) -> Result<Self, ArithmeticError> {
        let total = heartbeat_fee
            .checked_add(juror_fees)?
            .checked_add(draft_fees)?
            .checked_add(settle_fees)?;
        Ok(Self {
            heartbeat_fee,
            juror_fees,
            draft_fees,
            settle_fees,
            total,
        })
    }
}

/// Fee and collateral calculator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeEconomics {
    fees: FeeSchedule,
    penalty_pct: u16,
    final_round_reduction: u16,
    appeal_collateral_factor: u64,
    appeal_confirm_collateral_factor: u64,
    min_active_balance: Amount,
}

impl FeeEconomics {
    /// Build from a validated configuration.
    pub fn from_config(config: &CourtConfig) -> Self {
        Self {
            fees: config.fees,
            penalty_pct: config.penalty_pct,
            final_round_reduction: config.final_round_reduction,
            appeal_collateral_factor: config.appeal_collateral_factor,
            appeal_confirm_collateral_factor: config.appeal_confirm_collateral_factor,
            min_active_balance: config.min_active_balance,
        }
    }

    /// Per-unit fee schedule.
    pub fn schedule(&self) -> &FeeSchedule {
        &self.fees
    }

    /// Fees of a regular round with `juror_count` jurors.
    pub fn regular_round_fees(&self, juror_count: u64) -> Result<RoundFees, ArithmeticError> {
        let n = u128::from(juror_count);
        RoundFees::new(
            self.fees.heartbeat_fee,
            self.fees.juror_fee.checked_mul(n)?,
            self.fees.draft_fee.checked_mul(n)?,
            self.fees.settle_fee.checked_mul(n)?,
        )
    }

    /// Fees of a final round with `weight_units` of available weight.
    pub fn final_round_fees(&self, weight_units: u64) -> Result<RoundFees, ArithmeticError> {
        let keep = u128::from(PCT_BASE - self.final_round_reduction);
        let scale = |unit: Amount| -> Result<Amount, ArithmeticError> {
            unit.mul_div(u128::from(weight_units), u128::from(FINAL_ROUND_WEIGHT_PRECISION))?
                .mul_div(keep, u128::from(PCT_BASE))
        };
        RoundFees::new(
            self.fees.heartbeat_fee,
            scale(self.fees.juror_fee)?,
            Amount::ZERO,
            scale(self.fees.settle_fee)?,
        )
    }

    /// Deposit charged to raise a dispute with `juror_count` jurors.
    pub fn draft_deposit(&self, juror_count: u64) -> Result<Amount, ArithmeticError> {
        Ok(self.regular_round_fees(juror_count)?.total)
    }

    /// Deposit charged to appeal into a round costing `next_round`.
    pub fn appeal_deposit(&self, next_round: &RoundFees) -> Result<Amount, ArithmeticError> {
        next_round
            .total
            .checked_mul(u128::from(self.appeal_collateral_factor))
    }

    /// Deposit charged to confirm an appeal into a round costing `next_round`.
    pub fn confirm_appeal_deposit(&self, next_round: &RoundFees) -> Result<Amount, ArithmeticError> {
        next_round
            .total
            .checked_mul(u128::from(self.appeal_confirm_collateral_factor))
    }

    /// `amount * pct / 10000`.
    pub fn pct_of(amount: Amount, pct: u16) -> Result<Amount, ArithmeticError> {
        amount.mul_div(u128::from(pct), u128::from(PCT_BASE))
    }

    /// Stake locked for each unit of drafted weight.
    pub fn lock_per_draft(&self) -> Result<Amount, ArithmeticError> {
        Self::pct_of(self.min_active_balance, self.penalty_pct)
    }

    /// Final-round voting weight for `active_stake`; 0 below the minimum.
    pub fn final_round_weight(&self, active_stake: Amount) -> Result<u64, ArithmeticError> {
        if active_stake < self.min_active_balance {
            return Ok(0);
        }
        self.weight_units(active_stake)
    }

    /// Stake a final-round voter with `weight` units locks: the penalty
    /// share of the stake those units stand for. Callers pass the weight
    /// after capping, so a voter never risks more than their vote counts.
    pub fn final_round_lock(&self, weight: u64) -> Result<Amount, ArithmeticError> {
        let stake = self
            .min_active_balance
            .mul_div(u128::from(weight), u128::from(FINAL_ROUND_WEIGHT_PRECISION))?;
        Self::pct_of(stake, self.penalty_pct)
    }

    /// Total weight available in a final round given the court's total active stake.
    pub fn final_round_juror_count(&self, total_active: Amount) -> Result<u64, ArithmeticError> {
        self.weight_units(total_active)
    }

    fn weight_units(&self, stake: Amount) -> Result<u64, ArithmeticError> {
        let units = stake.mul_div(
            u128::from(FINAL_ROUND_WEIGHT_PRECISION),
            self.min_active_balance.units(),
        )?;
        u64::try_from(units.units()).map_err(|_| ArithmeticError::Overflow {
            op: "final round weight",
        })
    }
}
