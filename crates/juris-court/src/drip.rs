//! # Donated Fees Drip
//!
//! A funded account that tops up the subscriptions pool once per
//! subscription period. Each drip donates a fixed yield on the court's total
//! active stake, expressed with 18 decimals (`10^18` is 100%).

use juris_core::{AccountId, Amount};
use serde::{Deserialize, Serialize};

use crate::collaborators::{Accounting, Environment, JurorRegistry, Subscriptions};
use crate::court::Court;
use crate::error::CourtError;
use crate::events::CourtEvent;

/// Scale of [`DonatedFeesDrip::period_percentage_yield`].
pub const YIELD_PRECISION: u128 = 1_000_000_000_000_000_000;

/// Periodic donor to the subscriptions pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonatedFeesDrip {
    account: AccountId,
    owner: AccountId,
    period_percentage_yield: u128,
    last_drip_period: u64,
}

impl DonatedFeesDrip {
    /// Drip funded from `account` and administered by `owner`.
    pub fn new(account: AccountId, owner: AccountId, period_percentage_yield: u128) -> Self {
        Self {
            account,
            owner,
            period_percentage_yield,
            last_drip_period: 0,
        }
    }

    /// Funding account.
    pub fn account(&self) -> &AccountId {
        &self.account
    }

    /// Administrator.
    pub fn owner(&self) -> &AccountId {
        &self.owner
    }

    /// Yield donated per period, scaled by [`YIELD_PRECISION`].
    pub fn period_percentage_yield(&self) -> u128 {
        self.period_percentage_yield
    }

    /// Last period that received a drip.
    pub fn last_drip_period(&self) -> u64 {
        self.last_drip_period
    }

    /// Donate this period's yield to the subscriptions pool. Returns the
    /// amount donated.
    ///
    /// # Errors
    ///
    /// - [`CourtError::NotNewPeriod`] if this period already received a drip.
    /// - [`CourtError::NotEnoughFunds`] if the funding account cannot cover it.
    pub fn drip_fees<E: Environment>(
        &mut self,
        caller: &AccountId,
        court: &mut Court<E>,
    ) -> Result<Amount, CourtError> {
        let term = court.pending_term()?;
        let env = court.env();
        let period = env.subscriptions().current_period_id(term);
        if period <= self.last_drip_period {
            return Err(CourtError::NotNewPeriod {
                period,
                last: self.last_drip_period,
            });
        }
        let amount = env
            .registry()
            .total_active_stake_at(term)
            .mul_div(self.period_percentage_yield, YIELD_PRECISION)?;
        let available = env.accounting().balance_of(&self.account);
        if available < amount {
            tracing::warn!(needed = %amount, available = %available, "drip underfunded");
            return Err(CourtError::NotEnoughFunds {
                needed: amount,
                available,
            });
        }
        let pool = env.subscriptions().account().clone();

        court
            .env_mut()
            .accounting_mut()
            .transfer(&self.account, &pool, amount)?;
        court.env_mut().subscriptions_mut().deposit_donation(amount)?;

        court.apply_due_transitions(caller)?;
        self.last_drip_period = period;
        court.emit(CourtEvent::FeesDripped {
            period_id: period,
            amount,
        });
        Ok(amount)
    }

    /// Change the per-period yield.
    pub fn update_period_percentage_yield(&mut self, caller: &AccountId, value: u128) -> Result<(), CourtError> {
        self.require_owner(caller)?;
        tracing::info!(previous = self.period_percentage_yield, current = value, "drip yield updated");
        self.period_percentage_yield = value;
        Ok(())
    }

    /// Move the whole funding balance to `to`. Returns the amount moved.
    pub fn reclaim_funds<E: Environment>(
        &mut self,
        caller: &AccountId,
        court: &mut Court<E>,
        to: &AccountId,
    ) -> Result<Amount, CourtError> {
        self.require_owner(caller)?;
        let balance = court.env().accounting().balance_of(&self.account);
        if !balance.is_zero() {
            court
                .env_mut()
                .accounting_mut()
                .transfer(&self.account, to, balance)?;
        }
        tracing::info!(to = %to, amount = %balance, "drip funds reclaimed");
        Ok(balance)
    }

    /// Hand administration to `new_owner`.
    pub fn transfer_ownership(&mut self, caller: &AccountId, new_owner: AccountId) -> Result<(), CourtError> {
        self.require_owner(caller)?;
        self.owner = new_owner;
        Ok(())
    }

    fn require_owner(&self, caller: &AccountId) -> Result<(), CourtError> {
        if caller != &self.owner {
            return Err(CourtError::NotOwner {
                caller: caller.clone(),
            });
        }
        Ok(())
    }
}
