use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
use tracing::debug;

use crate::account::AccountId;
use crate::error::{EngineError, EngineResult};
use crate::math::{checked_add, checked_sub, mul_div, mul_div_round_up};
use crate::state::DepositorPosition;

/// Proportional-share pool accounting.
///
/// Owns the share/asset conversion and the per-depositor realization
/// bookkeeping. Yield is recognized only at explicit realization points
/// (withdraw, claim); every principal change re-synchronizes
/// `last_realized_value` so new principal can never be misread as yield.
///
/// Mutating operations are split into a fallible plan step and an
/// infallible commit step so the facade can validate the entire
/// vault -> experience chain before writing any state.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Default)]
pub struct VaultAccounting {
    positions: BTreeMap<AccountId, DepositorPosition>,
    total_shares: u64,
    total_pool_value: u64,
    deposits_suspended: bool,
}

/// Validated deposit, ready to commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DepositPlan {
    pub amount: u64,
    pub shares_minted: u64,
    pub share_balance: u64,
    pub total_shares: u64,
    pub total_pool_value: u64,
    /// Post-deposit asset value; becomes the new realization point.
    pub position_value: u64,
}

/// Validated withdrawal, ready to commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct WithdrawPlan {
    pub amount: u64,
    pub shares_burned: u64,
    pub realized_yield: u64,
    pub share_balance: u64,
    pub total_shares: u64,
    pub total_pool_value: u64,
    /// Asset value of the shares left behind; becomes the new
    /// realization point.
    pub remaining_value: u64,
}

/// Validated yield claim (no share burn), ready to commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ClaimPlan {
    pub realized_yield: u64,
    pub position_value: u64,
}

impl VaultAccounting {
    pub fn total_shares(&self) -> u64 {
        self.total_shares
    }

    pub fn total_pool_value(&self) -> u64 {
        self.total_pool_value
    }

    pub fn deposits_suspended(&self) -> bool {
        self.deposits_suspended
    }

    pub fn position(&self, account: &AccountId) -> Option<&DepositorPosition> {
        self.positions.get(account)
    }

    pub fn share_balance(&self, account: &AccountId) -> u64 {
        self.positions
            .get(account)
            .map(|p| p.share_balance)
            .unwrap_or(0)
    }

    /// Current asset-equivalent value of the account's shares.
    pub fn asset_value(&self, account: &AccountId) -> EngineResult<u64> {
        let shares = self.share_balance(account);
        if shares == 0 || self.total_shares == 0 {
            return Ok(0);
        }
        mul_div(shares, self.total_pool_value, self.total_shares)
    }

    /// Value growth since the last realization point.
    pub fn unrealized_yield(&self, account: &AccountId) -> EngineResult<u64> {
        let value = self.asset_value(account)?;
        let last = self
            .positions
            .get(account)
            .map(|p| p.last_realized_value)
            .unwrap_or(0);
        Ok(value.saturating_sub(last))
    }

    pub(crate) fn set_suspended(&mut self, suspended: bool) {
        self.deposits_suspended = suspended;
    }

    pub(crate) fn plan_deposit(&self, account: &AccountId, amount: u64) -> EngineResult<DepositPlan> {
        if amount == 0 {
            return Err(EngineError::ZeroAmount);
        }
        if self.deposits_suspended {
            return Err(EngineError::DepositsSuspended);
        }
        let shares_minted = if self.total_shares == 0 {
            amount
        } else {
            mul_div(amount, self.total_shares, self.total_pool_value)?
        };
        if shares_minted == 0 {
            // Deposit too small to mint a single share at the current rate.
            return Err(EngineError::ZeroAmount);
        }
        let total_shares = checked_add(self.total_shares, shares_minted)?;
        let total_pool_value = checked_add(self.total_pool_value, amount)?;
        let share_balance = checked_add(self.share_balance(account), shares_minted)?;
        let position_value = mul_div(share_balance, total_pool_value, total_shares)?;
        Ok(DepositPlan {
            amount,
            shares_minted,
            share_balance,
            total_shares,
            total_pool_value,
            position_value,
        })
    }

    pub(crate) fn commit_deposit(&mut self, account: &AccountId, plan: &DepositPlan, now: i64) {
        self.total_shares = plan.total_shares;
        self.total_pool_value = plan.total_pool_value;
        let position = self
            .positions
            .entry(*account)
            .or_insert_with(|| DepositorPosition::new(now));
        position.share_balance = plan.share_balance;
        position.last_realized_value = plan.position_value;
        debug!(
            account = %account,
            amount = plan.amount,
            shares = plan.shares_minted,
            total_pool_value = plan.total_pool_value,
            "deposit committed"
        );
    }

    /// Withdrawals are never blocked by suspension: this is the
    /// emergency-exit guarantee.
    pub(crate) fn plan_withdraw(
        &self,
        account: &AccountId,
        amount: u64,
    ) -> EngineResult<WithdrawPlan> {
        if amount == 0 {
            return Err(EngineError::ZeroAmount);
        }
        let available = self.share_balance(account);
        if self.total_shares == 0 {
            return Err(EngineError::InsufficientShares {
                requested: amount,
                available,
            });
        }
        // Round the burn up so truncation never favors the withdrawer.
        let shares_burned = mul_div_round_up(amount, self.total_shares, self.total_pool_value)?;
        if shares_burned > available {
            return Err(EngineError::InsufficientShares {
                requested: shares_burned,
                available,
            });
        }
        let pre_value = self.asset_value(account)?;
        let last_realized = self
            .positions
            .get(account)
            .map(|p| p.last_realized_value)
            .unwrap_or(0);
        let realized_yield = pre_value.saturating_sub(last_realized);

        let share_balance = available - shares_burned;
        let total_shares = self.total_shares - shares_burned;
        let total_pool_value = checked_sub(self.total_pool_value, amount)?;
        let remaining_value = if share_balance == 0 || total_shares == 0 {
            0
        } else {
            mul_div(share_balance, total_pool_value, total_shares)?
        };
        Ok(WithdrawPlan {
            amount,
            shares_burned,
            realized_yield,
            share_balance,
            total_shares,
            total_pool_value,
            remaining_value,
        })
    }

    pub(crate) fn commit_withdraw(&mut self, account: &AccountId, plan: &WithdrawPlan) {
        self.total_shares = plan.total_shares;
        self.total_pool_value = plan.total_pool_value;
        if let Some(position) = self.positions.get_mut(account) {
            position.share_balance = plan.share_balance;
            position.last_realized_value = plan.remaining_value;
        }
        debug!(
            account = %account,
            amount = plan.amount,
            shares = plan.shares_burned,
            realized_yield = plan.realized_yield,
            "withdrawal committed"
        );
    }

    /// Realization without a share burn. Zero realized yield is valid.
    pub(crate) fn plan_claim(&self, account: &AccountId) -> EngineResult<ClaimPlan> {
        let position_value = self.asset_value(account)?;
        let last_realized = self
            .positions
            .get(account)
            .map(|p| p.last_realized_value)
            .unwrap_or(0);
        Ok(ClaimPlan {
            realized_yield: position_value.saturating_sub(last_realized),
            position_value,
        })
    }

    pub(crate) fn commit_claim(&mut self, account: &AccountId, plan: &ClaimPlan) {
        if let Some(position) = self.positions.get_mut(account) {
            position.last_realized_value = plan.position_value;
        }
        debug!(
            account = %account,
            realized_yield = plan.realized_yield,
            "yield claim committed"
        );
    }

    /// Pool-strategy seam: externally earned value joins the pool without
    /// minting shares, which is what makes existing shares worth more.
    pub(crate) fn record_pool_yield(&mut self, amount: u64) -> EngineResult<u64> {
        if amount == 0 {
            return Err(EngineError::ZeroAmount);
        }
        self.total_pool_value = checked_add(self.total_pool_value, amount)?;
        debug!(amount, total_pool_value = self.total_pool_value, "pool yield recorded");
        Ok(self.total_pool_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(byte: u8) -> AccountId {
        AccountId::new([byte; 32])
    }

    fn deposit(vault: &mut VaultAccounting, who: &AccountId, amount: u64) -> DepositPlan {
        let plan = vault.plan_deposit(who, amount).unwrap();
        vault.commit_deposit(who, &plan, 1_000);
        plan
    }

    #[test]
    fn first_deposit_mints_one_share_per_unit() {
        let mut vault = VaultAccounting::default();
        let alice = account(1);
        let plan = deposit(&mut vault, &alice, 1_000);
        assert_eq!(plan.shares_minted, 1_000);
        assert_eq!(vault.total_shares(), 1_000);
        assert_eq!(vault.total_pool_value(), 1_000);
        assert_eq!(vault.asset_value(&alice).unwrap(), 1_000);
    }

    #[test]
    fn second_depositor_mints_proportionally() {
        let mut vault = VaultAccounting::default();
        let alice = account(1);
        let bob = account(2);
        deposit(&mut vault, &alice, 1_000);
        vault.record_pool_yield(1_000).unwrap();
        // Pool is now worth 2000 backed by 1000 shares; bob's 500 buys 250.
        let plan = deposit(&mut vault, &bob, 500);
        assert_eq!(plan.shares_minted, 250);
        assert_eq!(vault.asset_value(&bob).unwrap(), 500);
    }

    #[test]
    fn deposit_resyncs_realization_point() {
        let mut vault = VaultAccounting::default();
        let alice = account(1);
        deposit(&mut vault, &alice, 1_000);
        deposit(&mut vault, &alice, 2_000);
        let position = vault.position(&alice).unwrap();
        assert_eq!(position.last_realized_value, 3_000);
        assert_eq!(vault.unrealized_yield(&alice).unwrap(), 0);
    }

    #[test]
    fn deposit_folds_unrealized_growth_into_principal() {
        let mut vault = VaultAccounting::default();
        let alice = account(1);
        deposit(&mut vault, &alice, 100);
        vault.record_pool_yield(20).unwrap();
        assert_eq!(vault.unrealized_yield(&alice).unwrap(), 20);
        deposit(&mut vault, &alice, 100);
        // The resync swallowed the pending 20; it is no longer claimable.
        assert_eq!(vault.unrealized_yield(&alice).unwrap(), 0);
    }

    #[test]
    fn rejects_zero_and_suspended_deposits() {
        let mut vault = VaultAccounting::default();
        let alice = account(1);
        assert_eq!(vault.plan_deposit(&alice, 0), Err(EngineError::ZeroAmount));
        vault.set_suspended(true);
        assert_eq!(
            vault.plan_deposit(&alice, 100),
            Err(EngineError::DepositsSuspended)
        );
    }

    #[test]
    fn withdrawals_ignore_suspension() {
        let mut vault = VaultAccounting::default();
        let alice = account(1);
        deposit(&mut vault, &alice, 1_000);
        vault.set_suspended(true);
        let plan = vault.plan_withdraw(&alice, 400).unwrap();
        vault.commit_withdraw(&alice, &plan);
        assert_eq!(vault.share_balance(&alice), 600);
    }

    #[test]
    fn withdraw_rejects_more_than_owned() {
        let mut vault = VaultAccounting::default();
        let alice = account(1);
        let bob = account(2);
        deposit(&mut vault, &alice, 1_000);
        let err = vault.plan_withdraw(&alice, 1_500).unwrap_err();
        assert!(matches!(err, EngineError::InsufficientShares { .. }));
        let err = vault.plan_withdraw(&bob, 1).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InsufficientShares { available: 0, .. }
        ));
    }

    #[test]
    fn withdraw_realizes_growth_since_last_sync() {
        let mut vault = VaultAccounting::default();
        let alice = account(1);
        deposit(&mut vault, &alice, 100);
        vault.record_pool_yield(20).unwrap();
        let plan = vault.plan_withdraw(&alice, 60).unwrap();
        assert_eq!(plan.realized_yield, 20);
        vault.commit_withdraw(&alice, &plan);
        // Remaining value becomes the new realization point.
        assert_eq!(
            vault.position(&alice).unwrap().last_realized_value,
            vault.asset_value(&alice).unwrap()
        );
        assert_eq!(vault.unrealized_yield(&alice).unwrap(), 0);
    }

    #[test]
    fn full_round_trip_returns_exact_amount() {
        let mut vault = VaultAccounting::default();
        let alice = account(1);
        deposit(&mut vault, &alice, 12_345);
        let plan = vault.plan_withdraw(&alice, 12_345).unwrap();
        assert_eq!(plan.shares_burned, 12_345);
        assert_eq!(plan.realized_yield, 0);
        vault.commit_withdraw(&alice, &plan);
        assert_eq!(vault.total_shares(), 0);
        assert_eq!(vault.total_pool_value(), 0);
        assert_eq!(vault.share_balance(&alice), 0);
    }

    #[test]
    fn claim_realizes_without_burning() {
        let mut vault = VaultAccounting::default();
        let alice = account(1);
        deposit(&mut vault, &alice, 100);
        vault.record_pool_yield(20).unwrap();
        let plan = vault.plan_claim(&alice).unwrap();
        assert_eq!(plan.realized_yield, 20);
        vault.commit_claim(&alice, &plan);
        assert_eq!(vault.share_balance(&alice), 100);
        assert_eq!(vault.unrealized_yield(&alice).unwrap(), 0);
        // A second claim realizes nothing.
        assert_eq!(vault.plan_claim(&alice).unwrap().realized_yield, 0);
    }

    #[test]
    fn zero_share_position_is_inert_but_kept() {
        let mut vault = VaultAccounting::default();
        let alice = account(1);
        deposit(&mut vault, &alice, 50);
        let plan = vault.plan_withdraw(&alice, 50).unwrap();
        vault.commit_withdraw(&alice, &plan);
        assert!(vault.position(&alice).is_some());
        assert_eq!(vault.plan_claim(&alice).unwrap().realized_yield, 0);
    }
}
