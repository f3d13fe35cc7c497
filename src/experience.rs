use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
use tracing::debug;

use crate::account::AccountId;
use crate::config::validate_thresholds;
use crate::error::{EngineError, EngineResult};
use crate::math::{checked_add, mul_div, PRECISION};
use crate::state::ExperienceEntry;

/// Deterministic yield-to-experience conversion and level derivation.
///
/// Experience is monotonically non-decreasing per account. Levels are
/// derived lazily from the current threshold table: replacing the table
/// changes reported levels without touching stored experience.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone)]
pub struct ExperienceEngine {
    entries: BTreeMap<AccountId, ExperienceEntry>,
    /// Fixed point (6 decimals): xp = yield * multiplier / PRECISION.
    xp_multiplier: u64,
    /// thresholds[i] is the experience required for level i + 1.
    level_thresholds: Vec<u64>,
}

/// Validated award, ready to commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AwardPlan {
    pub xp_delta: u64,
    pub total_xp: u64,
    pub level_before: u32,
    pub level_after: u32,
}

impl ExperienceEngine {
    pub(crate) fn new(xp_multiplier: u64, level_thresholds: Vec<u64>) -> Self {
        ExperienceEngine {
            entries: BTreeMap::new(),
            xp_multiplier,
            level_thresholds,
        }
    }

    pub fn xp_multiplier(&self) -> u64 {
        self.xp_multiplier
    }

    pub fn level_thresholds(&self) -> &[u64] {
        &self.level_thresholds
    }

    pub fn level_count(&self) -> u32 {
        self.level_thresholds.len() as u32
    }

    pub fn experience_of(&self, account: &AccountId) -> u64 {
        self.entries
            .get(account)
            .map(|e| e.cumulative_xp)
            .unwrap_or(0)
    }

    /// Largest level whose threshold is covered by the account's
    /// cumulative experience. Always at least 1.
    pub fn level_of(&self, account: &AccountId) -> u32 {
        self.level_for(self.experience_of(account))
    }

    /// Experience still missing for the next level, 0 at the maximum
    /// configured level.
    pub fn experience_to_next_level(&self, account: &AccountId) -> u64 {
        let xp = self.experience_of(account);
        let level = self.level_for(xp);
        match self.level_thresholds.get(level as usize) {
            Some(&next) => next - xp,
            None => 0,
        }
    }

    fn level_for(&self, xp: u64) -> u32 {
        self.level_thresholds.partition_point(|&t| t <= xp) as u32
    }

    pub(crate) fn plan_award(&self, account: &AccountId, yield_amount: u64) -> EngineResult<AwardPlan> {
        let xp_delta = mul_div(yield_amount, self.xp_multiplier, PRECISION)?;
        let current = self.experience_of(account);
        let total_xp = checked_add(current, xp_delta)?;
        Ok(AwardPlan {
            xp_delta,
            total_xp,
            level_before: self.level_for(current),
            level_after: self.level_for(total_xp),
        })
    }

    pub(crate) fn commit_award(&mut self, account: &AccountId, plan: &AwardPlan) {
        let entry = self.entries.entry(*account).or_default();
        entry.cumulative_xp = plan.total_xp;
        entry.level = plan.level_after;
        debug!(
            account = %account,
            xp = plan.xp_delta,
            total_xp = plan.total_xp,
            level = plan.level_after,
            "experience committed"
        );
    }

    pub(crate) fn set_multiplier(&mut self, multiplier: u64) -> EngineResult<()> {
        if multiplier == 0 {
            return Err(EngineError::ZeroMultiplier);
        }
        self.xp_multiplier = multiplier;
        Ok(())
    }

    /// Replaces the whole table. Stored experience is untouched; derived
    /// levels shift immediately.
    pub(crate) fn set_thresholds(&mut self, thresholds: Vec<u64>) -> EngineResult<()> {
        validate_thresholds(&thresholds)?;
        self.level_thresholds = thresholds;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_LEVEL_THRESHOLDS, DEFAULT_XP_MULTIPLIER};

    fn engine() -> ExperienceEngine {
        ExperienceEngine::new(DEFAULT_XP_MULTIPLIER, DEFAULT_LEVEL_THRESHOLDS.to_vec())
    }

    fn account(byte: u8) -> AccountId {
        AccountId::new([byte; 32])
    }

    fn award(engine: &mut ExperienceEngine, who: &AccountId, yield_amount: u64) -> AwardPlan {
        let plan = engine.plan_award(who, yield_amount).unwrap();
        engine.commit_award(who, &plan);
        plan
    }

    #[test]
    fn fresh_account_is_level_one_with_zero_xp() {
        let engine = engine();
        let alice = account(1);
        assert_eq!(engine.experience_of(&alice), 0);
        assert_eq!(engine.level_of(&alice), 1);
        assert_eq!(engine.experience_to_next_level(&alice), 1_000);
    }

    #[test]
    fn award_converts_yield_through_multiplier() {
        let mut engine = engine();
        let alice = account(1);
        // 20 yield at 10x -> 200 xp
        let plan = award(&mut engine, &alice, 20);
        assert_eq!(plan.xp_delta, 200);
        assert_eq!(engine.experience_of(&alice), 200);
        assert_eq!(engine.level_of(&alice), 1);
    }

    #[test]
    fn multiplier_math_truncates() {
        let mut engine = engine();
        engine.set_multiplier(PRECISION / 3).unwrap();
        let alice = account(1);
        let plan = award(&mut engine, &alice, 10);
        // 10 * (1/3) truncates to 3
        assert_eq!(plan.xp_delta, 3);
    }

    #[test]
    fn level_boundary_is_inclusive() {
        let mut engine = engine();
        let alice = account(1);
        // 100 yield -> exactly the 1000 xp threshold for level 2
        let plan = award(&mut engine, &alice, 100);
        assert_eq!(plan.level_before, 1);
        assert_eq!(plan.level_after, 2);
        assert_eq!(engine.level_of(&alice), 2);
        assert_eq!(engine.experience_to_next_level(&alice), 4_000);
    }

    #[test]
    fn single_award_can_jump_multiple_levels() {
        let mut engine = engine();
        let alice = account(1);
        // 2500 yield -> 25_000 xp, exactly the level 5 threshold
        let plan = award(&mut engine, &alice, 2_500);
        assert_eq!(plan.level_before, 1);
        assert_eq!(plan.level_after, 5);
    }

    #[test]
    fn max_level_reports_zero_to_next() {
        let mut engine = engine();
        let alice = account(1);
        award(&mut engine, &alice, 200_000);
        assert_eq!(engine.level_of(&alice), 10);
        assert_eq!(engine.experience_to_next_level(&alice), 0);
    }

    #[test]
    fn threshold_replacement_shifts_levels_without_awards() {
        let mut engine = engine();
        let alice = account(1);
        award(&mut engine, &alice, 100); // 1000 xp, level 2
        assert_eq!(engine.level_of(&alice), 2);
        engine.set_thresholds(vec![0, 500, 900]).unwrap();
        assert_eq!(engine.level_of(&alice), 3);
        assert_eq!(engine.experience_of(&alice), 1_000);
    }

    #[test]
    fn rejects_invalid_admin_mutations() {
        let mut engine = engine();
        assert_eq!(engine.set_multiplier(0), Err(EngineError::ZeroMultiplier));
        assert!(matches!(
            engine.set_thresholds(vec![]),
            Err(EngineError::InvalidThresholds(_))
        ));
        assert!(matches!(
            engine.set_thresholds(vec![1, 2]),
            Err(EngineError::InvalidThresholds(_))
        ));
        assert!(matches!(
            engine.set_thresholds(vec![0, 5, 5]),
            Err(EngineError::InvalidThresholds(_))
        ));
    }

    #[test]
    fn experience_never_decreases() {
        let mut engine = engine();
        let alice = account(1);
        let mut last = 0;
        for yield_amount in [0, 5, 0, 100, 1, 0, 50_000] {
            award(&mut engine, &alice, yield_amount);
            let xp = engine.experience_of(&alice);
            assert!(xp >= last);
            last = xp;
        }
    }
}
