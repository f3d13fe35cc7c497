use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::account::AccountId;
use crate::achievements::AchievementRegistry;
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::events::Event;
use crate::experience::{AwardPlan, ExperienceEngine};
use crate::leaderboard::SnapshotStore;
use crate::state::AchievementType;
use crate::vault::VaultAccounting;

/// Administrative capability handle.
///
/// Issued once by [`ProgressionEngine::new`]; every administrative call
/// requires a live cap. [`ProgressionEngine::rotate_admin`] invalidates
/// all previously issued caps, so a stale handle fails with
/// [`crate::EngineError::Unauthorized`].
#[derive(Debug, Clone)]
pub struct AdminCap {
    epoch: u64,
}

/// What a deposit did, so callers need not re-query.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DepositReceipt {
    pub amount: u64,
    pub shares_minted: u64,
    pub share_balance: u64,
    pub position_value: u64,
}

/// What a withdrawal did, including the realization it triggered.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct WithdrawReceipt {
    pub amount: u64,
    pub shares_burned: u64,
    pub realized_yield: u64,
    pub xp_awarded: u64,
    pub share_balance: u64,
    pub remaining_value: u64,
}

/// Borsh image of everything that survives a restart.
#[derive(BorshSerialize, BorshDeserialize)]
struct PersistentState {
    vault: VaultAccounting,
    experience: ExperienceEngine,
    achievements: AchievementRegistry,
    leaderboard: SnapshotStore,
    milestone_levels: Vec<u32>,
    admin_epoch: u64,
}

/// The assembled yield-to-progression engine.
///
/// Owns all four components and the only mutable path through them:
/// depositor actions enter the vault, realized yield flows into the
/// experience engine, and level crossings trigger achievement grants.
/// Mutating methods take `&mut self`, so an embedder that needs
/// concurrent access serializes writers (e.g. behind an `RwLock` or an
/// actor) and the per-operation plan/commit split guarantees that a
/// failed operation writes nothing.
pub struct ProgressionEngine {
    vault: VaultAccounting,
    experience: ExperienceEngine,
    achievements: AchievementRegistry,
    leaderboard: SnapshotStore,
    milestone_levels: Vec<u32>,
    admin_epoch: u64,
    clock: Box<dyn Clock>,
    events: Vec<Event>,
}

impl ProgressionEngine {
    /// Validates the config and returns the engine together with the
    /// initial administrative capability.
    pub fn new(config: EngineConfig, clock: Box<dyn Clock>) -> EngineResult<(Self, AdminCap)> {
        config.validate()?;
        let engine = ProgressionEngine {
            vault: VaultAccounting::default(),
            experience: ExperienceEngine::new(config.xp_multiplier, config.level_thresholds),
            achievements: AchievementRegistry::default(),
            leaderboard: SnapshotStore::new(config.max_snapshot_entries),
            milestone_levels: config.milestone_levels,
            admin_epoch: 1,
            clock,
            events: Vec::new(),
        };
        Ok((engine, AdminCap { epoch: 1 }))
    }

    // ---- depositor actions -------------------------------------------------

    pub fn deposit(&mut self, account: AccountId, amount: u64) -> EngineResult<DepositReceipt> {
        let now = self.clock.unix_timestamp();
        let plan = self.vault.plan_deposit(&account, amount)?;
        self.vault.commit_deposit(&account, &plan, now);
        self.events.push(Event::Deposited {
            account,
            amount: plan.amount,
            shares_minted: plan.shares_minted,
            share_balance: plan.share_balance,
            total_shares: plan.total_shares,
            total_pool_value: plan.total_pool_value,
        });
        Ok(DepositReceipt {
            amount: plan.amount,
            shares_minted: plan.shares_minted,
            share_balance: plan.share_balance,
            position_value: plan.position_value,
        })
    }

    /// Never blocked by deposit suspension.
    pub fn withdraw(&mut self, account: AccountId, amount: u64) -> EngineResult<WithdrawReceipt> {
        let now = self.clock.unix_timestamp();
        let plan = self.vault.plan_withdraw(&account, amount)?;
        let award = self.experience.plan_award(&account, plan.realized_yield)?;
        self.vault.commit_withdraw(&account, &plan);
        self.events.push(Event::Withdrawn {
            account,
            amount: plan.amount,
            shares_burned: plan.shares_burned,
            share_balance: plan.share_balance,
            total_shares: plan.total_shares,
            total_pool_value: plan.total_pool_value,
        });
        self.apply_award(&account, &award, plan.realized_yield, now);
        Ok(WithdrawReceipt {
            amount: plan.amount,
            shares_burned: plan.shares_burned,
            realized_yield: plan.realized_yield,
            xp_awarded: award.xp_delta,
            share_balance: plan.share_balance,
            remaining_value: plan.remaining_value,
        })
    }

    /// Full redemption at the current share price.
    pub fn withdraw_all(&mut self, account: AccountId) -> EngineResult<WithdrawReceipt> {
        let value = self.vault.asset_value(&account)?;
        self.withdraw(account, value)
    }

    /// Realizes pending yield without burning shares. Returns the
    /// realized amount; zero is valid.
    pub fn claim_yield(&mut self, account: AccountId) -> EngineResult<u64> {
        let now = self.clock.unix_timestamp();
        let plan = self.vault.plan_claim(&account)?;
        let award = self.experience.plan_award(&account, plan.realized_yield)?;
        self.vault.commit_claim(&account, &plan);
        self.apply_award(&account, &award, plan.realized_yield, now);
        Ok(plan.realized_yield)
    }

    /// Pool-strategy seam: records externally earned pool value. Returns
    /// the new total pool value.
    pub fn record_pool_yield(&mut self, amount: u64) -> EngineResult<u64> {
        let total_pool_value = self.vault.record_pool_yield(amount)?;
        self.events.push(Event::PoolYieldRecorded {
            amount,
            total_pool_value,
        });
        Ok(total_pool_value)
    }

    // ---- administration ----------------------------------------------------

    fn authorize(&self, cap: &AdminCap) -> EngineResult<()> {
        if cap.epoch != self.admin_epoch {
            return Err(EngineError::Unauthorized);
        }
        Ok(())
    }

    /// Invalidates every previously issued cap and returns the new one.
    pub fn rotate_admin(&mut self, cap: &AdminCap) -> EngineResult<AdminCap> {
        self.authorize(cap)?;
        self.admin_epoch += 1;
        info!(epoch = self.admin_epoch, "admin capability rotated");
        self.events.push(Event::AdminRotated {
            epoch: self.admin_epoch,
        });
        Ok(AdminCap {
            epoch: self.admin_epoch,
        })
    }

    pub fn set_deposits_suspended(&mut self, cap: &AdminCap, suspended: bool) -> EngineResult<()> {
        self.authorize(cap)?;
        self.vault.set_suspended(suspended);
        self.events
            .push(Event::DepositSuspensionChanged { suspended });
        Ok(())
    }

    /// Administrative award sharing the regular path, including level
    /// crossings and milestone achievements. Returns the xp awarded.
    pub fn award_experience(
        &mut self,
        cap: &AdminCap,
        account: AccountId,
        yield_amount: u64,
    ) -> EngineResult<u64> {
        self.authorize(cap)?;
        let now = self.clock.unix_timestamp();
        let award = self.experience.plan_award(&account, yield_amount)?;
        self.apply_award(&account, &award, 0, now);
        Ok(award.xp_delta)
    }

    pub fn set_xp_multiplier(&mut self, cap: &AdminCap, multiplier: u64) -> EngineResult<()> {
        self.authorize(cap)?;
        self.experience.set_multiplier(multiplier)
    }

    /// Replaces the level table. Stored experience never changes; derived
    /// levels shift immediately.
    pub fn set_level_thresholds(&mut self, cap: &AdminCap, thresholds: Vec<u64>) -> EngineResult<()> {
        self.authorize(cap)?;
        self.experience.set_thresholds(thresholds)
    }

    /// Out-of-band grant. Duplicates fail with `AlreadyGranted`.
    pub fn grant_achievement(
        &mut self,
        cap: &AdminCap,
        account: AccountId,
        achievement: AchievementType,
    ) -> EngineResult<u64> {
        self.authorize(cap)?;
        let now = self.clock.unix_timestamp();
        let grant_id = self.achievements.grant(&account, achievement, now)?;
        self.events.push(Event::AchievementGranted {
            account,
            achievement,
            grant_id,
        });
        Ok(grant_id)
    }

    /// Always fails: achievements are bound to the account they were
    /// earned by.
    pub fn transfer_achievement(
        &mut self,
        from: AccountId,
        to: AccountId,
        achievement: AchievementType,
    ) -> EngineResult<()> {
        self.achievements.transfer(&from, &to, achievement)
    }

    /// Freezes the current experience of the supplied candidates. The
    /// list is trusted to be pre-sorted by descending experience.
    pub fn create_snapshot(
        &mut self,
        cap: &AdminCap,
        candidates: &[AccountId],
    ) -> EngineResult<u64> {
        self.authorize(cap)?;
        let now = self.clock.unix_timestamp();
        let id = self.leaderboard.create(candidates, &self.experience, now)?;
        self.events.push(Event::SnapshotCreated {
            id,
            entry_count: candidates.len() as u32,
            timestamp: now,
        });
        Ok(id)
    }

    // ---- reads -------------------------------------------------------------

    pub fn vault(&self) -> &VaultAccounting {
        &self.vault
    }

    pub fn experience(&self) -> &ExperienceEngine {
        &self.experience
    }

    pub fn achievements(&self) -> &AchievementRegistry {
        &self.achievements
    }

    pub fn leaderboard(&self) -> &SnapshotStore {
        &self.leaderboard
    }

    pub fn milestone_levels(&self) -> &[u32] {
        &self.milestone_levels
    }

    /// Buffered change notifications, oldest first. Draining resets the
    /// buffer.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn pending_events(&self) -> &[Event] {
        &self.events
    }

    // ---- persistence -------------------------------------------------------

    pub fn to_bytes(&self) -> std::io::Result<Vec<u8>> {
        PersistentState {
            vault: self.vault.clone(),
            experience: self.experience.clone(),
            achievements: self.achievements.clone(),
            leaderboard: self.leaderboard.clone(),
            milestone_levels: self.milestone_levels.clone(),
            admin_epoch: self.admin_epoch,
        }
        .try_to_vec()
    }

    /// Restores a checkpoint. The returned cap carries the persisted
    /// admin epoch.
    pub fn from_bytes(bytes: &[u8], clock: Box<dyn Clock>) -> std::io::Result<(Self, AdminCap)> {
        let state = PersistentState::try_from_slice(bytes)?;
        let cap = AdminCap {
            epoch: state.admin_epoch,
        };
        Ok((
            ProgressionEngine {
                vault: state.vault,
                experience: state.experience,
                achievements: state.achievements,
                leaderboard: state.leaderboard,
                milestone_levels: state.milestone_levels,
                admin_epoch: state.admin_epoch,
                clock,
                events: Vec::new(),
            },
            cap,
        ))
    }

    // ---- internal chain ----------------------------------------------------

    /// Commits a planned award and everything downstream of it. The
    /// vault part of the operation has already committed; nothing here
    /// can fail the enclosing operation. Duplicate milestone grants are
    /// "already earned", logged and discarded.
    fn apply_award(&mut self, account: &AccountId, award: &AwardPlan, realized: u64, now: i64) {
        if realized > 0 {
            self.events.push(Event::YieldRealized {
                account: *account,
                amount: realized,
            });
        }
        if award.xp_delta == 0 {
            return;
        }
        self.experience.commit_award(account, award);
        self.events.push(Event::ExperienceAwarded {
            account: *account,
            xp: award.xp_delta,
            total_xp: award.total_xp,
        });
        if award.level_after > award.level_before {
            self.events.push(Event::LevelUp {
                account: *account,
                from: award.level_before,
                to: award.level_after,
            });
            self.grant_milestones(account, award.level_before, award.level_after, now);
        }
    }

    /// Grants every configured milestone inside `(before, after]`. A
    /// single award that jumps several levels mints all of them.
    fn grant_milestones(&mut self, account: &AccountId, before: u32, after: u32, now: i64) {
        let crossed: Vec<u32> = self
            .milestone_levels
            .iter()
            .copied()
            .filter(|level| *level > before && *level <= after)
            .collect();
        for level in crossed {
            match self
                .achievements
                .grant(account, AchievementType::LevelMilestone(level), now)
            {
                Ok(grant_id) => self.events.push(Event::AchievementGranted {
                    account: *account,
                    achievement: AchievementType::LevelMilestone(level),
                    grant_id,
                }),
                Err(err) => {
                    debug!(account = %account, level, %err, "milestone grant skipped")
                }
            }
        }
    }
}
