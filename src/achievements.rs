use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
use tracing::debug;

use crate::account::AccountId;
use crate::error::{EngineError, EngineResult};
use crate::state::{AchievementGrant, AchievementType};

/// Permanent, unique, non-transferable achievement grants.
///
/// At most one grant per (account, achievement type), ever. Grant ids
/// are globally monotonic. There is no operation that can move a grant
/// to another account; [`AchievementRegistry::transfer`] exists only to
/// reject the attempt regardless of caller.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone)]
pub struct AchievementRegistry {
    grants: BTreeMap<AccountId, Vec<AchievementGrant>>,
    next_grant_id: u64,
}

impl Default for AchievementRegistry {
    fn default() -> Self {
        AchievementRegistry {
            grants: BTreeMap::new(),
            next_grant_id: 1,
        }
    }
}

impl AchievementRegistry {
    /// Grants in mint order for one account. Empty when none.
    pub fn grants_of(&self, account: &AccountId) -> &[AchievementGrant] {
        self.grants.get(account).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_achievement(&self, account: &AccountId, achievement: AchievementType) -> bool {
        self.grants_of(account)
            .iter()
            .any(|g| g.achievement == achievement)
    }

    /// Total grants ever minted.
    pub fn grant_count(&self) -> u64 {
        self.next_grant_id - 1
    }

    /// Fails with [`EngineError::AlreadyGranted`] on a duplicate, which
    /// callers in the level-crossing path treat as "already earned" and
    /// discard rather than propagate.
    pub(crate) fn grant(
        &mut self,
        account: &AccountId,
        achievement: AchievementType,
        now: i64,
    ) -> EngineResult<u64> {
        if self.has_achievement(account, achievement) {
            return Err(EngineError::AlreadyGranted);
        }
        let id = self.next_grant_id;
        self.next_grant_id += 1;
        self.grants.entry(*account).or_default().push(AchievementGrant {
            id,
            achievement,
            granted_at: now,
        });
        debug!(account = %account, %achievement, id, "achievement granted");
        Ok(id)
    }

    /// Unconditionally rejected: the prohibition is structural, not
    /// permission-based.
    pub fn transfer(
        &mut self,
        _from: &AccountId,
        _to: &AccountId,
        _achievement: AchievementType,
    ) -> EngineResult<()> {
        Err(EngineError::TransferForbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(byte: u8) -> AccountId {
        AccountId::new([byte; 32])
    }

    #[test]
    fn grants_are_recorded_in_mint_order_with_monotonic_ids() {
        let mut registry = AchievementRegistry::default();
        let alice = account(1);
        let bob = account(2);
        let a = registry
            .grant(&alice, AchievementType::LevelMilestone(5), 100)
            .unwrap();
        let b = registry
            .grant(&bob, AchievementType::LevelMilestone(5), 110)
            .unwrap();
        let c = registry
            .grant(&alice, AchievementType::LevelMilestone(10), 120)
            .unwrap();
        assert!(a < b && b < c);
        let alice_grants = registry.grants_of(&alice);
        assert_eq!(alice_grants.len(), 2);
        assert_eq!(alice_grants[0].achievement, AchievementType::LevelMilestone(5));
        assert_eq!(alice_grants[1].achievement, AchievementType::LevelMilestone(10));
        assert_eq!(registry.grant_count(), 3);
    }

    #[test]
    fn duplicate_grant_fails() {
        let mut registry = AchievementRegistry::default();
        let alice = account(1);
        registry
            .grant(&alice, AchievementType::Special(7), 100)
            .unwrap();
        assert_eq!(
            registry.grant(&alice, AchievementType::Special(7), 200),
            Err(EngineError::AlreadyGranted)
        );
        // Same type for a different account is fine.
        registry
            .grant(&account(2), AchievementType::Special(7), 200)
            .unwrap();
    }

    #[test]
    fn transfer_is_always_rejected() {
        let mut registry = AchievementRegistry::default();
        let alice = account(1);
        let bob = account(2);
        registry
            .grant(&alice, AchievementType::LevelMilestone(5), 100)
            .unwrap();
        assert_eq!(
            registry.transfer(&alice, &bob, AchievementType::LevelMilestone(5)),
            Err(EngineError::TransferForbidden)
        );
        // Even for grants that do not exist.
        assert_eq!(
            registry.transfer(&bob, &alice, AchievementType::Special(1)),
            Err(EngineError::TransferForbidden)
        );
        assert!(registry.has_achievement(&alice, AchievementType::LevelMilestone(5)));
        assert!(!registry.has_achievement(&bob, AchievementType::LevelMilestone(5)));
    }

    #[test]
    fn empty_account_has_no_grants() {
        let registry = AchievementRegistry::default();
        assert!(registry.grants_of(&account(9)).is_empty());
        assert!(!registry.has_achievement(&account(9), AchievementType::Special(1)));
    }
}
