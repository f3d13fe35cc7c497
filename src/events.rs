use serde::{Deserialize, Serialize};

use crate::account::AccountId;
use crate::state::AchievementType;

/// Change notification emitted on every state mutation.
///
/// Each variant carries the acting account, the relevant amounts, and the
/// resulting totals so indexers can reconstruct state without replaying
/// engine logic. Events are pushed only after the mutation has fully
/// committed and are drained with [`crate::ProgressionEngine::drain_events`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    Deposited {
        account: AccountId,
        amount: u64,
        shares_minted: u64,
        share_balance: u64,
        total_shares: u64,
        total_pool_value: u64,
    },
    Withdrawn {
        account: AccountId,
        amount: u64,
        shares_burned: u64,
        share_balance: u64,
        total_shares: u64,
        total_pool_value: u64,
    },
    PoolYieldRecorded {
        amount: u64,
        total_pool_value: u64,
    },
    YieldRealized {
        account: AccountId,
        amount: u64,
    },
    ExperienceAwarded {
        account: AccountId,
        xp: u64,
        total_xp: u64,
    },
    LevelUp {
        account: AccountId,
        from: u32,
        to: u32,
    },
    AchievementGranted {
        account: AccountId,
        achievement: AchievementType,
        grant_id: u64,
    },
    DepositSuspensionChanged {
        suspended: bool,
    },
    SnapshotCreated {
        id: u64,
        entry_count: u32,
        timestamp: i64,
    },
    AdminRotated {
        epoch: u64,
    },
}

impl Event {
    /// JSON form for read-side consumers.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
