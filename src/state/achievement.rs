use std::fmt;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

/// Kind of achievement. One grant per (account, type) pair, ever.
#[derive(
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
)]
pub enum AchievementType {
    /// Minted automatically the first time an account reaches the level.
    LevelMilestone(u32),
    /// Out-of-band badge granted administratively (event campaigns etc).
    Special(u32),
}

impl fmt::Display for AchievementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AchievementType::LevelMilestone(level) => write!(f, "level-milestone-{}", level),
            AchievementType::Special(id) => write!(f, "special-{}", id),
        }
    }
}

/// A permanent, non-transferable achievement record.
#[derive(
    BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq, Eq,
)]
pub struct AchievementGrant {
    /// Globally monotonic id assigned at grant time.
    pub id: u64,
    pub achievement: AchievementType,
    pub granted_at: i64,
}
