use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

/// Per-account experience ledger entry.
#[derive(
    BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq, Eq,
)]
pub struct ExperienceEntry {
    /// Cumulative experience. Monotonically non-decreasing for the
    /// lifetime of the account.
    pub cumulative_xp: u64,

    /// Level recorded at the last award. Queries derive the level from
    /// the current threshold table instead of trusting this field, so a
    /// table replacement changes reported levels without an award.
    pub level: u32,
}

impl Default for ExperienceEntry {
    fn default() -> Self {
        ExperienceEntry {
            cumulative_xp: 0,
            level: 1,
        }
    }
}
