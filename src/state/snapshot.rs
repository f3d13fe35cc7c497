use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::account::AccountId;

/// One ranked account inside a snapshot.
#[derive(
    BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq, Eq,
)]
pub struct SnapshotEntry {
    pub account: AccountId,
    /// Experience at capture time. Never updated afterwards.
    pub experience: u64,
    /// 1-based; rank 1 is the highest experience.
    pub rank: u32,
}

/// An immutable, timestamped ranking capture.
///
/// Candidates are ranked in input order; the provider is trusted to have
/// sorted them by descending experience beforehand.
#[derive(
    BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq, Eq,
)]
pub struct RankingSnapshot {
    pub id: u64,
    pub timestamp: i64,
    pub entry_count: u32,
    pub entries: Vec<SnapshotEntry>,
}
