use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

/// Per-depositor vault position.
///
/// A zero-share position is valid and inert; positions are never deleted.
#[derive(
    BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq, Eq,
)]
pub struct DepositorPosition {
    /// Pool shares owned.
    pub share_balance: u64,

    /// Asset-equivalent value of the position at the last realization
    /// point. Re-synchronized on every principal change so that only
    /// genuine value growth between realization points counts as yield.
    pub last_realized_value: u64,

    /// Timestamp of the first deposit. Informational only.
    pub first_deposit_time: i64,
}

impl DepositorPosition {
    pub fn new(first_deposit_time: i64) -> Self {
        DepositorPosition {
            share_balance: 0,
            last_realized_value: 0,
            first_deposit_time,
        }
    }
}
