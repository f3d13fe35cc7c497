use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::math::PRECISION;

/// 10 experience per unit of realized yield.
pub const DEFAULT_XP_MULTIPLIER: u64 = 10 * PRECISION;

/// Level table: index i holds the cumulative experience required for
/// level i + 1. Level 1 is always free (threshold 0).
pub const DEFAULT_LEVEL_THRESHOLDS: [u64; 10] = [
    0, 1_000, 5_000, 10_000, 25_000, 50_000, 100_000, 250_000, 500_000, 1_000_000,
];

/// Levels whose crossing mints a milestone achievement.
pub const DEFAULT_MILESTONE_LEVELS: [u32; 2] = [5, 10];

pub const DEFAULT_MAX_SNAPSHOT_ENTRIES: u32 = 100;

/// Engine parameters fixed at construction. The multiplier and threshold
/// table remain administratively replaceable afterwards.
#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Fixed point (6 decimals): xp = yield * xp_multiplier / PRECISION.
    pub xp_multiplier: u64,
    /// Strictly increasing, first entry must be 0.
    pub level_thresholds: Vec<u64>,
    /// Levels that mint a `LevelMilestone` achievement when first reached.
    pub milestone_levels: Vec<u32>,
    /// Upper bound on candidate lists passed to snapshot creation.
    pub max_snapshot_entries: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            xp_multiplier: DEFAULT_XP_MULTIPLIER,
            level_thresholds: DEFAULT_LEVEL_THRESHOLDS.to_vec(),
            milestone_levels: DEFAULT_MILESTONE_LEVELS.to_vec(),
            max_snapshot_entries: DEFAULT_MAX_SNAPSHOT_ENTRIES,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> EngineResult<()> {
        if self.xp_multiplier == 0 {
            return Err(EngineError::ZeroMultiplier);
        }
        validate_thresholds(&self.level_thresholds)
    }
}

/// A threshold table is valid when non-empty, zero-first, and strictly
/// increasing.
pub(crate) fn validate_thresholds(thresholds: &[u64]) -> EngineResult<()> {
    match thresholds.first() {
        None => return Err(EngineError::InvalidThresholds("table is empty")),
        Some(&first) if first != 0 => {
            return Err(EngineError::InvalidThresholds("first threshold must be 0"))
        }
        Some(_) => {}
    }
    for pair in thresholds.windows(2) {
        if pair[1] <= pair[0] {
            return Err(EngineError::InvalidThresholds(
                "thresholds must be strictly increasing",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn rejects_zero_multiplier() {
        let config = EngineConfig {
            xp_multiplier: 0,
            ..EngineConfig::default()
        };
        assert_eq!(config.validate(), Err(EngineError::ZeroMultiplier));
    }

    #[test]
    fn rejects_bad_threshold_tables() {
        assert!(matches!(
            validate_thresholds(&[]),
            Err(EngineError::InvalidThresholds(_))
        ));
        assert!(matches!(
            validate_thresholds(&[5, 10]),
            Err(EngineError::InvalidThresholds(_))
        ));
        assert!(matches!(
            validate_thresholds(&[0, 10, 10]),
            Err(EngineError::InvalidThresholds(_))
        ));
        assert!(matches!(
            validate_thresholds(&[0, 10, 5]),
            Err(EngineError::InvalidThresholds(_))
        ));
        validate_thresholds(&[0]).unwrap();
        validate_thresholds(&[0, 1, 2]).unwrap();
    }
}
