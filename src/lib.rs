//! Yield-to-progression state engine.
//!
//! Converts realized financial yield into experience, levels,
//! non-transferable achievements, and immutable point-in-time rankings.
//! Four components, each a leaf-to-root dependency layer:
//!
//! 1. [`vault::VaultAccounting`] — proportional-share pool accounting and
//!    realized-yield detection. Deposits re-synchronize the realization
//!    point so new principal is never misread as yield.
//! 2. [`experience::ExperienceEngine`] — deterministic, monotonic
//!    yield-to-experience conversion and threshold-table level derivation.
//! 3. [`achievements::AchievementRegistry`] — idempotent, permanent,
//!    non-transferable grants triggered by level crossings.
//! 4. [`leaderboard::SnapshotStore`] — immutable periodic ranking captures
//!    over externally pre-sorted candidate lists.
//!
//! [`ProgressionEngine`] wires the chain: a deposit, withdrawal, or yield
//! claim flows into the vault, realized yield is awarded as experience,
//! and milestone crossings mint achievements. Duplicate milestone grants
//! are the one failure deliberately swallowed; everything else aborts the
//! whole operation before any state is written.
//!
//! ```
//! use progression_engine::{AccountId, EngineConfig, ManualClock, ProgressionEngine};
//!
//! let clock = ManualClock::new(1_700_000_000);
//! let (mut engine, admin) =
//!     ProgressionEngine::new(EngineConfig::default(), Box::new(clock)).unwrap();
//!
//! let alice = AccountId::new([1u8; 32]);
//! engine.deposit(alice, 100).unwrap();
//! engine.record_pool_yield(20).unwrap();
//! assert_eq!(engine.claim_yield(alice).unwrap(), 20);
//! assert_eq!(engine.experience().experience_of(&alice), 200);
//! # let _ = admin;
//! ```

pub mod account;
pub mod achievements;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod experience;
pub mod leaderboard;
pub mod math;
pub mod state;
pub mod vault;

pub use account::AccountId;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use engine::{AdminCap, DepositReceipt, ProgressionEngine, WithdrawReceipt};
pub use error::{EngineError, EngineResult};
pub use events::Event;
pub use state::{AchievementGrant, AchievementType, RankingSnapshot, SnapshotEntry};
