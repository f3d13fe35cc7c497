pub mod achievement;
pub mod experience;
pub mod position;
pub mod snapshot;

pub use achievement::{AchievementGrant, AchievementType};
pub use experience::ExperienceEntry;
pub use position::DepositorPosition;
pub use snapshot::{RankingSnapshot, SnapshotEntry};
