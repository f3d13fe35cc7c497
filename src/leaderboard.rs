use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
use tracing::debug;

use crate::account::AccountId;
use crate::error::{EngineError, EngineResult};
use crate::experience::ExperienceEngine;
use crate::state::{RankingSnapshot, SnapshotEntry};

/// Immutable periodic ranking captures.
///
/// The candidate list is trusted to arrive pre-sorted by descending
/// experience; the store assigns ranks 1..N in input order and embeds
/// each account's experience as of the capture. Snapshots are never
/// mutated after creation.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone)]
pub struct SnapshotStore {
    snapshots: BTreeMap<u64, RankingSnapshot>,
    next_id: u64,
    max_entries: u32,
}

impl SnapshotStore {
    pub(crate) fn new(max_entries: u32) -> Self {
        SnapshotStore {
            snapshots: BTreeMap::new(),
            next_id: 1,
            max_entries,
        }
    }

    pub fn max_entries(&self) -> u32 {
        self.max_entries
    }

    /// Id of the most recent snapshot, `None` before the first capture.
    pub fn latest_id(&self) -> Option<u64> {
        self.snapshots.keys().next_back().copied()
    }

    pub fn snapshot(&self, id: u64) -> EngineResult<&RankingSnapshot> {
        self.snapshots
            .get(&id)
            .ok_or(EngineError::SnapshotNotFound(id))
    }

    /// Leading entries of a snapshot, clamped to what it holds.
    pub fn top_n(&self, id: u64, count: usize) -> EngineResult<&[SnapshotEntry]> {
        let snapshot = self.snapshot(id)?;
        let end = count.min(snapshot.entries.len());
        Ok(&snapshot.entries[..end])
    }

    /// Rank of an account within a snapshot, `Ok(None)` when the account
    /// was not included. Absence is a sentinel, not an error.
    pub fn rank_of(&self, id: u64, account: &AccountId) -> EngineResult<Option<u32>> {
        let snapshot = self.snapshot(id)?;
        Ok(snapshot
            .entries
            .iter()
            .find(|e| e.account == *account)
            .map(|e| e.rank))
    }

    /// An empty candidate list produces a valid, empty snapshot.
    pub(crate) fn create(
        &mut self,
        candidates: &[AccountId],
        experience: &ExperienceEngine,
        now: i64,
    ) -> EngineResult<u64> {
        if candidates.len() > self.max_entries as usize {
            return Err(EngineError::TooManyEntries {
                provided: candidates.len(),
                max: self.max_entries as usize,
            });
        }
        let entries: Vec<SnapshotEntry> = candidates
            .iter()
            .enumerate()
            .map(|(i, account)| SnapshotEntry {
                account: *account,
                experience: experience.experience_of(account),
                rank: i as u32 + 1,
            })
            .collect();
        let id = self.next_id;
        self.next_id += 1;
        let snapshot = RankingSnapshot {
            id,
            timestamp: now,
            entry_count: entries.len() as u32,
            entries,
        };
        debug!(id, entries = snapshot.entry_count, "snapshot created");
        self.snapshots.insert(id, snapshot);
        Ok(id)
    }
}
