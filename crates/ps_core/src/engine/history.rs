//! Undo history: a strict stack of pre-mutation snapshots, each tagged with
//! the team whose point produced the transition. Recording authorship at write
//! time is what makes team-scoped undo exact instead of replay-guessed.

use super::state::{RuntimeMatchState, Team};

/// One undo step: the state as it was immediately before a point was scored,
/// and who scored it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub scored_by: Team,
    pub snapshot: RuntimeMatchState,
}

/// Last-in-first-out history of fully independent snapshots. Entries own
/// their data outright; nothing in the stack aliases the live state or any
/// previously returned value. No capacity bound is imposed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotHistory {
    entries: Vec<HistoryEntry>,
}

impl SnapshotHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a snapshot. Taking the state by value is the deep-copy
    /// guarantee: the caller clones, the stack owns.
    pub fn push(&mut self, scored_by: Team, snapshot: RuntimeMatchState) {
        self.entries.push(HistoryEntry { scored_by, snapshot });
    }

    /// Remove and return the most recent entry, or `None` if empty.
    pub fn pop(&mut self) -> Option<HistoryEntry> {
        self.entries.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drop every entry above `len`, keeping the oldest `len` entries.
    pub fn truncate(&mut self, len: usize) {
        self.entries.truncate(len);
    }

    /// Oldest-first view of the stack, for team-scoped undo.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }
}
