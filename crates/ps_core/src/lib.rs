//! # ps_core - Padel/Tennis Match Scoring Core
//!
//! This library tracks the live score of a multi-set racket match (points,
//! deuce/advantage, games, sets, tie-breaks, match completion), supports
//! stepwise undo of scoring actions, and persists the score durably across
//! process restarts through a versioned, forward-migrating schema.
//!
//! ## Features
//! - Exact tennis/padel rules including tie-break mode and best-of-{1,3,5}
//! - Snapshot-based undo that restores state byte-for-byte, plus team-scoped
//!   undo over an authorship-tagged history
//! - Versioned JSON persistence with a total migration chain: old saves load,
//!   corrupt saves degrade to a fresh match, nothing ever crashes on ingress
//! - Abstract key-value storage boundary; backends are external collaborators

pub mod engine;
pub mod schema;
pub mod session;
pub mod storage;

// Re-export the scoring engine
pub use engine::{
    add_point, remove_point, remove_point_for_team, EngineError, HistoryEntry, MatchWinner,
    PointScore, RuntimeMatchState, SnapshotHistory, Team,
};

// Re-export the canonical schema
pub use schema::{
    deserialize_match_state, is_match_state, migrate_match_state, serialize_match_state,
    MatchState, MatchStatus, SchemaError, SetRecord, TeamScores, SCHEMA_VERSION,
};

// Re-export the session lifecycle
pub use session::{initialize_match_state, reset_session, MatchSession, ResetOutcome, SessionError};

// Re-export the persistence boundary
pub use storage::{
    MatchStore, MemoryStorage, StorageAdapter, StorageError, LEGACY_MATCH_STATE_KEY,
    MATCH_STATE_KEY,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    /// End-to-end flow: new match, score, persist, restart, resume, finish.
    #[test]
    fn test_full_match_lifecycle() {
        let mut store = MatchStore::new(MemoryStorage::new());
        let mut session = MatchSession::new(1).unwrap();

        // Team A takes five games.
        for _ in 0..(5 * 4) {
            session.add_point(Team::TeamA);
        }
        session.persist(&mut store);

        // "Process restart": a new session resumes from storage.
        let mut session = MatchSession::restore(&store).unwrap();
        assert_eq!(session.state().current_set_status.team_a_games, 5);

        // The sixth game ends the set and, best-of-1, the match.
        for _ in 0..4 {
            session.add_point(Team::TeamA);
        }
        assert_eq!(session.state().status, MatchStatus::Finished);
        assert_eq!(session.state().winner_team, Some(Team::TeamA));

        session.persist(&mut store);
        let reloaded = store.load().unwrap();
        assert_eq!(reloaded.status, MatchStatus::Finished);
        assert_eq!(reloaded.sets_won.team_a, 1);
    }

    /// A legacy-only save (runtime-shaped record, pre-versioning) still loads.
    #[test]
    fn test_legacy_save_survives_the_upgrade() {
        let mut session = MatchSession::new(3).unwrap();
        session.add_point(Team::TeamB);
        let legacy_payload = serde_json::to_string(session.state()).unwrap();

        let mut adapter = MemoryStorage::new();
        adapter.save(LEGACY_MATCH_STATE_KEY, &legacy_payload).unwrap();

        let mut store = MatchStore::new(adapter);
        let resumed = MatchSession::restore(&store).unwrap();
        assert_eq!(resumed.state().team_b.points, PointScore::Fifteen);

        // Persisting writes the schema-versioned record going forward.
        resumed.persist(&mut store);
        let raw = store.adapter().load(MATCH_STATE_KEY).unwrap();
        let migrated = deserialize_match_state(&raw).unwrap();
        assert_eq!(migrated.schema_version, SCHEMA_VERSION);
    }
}
