//! Persistence boundary: the abstract key-value adapter the core consumes,
//! an in-memory reference backend, and the match store that knows which keys
//! hold which representation.
//!
//! Storage is strictly downstream of scoring: nothing here is awaited by the
//! engine, and every failure degrades to "no saved match" instead of a crash.

use std::collections::HashMap;

use thiserror::Error;

use crate::engine::{normalize, RuntimeMatchState};
use crate::schema::migration::try_migrate_match_state;
use crate::schema::{serialize_match_state, MatchState};

/// Key for the canonical schema-versioned record.
pub const MATCH_STATE_KEY: &str = "match_state_v1";

/// Key for the legacy raw record (a serialized runtime-shaped object), kept
/// readable for backward compatibility with older persisted layouts.
pub const LEGACY_MATCH_STATE_KEY: &str = "match_state";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage backend unavailable")]
    Unavailable,

    #[error("storage operation failed: {0}")]
    Backend(String),
}

/// Abstract persistence adapter. Concrete backends (file system, settings
/// store, ...) live outside the core; implementations must never panic.
pub trait StorageAdapter {
    /// Best-effort write of an opaque string payload.
    fn save(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// `None` on absence, corruption, or read failure.
    fn load(&self, key: &str) -> Option<String>;

    /// Best-effort delete of a record.
    fn clear(&mut self, key: &str) -> Result<(), StorageError>;
}

/// In-memory backend: the reference implementation and test double.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    records: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageAdapter for MemoryStorage {
    fn save(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.records.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn load(&self, key: &str) -> Option<String> {
        self.records.get(key).cloned()
    }

    fn clear(&mut self, key: &str) -> Result<(), StorageError> {
        self.records.remove(key);
        Ok(())
    }
}

/// Persistence front for match state: serializes, migrates, and falls back
/// across the schema and legacy keys.
pub struct MatchStore<S: StorageAdapter> {
    adapter: S,
}

impl<S: StorageAdapter> MatchStore<S> {
    pub fn new(adapter: S) -> Self {
        Self { adapter }
    }

    pub fn adapter(&self) -> &S {
        &self.adapter
    }

    pub fn into_adapter(self) -> S {
        self.adapter
    }

    /// Persist the canonical record. Best-effort: serialization or backend
    /// failures are logged and swallowed. The caller's state is always
    /// written as the latest word; an undone point carries an older
    /// timestamp, and the restored snapshot must still win the record.
    pub fn save(&mut self, state: &MatchState) {
        let payload = match serialize_match_state(state) {
            Ok(payload) => payload,
            Err(err) => {
                log::warn!("Could not serialize match state: {}", err);
                return;
            }
        };

        if let Err(err) = self.adapter.save(MATCH_STATE_KEY, &payload) {
            log::warn!("Could not persist match state: {}", err);
        } else {
            log::debug!("Persisted match state ({} bytes)", payload.len());
        }
    }

    /// Load the saved match, if any. The schema-versioned record is read
    /// first; the legacy runtime-shaped record is the fallback, accepted only
    /// after passing its own structural predicate. A corrupt schema record is
    /// treated like an absent one, so it neither masks a still-valid legacy
    /// record nor surfaces as a fresh match where no save exists.
    pub fn load(&self) -> Option<MatchState> {
        if let Some(raw) = self.adapter.load(MATCH_STATE_KEY) {
            // A blanked record is how some backends express deletion.
            if !raw.trim().is_empty() {
                match try_migrate_match_state(&raw) {
                    Some(state) => return Some(state),
                    None => log::warn!("Ignoring unusable schema record"),
                }
            }
        }

        let raw = self.adapter.load(LEGACY_MATCH_STATE_KEY)?;
        let runtime: RuntimeMatchState = match serde_json::from_str(&raw) {
            Ok(runtime) => runtime,
            Err(err) => {
                log::debug!("Rejected legacy match record: {}", err);
                return None;
            }
        };

        if !runtime.is_restorable() {
            log::debug!("Rejected legacy match record: inconsistent state");
            return None;
        }

        log::info!("Loaded match state from legacy record");
        Some(normalize(&runtime))
    }

    /// Clear both persisted records. Each key is independently best-effort;
    /// the returned pair reports (schema record cleared, legacy record
    /// cleared).
    pub fn clear(&mut self) -> (bool, bool) {
        (self.clear_key(MATCH_STATE_KEY), self.clear_key(LEGACY_MATCH_STATE_KEY))
    }

    fn clear_key(&mut self, key: &str) -> bool {
        if self.adapter.clear(key).is_ok() {
            return true;
        }

        // Deletion unsupported or failed: blank the record instead.
        match self.adapter.save(key, "") {
            Ok(()) => true,
            Err(err) => {
                log::warn!("Could not clear stored record '{}': {}", key, err);
                false
            }
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{add_point, denormalize, Team};
    use crate::schema::SCHEMA_VERSION;

    /// Backend that cannot delete and optionally cannot write.
    struct StubbornStorage {
        inner: MemoryStorage,
        writable: bool,
    }

    impl StorageAdapter for StubbornStorage {
        fn save(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
            if !self.writable {
                return Err(StorageError::Unavailable);
            }
            self.inner.save(key, value)
        }

        fn load(&self, key: &str) -> Option<String> {
            self.inner.load(key)
        }

        fn clear(&mut self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Backend("delete not supported".to_string()))
        }
    }

    #[test]
    fn test_save_load_roundtrip() {
        let mut store = MatchStore::new(MemoryStorage::new());
        let state = MatchState::initial(5);

        store.save(&state);
        assert_eq!(store.load(), Some(state));
    }

    #[test]
    fn test_load_without_records_is_none() {
        let store = MatchStore::new(MemoryStorage::new());
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_blank_schema_record_reads_as_absent() {
        let mut adapter = MemoryStorage::new();
        adapter.save(MATCH_STATE_KEY, "").unwrap();

        let store = MatchStore::new(adapter);
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_corrupt_schema_record_reads_as_absent() {
        let mut adapter = MemoryStorage::new();
        adapter.save(MATCH_STATE_KEY, "{\"totally\": \"foreign\"}").unwrap();

        let store = MatchStore::new(adapter);
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_corrupt_schema_record_does_not_mask_legacy_record() {
        let mut runtime = denormalize(&MatchState::initial(3));
        runtime = add_point(&runtime, Team::TeamB, None);

        let mut adapter = MemoryStorage::new();
        adapter.save(MATCH_STATE_KEY, "{\"totally\": \"foreign\"}").unwrap();
        adapter
            .save(LEGACY_MATCH_STATE_KEY, &serde_json::to_string(&runtime).unwrap())
            .unwrap();

        let store = MatchStore::new(adapter);
        let loaded = store.load().unwrap();
        assert_eq!(loaded.current_game.points.team_b, 1);
    }

    #[test]
    fn test_legacy_record_fallback() {
        let mut runtime = denormalize(&MatchState::initial(3));
        runtime = add_point(&runtime, Team::TeamA, None);
        let legacy_payload = serde_json::to_string(&runtime).unwrap();

        let mut adapter = MemoryStorage::new();
        adapter.save(LEGACY_MATCH_STATE_KEY, &legacy_payload).unwrap();

        let store = MatchStore::new(adapter);
        let loaded = store.load().unwrap();

        assert_eq!(loaded.schema_version, SCHEMA_VERSION);
        assert_eq!(loaded.current_game.points.team_a, 1);
        assert_eq!(loaded.sets_to_play, 3);
    }

    #[test]
    fn test_invalid_legacy_record_is_ignored() {
        let mut adapter = MemoryStorage::new();
        adapter.save(LEGACY_MATCH_STATE_KEY, "{\"currentSet\": 2}").unwrap();

        let store = MatchStore::new(adapter);
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_clear_removes_both_records() {
        let mut store = MatchStore::new(MemoryStorage::new());
        store.save(&MatchState::default());
        store
            .adapter
            .save(LEGACY_MATCH_STATE_KEY, "{}")
            .unwrap();

        assert_eq!(store.clear(), (true, true));
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_clear_falls_back_to_blanking_the_record() {
        let mut adapter = StubbornStorage { inner: MemoryStorage::new(), writable: true };
        adapter.save(MATCH_STATE_KEY, "{\"x\":1}").unwrap();

        let mut store = MatchStore::new(adapter);
        assert_eq!(store.clear(), (true, true));

        // The record still exists but is blank, which load treats as absent.
        assert_eq!(store.adapter().load(MATCH_STATE_KEY), Some(String::new()));
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_clear_reports_failure_per_key() {
        let adapter = StubbornStorage { inner: MemoryStorage::new(), writable: false };
        let mut store = MatchStore::new(adapter);

        assert_eq!(store.clear(), (false, false));
    }

    #[test]
    fn test_save_failure_is_swallowed() {
        let adapter = StubbornStorage { inner: MemoryStorage::new(), writable: false };
        let mut store = MatchStore::new(adapter);

        // Must not panic; the state is simply not persisted.
        store.save(&MatchState::default());
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_persist_after_undo_overwrites_previous_record() {
        use crate::session::MatchSession;

        let mut store = MatchStore::new(MemoryStorage::new());
        let mut session = MatchSession::new(3).unwrap();

        session.add_point(Team::TeamA);
        session.add_point(Team::TeamA);
        session.persist(&mut store);

        // The restored snapshot carries its original, older timestamp; it
        // must still win the durable record, or the undone point would
        // resurrect after a restart.
        session.undo().unwrap();
        session.persist(&mut store);

        let reloaded = store.load().unwrap();
        assert_eq!(reloaded.current_game.points.team_a, 1);
        assert_eq!(reloaded, session.to_match_state());
    }
}
