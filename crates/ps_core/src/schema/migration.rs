//! Forward migration of persisted match state payloads.
//!
//! Payloads are versioned through the `schemaVersion` field. A payload with no
//! explicit version (or an explicit 0) is the legacy layout, version 0.
//! Migration is total: whatever the input looks like, the result is a valid
//! `MatchState`. Silently starting fresh beats crashing on an old save, but a
//! structurally invalid payload is never accepted as-is.

use serde::Deserialize;
use serde_json::Value;

use super::format::{
    is_match_state, CurrentGame, CurrentSet, MatchState, MatchStatus, SetRecord, TeamScores,
};
use super::SCHEMA_VERSION;

const VERSION_FIELD: &str = "schemaVersion";

/// One registered version transition, applied to an owned payload copy.
type MigrationStep = fn(Value) -> Value;

fn migration_step(from: u32) -> Option<MigrationStep> {
    match from {
        0 => Some(migrate_v0_to_v1),
        _ => None,
    }
}

/// v0 -> v1: stamp the schema version. The v0 layout is otherwise identical,
/// so every other field (including `updatedAt`) is carried over untouched.
fn migrate_v0_to_v1(mut value: Value) -> Value {
    if let Some(record) = value.as_object_mut() {
        record.insert(VERSION_FIELD.to_string(), Value::from(1u32));
    }
    value
}

/// Migrate a raw persisted payload to the current schema version.
///
/// Never fails and never propagates corruption: unreadable, foreign, future or
/// unmigratable payloads all resolve to a freshly constructed default state.
pub fn migrate_match_state(raw: &str) -> MatchState {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => migrate_match_state_value(&value),
        Err(err) => {
            log::warn!("Discarding unreadable match state payload: {}", err);
            MatchState::default()
        }
    }
}

/// Migration entry point for an already-parsed payload.
pub fn migrate_match_state_value(value: &Value) -> MatchState {
    migrate_checked(value).unwrap_or_else(|| {
        log::warn!("Saved match state could not be migrated, starting fresh");
        MatchState::default()
    })
}

/// Non-total variant for callers that need to distinguish "payload had to be
/// discarded" from a genuinely migrated state, e.g. to fall through to a
/// secondary record instead of presenting a fresh match.
pub fn try_migrate_match_state(raw: &str) -> Option<MatchState> {
    let value = serde_json::from_str::<Value>(raw).ok()?;
    migrate_checked(&value)
}

fn migrate_checked(value: &Value) -> Option<MatchState> {
    let resolved = resolve_version(value)?;

    // No downgrade support, no silent truncation of unknown future fields.
    if resolved < 0 || resolved > i64::from(SCHEMA_VERSION) {
        log::warn!(
            "Unsupported match state schema version {} (current: {})",
            resolved,
            SCHEMA_VERSION
        );
        return None;
    }

    let mut version = resolved as u32;

    if version == SCHEMA_VERSION {
        // Current payloads are accepted as-is, but only after independently
        // passing full current-schema validation.
        let state: MatchState = serde_json::from_value(value.clone()).ok()?;
        state.validate().ok()?;
        return Some(state);
    }

    if !passes_version_shape(version, value) {
        return None;
    }

    let mut migrated = value.clone();
    while version < SCHEMA_VERSION {
        let step = migration_step(version)?;
        migrated = step(migrated);
        version += 1;
    }

    let state: MatchState = serde_json::from_value(migrated).ok()?;
    state.validate().ok()?;

    log::info!("Migrated match state from schema version {} to {}", resolved, SCHEMA_VERSION);
    Some(state)
}

/// Resolve the payload's version. `None` means the version cannot be
/// determined at all (not a record, or a non-integer version field).
fn resolve_version(value: &Value) -> Option<i64> {
    let record = value.as_object()?;
    match record.get(VERSION_FIELD) {
        None => Some(0),
        Some(version) => version.as_i64(),
    }
}

fn passes_version_shape(version: u32, value: &Value) -> bool {
    match version {
        0 => is_legacy_v0(value),
        _ => is_match_state(value),
    }
}

/// Legacy v0 layout: the current shape minus `schemaVersion`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(dead_code)]
struct MatchStateV0 {
    status: MatchStatus,
    sets_to_play: u32,
    sets_needed_to_win: u32,
    sets_won: TeamScores,
    current_set: CurrentSet,
    current_game: CurrentGame,
    set_history: Vec<SetRecord>,
    updated_at: u64,
}

fn is_legacy_v0(value: &Value) -> bool {
    let parsed: MatchStateV0 = match serde_json::from_value(value.clone()) {
        Ok(parsed) => parsed,
        Err(err) => {
            log::debug!("Payload is not a v0 match state: {}", err);
            return false;
        }
    };

    matches!(parsed.sets_to_play, 1 | 3 | 5)
        && parsed.sets_needed_to_win == parsed.sets_to_play.div_ceil(2)
        && parsed.current_set.number >= 1
        && parsed.set_history.iter().all(|record| record.set_number >= 1)
}
