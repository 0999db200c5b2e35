use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use super::error::SchemaError;
use super::SCHEMA_VERSION;

/// Whether a match is still accepting points.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Active,
    Finished,
}

/// A per-team pair of non-negative counters (points, games or sets).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TeamScores {
    pub team_a: u32,
    pub team_b: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CurrentSet {
    /// 1-based set number.
    pub number: u32,
    pub games: TeamScores,
}

/// Point counts for the game in progress. 0..=3 map to Love/15/30/40,
/// 4 is Advantage; tie-break points are stored verbatim.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CurrentGame {
    pub points: TeamScores,
}

/// A completed set as it is persisted. Append-only; the engine never reorders
/// or edits entries once written.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SetRecord {
    pub set_number: u32,
    pub team_a_games: u32,
    pub team_b_games: u32,
}

/// Canonical match state with all persistent data.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MatchState {
    pub status: MatchStatus,

    /// Match format: best-of-1, best-of-3 or best-of-5.
    pub sets_to_play: u32,

    /// Derived from `sets_to_play` by ceiling division; the pairing is an
    /// invariant, never independently settable.
    pub sets_needed_to_win: u32,

    pub sets_won: TeamScores,

    pub current_set: CurrentSet,

    pub current_game: CurrentGame,

    /// Completed sets in completion order.
    pub set_history: Vec<SetRecord>,

    /// Unix milliseconds of the last mutation.
    pub updated_at: u64,

    /// Persisted format version for migration.
    pub schema_version: u32,
}

impl Default for MatchState {
    fn default() -> Self {
        Self::initial(3)
    }
}

impl MatchState {
    /// Fresh match in the given format. Callers validate `sets_to_play`
    /// before construction; see `session::initialize_match_state`.
    pub fn initial(sets_to_play: u32) -> Self {
        Self {
            status: MatchStatus::Active,
            sets_to_play,
            sets_needed_to_win: sets_to_play.div_ceil(2),
            sets_won: TeamScores::default(),
            current_set: CurrentSet { number: 1, games: TeamScores::default() },
            current_game: CurrentGame { points: TeamScores::default() },
            set_history: Vec::new(),
            updated_at: current_timestamp(),
            schema_version: SCHEMA_VERSION,
        }
    }

    pub fn validate(&self) -> Result<(), SchemaError> {
        if !matches!(self.sets_to_play, 1 | 3 | 5) {
            return Err(SchemaError::InvalidSetsToPlay { found: self.sets_to_play });
        }

        let expected = self.sets_to_play.div_ceil(2);
        if self.sets_needed_to_win != expected {
            return Err(SchemaError::MismatchedSetsNeeded {
                sets_to_play: self.sets_to_play,
                found: self.sets_needed_to_win,
                expected,
            });
        }

        if self.current_set.number == 0 {
            return Err(SchemaError::NonPositiveSetNumber);
        }

        if self.set_history.iter().any(|record| record.set_number == 0) {
            return Err(SchemaError::NonPositiveSetNumber);
        }

        if self.schema_version == 0 {
            return Err(SchemaError::NonPositiveSchemaVersion);
        }

        Ok(())
    }
}

/// Lossless string encoding of a valid match state.
pub fn serialize_match_state(state: &MatchState) -> Result<String, SchemaError> {
    state.validate()?;
    serde_json::to_string(state).map_err(SchemaError::Serialization)
}

/// Parse and validate in one step. This is the single recovery point for
/// corrupt or foreign input: malformed syntax, missing fields, negative
/// counters and broken invariants all resolve to `None`, never a panic.
pub fn deserialize_match_state(raw: &str) -> Option<MatchState> {
    let state: MatchState = match serde_json::from_str(raw) {
        Ok(state) => state,
        Err(err) => {
            log::debug!("Rejected match state payload: {}", err);
            return None;
        }
    };

    match state.validate() {
        Ok(()) => Some(state),
        Err(err) => {
            log::debug!("Rejected match state payload: {}", err);
            None
        }
    }
}

/// Full structural acceptance check for an arbitrary JSON value.
pub fn is_match_state(value: &Value) -> bool {
    serde_json::from_value::<MatchState>(value.clone())
        .map(|state| state.validate().is_ok())
        .unwrap_or(false)
}

/// Unix milliseconds.
pub fn current_timestamp() -> u64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_serialize_deserialize_roundtrip() {
        let mut state = MatchState::initial(5);
        state.sets_won = TeamScores { team_a: 1, team_b: 2 };
        state.current_set = CurrentSet { number: 4, games: TeamScores { team_a: 5, team_b: 6 } };
        state.current_game.points = TeamScores { team_a: 3, team_b: 4 };
        state.set_history = vec![
            SetRecord { set_number: 1, team_a_games: 6, team_b_games: 4 },
            SetRecord { set_number: 2, team_a_games: 6, team_b_games: 7 },
            SetRecord { set_number: 3, team_a_games: 2, team_b_games: 6 },
        ];

        let raw = serialize_match_state(&state).unwrap();
        let restored = deserialize_match_state(&raw).unwrap();

        assert_eq!(state, restored);
    }

    #[test]
    fn test_serialized_field_names_are_camel_case() {
        let raw = serialize_match_state(&MatchState::default()).unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();

        assert!(value.get("setsToPlay").is_some());
        assert!(value.get("setsNeededToWin").is_some());
        assert!(value.get("setHistory").is_some());
        assert!(value.get("updatedAt").is_some());
        assert!(value.get("schemaVersion").is_some());
        assert_eq!(value["status"], "active");
    }

    #[test]
    fn test_deserialize_rejects_malformed_syntax() {
        assert_eq!(deserialize_match_state(""), None);
        assert_eq!(deserialize_match_state("not json"), None);
        assert_eq!(deserialize_match_state("{\"status\":"), None);
    }

    #[test]
    fn test_deserialize_rejects_missing_fields() {
        let raw = json!({ "status": "active", "setsToPlay": 3 }).to_string();
        assert_eq!(deserialize_match_state(&raw), None);
    }

    #[test]
    fn test_deserialize_rejects_negative_counters() {
        let mut value = serde_json::to_value(MatchState::default()).unwrap();
        value["setsWon"]["teamA"] = json!(-1);
        assert_eq!(deserialize_match_state(&value.to_string()), None);
    }

    #[test]
    fn test_is_match_state_rejects_mismatched_sets_pairing() {
        let mut value = serde_json::to_value(MatchState::initial(5)).unwrap();
        // Both values are individually in range, but the pairing is broken.
        value["setsNeededToWin"] = json!(1);
        assert!(!is_match_state(&value));
    }

    #[test]
    fn test_is_match_state_rejects_invalid_sets_to_play() {
        let mut value = serde_json::to_value(MatchState::default()).unwrap();
        value["setsToPlay"] = json!(4);
        value["setsNeededToWin"] = json!(2);
        assert!(!is_match_state(&value));
    }

    #[test]
    fn test_validate_rejects_zero_set_number() {
        let mut state = MatchState::default();
        state.current_set.number = 0;
        assert!(state.validate().is_err());

        let mut state = MatchState::default();
        state.set_history.push(SetRecord { set_number: 0, team_a_games: 6, team_b_games: 0 });
        assert!(state.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_schema_version() {
        let mut state = MatchState::default();
        state.schema_version = 0;
        assert!(state.validate().is_err());
    }

    #[test]
    fn test_initial_derives_sets_needed() {
        assert_eq!(MatchState::initial(1).sets_needed_to_win, 1);
        assert_eq!(MatchState::initial(3).sets_needed_to_win, 2);
        assert_eq!(MatchState::initial(5).sets_needed_to_win, 3);
    }

    proptest! {
        #[test]
        fn prop_roundtrip_preserves_every_field(
            sets_idx in 0usize..3,
            points_a in 0u32..12,
            points_b in 0u32..12,
            games_a in 0u32..8,
            games_b in 0u32..8,
            set_number in 1u32..6,
            sets_a in 0u32..3,
            sets_b in 0u32..3,
            history_len in 0usize..4,
        ) {
            let mut state = MatchState::initial([1, 3, 5][sets_idx]);
            state.current_game.points = TeamScores { team_a: points_a, team_b: points_b };
            state.current_set =
                CurrentSet { number: set_number, games: TeamScores { team_a: games_a, team_b: games_b } };
            state.sets_won = TeamScores { team_a: sets_a, team_b: sets_b };
            for n in 0..history_len {
                state.set_history.push(SetRecord {
                    set_number: n as u32 + 1,
                    team_a_games: 6,
                    team_b_games: n as u32,
                });
            }

            let raw = serialize_match_state(&state).unwrap();
            prop_assert_eq!(deserialize_match_state(&raw), Some(state));
        }
    }
}
