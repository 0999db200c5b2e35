// Canonical match state: the durable, versioned representation.
// Validation, JSON serialization and forward migration live here.

pub mod error;
pub mod format;
pub mod migration;

pub use error::SchemaError;
pub use format::{
    current_timestamp, deserialize_match_state, is_match_state, serialize_match_state, CurrentGame,
    CurrentSet, MatchState, MatchStatus, SetRecord, TeamScores,
};
pub use migration::{migrate_match_state, try_migrate_match_state};

/// Current version of the persisted match state format.
pub const SCHEMA_VERSION: u32 = 1;
