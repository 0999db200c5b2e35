// Live match scoring: the rules engine, the undo history and the
// denormalized runtime state it operates on.

pub mod history;
pub mod scoring;
pub mod state;
pub mod undo;

pub use history::{HistoryEntry, SnapshotHistory};
pub use scoring::{add_point, remove_point};
pub use state::{
    denormalize, normalize, CurrentSetStatus, MatchWinner, PointScore, RuntimeMatchState, Team,
    TeamScore,
};
pub use undo::remove_point_for_team;

use thiserror::Error;

/// Contract violations raised by scoring and undo. These indicate caller
/// bugs, never expected data conditions, and are therefore loud.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum EngineError {
    #[error("undo history snapshot is not a valid match state")]
    CorruptSnapshot,
}
