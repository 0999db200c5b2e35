//! Team-scoped undo: remove the most recent point scored by one team while
//! keeping every point the other team scored since.
//!
//! Built on the tagged history rather than replay-based attribution: each
//! entry already records who scored, so locating the event is exact. The
//! state is rebuilt by restoring that entry's pre-mutation snapshot and
//! replaying the later events through the ordinary scoring path, which also
//! rebuilds their history entries.

use super::history::SnapshotHistory;
use super::scoring::add_point;
use super::state::{RuntimeMatchState, Team};
use super::EngineError;

/// Undo the last point scored by `team` specifically.
///
/// If the history holds no point by that team, the state is returned
/// unchanged and the history is left untouched.
pub fn remove_point_for_team(
    state: &RuntimeMatchState,
    team: Team,
    history: &mut SnapshotHistory,
) -> Result<RuntimeMatchState, EngineError> {
    let Some(index) = history.entries().iter().rposition(|entry| entry.scored_by == team) else {
        log::debug!("No point by {} in history, nothing to undo", team);
        return Ok(state.clone());
    };

    let base = history.entries()[index].snapshot.clone();
    if !base.is_restorable() {
        return Err(EngineError::CorruptSnapshot);
    }

    let later_events: Vec<Team> =
        history.entries()[index + 1..].iter().map(|entry| entry.scored_by).collect();

    history.truncate(index);

    let mut rebuilt = base;
    for later_team in later_events {
        rebuilt = add_point(&rebuilt, later_team, Some(&mut *history));
    }

    Ok(rebuilt)
}
